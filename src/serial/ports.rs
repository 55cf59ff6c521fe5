// Port enumeration
// Only USB serial adapters are offered: ttyUSB*/ttyACM* on Linux, cu.*/tty.* on
// macOS, every COM port on Windows.

use super::comm::{Result, SerialError};
use std::path::Path;

/// Check whether a port name looks like a USB serial adapter on this platform
pub fn is_candidate_port(port_name: &str) -> bool {
    let base = Path::new(port_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(port_name);

    if cfg!(target_os = "windows") {
        true
    } else if cfg!(target_os = "macos") {
        base.starts_with("cu.") || base.starts_with("tty.")
    } else {
        base.starts_with("ttyUSB") || base.starts_with("ttyACM")
    }
}

/// Keep candidate ports, sorted and deduplicated
pub fn filter_ports<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut ports: Vec<String> = names
        .into_iter()
        .map(Into::into)
        .filter(|name| is_candidate_port(name))
        .collect();
    ports.sort();
    ports.dedup();
    ports
}

/// List available serial ports
pub fn list_ports() -> Result<Vec<String>> {
    let ports = serialport::available_ports().map_err(|e| SerialError::Port(e.to_string()))?;
    tracing::debug!("System reports {} serial ports", ports.len());
    Ok(filter_ports(ports.into_iter().map(|p| p.port_name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_ports() {
        // This should not fail even if no ports are available
        let result = list_ports();
        assert!(result.is_ok());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_filter_linux_ports() {
        let ports = filter_ports([
            "/dev/ttyS0",
            "/dev/ttyUSB1",
            "/dev/ttyACM0",
            "/dev/ttyUSB0",
            "/dev/ttyUSB0",
            "/dev/tty",
        ]);
        assert_eq!(ports, vec!["/dev/ttyACM0", "/dev/ttyUSB0", "/dev/ttyUSB1"]);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_candidate_bare_name() {
        assert!(is_candidate_port("ttyUSB3"));
        assert!(!is_candidate_port("ttyAMA0"));
    }

    #[cfg(target_os = "macos")]
    #[test]
    fn test_filter_macos_ports() {
        let ports = filter_ports(["/dev/cu.usbserial-1", "/dev/tty.usbserial-1", "/dev/ttys000"]);
        assert_eq!(ports, vec!["/dev/cu.usbserial-1", "/dev/tty.usbserial-1"]);
    }
}

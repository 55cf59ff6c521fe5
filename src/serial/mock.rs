// Mock serial port for testing without hardware

use super::comm::{SerialConfig, SerialError};
use super::connection::Connection;
use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Mock serial port for testing
///
/// Clones share their buffers, so a test can keep one handle to feed device
/// output while the code under test owns another.
#[derive(Clone)]
pub struct MockSerialPort {
    port_name: String,

    /// Chunks to be read, one per read call (simulates device output)
    read_chunks: Arc<Mutex<VecDeque<Vec<u8>>>>,

    /// Data that was written (simulates lines sent to the device)
    write_buffer: Arc<Mutex<Vec<u8>>>,

    /// Set once the device has been unplugged
    unplugged: Arc<AtomicBool>,

    /// Configuration
    config: SerialConfig,

    /// Simulated delay for read/write operations (in ms)
    delay_ms: u64,
}

impl MockSerialPort {
    /// Create a new mock serial port
    pub fn new(port_name: &str) -> Self {
        Self {
            port_name: port_name.to_string(),
            read_chunks: Arc::new(Mutex::new(VecDeque::new())),
            write_buffer: Arc::new(Mutex::new(Vec::new())),
            unplugged: Arc::new(AtomicBool::new(false)),
            config: SerialConfig::default(),
            delay_ms: 1,
        }
    }

    /// Create with specific configuration
    pub fn with_config(port_name: &str, config: SerialConfig) -> Self {
        Self {
            config,
            ..Self::new(port_name)
        }
    }

    /// Set simulated delay for operations
    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    pub fn config(&self) -> &SerialConfig {
        &self.config
    }

    /// Queue one chunk of device output
    pub fn push_read_data(&self, data: &[u8]) {
        self.read_chunks.lock().unwrap().push_back(data.to_vec());
    }

    /// Get data that was written
    pub fn get_written_data(&self) -> Vec<u8> {
        self.write_buffer.lock().unwrap().clone()
    }

    /// Clear written data
    pub fn clear_written_data(&self) {
        self.write_buffer.lock().unwrap().clear();
    }

    /// Simulate the device disappearing; later reads and writes fail
    pub fn unplug(&self) {
        self.unplugged.store(true, Ordering::SeqCst);
    }

    /// Number of queued chunks not yet read
    pub fn pending_chunks(&self) -> usize {
        self.read_chunks.lock().unwrap().len()
    }

    fn check_plugged(&self) -> Result<(), SerialError> {
        if self.unplugged.load(Ordering::SeqCst) {
            return Err(SerialError::Io(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "device removed",
            )));
        }
        Ok(())
    }

    async fn simulate_delay(&self) {
        if self.delay_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(self.delay_ms)).await;
        }
    }
}

impl Connection for MockSerialPort {
    fn port_name(&self) -> &str {
        &self.port_name
    }

    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, SerialError> {
        self.simulate_delay().await;
        self.check_plugged()?;

        let mut chunks = self.read_chunks.lock().unwrap();
        let Some(mut chunk) = chunks.pop_front() else {
            return Err(SerialError::Timeout(self.config.timeout));
        };

        let count = chunk.len().min(buf.len());
        buf[..count].copy_from_slice(&chunk[..count]);
        if count < chunk.len() {
            chunks.push_front(chunk.split_off(count));
        }
        Ok(count)
    }

    async fn write_all(&mut self, buf: &[u8]) -> Result<(), SerialError> {
        self.simulate_delay().await;
        self.check_plugged()?;

        self.write_buffer.lock().unwrap().extend_from_slice(buf);
        Ok(())
    }

    fn try_clone(&self) -> Result<Self, SerialError> {
        self.check_plugged()?;
        Ok(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_mock_serial_basic() {
        let mut port = MockSerialPort::new("/dev/ttyUSB0");

        port.push_read_data(b"Hello");

        let mut buf = [0u8; 16];
        let n = port.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"Hello");

        port.write_all(b"World").await.unwrap();
        assert_eq!(port.get_written_data(), b"World");
    }

    #[tokio::test]
    async fn test_mock_serial_timeout() {
        let config = SerialConfig::new(9600).with_timeout(Duration::from_millis(250));
        let mut port = MockSerialPort::with_config("/dev/ttyUSB0", config);
        assert_eq!(port.config().baud_rate, 9600);

        let mut buf = [0u8; 5];
        let result = port.read(&mut buf).await;
        assert!(matches!(result, Err(SerialError::Timeout(d)) if d == Duration::from_millis(250)));
    }

    #[tokio::test]
    async fn test_mock_serial_partial_read() {
        let mut port = MockSerialPort::new("/dev/ttyUSB0");
        port.push_read_data(b"abcdef");

        let mut buf = [0u8; 4];
        assert_eq!(port.read(&mut buf).await.unwrap(), 4);
        assert_eq!(&buf, b"abcd");
        assert_eq!(port.read(&mut buf).await.unwrap(), 2);
        assert_eq!(&buf[..2], b"ef");
        assert_eq!(port.pending_chunks(), 0);
    }

    #[tokio::test]
    async fn test_mock_clone_shares_buffers() {
        let device = MockSerialPort::new("/dev/ttyACM0");
        let mut handle = device.try_clone().unwrap();

        device.push_read_data(b"ping");
        let mut buf = [0u8; 8];
        let n = handle.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"ping");

        handle.write_all(b"pong").await.unwrap();
        assert_eq!(device.get_written_data(), b"pong");

        device.clear_written_data();
        assert!(device.get_written_data().is_empty());
    }

    #[tokio::test]
    async fn test_mock_unplug() {
        let mut port = MockSerialPort::new("/dev/ttyUSB0").with_delay(0);
        port.unplug();

        let mut buf = [0u8; 4];
        assert!(matches!(port.read(&mut buf).await, Err(SerialError::Io(_))));
        assert!(port.write_all(b"x").await.is_err());
        assert!(port.try_clone().is_err());
    }
}

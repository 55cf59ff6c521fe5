// Append-only log file for a tab
// Every write is flushed so an abrupt disconnect loses nothing the viewer has shown

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Default file name for a port's log, e.g. `uart_log__dev_ttyUSB0.txt`
pub fn default_log_name(port_name: &str) -> String {
    format!("uart_log_{}.txt", port_name.replace('/', "_"))
}

pub struct LogSink {
    file: File,
    path: PathBuf,
    bytes_written: u64,
}

impl LogSink {
    /// Open `path` for appending, creating it if needed
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        tracing::info!("Logging to {}", path.display());

        Ok(Self {
            file,
            path,
            bytes_written: 0,
        })
    }

    /// Append text and flush it
    pub fn write(&mut self, text: &str) -> io::Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        self.file.write_all(text.as_bytes())?;
        self.file.flush()?;
        self.bytes_written += text.len() as u64;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes appended through this sink since it was opened
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }
}

impl Drop for LogSink {
    fn drop(&mut self) {
        tracing::debug!(
            "Closing log {} after {} bytes",
            self.path.display(),
            self.bytes_written
        );
    }
}

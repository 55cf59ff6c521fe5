// Connection trait implemented by anything a tab can read from and write to

use super::comm::{Result, SerialPort};
use std::future::Future;

/// Byte stream to a device
///
/// Reads return `SerialError::Timeout` when nothing arrived in time; callers
/// treat that as "no data yet". A connection is split into a reader and a
/// writer with [`Connection::try_clone`].
pub trait Connection: Send + Sized + 'static {
    /// Device name as shown to the user
    fn port_name(&self) -> &str;

    /// Read up to `buf.len()` bytes
    fn read(&mut self, buf: &mut [u8]) -> impl Future<Output = Result<usize>> + Send;

    /// Write every byte of `buf`
    fn write_all(&mut self, buf: &[u8]) -> impl Future<Output = Result<()>> + Send;

    /// Second handle to the same device
    fn try_clone(&self) -> Result<Self>;
}

impl Connection for SerialPort {
    fn port_name(&self) -> &str {
        SerialPort::port_name(self)
    }

    async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        SerialPort::read(self, buf).await
    }

    async fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        SerialPort::write_all(self, buf).await?;
        SerialPort::flush(self).await
    }

    fn try_clone(&self) -> Result<Self> {
        SerialPort::try_clone(self)
    }
}

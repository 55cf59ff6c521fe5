// Serial communication module for device I/O
pub mod comm;
pub mod connection;
pub mod ports;
pub mod reader;

#[cfg(test)]
pub mod mock;

pub use comm::{parse_baud, SerialConfig, SerialError, SerialPort};
pub use connection::Connection;
pub use ports::{filter_ports, is_candidate_port, list_ports};
pub use reader::{spawn_reader, PortEvent, ReaderHandle, TabId};

// UART-TABS: tabbed serial log viewer with per-line timestamps
// Copyright 2024 - Licensed under GPLv3

pub mod config;
pub mod core;
pub mod serial;
pub mod session;
pub mod shell;

// Re-export commonly used types
pub use config::{AppConfig, ConfigError};
pub use core::{
    constants::*, ChunkDecoder, Clock, Direction, FindOptions, FormatterState, SystemClock, Zone,
};
pub use serial::{list_ports, Connection, PortEvent, SerialConfig, SerialError, SerialPort};
pub use session::{ManagerSettings, PortTab, SessionError, TabManager};
pub use shell::{Reply, Shell};

/// uart-tabs version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}

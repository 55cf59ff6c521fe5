// Constants shared by the viewer - titles, baud rates, line endings

/// Title used for user-facing notices
pub const APP_TITLE: &str = "UART Log Viewer";

/// Baud rate selected for new tabs
pub const DEFAULT_BAUD: u32 = 115_200;

/// Baud rates offered for selection
pub const BAUD_RATES: &[u32] = &[
    300, 600, 1200, 2400, 4800, 9600, 19200, 38400, 57600, 115_200, 230_400, 460_800, 921_600,
];

/// Terminator appended to every line sent to a device
pub const SEND_LINE_ENDING: &str = "\r\n";

/// Maximum number of bytes pulled from a port per read
pub const READ_CHUNK_SIZE: usize = 4096;

/// Read timeout used while monitoring a port (milliseconds)
pub const MONITOR_READ_TIMEOUT_MS: u64 = 100;

/// Status text for a tab without an open port
pub const STATUS_DISCONNECTED: &str = "Disconnected";

/// Check whether a baud rate is one of the standard selections
pub fn is_standard_baud(baud: u32) -> bool {
    BAUD_RATES.contains(&baud)
}

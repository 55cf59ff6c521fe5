// Session layer: port tabs and the manager that routes reader events to them
pub mod log_sink;
pub mod manager;
pub mod scrollback;
pub mod tab;

pub use log_sink::{default_log_name, LogSink};
pub use manager::{FindMatch, ManagerSettings, PortOpener, TabManager};
pub use scrollback::Scrollback;
pub use tab::{EventOutcome, PortTab, Result, SessionError, TabStatus};

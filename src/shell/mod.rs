// Line-oriented shell: commands typed on stdin drive the port tabs
pub mod commands;
pub mod executor;

pub use commands::{parse_command, Command, CommandError, HELP};
pub use executor::{PortLister, Reply, Shell};

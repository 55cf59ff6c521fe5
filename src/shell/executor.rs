// Executes shell commands against the tab manager
// Replies are plain values so the event loop decides where each one is printed

use super::commands::{parse_command, Command, HELP};
use crate::core::constants::is_standard_baud;
use crate::core::search::FindOptions;
use crate::core::timestamp::{matching_zones, Zone};
use crate::serial::{Connection, PortEvent, SerialError};
use crate::session::{default_log_name, SessionError, TabManager};
use std::path::{Path, PathBuf};

/// Lines of scrollback shown when switching tabs
const TAB_SWITCH_CONTEXT_LINES: usize = 20;

/// Lists serial ports present on the system
pub type PortLister = Box<dyn Fn() -> Result<Vec<String>, SerialError> + Send>;

/// Something the front end should show
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Device output for the active tab, printed as is
    Output(String),

    /// Response to a command
    Info(String),

    /// Error or event the user should notice
    Notice(String),

    /// Leave the event loop
    Quit,
}

pub struct Shell<C: Connection> {
    manager: TabManager<C>,
    lister: PortLister,
    log_dir: Option<PathBuf>,
}

impl<C: Connection> Shell<C> {
    pub fn new(manager: TabManager<C>, lister: PortLister) -> Self {
        Self {
            manager,
            lister,
            log_dir: None,
        }
    }

    /// Directory for log files started without an explicit path
    pub fn with_log_dir(mut self, log_dir: Option<PathBuf>) -> Self {
        self.log_dir = log_dir;
        self
    }

    pub fn manager(&self) -> &TabManager<C> {
        &self.manager
    }

    /// Open a tab per port, connecting each one if asked
    ///
    /// An empty list opens every detected port.
    pub fn open_ports(&mut self, ports: &[String], connect: bool) -> Vec<Reply> {
        let ports = if ports.is_empty() {
            match (self.lister)() {
                Ok(found) => self.manager.candidate_ports(&found),
                Err(e) => return vec![Reply::Notice(e.to_string())],
            }
        } else {
            ports.to_vec()
        };

        if ports.is_empty() {
            return vec![Reply::Notice("No serial ports detected.".to_string())];
        }

        let mut replies = Vec::new();
        for port in &ports {
            replies.extend(self.open(port));
            if connect && self.manager.active_tab().map(|t| t.port_name() == port).unwrap_or(false) {
                replies.extend(self.connect());
            }
        }
        without_empty_output(replies)
    }

    /// Start the default log file for every open tab
    pub fn log_all(&mut self) -> Vec<Reply> {
        let active = self.manager.active_index();
        let mut replies = Vec::new();
        for idx in 0..self.manager.tabs().len() {
            if self.manager.select(idx).is_ok() {
                replies.extend(self.log(None));
            }
        }
        if let Some(idx) = active {
            let _ = self.manager.select(idx);
        }
        replies
    }

    /// Handle one line typed by the user
    pub async fn execute(&mut self, line: &str) -> Vec<Reply> {
        let command = match parse_command(line) {
            Ok(command) => command,
            Err(e) => return vec![Reply::Notice(e.to_string())],
        };
        tracing::debug!("Command {:?}", command);

        let replies = match command {
            Command::Send(text) => match self.manager.send_line(&text).await {
                Ok(()) => Vec::new(),
                Err(e) => vec![Reply::Notice(e.to_string())],
            },
            Command::Help => vec![Reply::Info(HELP.to_string())],
            Command::Ports => self.ports(),
            Command::Tabs => self.tabs(),
            Command::Open(port) => self.open(&port),
            Command::Close => match self.manager.close_tab() {
                Ok(port) => vec![Reply::Info(format!("Closed {}", port))],
                Err(e) => vec![Reply::Notice(e.to_string())],
            },
            Command::Select(number) => self.select(number),
            Command::Connect => self.connect(),
            Command::Disconnect => self.disconnect(),
            Command::Baud(baud) => self.baud(baud),
            Command::Timestamps(enabled) => {
                let released = self.manager.set_timestamp_enabled(enabled);
                let state = if enabled { "on" } else { "off" };
                vec![
                    Reply::Output(released),
                    Reply::Info(format!("Timestamps {}", state)),
                ]
            }
            Command::TimeZone(None) => vec![Reply::Info(format!(
                "Time zone: {}",
                self.manager.settings().time_zone
            ))],
            Command::TimeZone(Some(id)) => match Zone::parse(&id) {
                Ok(zone) => {
                    self.manager.set_time_zone(zone);
                    vec![Reply::Info(format!("Time zone: {}", zone))]
                }
                Err(e) => vec![Reply::Notice(e.to_string())],
            },
            Command::Zones(filter) => vec![Reply::Info(zone_list(filter.as_deref()))],
            Command::Find { query, options } => self.find(&query, options),
            Command::Save(path) => self.save(path),
            Command::Log(path) => self.log(path),
            Command::NoLog => match self.manager.stop_log_active() {
                Ok(Some(path)) => vec![Reply::Info(format!("Stopped logging to {}", path.display()))],
                Ok(None) => vec![Reply::Info("Not logging.".to_string())],
                Err(e) => vec![Reply::Notice(e.to_string())],
            },
            Command::Clear => match self.manager.clear_active() {
                Ok(()) => Vec::new(),
                Err(e) => vec![Reply::Notice(e.to_string())],
            },
            Command::Quit => {
                self.manager.disconnect_all();
                vec![Reply::Quit]
            }
        };

        without_empty_output(replies)
    }

    /// Route a reader event and report what to show
    pub fn handle_event(&mut self, event: PortEvent) -> Vec<Reply> {
        let outcome = self.manager.handle_event(event);
        let mut replies = Vec::new();
        if let Some(text) = outcome.display {
            replies.push(Reply::Output(text));
        }
        if let Some(notice) = outcome.notice {
            replies.push(Reply::Notice(notice));
        }
        replies
    }

    /// Disconnect every tab; used on Ctrl-C and end of input
    pub fn shutdown(&mut self) {
        self.manager.disconnect_all();
    }

    fn ports(&self) -> Vec<Reply> {
        match (self.lister)() {
            Ok(found) => {
                let candidates = self.manager.candidate_ports(&found);
                if candidates.is_empty() {
                    vec![Reply::Info("No new serial ports detected.".to_string())]
                } else {
                    vec![Reply::Info(candidates.join("\n"))]
                }
            }
            Err(e) => vec![Reply::Notice(e.to_string())],
        }
    }

    fn tabs(&self) -> Vec<Reply> {
        let lines = self.manager.describe_tabs();
        if lines.is_empty() {
            vec![Reply::Info("No tabs open.".to_string())]
        } else {
            vec![Reply::Info(lines.join("\n"))]
        }
    }

    fn open(&mut self, port: &str) -> Vec<Reply> {
        match self.manager.open_tab(port) {
            Ok(idx) => vec![Reply::Info(format!("Tab {}: {}", idx + 1, port))],
            Err(e) => vec![Reply::Notice(e.to_string())],
        }
    }

    fn select(&mut self, number: usize) -> Vec<Reply> {
        match self.manager.select(number - 1) {
            Ok(tab) => vec![
                Reply::Info(format!("Tab {}: {} [{}]", number, tab.port_name(), tab.status())),
                Reply::Output(tab.scrollback().tail_lines(TAB_SWITCH_CONTEXT_LINES).to_string()),
            ],
            Err(e) => vec![Reply::Notice(e.to_string())],
        }
    }

    fn connect(&mut self) -> Vec<Reply> {
        match self.manager.connect_active() {
            Ok(flushed) => vec![Reply::Output(flushed), Reply::Info(self.active_label())],
            Err(e) => vec![Reply::Notice(e.to_string())],
        }
    }

    fn disconnect(&mut self) -> Vec<Reply> {
        match self.manager.disconnect_active() {
            Ok(flushed) => vec![Reply::Output(flushed), Reply::Info(self.active_label())],
            Err(e) => vec![Reply::Notice(e.to_string())],
        }
    }

    fn baud(&mut self, baud: u32) -> Vec<Reply> {
        if let Err(e) = self.manager.set_active_baud(baud) {
            return vec![Reply::Notice(e.to_string())];
        }

        let mut replies = Vec::new();
        if !is_standard_baud(baud) {
            replies.push(Reply::Notice(format!("{} is not a standard baud rate", baud)));
        }
        let connected = self.manager.active_tab().map(|t| t.is_connected()).unwrap_or(false);
        if connected {
            replies.push(Reply::Info(format!(
                "Baud rate {} applies after reconnecting",
                baud
            )));
        } else {
            replies.push(Reply::Info(format!("Baud rate {}", baud)));
        }
        replies
    }

    fn find(&mut self, query: &str, options: FindOptions) -> Vec<Reply> {
        match self.manager.find_in_active(query, options) {
            Ok(Some(found)) => vec![Reply::Info(format!("{}: {}", found.line_number, found.line))],
            Ok(None) => vec![Reply::Notice(format!("Cannot find \"{}\"", query))],
            Err(e) => vec![Reply::Notice(e.to_string())],
        }
    }

    fn save(&mut self, path: Option<PathBuf>) -> Vec<Reply> {
        let path = match path.map_or_else(|| self.default_path(None), Ok) {
            Ok(path) => path,
            Err(e) => return vec![Reply::Notice(e.to_string())],
        };
        match self.manager.save_active(&path) {
            Ok(()) => vec![Reply::Info(format!("Saved to {}", path.display()))],
            Err(e) => vec![Reply::Notice(format!("Failed to save {}: {}", path.display(), e))],
        }
    }

    fn log(&mut self, path: Option<PathBuf>) -> Vec<Reply> {
        let log_dir = self.log_dir.clone();
        let path = match path.map_or_else(|| self.default_path(log_dir.as_deref()), Ok) {
            Ok(path) => path,
            Err(e) => return vec![Reply::Notice(e.to_string())],
        };
        match self.manager.start_log_active(&path) {
            Ok(()) => vec![Reply::Info(format!("Logging to {}", path.display()))],
            Err(e) => vec![Reply::Notice(format!("Failed to open {}: {}", path.display(), e))],
        }
    }

    /// `uart_log_<port>.txt` for the active tab, optionally inside `dir`
    fn default_path(&self, dir: Option<&Path>) -> Result<PathBuf, SessionError> {
        let name = default_log_name(self.manager.active_tab()?.port_name());
        Ok(match dir {
            Some(dir) => dir.join(name),
            None => PathBuf::from(name),
        })
    }

    fn active_label(&self) -> String {
        match self.manager.active_tab() {
            Ok(tab) => format!("{}: {}", tab.port_name(), tab.status()),
            Err(_) => self.manager.active_status(),
        }
    }
}

fn zone_list(filter: Option<&str>) -> String {
    let zones = matching_zones(filter.unwrap_or(""));
    if zones.is_empty() {
        "No matching time zones.".to_string()
    } else {
        zones.join("\n")
    }
}

fn without_empty_output(replies: Vec<Reply>) -> Vec<Reply> {
    replies
        .into_iter()
        .filter(|reply| !matches!(reply, Reply::Output(text) if text.is_empty()))
        .collect()
}

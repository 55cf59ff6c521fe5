// Tab manager: owns every port tab and applies global settings to them
// Timestamp and time zone changes are broadcast to all tabs; new tabs inherit them.

use super::tab::{EventOutcome, PortTab, Result, SessionError};
use crate::core::constants::{DEFAULT_BAUD, STATUS_DISCONNECTED};
use crate::core::formatter::FormatterState;
use crate::core::search::FindOptions;
use crate::core::timestamp::{Clock, SystemClock, Zone};
use crate::serial::{Connection, PortEvent, SerialConfig, SerialError, TabId};
use std::ops::Range;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

/// Opens a device given its name and line settings
pub type PortOpener<C> =
    Box<dyn Fn(&str, &SerialConfig) -> std::result::Result<C, SerialError> + Send>;

/// Settings applied to every tab
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagerSettings {
    pub timestamp_enabled: bool,
    pub time_zone: Zone,
    pub default_baud: u32,
}

impl Default for ManagerSettings {
    fn default() -> Self {
        Self {
            timestamp_enabled: false,
            time_zone: Zone::Local,
            default_baud: DEFAULT_BAUD,
        }
    }
}

/// A find result in the active tab
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindMatch {
    pub range: Range<usize>,
    pub line_number: usize,
    pub line: String,
}

pub struct TabManager<C: Connection> {
    tabs: Vec<PortTab<C>>,
    active: Option<usize>,
    next_id: u64,
    settings: ManagerSettings,
    opener: PortOpener<C>,
    events: UnboundedSender<PortEvent>,
    clock: Arc<dyn Clock>,
}

impl<C: Connection> TabManager<C> {
    pub fn new(
        settings: ManagerSettings,
        opener: PortOpener<C>,
        events: UnboundedSender<PortEvent>,
    ) -> Self {
        Self {
            tabs: Vec::new(),
            active: None,
            next_id: 1,
            settings,
            opener,
            events,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock used to stamp lines in tabs opened afterwards
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn settings(&self) -> ManagerSettings {
        self.settings
    }

    pub fn tabs(&self) -> &[PortTab<C>] {
        &self.tabs
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub fn active_tab(&self) -> Result<&PortTab<C>> {
        self.active
            .and_then(|idx| self.tabs.get(idx))
            .ok_or(SessionError::NoActiveTab)
    }

    fn active_tab_mut(&mut self) -> Result<&mut PortTab<C>> {
        self.active
            .and_then(|idx| self.tabs.get_mut(idx))
            .ok_or(SessionError::NoActiveTab)
    }

    fn position(&self, id: TabId) -> Option<usize> {
        self.tabs.iter().position(|tab| tab.id() == id)
    }

    /// Ports from `available` that do not have a tab yet
    pub fn candidate_ports(&self, available: &[String]) -> Vec<String> {
        available
            .iter()
            .filter(|port| !self.tabs.iter().any(|tab| tab.port_name() == port.as_str()))
            .cloned()
            .collect()
    }

    /// Open a disconnected tab for `port_name` and make it active
    pub fn open_tab(&mut self, port_name: &str) -> Result<usize> {
        if self.tabs.iter().any(|tab| tab.port_name() == port_name) {
            return Err(SessionError::DuplicatePort(port_name.to_string()));
        }

        let id = TabId(self.next_id);
        self.next_id += 1;

        let formatter = FormatterState::new(self.settings.timestamp_enabled, self.settings.time_zone);
        let tab = PortTab::new(
            id,
            port_name,
            self.settings.default_baud,
            formatter,
            self.clock.clone(),
        );
        self.tabs.push(tab);

        let idx = self.tabs.len() - 1;
        self.active = Some(idx);
        tracing::debug!("Opened tab {} for {}", id, port_name);
        Ok(idx)
    }

    /// Disconnect and remove the active tab; returns its port name
    pub fn close_tab(&mut self) -> Result<String> {
        let idx = self.active.ok_or(SessionError::NoActiveTab)?;
        let mut tab = self.tabs.remove(idx);
        tab.shutdown();

        self.active = if self.tabs.is_empty() {
            None
        } else {
            Some(idx.min(self.tabs.len() - 1))
        };
        Ok(tab.port_name().to_string())
    }

    /// Make tab `idx` (0-based) active
    pub fn select(&mut self, idx: usize) -> Result<&PortTab<C>> {
        if idx >= self.tabs.len() {
            return Err(SessionError::NoSuchTab(idx + 1));
        }
        self.active = Some(idx);
        Ok(&self.tabs[idx])
    }

    /// Toggle timestamping in every tab; returns text released in the active tab
    pub fn set_timestamp_enabled(&mut self, enabled: bool) -> String {
        self.settings.timestamp_enabled = enabled;
        let active = self.active;
        let mut display = String::new();
        for (idx, tab) in self.tabs.iter_mut().enumerate() {
            let released = tab.set_timestamp_enabled(enabled);
            if Some(idx) == active {
                display = released;
            }
        }
        display
    }

    /// Change the time zone of every tab
    pub fn set_time_zone(&mut self, zone: Zone) {
        self.settings.time_zone = zone;
        for tab in &mut self.tabs {
            tab.set_time_zone(zone);
        }
        tracing::info!("Time zone set to {}", zone);
    }

    /// Baud rate for the active tab's next connect
    pub fn set_active_baud(&mut self, baud_rate: u32) -> Result<()> {
        self.active_tab_mut()?.set_baud_rate(baud_rate);
        Ok(())
    }

    /// Open the active tab's device and start reading
    ///
    /// Returns text finished off from a previous connection that was still
    /// waiting for its reader to stop.
    pub fn connect_active(&mut self) -> Result<String> {
        let events = self.events.clone();
        let idx = self.active.ok_or(SessionError::NoActiveTab)?;
        let tab = &mut self.tabs[idx];
        if tab.is_connected() {
            return Err(SessionError::AlreadyConnected(tab.port_name().to_string()));
        }

        let config = SerialConfig::new(tab.baud_rate());
        let conn = (self.opener)(tab.port_name(), &config)?;
        tab.connect(conn, events)
    }

    /// Close the active tab's device
    ///
    /// Output already read from the device still arrives as events; the held
    /// partial line is finished when the reader reports it has stopped.
    pub fn disconnect_active(&mut self) -> Result<String> {
        Ok(self.active_tab_mut()?.disconnect())
    }

    /// Disconnect every tab, e.g. before exiting
    pub fn disconnect_all(&mut self) {
        for tab in &mut self.tabs {
            tab.shutdown();
        }
    }

    /// Send a line to the active tab's device
    pub async fn send_line(&mut self, line: &str) -> Result<()> {
        self.active_tab_mut()?.send_line(line).await
    }

    pub fn find_in_active(&mut self, query: &str, options: FindOptions) -> Result<Option<FindMatch>> {
        let tab = self.active_tab_mut()?;
        let Some(range) = tab.find_next(query, options) else {
            return Ok(None);
        };
        let (line_number, line) = tab.scrollback().line_at(range.start);
        Ok(Some(FindMatch {
            line_number,
            line: line.to_string(),
            range,
        }))
    }

    pub fn start_log_active(&mut self, path: &std::path::Path) -> Result<()> {
        self.active_tab_mut()?.start_log(path)?;
        Ok(())
    }

    pub fn stop_log_active(&mut self) -> Result<Option<std::path::PathBuf>> {
        Ok(self.active_tab_mut()?.stop_log())
    }

    pub fn save_active(&self, path: &std::path::Path) -> Result<()> {
        self.active_tab()?.save_logs(path)
    }

    pub fn clear_active(&mut self) -> Result<()> {
        self.active_tab_mut()?.clear();
        Ok(())
    }

    /// Route a reader event to its tab
    pub fn handle_event(&mut self, event: PortEvent) -> EventOutcome {
        let Some(idx) = self.position(event.tab()) else {
            tracing::debug!("Dropping event for closed tab {}", event.tab());
            return EventOutcome::default();
        };
        let is_active = self.active == Some(idx);
        let outcome = self.tabs[idx].apply_event(event);

        EventOutcome {
            display: outcome.display.filter(|_| is_active),
            notice: outcome.notice,
        }
    }

    /// One line per tab: index, port, status, log file
    pub fn describe_tabs(&self) -> Vec<String> {
        self.tabs
            .iter()
            .enumerate()
            .map(|(idx, tab)| {
                let marker = if self.active == Some(idx) { '*' } else { ' ' };
                let mut line = format!("{}{} {} [{}]", marker, idx + 1, tab.port_name(), tab.status());
                if let Some(path) = tab.log_path() {
                    line.push_str(&format!(" log: {}", path.display()));
                }
                line
            })
            .collect()
    }

    /// Status of the active tab, or "Disconnected" when none is open
    pub fn active_status(&self) -> String {
        self.active_tab()
            .map(|tab| tab.status().to_string())
            .unwrap_or_else(|_| STATUS_DISCONNECTED.to_string())
    }
}

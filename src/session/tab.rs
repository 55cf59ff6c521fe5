// A single port tab: connection, formatter, scrollback and optional log file

use super::log_sink::LogSink;
use super::scrollback::Scrollback;
use crate::core::constants::{SEND_LINE_ENDING, STATUS_DISCONNECTED};
use crate::core::formatter::FormatterState;
use crate::core::search::FindOptions;
use crate::core::timestamp::{Clock, Zone};
use crate::serial::{spawn_reader, Connection, PortEvent, ReaderHandle, SerialError, TabId};
use std::fmt;
use std::io;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("{0}")]
    Serial(#[from] SerialError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Port not connected.")]
    NotConnected,

    #[error("Port {0} is already connected")]
    AlreadyConnected(String),

    #[error("Port {0} is already open in a tab")]
    DuplicatePort(String),

    #[error("No tab number {0}")]
    NoSuchTab(usize),

    #[error("No tab is open")]
    NoActiveTab,
}

pub type Result<T> = std::result::Result<T, SessionError>;

/// Connection state shown under each tab
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabStatus {
    Disconnected,
    Connected { baud_rate: u32 },
}

impl fmt::Display for TabStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TabStatus::Disconnected => f.write_str(STATUS_DISCONNECTED),
            TabStatus::Connected { baud_rate } => write!(f, "Connected @ {}", baud_rate),
        }
    }
}

/// What the front end should show after a reader event
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EventOutcome {
    /// Text for the tab's view
    pub display: Option<String>,

    /// Message for the user, e.g. a lost device
    pub notice: Option<String>,
}

pub struct PortTab<C: Connection> {
    id: TabId,
    port_name: String,
    baud_rate: u32,
    status: TabStatus,
    formatter: FormatterState,
    scrollback: Scrollback,
    log: Option<LogSink>,
    writer: Option<C>,
    reader: Option<ReaderHandle>,

    /// Number of the current (or last) connection
    session: u64,

    /// Session whose reader was asked to stop and has not confirmed yet
    draining: Option<u64>,
    clock: Arc<dyn Clock>,
}

impl<C: Connection> PortTab<C> {
    pub fn new(
        id: TabId,
        port_name: impl Into<String>,
        baud_rate: u32,
        formatter: FormatterState,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            id,
            port_name: port_name.into(),
            baud_rate,
            status: TabStatus::Disconnected,
            formatter,
            scrollback: Scrollback::new(),
            log: None,
            writer: None,
            reader: None,
            session: 0,
            draining: None,
            clock,
        }
    }

    pub fn id(&self) -> TabId {
        self.id
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    pub fn status(&self) -> TabStatus {
        self.status
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.status, TabStatus::Connected { .. })
    }

    pub fn session(&self) -> u64 {
        self.session
    }

    pub fn formatter(&self) -> &FormatterState {
        &self.formatter
    }

    pub fn scrollback(&self) -> &Scrollback {
        &self.scrollback
    }

    pub fn log_path(&self) -> Option<&Path> {
        self.log.as_ref().map(LogSink::path)
    }

    /// Baud rate used by the next connect
    pub fn set_baud_rate(&mut self, baud_rate: u32) {
        self.baud_rate = baud_rate;
    }

    /// Start reading from `conn` and keep a second handle for writing
    ///
    /// Returns display text for a line left unfinished by a previous
    /// connection whose reader had not finished stopping.
    pub fn connect(&mut self, conn: C, events: UnboundedSender<PortEvent>) -> Result<String> {
        if self.is_connected() {
            return Err(SessionError::AlreadyConnected(self.port_name.clone()));
        }

        let reader = conn.try_clone()?;
        let flushed = self.finish_line();

        self.session += 1;
        self.reader = Some(spawn_reader(self.id, self.session, reader, events));
        self.writer = Some(conn);
        self.status = TabStatus::Connected {
            baud_rate: self.baud_rate,
        };
        tracing::info!("{} {} (session {})", self.port_name, self.status, self.session);
        Ok(flushed)
    }

    /// Close the port and let the reader drain
    ///
    /// Output the reader already has is still applied; the unfinished line is
    /// terminated when the reader reports [`PortEvent::Stopped`]. Returns
    /// display text only when there is no reader left to wait for.
    pub fn disconnect(&mut self) -> String {
        self.writer = None;
        if self.is_connected() {
            tracing::info!("{} disconnected", self.port_name);
        }
        self.status = TabStatus::Disconnected;

        match self.reader.take() {
            Some(reader) => {
                reader.stop();
                self.draining = Some(self.session);
                String::new()
            }
            None => self.finish_line(),
        }
    }

    /// Close the port without waiting for the reader; its later events are ignored
    pub fn shutdown(&mut self) -> String {
        if let Some(reader) = self.reader.take() {
            reader.stop();
        }
        self.writer = None;
        self.status = TabStatus::Disconnected;
        self.finish_line()
    }

    /// Terminate a held-back line so the next connection starts clean
    fn finish_line(&mut self) -> String {
        self.draining = None;
        if self.formatter.pending_tail().is_empty() {
            String::new()
        } else {
            self.handle_data("\n")
        }
    }

    /// Whether `session` is the connection this tab is listening to
    fn accepts(&self, session: u64) -> bool {
        session == self.session && (self.is_connected() || self.draining == Some(session))
    }

    /// Apply an event from this tab's reader
    pub fn apply_event(&mut self, event: PortEvent) -> EventOutcome {
        if !self.accepts(event.session()) {
            tracing::debug!(
                "Ignoring event for {} from session {} (current {})",
                self.port_name,
                event.session(),
                self.session
            );
            return EventOutcome::default();
        }

        let (output, notice) = match event {
            PortEvent::Data { text, .. } => (self.handle_data(&text), None),
            PortEvent::Stopped { .. } => (self.finish_line(), None),
            PortEvent::Disconnected { reason, .. } => {
                let was_connected = self.is_connected();
                tracing::warn!("{} lost: {}", self.port_name, reason);
                self.reader = None;
                self.writer = None;
                self.status = TabStatus::Disconnected;
                let notice = was_connected.then(|| format!("Port {} disconnected.", self.port_name));
                (self.finish_line(), notice)
            }
        };

        EventOutcome {
            display: (!output.is_empty()).then_some(output),
            notice,
        }
    }

    /// Format received text, record it, and return what should be displayed
    pub fn handle_data(&mut self, text: &str) -> String {
        let output = self.formatter.feed(text, self.clock.now());
        self.record(&output);
        output
    }

    fn record(&mut self, output: &str) {
        if output.is_empty() {
            return;
        }
        self.scrollback.append(output);

        if let Some(log) = self.log.as_mut() {
            if let Err(e) = log.write(output) {
                tracing::error!("Writing log {} failed: {}", log.path().display(), e);
                self.log = None;
            }
        }
    }

    /// Send one line to the device, terminated with CRLF
    pub async fn send_line(&mut self, line: &str) -> Result<()> {
        let writer = self.writer.as_mut().ok_or(SessionError::NotConnected)?;
        let mut payload = String::with_capacity(line.len() + SEND_LINE_ENDING.len());
        payload.push_str(line);
        payload.push_str(SEND_LINE_ENDING);
        writer.write_all(payload.as_bytes()).await?;
        tracing::debug!("Sent {} bytes to {}", payload.len(), self.port_name);
        Ok(())
    }

    /// Toggle timestamping; returns display text released by disabling it
    pub fn set_timestamp_enabled(&mut self, enabled: bool) -> String {
        let released = self.formatter.set_timestamp_enabled(enabled);
        self.record(&released);
        released
    }

    pub fn set_time_zone(&mut self, zone: Zone) {
        self.formatter.set_time_zone(zone);
    }

    /// Append everything displayed from now on to `path`
    pub fn start_log(&mut self, path: impl AsRef<Path>) -> Result<&Path> {
        let sink = LogSink::open(path)?;
        Ok(self.log.insert(sink).path())
    }

    /// Stop logging; returns the file that was being written
    pub fn stop_log(&mut self) -> Option<PathBuf> {
        self.log.take().map(|sink| sink.path().to_path_buf())
    }

    /// Write the whole scrollback to `path`
    pub fn save_logs(&self, path: impl AsRef<Path>) -> Result<()> {
        self.scrollback.save_to(path)?;
        Ok(())
    }

    pub fn find_next(&mut self, query: &str, options: FindOptions) -> Option<Range<usize>> {
        self.scrollback.find_next(query, options)
    }

    /// Clear the scrollback; the log file is left alone
    pub fn clear(&mut self) {
        self.scrollback.clear();
    }
}

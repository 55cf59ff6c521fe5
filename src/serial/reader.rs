// Background reader forwarding decoded device output to the event loop

use super::comm::SerialError;
use super::connection::Connection;
use crate::core::constants::READ_CHUNK_SIZE;
use crate::core::decode::ChunkDecoder;
use std::fmt;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::oneshot::{self, error::TryRecvError};
use tokio::task::JoinHandle;

/// Pause between polls when the device had nothing to say
const IDLE_BACKOFF: Duration = Duration::from_millis(20);

/// Stable identifier of a tab, independent of its position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TabId(pub u64);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Notification from a reader task
///
/// `session` counts the connections made by a tab, so output from an earlier
/// connection can be told apart from the current one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortEvent {
    /// Decoded, normalized text in the order it was received
    Data {
        tab: TabId,
        session: u64,
        text: String,
    },

    /// The reader was asked to stop and has sent everything it read
    Stopped { tab: TabId, session: u64 },

    /// The device stopped answering; the reader has exited
    Disconnected {
        tab: TabId,
        session: u64,
        reason: String,
    },
}

impl PortEvent {
    pub fn tab(&self) -> TabId {
        match self {
            PortEvent::Data { tab, .. }
            | PortEvent::Stopped { tab, .. }
            | PortEvent::Disconnected { tab, .. } => *tab,
        }
    }

    pub fn session(&self) -> u64 {
        match self {
            PortEvent::Data { session, .. }
            | PortEvent::Stopped { session, .. }
            | PortEvent::Disconnected { session, .. } => *session,
        }
    }
}

/// Handle to a running reader
///
/// Stopping is cooperative: the reader finishes the read in progress, sends
/// its output and then a final [`PortEvent::Stopped`]. Dropping the handle
/// stops the reader the same way.
pub struct ReaderHandle {
    task: JoinHandle<()>,
    stop: Option<oneshot::Sender<()>>,
}

impl ReaderHandle {
    /// Ask the reader to stop after its current read
    pub fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            // Fails only if the reader already exited
            let _ = stop.send(());
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Spawn a task that reads `conn` until it fails or is stopped
pub fn spawn_reader<C: Connection>(
    tab: TabId,
    session: u64,
    mut conn: C,
    events: UnboundedSender<PortEvent>,
) -> ReaderHandle {
    let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let mut decoder = ChunkDecoder::new();
        let mut buf = vec![0u8; READ_CHUNK_SIZE];
        tracing::debug!("Reader for {} ({} session {}) started", conn.port_name(), tab, session);

        loop {
            // A sent or dropped stop signal both end the reader
            if !matches!(stop_rx.try_recv(), Err(TryRecvError::Empty)) {
                let text = decoder.finish();
                if !text.is_empty() {
                    let _ = events.send(PortEvent::Data { tab, session, text });
                }
                let _ = events.send(PortEvent::Stopped { tab, session });
                tracing::debug!("Reader for {} stopped", conn.port_name());
                break;
            }

            match conn.read(&mut buf).await {
                Ok(0) | Err(SerialError::Timeout(_)) => {
                    tokio::time::sleep(IDLE_BACKOFF).await;
                }
                Ok(n) => {
                    let text = decoder.decode(&buf[..n]);
                    if text.is_empty() {
                        continue;
                    }
                    if events.send(PortEvent::Data { tab, session, text }).is_err() {
                        tracing::debug!("Event loop gone, reader for {} exiting", tab);
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!("Read from {} failed: {}", conn.port_name(), e);
                    let text = decoder.finish();
                    if !text.is_empty() {
                        let _ = events.send(PortEvent::Data { tab, session, text });
                    }
                    let _ = events.send(PortEvent::Disconnected {
                        tab,
                        session,
                        reason: e.to_string(),
                    });
                    break;
                }
            }
        }
    });

    ReaderHandle {
        task,
        stop: Some(stop_tx),
    }
}

//! Terminal events reported back to the host.

use serde::Serialize;
use std::path::PathBuf;
use std::sync::Mutex;
use tokio::sync::mpsc;
use tracing::debug;

/// Lifecycle events emitted by the action controllers.
///
/// A Play run emits `Started` at most once and always before its `Stopped`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum GameEvent {
    Started,
    #[serde(rename_all = "camelCase")]
    Stopped { elapsed_secs: u64 },
    #[serde(rename_all = "camelCase")]
    Installed { install_directory: Option<PathBuf> },
    Uninstalled,
}

impl GameEvent {
    /// Whether this event ends a run.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, GameEvent::Started)
    }
}

/// Host-side receiver of controller events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: GameEvent);
}

/// Forwards events into an unbounded tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<GameEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<GameEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: GameEvent) {
        if self.tx.send(event).is_err() {
            debug!("Event receiver dropped; discarding event");
        }
    }
}

/// Records every event in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<GameEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<GameEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: GameEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

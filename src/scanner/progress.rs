//! Progress-event protocol
//!
//! The orchestrator is the sole writer of the per-server and per-tool state
//! machines and pushes exactly one event per transition through an injected
//! sink. Events are for external reporting only and carry no authority over
//! the scan result. A no-op sink is valid for headless use.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// One state-machine transition
///
/// Per-server: `pending → connecting → {connected | error}`. Per-tool
/// (reachable only after `connected`): `pending → scanning → analyzed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum ProgressEvent {
    ServerConnected {
        server: String,
        tools: usize,
    },
    ServerError {
        server: String,
        message: String,
    },
    ToolScanning {
        server: String,
        tool: String,
    },
    ToolAnalyzed {
        server: String,
        tool: String,
        flagged: bool,
    },
}

impl ProgressEvent {
    /// Server this event belongs to
    pub fn server(&self) -> &str {
        match self {
            ProgressEvent::ServerConnected { server, .. }
            | ProgressEvent::ServerError { server, .. }
            | ProgressEvent::ToolScanning { server, .. }
            | ProgressEvent::ToolAnalyzed { server, .. } => server,
        }
    }
}

/// Subscriber side of the progress protocol
///
/// `emit` must not block the scan; implementations that forward to a slow
/// consumer should buffer or drop.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

/// Sink that discards everything; valid for headless use
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl ProgressSink for NoopSink {
    fn emit(&self, _event: ProgressEvent) {}
}

/// Bounded-channel bridge between the orchestrator (publisher) and a
/// presentation layer (subscriber)
///
/// Per-entity ordering is preserved by the channel. If the subscriber falls
/// more than `capacity` events behind, further events are dropped rather
/// than stalling the scan.
pub struct ChannelSink {
    tx: mpsc::Sender<ProgressEvent>,
}

impl ChannelSink {
    pub fn bounded(capacity: usize) -> (Self, mpsc::Receiver<ProgressEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

impl ProgressSink for ChannelSink {
    fn emit(&self, event: ProgressEvent) {
        let _ = self.tx.try_send(event);
    }
}

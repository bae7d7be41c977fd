//! The orchestrator's side of the trace channel.

use tokio::sync::mpsc;
use vibeforge_core::TraceEvent;

/// Capacity of the trace channel. With one slot the loop can never run more
/// than one event ahead of whoever is reading.
pub const TRACE_BUFFER: usize = 1;

/// Sends trace events to a single consumer, in order.
#[derive(Debug, Clone)]
pub struct TraceSink {
    tx: mpsc::Sender<TraceEvent>,
}

impl TraceSink {
    pub fn new(tx: mpsc::Sender<TraceEvent>) -> Self {
        Self { tx }
    }

    /// Create a sink and the receiver that drains it.
    pub fn channel() -> (Self, mpsc::Receiver<TraceEvent>) {
        let (tx, rx) = mpsc::channel(TRACE_BUFFER);
        (Self::new(tx), rx)
    }

    /// Deliver one event, waiting for room in the channel.
    ///
    /// Returns `false` once the consumer has gone away.
    pub async fn emit(&self, event: TraceEvent) -> bool {
        self.tx.send(event).await.is_ok()
    }

    /// Whether the consumer has gone away.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

//! Outbound wire frames.

use serde::Serialize;

/// Frames this client writes to the stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundFrame {
    /// Liveness heartbeat, correlated by `id`.
    Ping { id: u64 },
}

impl OutboundFrame {
    /// Serialize to the UTF-8 JSON text that goes into a single text frame.
    pub fn to_text(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

//! Core types for inkwire.
//!
//! This crate has no I/O. It provides the values that flow between the
//! connection manager, the transport and the display: endpoints, credentials,
//! pinned fingerprints, outbound frames, and the classifier that turns inbound
//! frames into notifications.

mod classify;
mod credential;
mod endpoint;
mod fingerprint;
mod message;

pub use classify::{AttachmentFields, InboundFrame, Notification, ParseError, classify};
pub use credential::Credential;
pub use endpoint::Endpoint;
pub use fingerprint::{Fingerprint, FingerprintParseError};
pub use message::OutboundFrame;

use std::fmt;

/// Connection lifecycle state.
///
/// There is exactly one of these per running client and only the connection
/// manager moves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// Waiting for the next loop tick.
    #[default]
    Idle,
    /// Asking the discovery endpoint for a streaming address.
    Resolving,
    /// Opening the streaming transport.
    Connecting,
    /// Stream open; heartbeats flowing.
    Connected,
    /// Attempt over; waiting out the retry delay.
    Failed,
}

impl ConnectionState {
    /// Whether `next` may directly follow `self`.
    pub fn can_transition_to(self, next: ConnectionState) -> bool {
        use ConnectionState::*;
        matches!(
            (self, next),
            (Idle, Resolving)
                | (Resolving, Connecting)
                | (Resolving, Failed)
                | (Connecting, Connected)
                | (Connecting, Failed)
                | (Connected, Failed)
                | (Failed, Idle)
        )
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Idle => "idle",
            ConnectionState::Resolving => "resolving",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Failed => "failed",
        };
        f.write_str(name)
    }
}

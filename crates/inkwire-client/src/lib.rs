//! Networked side of inkwire.
//!
//! [`ConnectionManager`] resolves a streaming endpoint through a [`Resolve`]
//! implementation, opens it through a [`Connector`], keeps it alive with
//! heartbeats and hands classified notifications to a [`Renderer`]. The
//! production implementations are [`DiscoveryResolver`] and [`WsConnector`].

mod error;
mod heartbeat;
mod manager;
mod resolver;
mod retry;
pub mod tls;
mod transport;

pub use error::{HandshakeError, SetupError, TransportError};
pub use heartbeat::{DEFAULT_HEARTBEAT_INTERVAL, HeartbeatClock, SequenceCounter};
pub use manager::{ConnectionManager, DEFAULT_CONNECT_TIMEOUT, ManagerConfig, Renderer};
pub use resolver::{
    DEFAULT_DISCOVERY_URL, DiscoveryResolver, Resolve, extract_endpoint, parse_discovery_body,
};
pub use retry::{DEFAULT_MAX_RETRY_DELAY, DEFAULT_RETRY_DELAY, RetryPolicy};
pub use transport::{Connector, Transport, TransportEvent, WsConnector, WsSession};

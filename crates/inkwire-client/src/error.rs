//! Client error types.

use thiserror::Error;

/// Failure of the discovery handshake. Fatal to the current attempt only.
#[derive(Debug, Error)]
pub enum HandshakeError {
    #[error("discovery returned unexpected status {0}")]
    UnexpectedStatus(u16),

    #[error("discovery response has no streaming url")]
    MalformedResponse,

    #[error("discovery server certificate does not match the pinned fingerprint")]
    CertificateMismatch,

    #[error("discovery rejected the credential: {0}")]
    Rejected(String),

    #[error("discovery request failed: {0}")]
    Request(#[source] reqwest::Error),
}

/// Failure on the streaming transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// `send` was called while the session was not open.
    #[error("transport is not connected")]
    NotConnected,

    #[error("connection dropped: {0}")]
    ConnectionDropped(String),
}

/// Failure building a client component at startup.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("tls setup failed: {0}")]
    Tls(#[from] rustls::Error),

    #[error("http client setup failed: {0}")]
    Http(#[from] reqwest::Error),
}

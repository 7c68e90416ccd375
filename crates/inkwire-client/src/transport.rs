//! Streaming transport.
//!
//! A session is created per connection attempt and driven by its owner
//! through [`Transport::next_event`]. The first call opens the stream; later
//! calls deliver frames until the stream closes. A closed session is never
//! reopened: the owner drops it and asks the [`Connector`] for a new one.

use crate::error::{SetupError, TransportError};
use crate::tls;
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use inkwire_core::{Endpoint, Fingerprint};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{Connector as TlsConnector, MaybeTlsStream, WebSocketStream};

/// Something the transport observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Opened,
    Closed,
    TextFrame(String),
}

/// One streaming connection.
#[async_trait]
pub trait Transport: Send {
    /// Wait for the next event. Cancel-safe once the session is open.
    async fn next_event(&mut self) -> TransportEvent;

    /// Send one text frame.
    async fn send(&mut self, text: String) -> Result<(), TransportError>;
}

/// Builds fresh sessions.
pub trait Connector: Send + Sync {
    type Session: Transport;

    /// Create an unopened session for `endpoint`.
    fn open(&self, endpoint: &Endpoint) -> Self::Session;
}

#[derive(Clone)]
enum StreamSecurity {
    NativeRoots,
    Pinned(Arc<rustls::ClientConfig>),
    #[cfg(test)]
    Plaintext,
}

impl StreamSecurity {
    fn scheme(&self) -> &'static str {
        match self {
            #[cfg(test)]
            StreamSecurity::Plaintext => "ws",
            _ => "wss",
        }
    }

    fn connector(&self) -> Option<TlsConnector> {
        match self {
            StreamSecurity::NativeRoots => None,
            StreamSecurity::Pinned(config) => Some(TlsConnector::Rustls(config.clone())),
            #[cfg(test)]
            StreamSecurity::Plaintext => Some(TlsConnector::Plain),
        }
    }
}

/// Websocket connector over TLS.
#[derive(Clone)]
pub struct WsConnector {
    security: StreamSecurity,
}

impl WsConnector {
    /// Validate the streaming host against the platform's root store.
    pub fn native_roots() -> Self {
        tls::install_crypto_provider();
        Self {
            security: StreamSecurity::NativeRoots,
        }
    }

    /// Accept only the streaming host certificate matching `fingerprint`.
    pub fn pinned(fingerprint: Fingerprint) -> Result<Self, SetupError> {
        let config = tls::pinned_client_config(fingerprint)?;
        Ok(Self {
            security: StreamSecurity::Pinned(Arc::new(config)),
        })
    }

    #[cfg(test)]
    pub(crate) fn plaintext() -> Self {
        Self {
            security: StreamSecurity::Plaintext,
        }
    }
}

impl Connector for WsConnector {
    type Session = WsSession;

    fn open(&self, endpoint: &Endpoint) -> WsSession {
        WsSession {
            endpoint: endpoint.clone(),
            security: self.security.clone(),
            state: SessionState::Pending,
        }
    }
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

enum SessionState {
    Pending,
    Open(Box<WsStream>),
    Closed,
}

/// Websocket session for one connection attempt.
pub struct WsSession {
    endpoint: Endpoint,
    security: StreamSecurity,
    state: SessionState,
}

impl WsSession {
    async fn connect(&mut self) -> TransportEvent {
        let url = self.endpoint.url(self.security.scheme());
        tracing::debug!("Opening stream to {}", self.endpoint.host);

        let connector = self.security.connector();
        let result =
            tokio_tungstenite::connect_async_tls_with_config(url, None, true, connector).await;

        match result {
            Ok((ws, _)) => {
                tracing::info!("Stream open to {}", self.endpoint.host);
                self.state = SessionState::Open(Box::new(ws));
                TransportEvent::Opened
            }
            Err(e) => {
                if tls::is_pin_mismatch(&e) {
                    tracing::error!(
                        "Stream host {} does not match the pinned fingerprint",
                        self.endpoint.host
                    );
                } else {
                    tracing::warn!("Failed to open stream to {}: {}", self.endpoint.host, e);
                }
                self.close();
                TransportEvent::Closed
            }
        }
    }

    fn close(&mut self) {
        // Dropping the stream discards anything still buffered.
        self.state = SessionState::Closed;
    }
}

#[async_trait]
impl Transport for WsSession {
    async fn next_event(&mut self) -> TransportEvent {
        loop {
            let ws = match &mut self.state {
                SessionState::Pending => return self.connect().await,
                SessionState::Open(ws) => ws,
                SessionState::Closed => return TransportEvent::Closed,
            };

            match ws.next().await {
                Some(Ok(Message::Text(text))) => {
                    return TransportEvent::TextFrame(text.to_string());
                }
                Some(Ok(Message::Close(frame))) => {
                    tracing::info!("Stream closed by server: {:?}", frame);
                }
                // Pings are answered by tungstenite; binary frames carry nothing for us.
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    tracing::warn!("Stream error: {}", e);
                }
                None => {
                    tracing::info!("Stream ended");
                }
            }

            self.close();
            return TransportEvent::Closed;
        }
    }

    async fn send(&mut self, text: String) -> Result<(), TransportError> {
        let SessionState::Open(ws) = &mut self.state else {
            return Err(TransportError::NotConnected);
        };

        let result = ws.send(Message::Text(text.into())).await;
        if let Err(e) = result {
            self.close();
            return Err(TransportError::ConnectionDropped(e.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// One-connection server: sends `greeting`, records one reply, then closes.
    async fn serve_once(greeting: &'static str) -> (SocketAddr, JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            ws.send(Message::Text(String::from(greeting).into()))
                .await
                .unwrap();

            let mut received = Vec::new();
            if let Some(Ok(Message::Text(text))) = ws.next().await {
                received.push(text.to_string());
            }
            ws.close(None).await.unwrap();
            received
        });

        (addr, handle)
    }

    #[tokio::test]
    async fn session_lifecycle() {
        let (addr, server) = serve_once(r#"{"type":"hello"}"#).await;
        let mut session = WsConnector::plaintext().open(&Endpoint::new(addr.to_string(), "/ws"));

        assert_eq!(session.next_event().await, TransportEvent::Opened);
        assert_eq!(
            session.next_event().await,
            TransportEvent::TextFrame(r#"{"type":"hello"}"#.to_string())
        );

        session
            .send(r#"{"type":"ping","id":1}"#.to_string())
            .await
            .unwrap();
        assert_eq!(session.next_event().await, TransportEvent::Closed);

        assert!(matches!(
            session.send("late".to_string()).await,
            Err(TransportError::NotConnected)
        ));
        assert_eq!(session.next_event().await, TransportEvent::Closed);

        let received = server.await.unwrap();
        assert_eq!(received, vec![r#"{"type":"ping","id":1}"#.to_string()]);
    }

    #[tokio::test]
    async fn send_before_open_is_rejected() {
        let mut session = WsConnector::plaintext().open(&Endpoint::new("127.0.0.1:9", "/"));
        assert!(matches!(
            session.send("early".to_string()).await,
            Err(TransportError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn unreachable_host_closes() {
        // Bind then drop to get a port with nothing listening.
        let addr = TcpListener::bind("127.0.0.1:0")
            .await
            .unwrap()
            .local_addr()
            .unwrap();
        let mut session = WsConnector::plaintext().open(&Endpoint::new(addr.to_string(), "/"));
        assert_eq!(session.next_event().await, TransportEvent::Closed);
    }
}

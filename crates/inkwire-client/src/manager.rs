//! Connection state machine.
//!
//! ```text
//! Idle -> Resolving -> Connecting -> Connected
//!   ^         |             |            |
//!   |         +-------------+------------+--> Failed
//!   +------------------- retry delay ----------+
//! ```
//!
//! The manager owns all connection state. It is driven by a single loop
//! ([`ConnectionManager::run`], or [`ConnectionManager::step`] one transition
//! at a time) and never shares itself, so it needs no locks.

use crate::error::TransportError;
use crate::heartbeat::{DEFAULT_HEARTBEAT_INTERVAL, HeartbeatClock, SequenceCounter};
use crate::resolver::Resolve;
use crate::retry::RetryPolicy;
use crate::transport::{Connector, Transport, TransportEvent};
use inkwire_core::{ConnectionState, Credential, Endpoint, Notification, OutboundFrame, classify};
use std::fmt::Display;
use std::time::Duration;
use tokio::time::Instant;

/// Default limit on opening the stream.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Display collaborator. Called once per renderable notification.
pub trait Renderer {
    fn render(&mut self, notification: Notification);
}

impl<F: FnMut(Notification)> Renderer for F {
    fn render(&mut self, notification: Notification) {
        self(notification)
    }
}

/// Timing knobs for the manager.
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    pub heartbeat_interval: Duration,
    pub connect_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }
}

pub struct ConnectionManager<R, C: Connector, D> {
    credential: Credential,
    resolver: R,
    connector: C,
    renderer: D,
    config: ManagerConfig,

    state: ConnectionState,
    endpoint: Option<Endpoint>,
    session: Option<C::Session>,
    heartbeat: HeartbeatClock,
    sequence: SequenceCounter,
    failures: u32,
}

impl<R, C, D> ConnectionManager<R, C, D>
where
    R: Resolve,
    C: Connector,
    D: Renderer,
{
    pub fn new(
        credential: Credential,
        resolver: R,
        connector: C,
        renderer: D,
        config: ManagerConfig,
    ) -> Self {
        let heartbeat = HeartbeatClock::new(config.heartbeat_interval);
        Self {
            credential,
            resolver,
            connector,
            renderer,
            config,
            state: ConnectionState::Idle,
            endpoint: None,
            session: None,
            heartbeat,
            sequence: SequenceCounter::new(),
            failures: 0,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Endpoint of the current attempt, if one was resolved.
    pub fn endpoint(&self) -> Option<&Endpoint> {
        self.endpoint.as_ref()
    }

    pub fn heartbeat(&self) -> &HeartbeatClock {
        &self.heartbeat
    }

    pub fn sequence(&self) -> &SequenceCounter {
        &self.sequence
    }

    /// Consecutive failed attempts since the last successful connect.
    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Drive the state machine until `shutdown` completes.
    pub async fn run<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        tracing::info!("Connection manager started");

        loop {
            tokio::select! {
                () = &mut shutdown => break,
                () = self.step() => {}
            }
        }

        tracing::info!("Connection manager stopping in state {}", self.state);
        self.session = None;
        self.endpoint = None;
    }

    /// Perform one transition, or one unit of work while Connected.
    pub async fn step(&mut self) {
        match self.state {
            ConnectionState::Idle => self.transition(ConnectionState::Resolving),
            ConnectionState::Resolving => self.resolve().await,
            ConnectionState::Connecting => self.connect().await,
            ConnectionState::Connected => self.pump().await,
            ConnectionState::Failed => {
                let delay = self.config.retry.delay(self.failures);
                tracing::debug!("Retrying in {:?} (failure #{})", delay, self.failures);
                tokio::time::sleep(delay).await;
                self.transition(ConnectionState::Idle);
            }
        }
    }

    fn transition(&mut self, next: ConnectionState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {} -> {}",
            self.state,
            next
        );
        tracing::debug!("State {} -> {}", self.state, next);
        self.state = next;
    }

    fn fail(&mut self, reason: impl Display) {
        tracing::warn!("Connection lost in state {}: {}", self.state, reason);
        self.session = None;
        self.endpoint = None;
        self.heartbeat.reset();
        self.failures = self.failures.saturating_add(1);
        self.transition(ConnectionState::Failed);
    }

    async fn resolve(&mut self) {
        match self.resolver.resolve(&self.credential).await {
            Ok(endpoint) => {
                tracing::info!("Resolved streaming endpoint on {}", endpoint.host);
                self.endpoint = Some(endpoint);
                self.transition(ConnectionState::Connecting);
            }
            Err(e) => self.fail(e),
        }
    }

    async fn connect(&mut self) {
        let Some(endpoint) = self.endpoint.as_ref() else {
            self.fail("no endpoint resolved");
            return;
        };

        let mut session = self.connector.open(endpoint);
        let timeout = self.config.connect_timeout;

        match tokio::time::timeout(timeout, session.next_event()).await {
            Ok(TransportEvent::Opened) => {
                self.session = Some(session);
                self.failures = 0;
                self.transition(ConnectionState::Connected);
                self.send_heartbeat().await;
            }
            Ok(TransportEvent::Closed) => self.fail("stream closed before opening"),
            Ok(TransportEvent::TextFrame(_)) => self.fail("frame received before open"),
            Err(_) => self.fail(format!("stream did not open within {timeout:?}")),
        }
    }

    /// Wait for whichever comes first: an inbound event or the next heartbeat.
    async fn pump(&mut self) {
        let Some(session) = self.session.as_mut() else {
            self.fail("connected without a session");
            return;
        };
        let due = self.heartbeat.next_due();

        tokio::select! {
            event = session.next_event() => match event {
                TransportEvent::TextFrame(text) => self.dispatch(&text),
                TransportEvent::Closed => self.fail("stream closed"),
                TransportEvent::Opened => tracing::debug!("Ignoring repeated open event"),
            },
            () = tokio::time::sleep_until(due) => self.send_heartbeat().await,
        }
    }

    async fn send_heartbeat(&mut self) {
        let Some(session) = self.session.as_mut() else {
            tracing::error!("Heartbeat without a session");
            return;
        };

        let id = self.sequence.advance();
        let text = match (OutboundFrame::Ping { id }).to_text() {
            Ok(text) => text,
            Err(e) => {
                tracing::error!("Failed to encode heartbeat {}: {}", id, e);
                return;
            }
        };

        match session.send(text).await {
            Ok(()) => {
                self.heartbeat.record(Instant::now());
                tracing::trace!("Sent heartbeat {}", id);
            }
            Err(TransportError::NotConnected) => {
                // Wait a full interval before the next attempt.
                self.heartbeat.record(Instant::now());
                tracing::error!("Heartbeat {} sent on a session that is not open", id);
            }
            Err(e @ TransportError::ConnectionDropped(_)) => self.fail(e),
        }
    }

    fn dispatch(&mut self, payload: &str) {
        tracing::trace!("Inbound frame: {}", payload);
        let notification = classify(payload.as_bytes());
        if notification.is_renderable() {
            self.renderer.render(notification);
        }
    }
}

//! Heartbeat timing and correlation ids.

use std::time::Duration;
use tokio::time::Instant;

/// Default gap between heartbeats.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);

/// When the last heartbeat went out, and how often they are due.
#[derive(Debug, Clone)]
pub struct HeartbeatClock {
    interval: Duration,
    last_sent: Option<Instant>,
}

impl HeartbeatClock {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_sent: None,
        }
    }

    pub fn last_sent(&self) -> Option<Instant> {
        self.last_sent
    }

    /// When the next heartbeat is due. Immediately if none was ever sent.
    pub fn next_due(&self) -> Instant {
        match self.last_sent {
            Some(at) => at + self.interval,
            None => Instant::now(),
        }
    }

    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.next_due()
    }

    /// Record a successful send.
    pub fn record(&mut self, at: Instant) {
        self.last_sent = Some(at);
    }

    /// Forget the last send, e.g. when a session ends.
    pub fn reset(&mut self) {
        self.last_sent = None;
    }
}

/// Monotonic heartbeat id. Starts at 1 and is never reset.
#[derive(Debug, Clone)]
pub struct SequenceCounter {
    next: u64,
}

impl SequenceCounter {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Return the current value and advance.
    pub fn advance(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }

    /// The value the next call to [`advance`](Self::advance) returns.
    pub fn peek(&self) -> u64 {
        self.next
    }
}

impl Default for SequenceCounter {
    fn default() -> Self {
        Self::new()
    }
}

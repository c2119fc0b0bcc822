use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
}

/// Socket lifecycle bookkeeping for the stream client.
///
/// Pure state: the driver feeds it socket events and the current time, and
/// asks it when the next connect attempt is due. Holds at most one pending
/// reconnect deadline.
#[derive(Debug)]
pub struct ConnectionMachine {
    state: ConnectionState,
    reconnect_delay: Duration,
    reconnect_at: Option<Instant>,
    attempts: u64,
    shut_down: bool,
}

impl ConnectionMachine {
    pub fn new(reconnect_delay: Duration) -> Self {
        Self {
            state: ConnectionState::Closed,
            reconnect_delay,
            reconnect_at: None,
            attempts: 0,
            shut_down: false,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    pub fn pending_reconnect(&self) -> Option<Instant> {
        self.reconnect_at
    }

    /// Starts a connect attempt. Consumes the pending reconnect timer.
    /// Returns `false` once the machine has been shut down.
    pub fn begin_connect(&mut self) -> bool {
        if self.shut_down {
            return false;
        }
        self.reconnect_at = None;
        self.attempts += 1;
        self.state = ConnectionState::Connecting;
        debug!("Connect attempt {}", self.attempts);
        true
    }

    pub fn on_open(&mut self) {
        if self.shut_down {
            return;
        }
        self.state = ConnectionState::Open;
        info!("Backend stream open after {} attempt(s)", self.attempts);
    }

    /// Handles a failed connect or a close from either side. Schedules a
    /// reconnect `reconnect_delay` from `now` unless one is already pending,
    /// and returns the deadline to wait for. `None` after shutdown.
    pub fn on_close(&mut self, now: Instant) -> Option<Instant> {
        self.state = ConnectionState::Closed;
        if self.shut_down {
            return None;
        }
        if let Some(deadline) = self.reconnect_at {
            debug!("Reconnect already pending, not scheduling another");
            return Some(deadline);
        }
        let deadline = now + self.reconnect_delay;
        self.reconnect_at = Some(deadline);
        warn!(
            "Backend stream closed, retrying in {}ms",
            self.reconnect_delay.as_millis()
        );
        Some(deadline)
    }

    pub fn reconnect_due(&self, now: Instant) -> bool {
        !self.shut_down && self.reconnect_at.is_some_and(|deadline| now >= deadline)
    }

    /// Cancels any pending reconnect and refuses further attempts.
    pub fn shutdown(&mut self) {
        if self.reconnect_at.take().is_some() {
            debug!("Cancelled pending reconnect");
        }
        self.shut_down = true;
        self.state = ConnectionState::Closed;
    }
}

//! Reconnection State Machine
//!
//! An explicit, independently testable model of the client connector:
//!
//! ```text
//! disconnected -> connecting(attempt) -> connected
//!                      |    ^                |
//!                      v    | (backoff)      v (drop: reconnect from 1)
//!                    failed (after max attempts)
//! ```
//!
//! The machine owns no sockets and no timers. The I/O layer asks it what to
//! do next: how long the handshake may take, how long to back off, and when
//! to give up and surface a persistent-failure state to the UI. On every
//! transition to connected the caller must re-send `join` - presence state
//! on the server is transient and is rebuilt from the join.

use std::time::Duration;

/// Connector configuration
#[derive(Debug, Clone)]
pub struct ConnectorConfig {
    /// Give up after this many consecutive failed attempts
    pub max_attempts: u32,
    /// First retry delay; doubles per attempt
    pub base_delay: Duration,
    /// Backoff ceiling
    pub max_delay: Duration,
    /// Bounded wait for one handshake before it counts as failed
    pub connect_timeout: Duration,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Where the connector currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not connected and not trying
    Disconnected,
    /// Attempt number `attempt` (1-based) is in flight or scheduled
    Connecting { attempt: u32 },
    /// Session is up; the caller has re-sent `join`
    Connected,
    /// Retries exhausted; surfaced to the UI as a persistent failure
    Failed,
}

/// The reconnection state machine
#[derive(Debug, Clone)]
pub struct Connector {
    config: ConnectorConfig,
    state: ConnectionState,
}

impl Connector {
    pub fn new(config: ConnectorConfig) -> Self {
        Self {
            config,
            state: ConnectionState::Disconnected,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// How long the I/O layer may wait for one handshake
    pub fn connect_timeout(&self) -> Duration {
        self.config.connect_timeout
    }

    /// Start connecting from an idle or failed state. Returns the attempt
    /// number; a no-op returning the current attempt if already connecting.
    pub fn start(&mut self) -> u32 {
        match self.state {
            ConnectionState::Connecting { attempt } => attempt,
            ConnectionState::Connected => 0,
            _ => {
                self.state = ConnectionState::Connecting { attempt: 1 };
                1
            }
        }
    }

    /// The handshake completed; the caller re-sends `join` now
    pub fn on_connected(&mut self) {
        self.state = ConnectionState::Connected;
    }

    /// The attempt failed (refused, timed out, dropped mid-handshake).
    /// Returns the delay before the next attempt, or `None` when retries
    /// are exhausted and the machine has moved to `Failed`.
    pub fn on_connect_failed(&mut self) -> Option<Duration> {
        let attempt = match self.state {
            ConnectionState::Connecting { attempt } => attempt,
            // A failure while not connecting is a late signal; ignore it.
            _ => return None,
        };

        if attempt >= self.config.max_attempts {
            self.state = ConnectionState::Failed;
            return None;
        }

        self.state = ConnectionState::Connecting { attempt: attempt + 1 };
        Some(self.backoff(attempt))
    }

    /// An established session dropped; reconnect from attempt 1 after the
    /// base delay.
    pub fn on_disconnected(&mut self) -> Option<Duration> {
        match self.state {
            ConnectionState::Connected => {
                self.state = ConnectionState::Connecting { attempt: 1 };
                Some(self.config.base_delay)
            }
            _ => None,
        }
    }

    /// Explicit shutdown; no retries
    pub fn reset(&mut self) {
        self.state = ConnectionState::Disconnected;
    }

    /// Exponential backoff for the given (1-based) failed attempt, capped
    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.config
            .base_delay
            .saturating_mul(factor)
            .min(self.config.max_delay)
    }
}

impl Default for Connector {
    fn default() -> Self {
        Self::new(ConnectorConfig::default())
    }
}

//! Per-provider circuit breaker state machine.
//!
//! Tracks consecutive failures and stops traffic to a provider once the
//! failure threshold is reached, periodically admitting a single trial
//! request to test recovery. The machine is pure over an injected "now" so
//! tests never sleep; wall-clock time is supplied by callers.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Circuit breaker configuration, set per provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakerConfig {
    /// Consecutive failures before the circuit opens
    pub failure_threshold: u32,
    /// Seconds the circuit stays open before admitting a trial request
    pub recovery_timeout_seconds: u64,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            recovery_timeout_seconds: 60,
        }
    }
}

/// Circuit state as seen by routing decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CircuitState {
    /// Requests pass through
    Closed,
    /// All requests rejected until the recovery timeout elapses
    Open,
    /// Exactly one trial request is allowed through
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "closed"),
            CircuitState::Open => write!(f, "open"),
            CircuitState::HalfOpen => write!(f, "half-open"),
        }
    }
}

/// A state change produced by a breaker operation, `(from, to)`.
pub type Transition = (CircuitState, CircuitState);

/// Failure-rate state machine for a single provider.
///
/// A success in the closed state fully clears failure history; there is no
/// gradual decay. That is the simplest policy that satisfies the recovery
/// contract and it is a deliberate choice, not an omission.
#[derive(Debug)]
pub struct CircuitBreaker {
    config: BreakerConfig,
    state: CircuitState,
    failure_count: u32,
    /// Set while the circuit is open
    opened_at: Option<DateTime<Utc>>,
    /// Set while a half-open trial is outstanding
    probe_started_at: Option<DateTime<Utc>>,
}

impl CircuitBreaker {
    /// Create a closed breaker with the given thresholds.
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            config,
            state: CircuitState::Closed,
            failure_count: 0,
            opened_at: None,
            probe_started_at: None,
        }
    }

    /// Current state. Read-only; does not advance open -> half-open.
    pub fn state(&self) -> CircuitState {
        self.state
    }

    /// Consecutive failures observed since the last success.
    pub fn failure_count(&self) -> u32 {
        self.failure_count
    }

    fn recovery_timeout(&self) -> Duration {
        Duration::seconds(self.config.recovery_timeout_seconds as i64)
    }

    /// Whether a request would currently be admitted, without consuming the
    /// half-open trial slot. Used for candidate filtering.
    pub fn allows_request(&self, now: DateTime<Utc>) -> bool {
        match self.state {
            CircuitState::Closed => true,
            CircuitState::Open => match self.opened_at {
                Some(opened_at) => now - opened_at >= self.recovery_timeout(),
                None => true,
            },
            CircuitState::HalfOpen => match self.probe_started_at {
                // The trial slot frees up if its outcome never arrived.
                Some(started) => now - started >= self.recovery_timeout(),
                None => true,
            },
        }
    }

    /// Attempt to take a permit for one request.
    ///
    /// In the open state this performs the open -> half-open transition once
    /// the recovery timeout has elapsed, and the admitted request becomes the
    /// single trial. A half-open trial whose outcome never arrives (for
    /// example a cancelled caller) releases the slot after another recovery
    /// timeout, so an abandoned probe cannot wedge the breaker.
    pub fn try_acquire(&mut self, now: DateTime<Utc>) -> bool {
        match self.state {
            CircuitState::Closed => true,
            CircuitState::Open => {
                if self.allows_request(now) {
                    self.state = CircuitState::HalfOpen;
                    self.probe_started_at = Some(now);
                    true
                } else {
                    false
                }
            }
            CircuitState::HalfOpen => {
                if self.allows_request(now) {
                    self.probe_started_at = Some(now);
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Record a successful request.
    pub fn on_success(&mut self) {
        match self.state {
            CircuitState::Closed => {
                self.failure_count = 0;
            }
            CircuitState::HalfOpen => {
                self.state = CircuitState::Closed;
                self.failure_count = 0;
                self.opened_at = None;
                self.probe_started_at = None;
            }
            // No request is admitted while open; a stray success is ignored.
            CircuitState::Open => {}
        }
    }

    /// Record a failed (or timed-out) request.
    pub fn on_failure(&mut self, now: DateTime<Utc>) {
        match self.state {
            CircuitState::Closed => {
                self.failure_count += 1;
                if self.failure_count >= self.config.failure_threshold {
                    self.state = CircuitState::Open;
                    self.opened_at = Some(now);
                }
            }
            CircuitState::HalfOpen => {
                self.state = CircuitState::Open;
                self.opened_at = Some(now);
                self.probe_started_at = None;
            }
            CircuitState::Open => {}
        }
    }
}

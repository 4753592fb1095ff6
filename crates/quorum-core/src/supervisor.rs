//! Reconnection supervisor state machine.
//!
//! Pure, action-pattern: lifecycle signals go in, scheduling instructions
//! come out, and the async driver in `quorum-client` executes them. Time is
//! never sampled here — delays are returned as values.
//!
//! # State Machine
//!
//! ```text
//! ┌──────┐  open    ┌───────────┐  unintentional close   ┌──────────────┐
//! │ Idle │─────────>│ Connected │───────────────────────>│ Reconnecting │
//! └──────┘          └───────────┘                        └──────────────┘
//!    ↑                    ↑         open                    │         │
//!    │                    └─────────────────────────────────┘         │
//!    │  disconnect (any phase)                     attempts exhausted │
//!    │                                                                ↓
//!    │                                                         ┌───────────┐
//!    └─────────────────────────────────────────────────────────│ Exhausted │
//!                         explicit reconnect                   └───────────┘
//! ```

use std::time::Duration;

/// Delay before the first retry.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Upper bound on the retry delay.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);

/// Consecutive failures tolerated before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Backoff parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectConfig {
    /// Delay before the first retry; doubles each attempt.
    pub base_delay: Duration,
    /// Cap on the computed delay.
    pub max_delay: Duration,
    /// Attempt budget before the supervisor transitions to exhausted.
    pub max_attempts: u32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Capped exponential backoff: `min(base * 2^(attempt-1), cap)`.
///
/// `attempt` is 1-indexed; attempt 0 is treated as 1.
pub fn retry_delay(config: &ReconnectConfig, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(30);
    let factor = 1u32 << exponent;
    config.base_delay.saturating_mul(factor).min(config.max_delay)
}

/// Supervisor phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No connection wanted or an intentional disconnect happened.
    Idle,
    /// A connection is open.
    Connected,
    /// Between attempts after an unintentional loss.
    Reconnecting {
        /// 1-indexed attempt about to run (or running).
        attempt: u32,
    },
    /// Attempt budget spent; only an explicit reconnect leaves this phase.
    Exhausted,
}

/// Instructions for the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorAction {
    /// Sleep this long, then dial again with the original session context.
    Retry {
        /// 1-indexed attempt number.
        attempt: u32,
        /// Backoff delay before dialing.
        delay: Duration,
    },
    /// Stop retrying and surface a fatal, user-visible error.
    GiveUp,
    /// Do nothing; the closure was intentional.
    Stop,
}

/// Reconnection supervisor.
///
/// Owns no connection and performs no I/O; it only decides what the driver
/// should do next after each lifecycle signal.
#[derive(Debug, Clone)]
pub struct Supervisor {
    phase: Phase,
    config: ReconnectConfig,
}

impl Supervisor {
    /// New supervisor in [`Phase::Idle`].
    pub fn new(config: ReconnectConfig) -> Self {
        Self { phase: Phase::Idle, config }
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// A connection opened successfully. Resets the attempt count.
    pub fn on_open(&mut self) {
        self.phase = Phase::Connected;
    }

    /// The connection closed, or a dial attempt failed.
    ///
    /// Intentional closures stop the supervisor. Unintentional ones
    /// schedule the next attempt with capped exponential backoff until the
    /// budget runs out.
    pub fn on_close(&mut self, intentional: bool) -> SupervisorAction {
        if intentional {
            self.phase = Phase::Idle;
            return SupervisorAction::Stop;
        }

        let attempt = match self.phase {
            Phase::Reconnecting { attempt } => attempt + 1,
            Phase::Idle | Phase::Connected => 1,
            Phase::Exhausted => return SupervisorAction::GiveUp,
        };

        if attempt > self.config.max_attempts {
            self.phase = Phase::Exhausted;
            return SupervisorAction::GiveUp;
        }

        self.phase = Phase::Reconnecting { attempt };
        SupervisorAction::Retry { attempt, delay: retry_delay(&self.config, attempt) }
    }

    /// Explicit disconnect: cancel any pending retry, force idle.
    ///
    /// Idempotent; valid in every phase.
    pub fn on_disconnect(&mut self) {
        self.phase = Phase::Idle;
    }

    /// Explicit reconnect request (e.g. a manual reload after exhaustion).
    /// Clears the exhausted phase so the driver may dial again.
    pub fn on_reconnect_requested(&mut self) {
        self.phase = Phase::Idle;
    }

    /// Attempt budget from the configuration.
    pub fn max_attempts(&self) -> u32 {
        self.config.max_attempts
    }
}

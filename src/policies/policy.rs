//! # Per-unit policy bundle.
//!
//! [`Policy`] is attached once at registration and never mutated afterwards.
//! Units registered without an explicit policy get
//! [`SupervisorConfig::default_policy`](crate::SupervisorConfig::default_policy).
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use watchvisor::{Policy, RestartPolicy, StartupPolicy};
//!
//! let policy = Policy::default()
//!     .with_restart(RestartPolicy::OnFailure)
//!     .with_max_restart_attempts(3)
//!     .with_restart_delay(Duration::from_secs(1));
//!
//! assert_eq!(policy.startup, StartupPolicy::Automatic);
//! assert_eq!(policy.dwell(0), Duration::from_secs(1));
//! ```

use std::time::Duration;

use crate::policies::{BackoffPolicy, RestartPolicy, StartupPolicy};

/// Startup and restart policy of one managed unit.
#[derive(Clone, Copy, Debug)]
pub struct Policy {
    /// Whether `start_all` starts the unit.
    pub startup: StartupPolicy,
    /// Whether the scanner retries the unit after a failure.
    pub restart: RestartPolicy,
    /// Upper bound on consecutive automatic restarts.
    pub max_restart_attempts: u32,
    /// Minimum dwell time in `Failed` before a retry is eligible.
    pub restart_delay: Duration,
    /// Growth of the dwell time across consecutive restarts.
    pub backoff: BackoffPolicy,
}

impl Default for Policy {
    /// Returns `Automatic`, `Manual`, 5 attempts, 5s delay, constant backoff.
    fn default() -> Self {
        Self {
            startup: StartupPolicy::Automatic,
            restart: RestartPolicy::Manual,
            max_restart_attempts: 5,
            restart_delay: Duration::from_secs(5),
            backoff: BackoffPolicy::default(),
        }
    }
}

impl Policy {
    /// Returns the dwell time required after `attempts` consecutive restarts.
    pub fn dwell(&self, attempts: u32) -> Duration {
        self.backoff.dwell(self.restart_delay, attempts)
    }

    /// Returns true if a unit with `attempts` consecutive restarts may be retried.
    #[inline]
    pub fn allows_restart(&self, attempts: u32) -> bool {
        matches!(self.restart, RestartPolicy::OnFailure) && attempts < self.max_restart_attempts
    }

    /// Returns a new policy with updated startup policy.
    pub fn with_startup(mut self, startup: StartupPolicy) -> Self {
        self.startup = startup;
        self
    }

    /// Returns a new policy with updated restart policy.
    pub fn with_restart(mut self, restart: RestartPolicy) -> Self {
        self.restart = restart;
        self
    }

    /// Returns a new policy with updated attempt bound.
    pub fn with_max_restart_attempts(mut self, n: u32) -> Self {
        self.max_restart_attempts = n;
        self
    }

    /// Returns a new policy with updated restart delay.
    pub fn with_restart_delay(mut self, delay: Duration) -> Self {
        self.restart_delay = delay;
        self
    }

    /// Returns a new policy with updated backoff.
    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }
}

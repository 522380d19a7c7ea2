//! # Unit status and state machine.
//!
//! [`Status`] is the unit's point in the supervision state machine and
//! [`UnitState`] is the snapshot handed to callers and subscribers.
//!
//! ## Transitions
//! ```text
//! Stopped    ──► Starting
//! Starting   ──► Running | Failed
//! Running    ──► Stopping
//! Stopping   ──► Stopped | Failed
//! Failed     ──► Restarting (scanner) | Starting (manual)
//! Restarting ──► Running | Failed | Stopping (shutdown overtakes a restart)
//! ```
//!
//! ## Rules
//! - `restart_attempts` resets on entering `Running`/`Stopped`, increments on entering `Restarting`
//! - `last_error` clears on entering `Running`/`Stopped`, is set on entering `Failed`
//! - Illegal transitions are rejected and leave the state untouched
//! - `epoch` bumps on entering `Starting`/`Restarting`/`Stopping`; an operation
//!   may only settle the unit while the epoch it started under is current

use std::fmt;
use std::time::{Duration, SystemTime};

use tokio::time::Instant;

use crate::error::UnitError;
use crate::policies::Policy;
use crate::units::UnitId;

/// Operational status of a managed unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Status {
    /// Not running (initial status).
    Stopped,
    /// `start` is in flight.
    Starting,
    /// `start` succeeded.
    Running,
    /// `stop` is in flight.
    Stopping,
    /// The last `start`/`stop` failed; see `last_error`.
    Failed,
    /// The scanner relaunched a failed unit; `start` is in flight.
    Restarting,
}

impl Status {
    /// Returns true if the state machine allows `self → next`.
    pub fn can_transition_to(self, next: Status) -> bool {
        use Status::*;
        matches!(
            (self, next),
            (Stopped, Starting)
                | (Starting, Running)
                | (Starting, Failed)
                | (Running, Stopping)
                | (Stopping, Stopped)
                | (Stopping, Failed)
                | (Failed, Restarting)
                | (Failed, Starting)
                | (Restarting, Running)
                | (Restarting, Failed)
                | (Restarting, Stopping)
        )
    }

    /// Returns true for statuses with an operation in flight.
    #[inline]
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            Status::Starting | Status::Stopping | Status::Restarting
        )
    }

    /// Returns a short stable lowercase label for use in logs/metrics.
    pub fn as_label(self) -> &'static str {
        match self {
            Status::Stopped => "stopped",
            Status::Starting => "starting",
            Status::Running => "running",
            Status::Stopping => "stopping",
            Status::Failed => "failed",
            Status::Restarting => "restarting",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Snapshot of one unit's supervision state.
///
/// Values handed out by the supervisor are copies; mutating them has no effect
/// on the live state.
#[derive(Clone, Debug)]
pub struct UnitState {
    /// Identity of the unit.
    pub id: UnitId,
    /// Current status.
    pub status: Status,
    /// Error that drove the last transition into `Failed`.
    pub last_error: Option<UnitError>,
    /// Consecutive automatic restarts since the unit last reached `Running`/`Stopped`.
    pub restart_attempts: u32,
    /// Wall-clock time of the last transition.
    pub last_transition: SystemTime,
    /// Dwell required in `Failed` before the scanner may retry (set on entering `Failed`).
    pub retry_after: Duration,
    changed_at: Instant,
    epoch: u64,
}

impl UnitState {
    pub(crate) fn new(id: UnitId) -> Self {
        Self {
            id,
            status: Status::Stopped,
            last_error: None,
            restart_attempts: 0,
            last_transition: SystemTime::now(),
            retry_after: Duration::ZERO,
            changed_at: Instant::now(),
            epoch: 0,
        }
    }

    /// Generation of the operation in flight (or of the last one).
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Monotonic time of the last transition.
    pub fn changed_at(&self) -> Instant {
        self.changed_at
    }

    /// Time spent in the current status.
    pub fn elapsed(&self) -> Duration {
        self.changed_at.elapsed()
    }

    /// Returns true if the scanner may restart this unit now.
    pub(crate) fn restart_due(&self, policy: &Policy) -> bool {
        self.status == Status::Failed
            && policy.allows_restart(self.restart_attempts)
            && self.elapsed() >= self.retry_after
    }

    /// Applies `next` if legal. `error` is only consulted when entering `Failed`.
    ///
    /// Returns false (state untouched) for illegal transitions.
    pub(crate) fn apply(&mut self, next: Status, error: Option<UnitError>, policy: &Policy) -> bool {
        if !self.status.can_transition_to(next) {
            return false;
        }
        self.status = next;
        self.last_transition = SystemTime::now();
        self.changed_at = Instant::now();

        match next {
            Status::Running | Status::Stopped => {
                self.restart_attempts = 0;
                self.last_error = None;
            }
            Status::Restarting => {
                self.restart_attempts = self.restart_attempts.saturating_add(1);
                self.epoch = self.epoch.wrapping_add(1);
            }
            Status::Failed => {
                self.last_error =
                    Some(error.unwrap_or_else(|| UnitError::fail("unspecified failure")));
                self.retry_after = policy.dwell(self.restart_attempts);
            }
            Status::Starting | Status::Stopping => {
                self.epoch = self.epoch.wrapping_add(1);
            }
        }
        true
    }
}

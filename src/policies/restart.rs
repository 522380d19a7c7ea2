//! # Restart policies for failed units.
//!
//! [`RestartPolicy`] determines whether the restart scanner retries a unit that
//! landed in `Failed`.
//!
//! - [`RestartPolicy::Manual`] the unit stays `Failed` until someone calls `start_one` (default).
//! - [`RestartPolicy::OnFailure`] the scanner retries the unit, bounded by
//!   [`Policy::max_restart_attempts`](crate::Policy::max_restart_attempts).
//!
//! ## Choosing the right policy
//! ```text
//! RestartPolicy::Manual     → Failure is sticky; an operator decides
//! RestartPolicy::OnFailure  → Failure is retried after the dwell time, up to N times
//! ```

/// Policy controlling whether a failed unit is restarted automatically.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RestartPolicy {
    /// Never restart automatically (default).
    #[default]
    Manual,
    /// Restart on failure, bounded by the unit's maximum attempts.
    OnFailure,
}

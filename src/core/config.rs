//! # Supervisor configuration.
//!
//! Provides [`SupervisorConfig`] centralized settings for the supervisor runtime.
//!
//! Config is used in two ways:
//! 1. **Supervisor creation**: `Supervisor::builder(config)`
//! 2. **Policy defaults**: units registered without a policy get `default_policy`
//!
//! ## Sentinel values
//! - `scan_interval = 0s` → clamped to 1ms (a periodic timer needs a non-zero period)

use std::time::Duration;

use crate::policies::Policy;

/// Global configuration for the supervisor runtime.
///
/// ## Field semantics
/// - `scan_interval`: period of the restart scanner (independent of per-unit `restart_delay`)
/// - `grace`: upper bound for `stop_all` inside [`Supervisor::run`](crate::Supervisor::run)
/// - `default_policy`: policy for units registered without one
#[derive(Clone, Debug)]
pub struct SupervisorConfig {
    /// Period of the restart scanner.
    ///
    /// The scanner only relaunches units whose dwell time has elapsed, so a unit
    /// is retried on the first tick after its `restart_delay`.
    pub scan_interval: Duration,

    /// Maximum time [`Supervisor::run`](crate::Supervisor::run) waits for units to stop.
    ///
    /// `stop_all` itself never times out; timeouts are a caller policy.
    pub grace: Duration,

    /// Policy for units registered without an explicit one.
    pub default_policy: Policy,
}

impl SupervisorConfig {
    /// Returns the scan interval clamped to a minimum of 1ms.
    #[inline]
    pub fn scan_interval_clamped(&self) -> Duration {
        self.scan_interval.max(Duration::from_millis(1))
    }
}

impl Default for SupervisorConfig {
    /// Default configuration:
    ///
    /// - `scan_interval = 10s`
    /// - `grace = 30s`
    /// - `default_policy = Policy::default()`
    fn default() -> Self {
        Self {
            scan_interval: Duration::from_secs(10),
            grace: Duration::from_secs(30),
            default_policy: Policy::default(),
        }
    }
}

//! # Backoff policy for restart dwell times.
//!
//! [`BackoffPolicy`] controls how the minimum dwell time in `Failed` grows
//! across consecutive automatic restarts. It is parameterized by:
//! - [`BackoffPolicy::factor`] the multiplicative growth factor;
//! - [`BackoffPolicy::max`] the dwell cap;
//! - [`BackoffPolicy::jitter`] randomization applied after clamping.
//!
//! The dwell after `n` consecutive restarts is `restart_delay × factor^n`,
//! clamped to `max`. Jitter only randomizes the growth above `restart_delay`,
//! so the dwell never drops below `restart_delay`:
//! ```text
//! dwell(n) = base + jitter(min(base × factor^n, max(max, base)) − base)
//! ```
//! `factor` below 1.0 is treated as 1.0. The result is derived purely from `n`,
//! so jitter output never feeds back into later dwell times.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use watchvisor::{BackoffPolicy, JitterPolicy};
//!
//! let backoff = BackoffPolicy {
//!     factor: 2.0,
//!     max: Duration::from_secs(10),
//!     jitter: JitterPolicy::None,
//! };
//! let base = Duration::from_millis(100);
//!
//! assert_eq!(backoff.dwell(base, 0), Duration::from_millis(100));
//! assert_eq!(backoff.dwell(base, 1), Duration::from_millis(200));
//! // 100ms × 2^10 = 102.4s → capped at max=10s
//! assert_eq!(backoff.dwell(base, 10), Duration::from_secs(10));
//! ```

use std::time::Duration;

use crate::policies::jitter::JitterPolicy;

/// Growth of the restart dwell time.
#[derive(Clone, Copy, Debug)]
pub struct BackoffPolicy {
    /// Multiplicative growth factor; values below 1.0 act as 1.0.
    pub factor: f64,
    /// Maximum dwell; never lowers the dwell below the base delay.
    pub max: Duration,
    /// Jitter applied to the growth above the base delay.
    pub jitter: JitterPolicy,
}

impl Default for BackoffPolicy {
    /// Returns a constant policy: `factor = 1.0`, `max = 5min`, no jitter.
    fn default() -> Self {
        Self {
            factor: 1.0,
            max: Duration::from_secs(300),
            jitter: JitterPolicy::None,
        }
    }
}

impl BackoffPolicy {
    /// Computes the dwell after `attempts` consecutive restarts.
    ///
    /// - `factor <= 1.0` keeps the dwell at `base`.
    /// - `factor > 1.0` grows exponentially up to `max`.
    /// - Non-finite or negative intermediate values clamp to `max`.
    /// - The result is never below `base`.
    pub fn dwell(&self, base: Duration, attempts: u32) -> Duration {
        let ceiling = self.max.max(base);
        let factor = self.factor.max(1.0);
        let clamped_exp = attempts.min(i32::MAX as u32) as i32;
        let unclamped_secs = base.as_secs_f64() * factor.powi(clamped_exp);

        let grown = if !unclamped_secs.is_finite()
            || unclamped_secs < 0.0
            || unclamped_secs > ceiling.as_secs_f64()
        {
            ceiling
        } else {
            Duration::from_secs_f64(unclamped_secs).max(base)
        };
        base + self.jitter.apply(grown - base)
    }
}

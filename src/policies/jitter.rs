//! # Jitter policy for restart dwell times.
//!
//! [`JitterPolicy`] randomizes the backoff growth so that units that failed
//! together (a shared dependency went away) do not all come back on the same
//! scanner tick. [`BackoffPolicy`](crate::BackoffPolicy) applies it only to the
//! part of the dwell above `restart_delay`.
//!
//! - [`JitterPolicy::None`]: no randomization, predictable dwell
//! - [`JitterPolicy::Full`]: random dwell in [0, dwell]
//! - [`JitterPolicy::Equal`]: dwell/2 + random[0, dwell/2]

use rand::Rng;
use std::time::Duration;

/// Policy controlling randomization of dwell times.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JitterPolicy {
    /// No jitter: use the exact dwell.
    #[default]
    None,

    /// Full jitter: random dwell in [0, dwell].
    Full,

    /// Equal jitter: dwell/2 + random[0, dwell/2].
    Equal,
}

impl JitterPolicy {
    /// Applies jitter to the given delay.
    pub fn apply(&self, delay: Duration) -> Duration {
        match self {
            JitterPolicy::None => delay,
            JitterPolicy::Full => full_jitter(delay),
            JitterPolicy::Equal => equal_jitter(delay),
        }
    }
}

/// Full jitter: random[0, delay]
fn full_jitter(delay: Duration) -> Duration {
    let ms = delay.as_millis() as u64;
    if ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::rng().random_range(0..=ms))
}

/// Equal jitter: delay/2 + random[0, delay/2]
fn equal_jitter(delay: Duration) -> Duration {
    let ms = delay.as_millis() as u64;
    if ms == 0 {
        return Duration::ZERO;
    }
    let half = ms / 2;
    let jitter = if half == 0 {
        0
    } else {
        rand::rng().random_range(0..=half)
    };
    Duration::from_millis(half + jitter)
}

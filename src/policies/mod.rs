//! Startup and restart policies.
//!
//! This module groups the knobs that control **whether** a unit starts on its
//! own, **whether** a failed unit is retried, and **how long** it must dwell in
//! `Failed` before the next retry.
//!
//! ## Contents
//! - [`Policy`]         per-unit bundle attached once at registration
//! - [`StartupPolicy`]  automatic vs manual start
//! - [`RestartPolicy`]  manual vs on-failure restart
//! - [`BackoffPolicy`]  how the dwell time grows with consecutive restarts
//! - [`JitterPolicy`]   randomization of the dwell time
//!
//! ## Quick wiring
//! ```text
//! Policy { startup, restart, max_restart_attempts, restart_delay, backoff }
//!      ├─► Supervisor::start_all   uses startup
//!      └─► RestartScanner          uses restart, max_restart_attempts and
//!                                  the dwell computed on entering Failed:
//!                                  backoff.dwell(restart_delay, restart_attempts)
//! ```
//!
//! ## Defaults
//! - `StartupPolicy::Automatic`, `RestartPolicy::Manual`, 5 attempts, 5s delay.
//! - `BackoffPolicy::default()` → factor=1.0 (constant), max=5min, jitter=None.

mod backoff;
mod jitter;
mod policy;
mod restart;
mod startup;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
pub use policy::Policy;
pub use restart::RestartPolicy;
pub use startup::StartupPolicy;

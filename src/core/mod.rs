//! Runtime core: registry, state machine and lifecycle.
//!
//! The public API from this module is [`Supervisor`] (with its builder and
//! config) and the state types it hands out ([`Status`], [`UnitState`]).
//!
//! Internal modules:
//! - [`state`]: unit status, snapshot and the transition table;
//! - [`registry`]: identity → (unit, policy, state) with per-unit locking;
//! - [`runner`]: start/stop sequence of one unit with error capture;
//! - [`scanner`]: periodic relaunch of failed units;
//! - [`supervisor`]: bulk and manual start/stop, queries, subscriptions;
//! - [`shutdown`]: cross-platform shutdown signal handling.

mod builder;
mod config;
mod registry;
mod runner;
mod scanner;
mod shutdown;
mod state;
mod supervisor;

pub use builder::SupervisorBuilder;
pub use config::SupervisorConfig;
pub use state::{Status, UnitState};
pub use supervisor::Supervisor;

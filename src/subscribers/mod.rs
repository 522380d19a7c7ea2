//! # Event subscribers for the watchvisor runtime.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out
//! used as the supervisor's event sink, and small built-in implementations.
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   Entry::transition ── emit(Event) ──► SubscriberSet ──► [queue per subscriber]
//!                                                             │
//!                                                ┌────────────┼────────────┐
//!                                                ▼            ▼            ▼
//!                                            LogWriter    Dashboard     Custom
//! ```
//!
//! ## Subscriber types
//! - **Trait subscribers** - implement [`Subscribe`] (async handler)
//! - **Closure subscribers** - wrap a `Fn(&Event)` in [`SubscribeFn`]

mod embedded;
mod subscribe_fn;
mod subscriber;
mod subscriber_set;

#[cfg(feature = "logging")]
pub use embedded::LogWriter;
pub use subscribe_fn::SubscribeFn;
pub use subscriber::Subscribe;
pub use subscriber_set::{SubscriberSet, SubscriptionId};

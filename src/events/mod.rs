//! Runtime events.
//!
//! This module groups the event **data model** delivered to subscribers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload
//!
//! ## Quick reference
//! - **Publishers**: the per-unit transition in the registry (`StatusChanged`) and
//!   subscriber workers (`SubscriberPanicked`).
//! - **Consumers**: every [`Subscribe`](crate::Subscribe) registered on the supervisor,
//!   through its own queue in [`SubscriberSet`](crate::SubscriberSet).

mod event;

pub use event::{Event, EventKind};

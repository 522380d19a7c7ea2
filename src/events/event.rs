//! # Runtime events emitted by the supervisor.
//!
//! The [`EventKind`] enum classifies events:
//! - **Transition events**: a unit moved to a new [`Status`](crate::Status)
//! - **Subscriber events**: a subscriber panicked while handling an event
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Transition events for one unit are numbered while that unit's state is locked,
//! so per-unit `seq` order equals transition order.
//!
//! ## Example
//! ```rust
//! use watchvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::SubscriberPanicked)
//!     .with_subscriber("metrics")
//!     .with_reason("boom");
//!
//! assert_eq!(ev.kind, EventKind::SubscriberPanicked);
//! assert_eq!(ev.subscriber, Some("metrics"));
//! assert!(ev.state.is_none());
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::core::UnitState;
use crate::units::UnitId;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// A unit completed a transition.
    ///
    /// Sets:
    /// - `state`: post-transition snapshot
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    StatusChanged,

    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `subscriber`: subscriber name
    /// - `reason`: panic info/message
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    SubscriberPanicked,
}

/// Runtime event with optional metadata.
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Post-transition snapshot (for `StatusChanged`).
    pub state: Option<UnitState>,
    /// Subscriber name (for `SubscriberPanicked`).
    pub subscriber: Option<&'static str>,
    /// Human-readable reason.
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            state: None,
            subscriber: None,
            reason: None,
        }
    }

    /// Creates a transition event carrying `state`.
    #[inline]
    pub fn status_changed(state: UnitState) -> Self {
        Event::new(EventKind::StatusChanged).with_state(state)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_subscriber(subscriber)
            .with_reason(info)
    }

    /// Attaches a unit snapshot.
    #[inline]
    pub fn with_state(mut self, state: UnitState) -> Self {
        self.state = Some(state);
        self
    }

    /// Attaches a subscriber name.
    #[inline]
    pub fn with_subscriber(mut self, name: &'static str) -> Self {
        self.subscriber = Some(name);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Identity of the unit this event is about, if any.
    #[inline]
    pub fn unit(&self) -> Option<&UnitId> {
        self.state.as_ref().map(|s| &s.id)
    }

    #[inline]
    pub fn is_subscriber_panic(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberPanicked)
    }
}

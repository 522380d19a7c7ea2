//! # Event subscriber trait.
//!
//! Provides [`Subscribe`] an extension point for plugging custom event handlers
//! (dashboards, UI bindings, metrics) into the supervisor.
//!
//! Each subscriber gets:
//! - **Dedicated worker task** (runs independently)
//! - **Per-subscriber FIFO queue** (unbounded, nothing is dropped)
//! - **Panic isolation** (panics are caught and reported as `EventKind::SubscriberPanicked`)
//!
//! ## Architecture
//! ```text
//! SubscriberSet ──► [queue] ──► worker task ──► subscriber.on_event()
//!                                          └─► panic caught → EventKind::SubscriberPanicked
//! ```
//!
//! ## Rules
//! - Every subscriber sees every event exactly once.
//! - Events of one unit arrive in transition order.
//! - A slow subscriber only grows its own queue; it never blocks a transition.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use watchvisor::{Event, Status, Subscribe};
//!
//! struct FailureAlert;
//!
//! #[async_trait]
//! impl Subscribe for FailureAlert {
//!     async fn on_event(&self, ev: &Event) {
//!         if let Some(state) = &ev.state {
//!             if state.status == Status::Failed {
//!                 // page someone
//!             }
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "failure-alert" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Event subscriber for supervisor observability.
///
/// ### Implementation requirements
/// - Use async I/O; avoid blocking the executor.
/// - Handle errors internally; do not panic.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Processes a single event.
    ///
    /// Called from a dedicated worker task, not in the transition context.
    async fn on_event(&self, event: &Event);

    /// Returns the subscriber name used in logs and panic events.
    ///
    /// The default uses `type_name::<Self>()`, which can be verbose - override it when possible.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

//! # Closure-backed subscriber (`SubscribeFn`)
//!
//! Adapts a plain `Fn(&Event)` to [`Subscribe`] for handlers that do not need
//! to await anything (UI bindings, counters).
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use watchvisor::{Subscribe, SubscribeFn};
//!
//! let sub: Arc<dyn Subscribe> = SubscribeFn::arc("printer", |ev| {
//!     if let Some(state) = &ev.state {
//!         println!("{} -> {}", state.id, state.status);
//!     }
//! });
//! assert_eq!(sub.name(), "printer");
//! ```

use std::sync::Arc;

use async_trait::async_trait;

use crate::events::Event;
use crate::subscribers::Subscribe;

/// Closure-backed subscriber.
pub struct SubscribeFn<F> {
    name: &'static str,
    f: F,
}

impl<F> SubscribeFn<F>
where
    F: Fn(&Event) + Send + Sync + 'static,
{
    /// Wraps `f` under the given name.
    pub fn new(name: &'static str, f: F) -> Self {
        Self { name, f }
    }

    /// Wraps `f` and returns it as a shared handle.
    pub fn arc(name: &'static str, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<F> Subscribe for SubscribeFn<F>
where
    F: Fn(&Event) + Send + Sync + 'static,
{
    async fn on_event(&self, event: &Event) {
        (self.f)(event)
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

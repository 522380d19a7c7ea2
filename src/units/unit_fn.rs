//! # Closure-backed unit (`UnitFn`)
//!
//! [`UnitFn`] wraps two closures, one for `start` and one for `stop`, each
//! producing a fresh future per call. Shared state between the two must be
//! captured explicitly (e.g. an `Arc<...>` cloned into both closures).
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use watchvisor::{UnitError, UnitFn, UnitRef};
//!
//! let u: UnitRef = UnitFn::arc(
//!     "ticker",
//!     |_ctx: CancellationToken| async { Ok::<_, UnitError>(()) },
//!     |_ctx: CancellationToken| async { Ok::<_, UnitError>(()) },
//! );
//! assert_eq!(u.name(), "ticker");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::UnitError;
use crate::units::unit::Unit;

/// Closure-backed unit implementation.
#[derive(Debug)]
pub struct UnitFn<S, T> {
    name: Cow<'static, str>,
    start: S,
    stop: T,
}

impl<S, T> UnitFn<S, T> {
    /// Creates a new closure-backed unit.
    ///
    /// Prefer [`UnitFn::arc`] when you immediately need a [`UnitRef`](crate::UnitRef).
    pub fn new(name: impl Into<Cow<'static, str>>, start: S, stop: T) -> Self {
        Self {
            name: name.into(),
            start,
            stop,
        }
    }

    /// Creates the unit and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, start: S, stop: T) -> Arc<Self> {
        Arc::new(Self::new(name, start, stop))
    }
}

#[async_trait]
impl<S, SF, T, TF> Unit for UnitFn<S, T>
where
    S: Fn(CancellationToken) -> SF + Send + Sync + 'static,
    SF: Future<Output = Result<(), UnitError>> + Send + 'static,
    T: Fn(CancellationToken) -> TF + Send + Sync + 'static,
    TF: Future<Output = Result<(), UnitError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self, ctx: CancellationToken) -> Result<(), UnitError> {
        (self.start)(ctx).await
    }

    async fn stop(&self, ctx: CancellationToken) -> Result<(), UnitError> {
        (self.stop)(ctx).await
    }
}

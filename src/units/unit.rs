//! # Managed unit contract.
//!
//! A [`Unit`] is a long-running background service with a start/stop capability.
//! Both operations receive a [`CancellationToken`] and should honor it; the
//! supervisor propagates cancellation but never enforces a timeout itself.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::UnitError;

/// Shared handle to a managed unit.
pub type UnitRef = Arc<dyn Unit>;

/// # Startable / stoppable background unit.
///
/// # Example
/// ```
/// use tokio_util::sync::CancellationToken;
/// use async_trait::async_trait;
/// use watchvisor::{Unit, UnitError};
///
/// struct Cache;
///
/// #[async_trait]
/// impl Unit for Cache {
///     fn name(&self) -> &str { "cache" }
///
///     async fn start(&self, ctx: CancellationToken) -> Result<(), UnitError> {
///         if ctx.is_cancelled() {
///             return Err(UnitError::Canceled);
///         }
///         // warm up, spawn background work...
///         Ok(())
///     }
///
///     async fn stop(&self, _ctx: CancellationToken) -> Result<(), UnitError> {
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Unit: Send + Sync + 'static {
    /// Returns a stable, human-readable unit name.
    fn name(&self) -> &str;

    /// Brings the unit up. Returns once the unit is running (not when it finishes).
    async fn start(&self, ctx: CancellationToken) -> Result<(), UnitError>;

    /// Brings the unit down.
    async fn stop(&self, ctx: CancellationToken) -> Result<(), UnitError>;
}

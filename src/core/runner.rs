//! # Start/stop sequences for a single unit.
//!
//! Drives one unit through `Starting/Restarting → Running | Failed` or
//! `Stopping → Stopped | Failed`, capturing the unit's error into its state.
//!
//! ## Flow
//! ```text
//! start_unit(guard):
//!   ├─ token already cancelled  → Err(Canceled), state untouched
//!   ├─ [lock] guard(status)?    → no: Ok(()) (no-op)
//!   │          └─ yes: → Starting (event)
//!   └─ drive_start():
//!        unit.start(ctx)  (outside the lock, panics caught)
//!          ├─ Ok             → Running (event)
//!          ├─ Err(Canceled)  → Failed  (event), Err(Canceled)
//!          └─ Err(e)         → Failed  (event), Ok(())
//!
//! stop_unit: same shape with Running|Restarting → Stopping → Stopped | Failed
//! ```
//!
//! ## Rules
//! - Per-unit failures never surface as `Err`; only cancellation does
//! - The unit's operation runs outside the entry lock (it may be long-running)
//! - The settle transition only applies while the epoch the operation began
//!   under is current: if another operation began meanwhile (e.g. a stop
//!   overtook a restart), the stale result is dropped

use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tokio_util::sync::CancellationToken;

use crate::core::registry::Entry;
use crate::core::state::Status;
use crate::error::{RuntimeError, UnitError, panic_message};
use crate::subscribers::SubscriberSet;

/// Runs the start sequence if `accept` admits the unit's current status.
pub(crate) async fn start_unit(
    entry: &Entry,
    sink: &SubscriberSet,
    ctx: CancellationToken,
    accept: fn(Status) -> bool,
) -> Result<(), RuntimeError> {
    if ctx.is_cancelled() {
        return Err(RuntimeError::Canceled);
    }
    let Some(begun) = entry.transition_if(|s| accept(s.status), Status::Starting, None, sink)
    else {
        return Ok(());
    };
    drive_start(entry, sink, ctx, begun.epoch()).await
}

/// Invokes the unit's `start` for a unit already in `Starting` or `Restarting`
/// under `epoch`.
pub(crate) async fn drive_start(
    entry: &Entry,
    sink: &SubscriberSet,
    ctx: CancellationToken,
    epoch: u64,
) -> Result<(), RuntimeError> {
    let res = invoke(entry.unit.start(ctx)).await;
    settle(entry, sink, epoch, res, Status::Running)
}

/// Runs the stop sequence if `accept` admits the unit's current status.
pub(crate) async fn stop_unit(
    entry: &Entry,
    sink: &SubscriberSet,
    ctx: CancellationToken,
    accept: fn(Status) -> bool,
) -> Result<(), RuntimeError> {
    if ctx.is_cancelled() {
        return Err(RuntimeError::Canceled);
    }
    let Some(begun) = entry.transition_if(|s| accept(s.status), Status::Stopping, None, sink)
    else {
        return Ok(());
    };
    let res = invoke(entry.unit.stop(ctx)).await;
    settle(entry, sink, begun.epoch(), res, Status::Stopped)
}

/// Awaits a unit operation, converting a panic into [`UnitError::Panicked`].
async fn invoke<F>(op: F) -> Result<(), UnitError>
where
    F: Future<Output = Result<(), UnitError>>,
{
    match AssertUnwindSafe(op).catch_unwind().await {
        Ok(res) => res,
        Err(panic_err) => Err(UnitError::Panicked {
            info: panic_message(panic_err.as_ref()),
        }),
    }
}

/// Lands the unit in `ok` or `Failed` depending on the operation result,
/// provided no newer operation has begun since `epoch`.
fn settle(
    entry: &Entry,
    sink: &SubscriberSet,
    epoch: u64,
    res: Result<(), UnitError>,
    ok: Status,
) -> Result<(), RuntimeError> {
    match res {
        Ok(()) => {
            if entry
                .transition_if(|s| s.epoch() == epoch, ok, None, sink)
                .is_none()
            {
                tracing::debug!(unit = %entry.id, next = %ok, "stale completion dropped");
            }
            Ok(())
        }
        Err(err) => {
            let canceled = matches!(err, UnitError::Canceled);
            if entry
                .transition_if(|s| s.epoch() == epoch, Status::Failed, Some(err), sink)
                .is_none()
            {
                tracing::debug!(unit = %entry.id, "stale failure dropped");
            }
            if canceled {
                Err(RuntimeError::Canceled)
            } else {
                Ok(())
            }
        }
    }
}

/// `start_one`: stopped or failed units.
pub(crate) fn startable(status: Status) -> bool {
    matches!(status, Status::Stopped | Status::Failed)
}

/// `start_all`: only units that were never started or were stopped cleanly.
pub(crate) fn auto_startable(status: Status) -> bool {
    status == Status::Stopped
}

/// `stop_one` / `stop_all`: running units, including ones mid-restart.
pub(crate) fn stoppable(status: Status) -> bool {
    matches!(status, Status::Running | Status::Restarting)
}

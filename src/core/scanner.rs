//! # Restart scanner.
//!
//! A periodic background task that relaunches failed units whose policy allows it.
//!
//! ## Tick
//! ```text
//! every scan_interval:
//!   [gate] scanner still armed?
//!     for each entry:
//!       [entry lock] Failed && OnFailure && attempts < max && elapsed >= retry_after?
//!           └─ yes: → Restarting (attempts += 1, event)
//!                   spawn drive_start(entry)  → Running | Failed   (background)
//! ```
//!
//! ## Rules
//! - Relaunches are spawned; a slow unit never delays the next tick
//! - `disarm()` waits for an in-progress tick (synchronous, short), so once it
//!   returns no further unit enters `Restarting` until the scanner is re-armed
//! - `disarm()` never waits for relaunches already in flight and never changes a unit's status
//! - Relaunches use the supervisor's runtime token, not the scanner's

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::core::registry::Registry;
use crate::core::runner;
use crate::core::state::Status;
use crate::subscribers::SubscriberSet;

type Gate = Arc<Mutex<Option<CancellationToken>>>;

fn lock(gate: &Gate) -> MutexGuard<'_, Option<CancellationToken>> {
    gate.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owner of the periodic restart timer.
pub(crate) struct RestartScanner {
    period: Duration,
    /// `Some(token)` while armed; also serializes ticks against `disarm`.
    gate: Gate,
}

impl RestartScanner {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            gate: Arc::new(Mutex::new(None)),
        }
    }

    /// Starts ticking. Returns false if already armed or `runtime` is cancelled.
    pub fn arm(
        &self,
        registry: Arc<Registry>,
        sink: Arc<SubscriberSet>,
        runtime: CancellationToken,
    ) -> bool {
        let token = {
            let mut gate = lock(&self.gate);
            if gate.is_some() || runtime.is_cancelled() {
                return false;
            }
            let token = runtime.child_token();
            *gate = Some(token.clone());
            token
        };

        tracing::debug!(period = ?self.period, "restart scanner armed");
        tokio::spawn(scan_loop(
            self.period,
            Arc::clone(&self.gate),
            token,
            registry,
            sink,
            runtime,
        ));
        true
    }

    /// Stops ticking. Idempotent; returns false if the scanner was not armed.
    pub fn disarm(&self) -> bool {
        match lock(&self.gate).take() {
            Some(token) => {
                token.cancel();
                tracing::debug!("restart scanner disarmed");
                true
            }
            None => false,
        }
    }

    pub fn is_armed(&self) -> bool {
        lock(&self.gate).is_some()
    }
}

async fn scan_loop(
    period: Duration,
    gate: Gate,
    token: CancellationToken,
    registry: Arc<Registry>,
    sink: Arc<SubscriberSet>,
    runtime: CancellationToken,
) {
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {}
        }
        if tick(&gate, &token, &registry, &sink, &runtime).is_none() {
            break;
        }
    }
}

/// One tick under the gate. Returns `None` once the scanner was disarmed.
fn tick(
    gate: &Gate,
    token: &CancellationToken,
    registry: &Registry,
    sink: &Arc<SubscriberSet>,
    runtime: &CancellationToken,
) -> Option<usize> {
    let _held = lock(gate);
    if token.is_cancelled() {
        return None;
    }
    Some(scan_once(registry, sink, runtime))
}

/// Moves every eligible unit to `Restarting` and spawns its start sequence.
///
/// Returns the number of relaunches.
pub(crate) fn scan_once(
    registry: &Registry,
    sink: &Arc<SubscriberSet>,
    runtime: &CancellationToken,
) -> usize {
    let mut launched = 0;
    for entry in registry.entries() {
        let policy = entry.policy;
        let Some(begun) =
            entry.transition_if(|s| s.restart_due(&policy), Status::Restarting, None, sink)
        else {
            continue;
        };
        launched += 1;
        tracing::debug!(unit = %entry.id, "relaunching failed unit");

        let entry = Arc::clone(entry);
        let sink = Arc::clone(sink);
        let ctx = runtime.child_token();
        let epoch = begun.epoch();
        tokio::spawn(async move {
            let _ = runner::drive_start(&entry, &sink, ctx, epoch).await;
        });
    }
    launched
}

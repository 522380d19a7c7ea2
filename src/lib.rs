//! # watchvisor
//!
//! **Watchvisor** supervises a fixed set of long-running background units.
//!
//! Every unit exposes an async `start` and `stop`. The supervisor starts them
//! according to a per-unit [`StartupPolicy`], tracks each one through a small
//! state machine, and relaunches failed units on a periodic scan according to
//! a per-unit [`RestartPolicy`]. Every state change is published to
//! subscribers.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │     Unit     │   │     Unit     │   │  Supervisor  │  (nested)
//!     │ start / stop │   │ start / stop │   │ start / stop │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Supervisor                                                       │
//! │  - Registry (UnitId → Entry { unit, policy, Mutex<UnitState> })   │
//! │  - RestartScanner (periodic relaunch of Failed units)             │
//! │  - SubscriberSet (event sink, one queue per subscriber)           │
//! └──────┬──────────────────┬──────────────────┬───────────────┬──────┘
//!        │ start_all        │ start_one        │ scan tick     │
//!        │ stop_all         │ stop_one         │               │
//!        ▼                  ▼                  ▼               │
//!   ┌────────────────────────────────────────────────────┐     │
//!   │ Entry::transition_if(guard, next)                  │     │
//!   │   guard + transition under the unit's own mutex    │     │
//!   │   emits Event::StatusChanged before unlocking      │     │
//!   └──────────────────────────┬─────────────────────────┘     │
//!                              ▼                               ▼
//!                   ┌────────────────────────┐       get_all / get_one
//!                   │     SubscriberSet      │       (state snapshots)
//!                   └───┬────────┬───────┬───┘
//!                       ▼        ▼       ▼
//!                    worker1  worker2  workerN
//!                       ▼        ▼       ▼
//!                   sub1.on   sub2.on  subN.on
//!                    _event()  _event()  _event()
//! ```
//!
//! ### Unit lifecycle
//! ```text
//!            start_all / start_one
//! Stopped ────────────────────────► Starting ──ok──► Running
//!    ▲                                  │               │ stop_all / stop_one
//!    │                                 err              ▼
//!    └──────────────ok────────────── Stopping ◄──── (Running | Restarting)
//!                                       │
//!                                      err
//!                                       ▼
//!                                    Failed ──scan: OnFailure, attempts < max,
//!                                       ▲           dwell elapsed──► Restarting
//!                                       └─────────────err──────────────┘
//! ```
//!
//! ## Features
//! | Area              | Description                                                     | Key types / traits                        |
//! |-------------------|-----------------------------------------------------------------|-------------------------------------------|
//! | **Units**         | Anything with async `start`/`stop`, or a pair of closures.      | [`Unit`], [`UnitFn`], [`UnitRef`]         |
//! | **Policies**      | Startup, restart, attempt cap, dwell and backoff per unit.      | [`Policy`], [`RestartPolicy`]             |
//! | **Supervision**   | Bulk and per-unit lifecycle, restart scanner, snapshots.        | [`Supervisor`], [`UnitState`]             |
//! | **Subscriber API**| Observe every transition (logging, dashboards, alerts).         | [`Subscribe`], [`SubscribeFn`], [`Event`] |
//! | **Errors**        | Structural call errors and unit failure records.                | [`RuntimeError`], [`UnitError`]           |
//! | **Configuration** | Scan interval, shutdown grace, default policy.                  | [`SupervisorConfig`]                      |
//!
//! ## Optional features
//! - `logging`: exports a tracing-backed [`LogWriter`] subscriber _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::collections::HashMap;
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use watchvisor::{
//!     Policy, StartupPolicy, Status, Supervisor, SupervisorConfig, UnitError, UnitFn, UnitId,
//!     UnitRef,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     #[cfg(feature = "logging")]
//!     let subs: Vec<Arc<dyn watchvisor::Subscribe>> = vec![Arc::new(watchvisor::LogWriter::new())];
//!     #[cfg(not(feature = "logging"))]
//!     let subs: Vec<Arc<dyn watchvisor::Subscribe>> = Vec::new();
//!
//!     let sup = Supervisor::builder(SupervisorConfig::default())
//!         .with_subscribers(subs)
//!         .build();
//!
//!     let cache: UnitRef = UnitFn::arc(
//!         "cache",
//!         |_ctx: CancellationToken| async { Ok::<_, UnitError>(()) },
//!         |_ctx: CancellationToken| async { Ok::<_, UnitError>(()) },
//!     );
//!     let admin: UnitRef = UnitFn::arc(
//!         "admin",
//!         |_ctx: CancellationToken| async { Ok::<_, UnitError>(()) },
//!         |_ctx: CancellationToken| async { Ok::<_, UnitError>(()) },
//!     );
//!
//!     let mut policies = HashMap::new();
//!     policies.insert(UnitId::from("admin"), Policy::default().with_startup(StartupPolicy::Manual));
//!     sup.initialize(
//!         vec![(UnitId::from("cache"), cache), (UnitId::from("admin"), admin)],
//!         policies,
//!     )?;
//!
//!     let token = CancellationToken::new();
//!     sup.start_all(&token).await?;
//!     let states = sup.get_all()?;
//!     assert_eq!(states[&UnitId::from("cache")].status, Status::Running);
//!     assert_eq!(states[&UnitId::from("admin")].status, Status::Stopped);
//!
//!     sup.stop_all(&token).await?;
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod policies;
mod subscribers;
mod units;

// ---- Public re-exports ----

pub use crate::core::{Status, Supervisor, SupervisorBuilder, SupervisorConfig, UnitState};
pub use error::{RuntimeError, UnitError};
pub use events::{Event, EventKind};
pub use policies::{BackoffPolicy, JitterPolicy, Policy, RestartPolicy, StartupPolicy};
pub use subscribers::{Subscribe, SubscribeFn, SubscriberSet, SubscriptionId};
pub use units::{Unit, UnitFn, UnitId, UnitRef};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;

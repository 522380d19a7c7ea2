//! # Supervisor: registry owner, bulk/manual lifecycle, restart scanner.
//!
//! The [`Supervisor`] owns the unit registry, the event sink ([`SubscriberSet`]),
//! the [`RestartScanner`] and a runtime cancellation token. It is constructed
//! once and shared by handle (`Arc<Supervisor>`) with every caller.
//!
//! ## Key responsibilities
//! - build the registry once from explicit registrations ([`Supervisor::initialize`])
//! - **fan-out** start/stop across units without short-circuiting
//! - manual per-unit start/stop with per-unit mutual exclusion
//! - arm/disarm the restart scanner
//! - expose state snapshots and event subscriptions
//!
//! ## Lifecycle
//! ```text
//! Supervisor::builder(cfg).build()
//!     └─► initialize(units, policies)       (exactly once)
//!          └─► start_all(token)             (arms the scanner)
//!               ├─ start_one / stop_one     (any time, any caller)
//!               ├─ get_all / get_one        (any time)
//!               └─► stop_all(token)         (disarms the scanner first)
//!                    └─► shutdown() / Drop  (cancels in-flight relaunches)
//! ```
//!
//! ## Fan-out
//! ```text
//! start_all:
//!   for entry in registry (startup = Automatic):
//!       tokio::spawn(start_unit(entry, guard = Stopped))
//!   await all ── one unit's failure never delays or cancels another
//! ```
//! Each sequence runs in its own task. If the caller stops waiting (a timeout,
//! a dropped future) the tasks are detached, not aborted, so every unit still
//! lands in a settled status.
//!
//! ## Stop ordering
//! `stop_all` stops units concurrently in no defined order. Callers that need
//! an ordered shutdown (e.g. reverse registration order) can walk
//! [`Supervisor::ids`] and call [`Supervisor::stop_one`] themselves.
//!
//! ## Example
//! ```rust
//! use std::collections::HashMap;
//! use tokio_util::sync::CancellationToken;
//! use watchvisor::{
//!     Policy, RestartPolicy, Status, Supervisor, SupervisorConfig, UnitError, UnitFn, UnitId,
//!     UnitRef,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let sup = Supervisor::builder(SupervisorConfig::default()).build();
//!
//!     let db: UnitRef = UnitFn::arc(
//!         "db",
//!         |_ctx: CancellationToken| async { Ok::<_, UnitError>(()) },
//!         |_ctx: CancellationToken| async { Ok::<_, UnitError>(()) },
//!     );
//!     let mut policies = HashMap::new();
//!     policies.insert(UnitId::from("db"), Policy::default().with_restart(RestartPolicy::OnFailure));
//!
//!     sup.initialize(vec![(UnitId::from("db"), db)], policies)?;
//!
//!     let token = CancellationToken::new();
//!     sup.start_all(&token).await?;
//!     assert_eq!(sup.get_one(&UnitId::from("db"))?.map(|s| s.status), Some(Status::Running));
//!
//!     sup.stop_all(&token).await?;
//!     assert_eq!(sup.get_one(&UnitId::from("db"))?.map(|s| s.status), Some(Status::Stopped));
//!     Ok(())
//! }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use tokio::{task::JoinHandle, time};
use tokio_util::sync::CancellationToken;

use crate::core::{
    SupervisorBuilder, SupervisorConfig,
    registry::{Entry, Registry},
    runner,
    scanner::RestartScanner,
    shutdown,
    state::{Status, UnitState},
};
use crate::error::{RuntimeError, UnitError};
use crate::policies::{Policy, StartupPolicy};
use crate::subscribers::{Subscribe, SubscriberSet, SubscriptionId};
use crate::units::{Unit, UnitId, UnitRef};

/// Supervises a fixed set of managed units.
pub struct Supervisor {
    cfg: SupervisorConfig,
    subs: Arc<SubscriberSet>,
    registry: OnceLock<Arc<Registry>>,
    scanner: RestartScanner,
    runtime_token: CancellationToken,
}

impl Supervisor {
    /// Returns a builder for a supervisor with the given configuration.
    pub fn builder(cfg: SupervisorConfig) -> SupervisorBuilder {
        SupervisorBuilder::new(cfg)
    }

    pub(crate) fn new_internal(cfg: SupervisorConfig, subs: Arc<SubscriberSet>) -> Self {
        Self {
            scanner: RestartScanner::new(cfg.scan_interval_clamped()),
            cfg,
            subs,
            registry: OnceLock::new(),
            runtime_token: CancellationToken::new(),
        }
    }

    /// Global configuration.
    pub fn config(&self) -> &SupervisorConfig {
        &self.cfg
    }

    /// Builds the registry from explicit registrations.
    ///
    /// - `policies` are matched by identity; other units get `cfg.default_policy`
    /// - a handle that is this supervisor itself is skipped
    /// - a repeated identity keeps its first registration
    ///
    /// Must be called exactly once, before any start/stop call. A second call is
    /// a programming error and returns [`RuntimeError::AlreadyInitialized`]
    /// without touching the existing registry.
    pub fn initialize(
        &self,
        units: impl IntoIterator<Item = (UnitId, UnitRef)>,
        policies: HashMap<UnitId, Policy>,
    ) -> Result<(), RuntimeError> {
        if self.registry.get().is_some() {
            return Err(RuntimeError::AlreadyInitialized);
        }
        let me = self as *const Self as *const ();
        let registry = Registry::build(units, policies, self.cfg.default_policy, me);
        let count = registry.len();

        self.registry
            .set(Arc::new(registry))
            .map_err(|_| RuntimeError::AlreadyInitialized)?;
        tracing::debug!(units = count, "registry initialized");
        Ok(())
    }

    /// Starts every `Automatic` unit that is `Stopped`, concurrently, and arms the scanner.
    ///
    /// Returns once every started unit is `Running` or `Failed`. Unit failures are
    /// recorded in their state; the call itself only fails structurally or when
    /// `token` is cancelled.
    pub async fn start_all(&self, token: &CancellationToken) -> Result<(), RuntimeError> {
        let registry = self.registry()?;
        if token.is_cancelled() {
            return Err(RuntimeError::Canceled);
        }
        self.scanner.arm(
            Arc::clone(registry),
            Arc::clone(&self.subs),
            self.runtime_token.clone(),
        );

        let tasks: Vec<_> = registry
            .entries()
            .filter(|entry| entry.policy.startup == StartupPolicy::Automatic)
            .map(|entry| {
                let entry = Arc::clone(entry);
                let sink = Arc::clone(&self.subs);
                let ctx = token.clone();
                tokio::spawn(async move {
                    runner::start_unit(&entry, &sink, ctx, runner::auto_startable).await
                })
            })
            .collect();
        join_fanout(tasks).await;

        if token.is_cancelled() {
            Err(RuntimeError::Canceled)
        } else {
            Ok(())
        }
    }

    /// Disarms the scanner, then stops every `Running`/`Restarting` unit concurrently.
    ///
    /// Returns once every stopped unit is `Stopped` or `Failed`.
    pub async fn stop_all(&self, token: &CancellationToken) -> Result<(), RuntimeError> {
        let registry = self.registry()?;
        self.scanner.disarm();
        if token.is_cancelled() {
            return Err(RuntimeError::Canceled);
        }

        let tasks: Vec<_> = registry
            .entries()
            .map(|entry| {
                let entry = Arc::clone(entry);
                let sink = Arc::clone(&self.subs);
                let ctx = token.clone();
                tokio::spawn(async move {
                    runner::stop_unit(&entry, &sink, ctx, runner::stoppable).await
                })
            })
            .collect();
        join_fanout(tasks).await;

        if token.is_cancelled() {
            Err(RuntimeError::Canceled)
        } else {
            Ok(())
        }
    }

    /// Starts one unit if it is `Stopped` or `Failed`; otherwise a no-op.
    ///
    /// Concurrent calls for the same unit are serialized on its guard: exactly
    /// one proceeds, the others observe `Starting`/`Running` and return `Ok(())`.
    pub async fn start_one(
        &self,
        id: &UnitId,
        token: &CancellationToken,
    ) -> Result<(), RuntimeError> {
        let entry = self.entry(id)?;
        runner::start_unit(entry, &self.subs, token.clone(), runner::startable).await
    }

    /// Stops one unit if it is `Running` or `Restarting`; otherwise a no-op.
    pub async fn stop_one(
        &self,
        id: &UnitId,
        token: &CancellationToken,
    ) -> Result<(), RuntimeError> {
        let entry = self.entry(id)?;
        runner::stop_unit(entry, &self.subs, token.clone(), runner::stoppable).await
    }

    /// Snapshot of every unit's state.
    pub fn get_all(&self) -> Result<BTreeMap<UnitId, UnitState>, RuntimeError> {
        Ok(self.registry()?.snapshot())
    }

    /// Snapshot of one unit's state, `None` if the identity is not registered.
    pub fn get_one(&self, id: &UnitId) -> Result<Option<UnitState>, RuntimeError> {
        Ok(self.registry()?.get(id).map(|e| e.snapshot()))
    }

    /// Registered identities in registration order.
    pub fn ids(&self) -> Result<Vec<UnitId>, RuntimeError> {
        Ok(self.registry()?.ids())
    }

    /// Registers an event subscriber. Must be called inside a tokio runtime.
    pub fn subscribe(&self, subscriber: Arc<dyn Subscribe>) -> SubscriptionId {
        self.subs.subscribe(subscriber)
    }

    /// Removes an event subscriber. Returns false if it was already removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subs.unsubscribe(id)
    }

    /// Returns true while the restart scanner is ticking.
    pub fn is_scanning(&self) -> bool {
        self.scanner.is_armed()
    }

    /// Runs the supervised set until a shutdown signal or `token` cancellation.
    ///
    /// 1. `start_all(token)`
    /// 2. wait for SIGINT/SIGTERM/SIGQUIT (Ctrl-C elsewhere) or `token`
    /// 3. `stop_all`, bounded by [`SupervisorConfig::grace`]
    ///
    /// Returns [`RuntimeError::GraceExceeded`] with the units that had not
    /// settled when the grace period ran out.
    pub async fn run(&self, token: &CancellationToken) -> Result<(), RuntimeError> {
        match self.start_all(token).await {
            Ok(()) | Err(RuntimeError::Canceled) => {}
            Err(e) => return Err(e),
        }

        tokio::select! {
            res = shutdown::wait_for_shutdown_signal() => {
                if let Err(e) = res {
                    tracing::warn!(error = %e, "signal registration failed; waiting for cancellation");
                    token.cancelled().await;
                }
            }
            _ = token.cancelled() => {}
        }

        let grace = self.cfg.grace;
        let stop_token = self.runtime_token.child_token();
        match time::timeout(grace, self.stop_all(&stop_token)).await {
            Ok(res) => res,
            Err(_elapsed) => {
                stop_token.cancel();
                let stuck = self.unsettled()?;
                tracing::warn!(grace = ?grace, stuck = ?stuck, "units did not stop within grace");
                Err(RuntimeError::GraceExceeded { grace, stuck })
            }
        }
    }

    /// Disarms the scanner and cancels relaunches in flight. Idempotent.
    ///
    /// Unit statuses are left as they are; call [`Supervisor::stop_all`] first
    /// for an orderly teardown.
    pub fn shutdown(&self) {
        self.scanner.disarm();
        self.runtime_token.cancel();
    }

    fn registry(&self) -> Result<&Arc<Registry>, RuntimeError> {
        self.registry.get().ok_or(RuntimeError::NotInitialized)
    }

    fn entry(&self, id: &UnitId) -> Result<&Arc<Entry>, RuntimeError> {
        self.registry()?
            .get(id)
            .ok_or_else(|| RuntimeError::UnknownUnit { id: id.clone() })
    }

    /// Units that are neither `Stopped` nor `Failed`.
    fn unsettled(&self) -> Result<Vec<UnitId>, RuntimeError> {
        Ok(self
            .registry()?
            .entries()
            .filter(|e| !matches!(e.status(), Status::Stopped | Status::Failed))
            .map(|e| e.id.clone())
            .collect())
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// A supervisor is itself a unit, so it can be nested under another one.
#[async_trait]
impl Unit for Supervisor {
    fn name(&self) -> &str {
        "supervisor"
    }

    async fn start(&self, ctx: CancellationToken) -> Result<(), UnitError> {
        self.start_all(&ctx).await.map_err(into_unit_error)
    }

    async fn stop(&self, ctx: CancellationToken) -> Result<(), UnitError> {
        self.stop_all(&ctx).await.map_err(into_unit_error)
    }
}

fn into_unit_error(err: RuntimeError) -> UnitError {
    match err {
        RuntimeError::Canceled => UnitError::Canceled,
        other => UnitError::fail(other.to_string()),
    }
}

/// Awaits every fan-out task. Per-unit outcomes already live in the registry.
///
/// Dropping this future detaches the remaining tasks.
async fn join_fanout(tasks: Vec<JoinHandle<Result<(), RuntimeError>>>) {
    for task in tasks {
        if let Err(je) = task.await {
            tracing::warn!(error = %je, "unit fan-out task failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policies::RestartPolicy;
    use crate::subscribers::SubscribeFn;
    use crate::events::Event;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct FakeUnit {
        fail_start: AtomicBool,
        fail_stop: AtomicBool,
        panic_start: AtomicBool,
        /// Per-call start outcomes (true = fail), consumed when a call begins;
        /// `fail_start` decides once the script is empty.
        start_script: Mutex<VecDeque<bool>>,
        start_delay: Duration,
        stop_delay: Duration,
        starts: AtomicU32,
        stops: AtomicU32,
    }

    impl FakeUnit {
        fn starts(&self) -> u32 {
            self.starts.load(Ordering::SeqCst)
        }
        fn stops(&self) -> u32 {
            self.stops.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Unit for FakeUnit {
        fn name(&self) -> &str {
            "fake"
        }

        async fn start(&self, ctx: CancellationToken) -> Result<(), UnitError> {
            self.starts.fetch_add(1, Ordering::SeqCst);
            let scripted = self.start_script.lock().unwrap().pop_front();
            let fail = scripted.unwrap_or_else(|| self.fail_start.load(Ordering::SeqCst));
            if !self.start_delay.is_zero() {
                tokio::select! {
                    _ = time::sleep(self.start_delay) => {}
                    _ = ctx.cancelled() => return Err(UnitError::Canceled),
                }
            }
            if self.panic_start.load(Ordering::SeqCst) {
                panic!("unit exploded");
            }
            if fail {
                return Err(UnitError::fail("start refused"));
            }
            Ok(())
        }

        async fn stop(&self, _ctx: CancellationToken) -> Result<(), UnitError> {
            self.stops.fetch_add(1, Ordering::SeqCst);
            if !self.stop_delay.is_zero() {
                time::sleep(self.stop_delay).await;
            }
            if self.fail_stop.load(Ordering::SeqCst) {
                return Err(UnitError::fail("stop refused"));
            }
            Ok(())
        }
    }

    type Events = Arc<Mutex<Vec<(UnitId, Status)>>>;

    fn supervisor(scan_interval: Duration) -> (Arc<Supervisor>, Events) {
        let events: Events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let recorder = SubscribeFn::arc("recorder", move |ev: &Event| {
            if let Some(st) = &ev.state {
                sink.lock().unwrap().push((st.id.clone(), st.status));
            }
        });
        let cfg = SupervisorConfig {
            scan_interval,
            grace: Duration::from_secs(1),
            ..SupervisorConfig::default()
        };
        let sup = Supervisor::builder(cfg).with_subscriber(recorder).build();
        (sup, events)
    }

    fn id(s: &str) -> UnitId {
        UnitId::from(s)
    }

    fn status(sup: &Supervisor, unit: &str) -> Status {
        sup.get_one(&id(unit)).unwrap().unwrap().status
    }

    fn history(events: &Events, unit: &str) -> Vec<Status> {
        events
            .lock()
            .unwrap()
            .iter()
            .filter(|(i, _)| i.as_str() == unit)
            .map(|(_, s)| *s)
            .collect()
    }

    /// Lets spawned relaunches and subscriber workers run.
    async fn settle() {
        for _ in 0..50 {
            tokio::task::yield_now().await;
        }
    }

    fn on_failure(max: u32, delay: Duration) -> Policy {
        Policy::default()
            .with_restart(RestartPolicy::OnFailure)
            .with_max_restart_attempts(max)
            .with_restart_delay(delay)
    }

    #[tokio::test(start_paused = true)]
    async fn failing_unit_is_retried_until_max_attempts() {
        let (sup, events) = supervisor(Duration::from_secs(10));
        let a = Arc::new(FakeUnit {
            fail_start: AtomicBool::new(true),
            ..FakeUnit::default()
        });
        let mut policies = HashMap::new();
        policies.insert(id("a"), on_failure(3, Duration::from_secs(5)));
        sup.initialize(vec![(id("a"), a.clone() as UnitRef)], policies)
            .unwrap();

        let token = CancellationToken::new();
        sup.start_all(&token).await.unwrap();
        let st = sup.get_one(&id("a")).unwrap().unwrap();
        assert_eq!(st.status, Status::Failed);
        assert_eq!(st.restart_attempts, 0);
        assert_eq!(st.last_error, Some(UnitError::fail("start refused")));

        time::sleep(Duration::from_millis(500)).await;
        for n in 1..=3 {
            time::sleep(Duration::from_secs(10)).await;
            settle().await;
            let st = sup.get_one(&id("a")).unwrap().unwrap();
            assert_eq!(st.status, Status::Failed);
            assert_eq!(st.restart_attempts, n);
        }

        time::sleep(Duration::from_secs(60)).await;
        settle().await;
        assert_eq!(sup.get_one(&id("a")).unwrap().unwrap().restart_attempts, 3);
        assert_eq!(a.starts(), 4);

        use Status::*;
        assert_eq!(
            history(&events, "a"),
            vec![
                Starting, Failed, Restarting, Failed, Restarting, Failed, Restarting, Failed
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn restart_waits_for_restart_delay() {
        let (sup, _events) = supervisor(Duration::from_secs(10));
        let a = Arc::new(FakeUnit {
            fail_start: AtomicBool::new(true),
            ..FakeUnit::default()
        });
        let mut policies = HashMap::new();
        policies.insert(id("a"), on_failure(5, Duration::from_secs(15)));
        sup.initialize(vec![(id("a"), a.clone() as UnitRef)], policies)
            .unwrap();
        sup.start_all(&CancellationToken::new()).await.unwrap();

        // tick at 10s: only 10s of dwell
        time::sleep(Duration::from_millis(10_500)).await;
        settle().await;
        assert_eq!(a.starts(), 1);

        // tick at 20s: dwell satisfied
        time::sleep(Duration::from_secs(10)).await;
        settle().await;
        assert_eq!(a.starts(), 2);
        assert_eq!(
            sup.get_one(&id("a")).unwrap().unwrap().restart_attempts,
            1
        );
    }

    #[tokio::test(start_paused = true)]
    async fn recovered_unit_resets_attempts() {
        let (sup, _events) = supervisor(Duration::from_secs(10));
        let a = Arc::new(FakeUnit {
            fail_start: AtomicBool::new(true),
            ..FakeUnit::default()
        });
        let mut policies = HashMap::new();
        policies.insert(id("a"), on_failure(5, Duration::from_secs(1)));
        sup.initialize(vec![(id("a"), a.clone() as UnitRef)], policies)
            .unwrap();
        sup.start_all(&CancellationToken::new()).await.unwrap();

        time::sleep(Duration::from_millis(10_500)).await;
        settle().await;
        assert_eq!(sup.get_one(&id("a")).unwrap().unwrap().restart_attempts, 1);

        a.fail_start.store(false, Ordering::SeqCst);
        time::sleep(Duration::from_secs(10)).await;
        settle().await;
        let st = sup.get_one(&id("a")).unwrap().unwrap();
        assert_eq!(st.status, Status::Running);
        assert_eq!(st.restart_attempts, 0);
        assert!(st.last_error.is_none());
    }

    #[tokio::test]
    async fn manual_unit_waits_for_start_one() {
        let (sup, _events) = supervisor(Duration::from_secs(10));
        let mut policies = HashMap::new();
        policies.insert(
            id("b"),
            Policy::default().with_startup(StartupPolicy::Manual),
        );
        sup.initialize(
            vec![(id("b"), Arc::new(FakeUnit::default()) as UnitRef)],
            policies,
        )
        .unwrap();

        let token = CancellationToken::new();
        sup.start_all(&token).await.unwrap();
        assert_eq!(status(&sup, "b"), Status::Stopped);

        sup.start_one(&id("b"), &token).await.unwrap();
        assert_eq!(status(&sup, "b"), Status::Running);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_restart_policy_leaves_unit_failed() {
        let (sup, _events) = supervisor(Duration::from_secs(10));
        let c = Arc::new(FakeUnit::default());
        sup.initialize(vec![(id("c"), c.clone() as UnitRef)], HashMap::new())
            .unwrap();

        let token = CancellationToken::new();
        sup.start_all(&token).await.unwrap();
        let st = sup.get_one(&id("c")).unwrap().unwrap();
        assert_eq!(st.status, Status::Running);
        assert_eq!(st.restart_attempts, 0);

        // a failed stop is the way a running unit lands in Failed
        c.fail_stop.store(true, Ordering::SeqCst);
        sup.stop_one(&id("c"), &token).await.unwrap();
        assert_eq!(status(&sup, "c"), Status::Failed);

        time::sleep(Duration::from_secs(120)).await;
        settle().await;
        assert_eq!(status(&sup, "c"), Status::Failed);
        assert_eq!(c.starts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_stop_one_stops_once() {
        let (sup, events) = supervisor(Duration::from_secs(10));
        let d = Arc::new(FakeUnit {
            stop_delay: Duration::from_secs(1),
            ..FakeUnit::default()
        });
        sup.initialize(vec![(id("d"), d.clone() as UnitRef)], HashMap::new())
            .unwrap();
        let token = CancellationToken::new();
        sup.start_all(&token).await.unwrap();

        let d_id = id("d");
        let (r1, r2) = tokio::join!(sup.stop_one(&d_id, &token), sup.stop_one(&d_id, &token));
        r1.unwrap();
        r2.unwrap();
        settle().await;

        assert_eq!(d.stops(), 1);
        assert_eq!(status(&sup, "d"), Status::Stopped);
        assert_eq!(
            history(&events, "d"),
            vec![
                Status::Starting,
                Status::Running,
                Status::Stopping,
                Status::Stopped
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_start_one_starts_once() {
        let (sup, events) = supervisor(Duration::from_secs(10));
        let e = Arc::new(FakeUnit {
            start_delay: Duration::from_secs(1),
            ..FakeUnit::default()
        });
        let mut policies = HashMap::new();
        policies.insert(
            id("e"),
            Policy::default().with_startup(StartupPolicy::Manual),
        );
        sup.initialize(vec![(id("e"), e.clone() as UnitRef)], policies)
            .unwrap();

        let token = CancellationToken::new();
        let e_id = id("e");
        let (r1, r2) =
            tokio::join!(sup.start_one(&e_id, &token), sup.start_one(&e_id, &token));
        r1.unwrap();
        r2.unwrap();
        settle().await;

        assert_eq!(e.starts(), 1);
        assert_eq!(
            history(&events, "e"),
            vec![Status::Starting, Status::Running]
        );
    }

    #[tokio::test]
    async fn start_one_on_running_unit_is_a_no_op() {
        let (sup, events) = supervisor(Duration::from_secs(10));
        let u = Arc::new(FakeUnit::default());
        sup.initialize(vec![(id("u"), u.clone() as UnitRef)], HashMap::new())
            .unwrap();
        let token = CancellationToken::new();
        sup.start_all(&token).await.unwrap();
        settle().await;
        let before = sup.get_one(&id("u")).unwrap().unwrap();
        let seen = events.lock().unwrap().len();

        sup.start_one(&id("u"), &token).await.unwrap();
        settle().await;

        let after = sup.get_one(&id("u")).unwrap().unwrap();
        assert_eq!(after.status, Status::Running);
        assert_eq!(after.restart_attempts, before.restart_attempts);
        assert_eq!(after.changed_at(), before.changed_at());
        assert_eq!(events.lock().unwrap().len(), seen);
        assert_eq!(u.starts(), 1);
    }

    #[tokio::test]
    async fn start_all_isolates_failures() {
        let (sup, _events) = supervisor(Duration::from_secs(10));
        let ok = Arc::new(FakeUnit::default());
        let bad = Arc::new(FakeUnit {
            fail_start: AtomicBool::new(true),
            ..FakeUnit::default()
        });
        let boom = Arc::new(FakeUnit {
            panic_start: AtomicBool::new(true),
            ..FakeUnit::default()
        });
        sup.initialize(
            vec![
                (id("ok"), ok.clone() as UnitRef),
                (id("bad"), bad.clone() as UnitRef),
                (id("boom"), boom.clone() as UnitRef),
            ],
            HashMap::new(),
        )
        .unwrap();

        sup.start_all(&CancellationToken::new()).await.unwrap();

        let all = sup.get_all().unwrap();
        assert!(all.values().all(|s| !s.status.is_transient()));
        assert_eq!(all[&id("ok")].status, Status::Running);
        assert_eq!(all[&id("bad")].status, Status::Failed);
        assert_eq!(all[&id("boom")].status, Status::Failed);
        assert!(matches!(
            all[&id("boom")].last_error,
            Some(UnitError::Panicked { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_all_disarms_scanner_before_stopping() {
        let (sup, events) = supervisor(Duration::from_secs(10));
        let flaky = Arc::new(FakeUnit {
            fail_start: AtomicBool::new(true),
            ..FakeUnit::default()
        });
        let steady = Arc::new(FakeUnit::default());
        let mut policies = HashMap::new();
        policies.insert(id("flaky"), on_failure(5, Duration::from_secs(1)));
        sup.initialize(
            vec![
                (id("flaky"), flaky.clone() as UnitRef),
                (id("steady"), steady.clone() as UnitRef),
            ],
            policies,
        )
        .unwrap();

        let token = CancellationToken::new();
        sup.start_all(&token).await.unwrap();
        assert!(sup.is_scanning());

        sup.stop_all(&token).await.unwrap();
        assert!(!sup.is_scanning());
        assert_eq!(status(&sup, "steady"), Status::Stopped);
        assert_eq!(status(&sup, "flaky"), Status::Failed);

        time::sleep(Duration::from_secs(60)).await;
        settle().await;
        assert_eq!(flaky.starts(), 1);
        assert!(!history(&events, "flaky").contains(&Status::Restarting));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_all_overtakes_a_restart_in_flight() {
        let (sup, _events) = supervisor(Duration::from_secs(10));
        let a = Arc::new(FakeUnit {
            fail_start: AtomicBool::new(true),
            start_delay: Duration::from_secs(2),
            ..FakeUnit::default()
        });
        let mut policies = HashMap::new();
        policies.insert(id("a"), on_failure(5, Duration::from_secs(1)));
        sup.initialize(vec![(id("a"), a.clone() as UnitRef)], policies)
            .unwrap();

        let token = CancellationToken::new();
        sup.start_all(&token).await.unwrap(); // fails at t=2s
        a.fail_start.store(false, Ordering::SeqCst);

        // tick at 10s relaunches; the relaunch completes at 12s
        time::sleep(Duration::from_secs(9)).await;
        settle().await;
        assert_eq!(status(&sup, "a"), Status::Restarting);

        sup.stop_all(&token).await.unwrap();
        assert_eq!(status(&sup, "a"), Status::Stopped);

        time::sleep(Duration::from_secs(5)).await;
        settle().await;
        assert_eq!(status(&sup, "a"), Status::Stopped);
    }

    #[tokio::test]
    async fn structural_misuse_is_reported() {
        let (sup, _events) = supervisor(Duration::from_secs(10));
        let token = CancellationToken::new();

        assert_eq!(
            sup.start_all(&token).await,
            Err(RuntimeError::NotInitialized)
        );
        assert_eq!(sup.get_all().err(), Some(RuntimeError::NotInitialized));

        sup.initialize(Vec::new(), HashMap::new()).unwrap();
        assert_eq!(
            sup.initialize(Vec::new(), HashMap::new()),
            Err(RuntimeError::AlreadyInitialized)
        );
        assert_eq!(
            sup.start_one(&id("ghost"), &token).await,
            Err(RuntimeError::UnknownUnit { id: id("ghost") })
        );
        assert!(matches!(sup.get_one(&id("ghost")), Ok(None)));
    }

    #[tokio::test]
    async fn cancelled_token_leaves_state_untouched() {
        let (sup, events) = supervisor(Duration::from_secs(10));
        let u = Arc::new(FakeUnit::default());
        sup.initialize(vec![(id("u"), u.clone() as UnitRef)], HashMap::new())
            .unwrap();

        let token = CancellationToken::new();
        token.cancel();
        assert_eq!(
            sup.start_one(&id("u"), &token).await,
            Err(RuntimeError::Canceled)
        );
        assert_eq!(sup.start_all(&token).await, Err(RuntimeError::Canceled));
        settle().await;

        assert_eq!(status(&sup, "u"), Status::Stopped);
        assert_eq!(u.starts(), 0);
        assert!(events.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_observed_by_unit_is_recorded() {
        let (sup, _events) = supervisor(Duration::from_secs(10));
        let slow = Arc::new(FakeUnit {
            start_delay: Duration::from_secs(30),
            ..FakeUnit::default()
        });
        sup.initialize(vec![(id("slow"), slow.clone() as UnitRef)], HashMap::new())
            .unwrap();

        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            time::sleep(Duration::from_secs(1)).await;
            canceller.cancel();
        });

        assert_eq!(
            sup.start_one(&id("slow"), &token).await,
            Err(RuntimeError::Canceled)
        );
        let st = sup.get_one(&id("slow")).unwrap().unwrap();
        assert_eq!(st.status, Status::Failed);
        assert_eq!(st.last_error, Some(UnitError::Canceled));
    }

    #[tokio::test]
    async fn snapshots_are_copies() {
        let (sup, _events) = supervisor(Duration::from_secs(10));
        sup.initialize(
            vec![(id("u"), Arc::new(FakeUnit::default()) as UnitRef)],
            HashMap::new(),
        )
        .unwrap();

        let mut all = sup.get_all().unwrap();
        if let Some(st) = all.get_mut(&id("u")) {
            st.status = Status::Running;
            st.restart_attempts = 42;
        }
        let fresh = sup.get_one(&id("u")).unwrap().unwrap();
        assert_eq!(fresh.status, Status::Stopped);
        assert_eq!(fresh.restart_attempts, 0);
    }

    #[tokio::test]
    async fn supervisor_never_supervises_itself() {
        let (sup, _events) = supervisor(Duration::from_secs(10));
        sup.initialize(
            vec![
                (id("me"), Arc::clone(&sup) as UnitRef),
                (id("u"), Arc::new(FakeUnit::default()) as UnitRef),
            ],
            HashMap::new(),
        )
        .unwrap();
        assert_eq!(sup.ids().unwrap(), vec![id("u")]);
    }

    #[tokio::test]
    async fn nested_supervisor_is_a_unit() {
        let (inner, _inner_events) = supervisor(Duration::from_secs(10));
        let leaf = Arc::new(FakeUnit::default());
        inner
            .initialize(vec![(id("leaf"), leaf.clone() as UnitRef)], HashMap::new())
            .unwrap();

        let (outer, _outer_events) = supervisor(Duration::from_secs(10));
        outer
            .initialize(
                vec![(id("inner"), Arc::clone(&inner) as UnitRef)],
                HashMap::new(),
            )
            .unwrap();

        let token = CancellationToken::new();
        outer.start_all(&token).await.unwrap();
        assert_eq!(status(&outer, "inner"), Status::Running);
        assert_eq!(status(&inner, "leaf"), Status::Running);

        outer.stop_all(&token).await.unwrap();
        assert_eq!(status(&outer, "inner"), Status::Stopped);
        assert_eq!(status(&inner, "leaf"), Status::Stopped);
        assert_eq!(leaf.stops(), 1);
    }

    #[tokio::test]
    async fn unsubscribed_handler_misses_later_transitions() {
        let (sup, _events) = supervisor(Duration::from_secs(10));
        sup.initialize(
            vec![(id("u"), Arc::new(FakeUnit::default()) as UnitRef)],
            HashMap::new(),
        )
        .unwrap();

        let count = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&count);
        let sub = sup.subscribe(SubscribeFn::arc("counter", move |_ev: &Event| {
            c.fetch_add(1, Ordering::SeqCst);
        }));

        let token = CancellationToken::new();
        sup.start_one(&id("u"), &token).await.unwrap();
        settle().await;
        assert_eq!(count.load(Ordering::SeqCst), 2);

        assert!(sup.unsubscribe(sub));
        sup.stop_one(&id("u"), &token).await.unwrap();
        settle().await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn run_stops_units_on_cancellation() {
        let (sup, _events) = supervisor(Duration::from_secs(10));
        sup.initialize(
            vec![
                (id("a"), Arc::new(FakeUnit::default()) as UnitRef),
                (id("b"), Arc::new(FakeUnit::default()) as UnitRef),
            ],
            HashMap::new(),
        )
        .unwrap();

        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            time::sleep(Duration::from_secs(1)).await;
            canceller.cancel();
        });

        sup.run(&token).await.unwrap();
        assert!(
            sup.get_all()
                .unwrap()
                .values()
                .all(|s| s.status == Status::Stopped)
        );
        assert!(!sup.is_scanning());
    }

    #[tokio::test(start_paused = true)]
    async fn run_reports_units_stuck_past_grace() {
        let (sup, _events) = supervisor(Duration::from_secs(10));
        sup.initialize(
            vec![
                (
                    id("slow"),
                    Arc::new(FakeUnit {
                        stop_delay: Duration::from_secs(5),
                        ..FakeUnit::default()
                    }) as UnitRef,
                ),
                (id("ok"), Arc::new(FakeUnit::default()) as UnitRef),
            ],
            HashMap::new(),
        )
        .unwrap();

        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            time::sleep(Duration::from_secs(1)).await;
            canceller.cancel();
        });
        match sup.run(&token).await {
            Err(RuntimeError::GraceExceeded { grace, stuck }) => {
                assert_eq!(grace, Duration::from_secs(1));
                assert_eq!(stuck, vec![id("slow")]);
            }
            other => panic!("expected GraceExceeded, got {other:?}"),
        }
        assert_eq!(status(&sup, "slow"), Status::Stopping);

        // the stop keeps running after run() gave up on it
        time::sleep(Duration::from_secs(10)).await;
        settle().await;
        assert_eq!(status(&sup, "slow"), Status::Stopped);
        assert_eq!(status(&sup, "ok"), Status::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_start_all_still_settles() {
        let (sup, _events) = supervisor(Duration::from_secs(10));
        let slow = Arc::new(FakeUnit {
            start_delay: Duration::from_secs(60),
            ..FakeUnit::default()
        });
        sup.initialize(vec![(id("slow"), slow.clone() as UnitRef)], HashMap::new())
            .unwrap();

        let token = CancellationToken::new();
        assert!(
            time::timeout(Duration::from_secs(1), sup.start_all(&token))
                .await
                .is_err()
        );
        assert_eq!(status(&sup, "slow"), Status::Starting);

        time::sleep(Duration::from_secs(70)).await;
        settle().await;
        assert_eq!(status(&sup, "slow"), Status::Running);

        sup.stop_one(&id("slow"), &token).await.unwrap();
        assert_eq!(status(&sup, "slow"), Status::Stopped);
        assert_eq!(slow.starts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn late_relaunch_failure_does_not_override_stop() {
        let (sup, _events) = supervisor(Duration::from_secs(10));
        let a = Arc::new(FakeUnit {
            fail_start: AtomicBool::new(true),
            start_delay: Duration::from_secs(2),
            stop_delay: Duration::from_secs(5),
            ..FakeUnit::default()
        });
        let mut policies = HashMap::new();
        policies.insert(id("a"), on_failure(5, Duration::from_secs(1)));
        sup.initialize(vec![(id("a"), a.clone() as UnitRef)], policies)
            .unwrap();

        let token = CancellationToken::new();
        sup.start_all(&token).await.unwrap(); // Failed at t=2s

        // tick at 10s relaunches; the relaunch fails at 12s, mid-stop
        time::sleep(Duration::from_secs(9)).await;
        settle().await;
        assert_eq!(status(&sup, "a"), Status::Restarting);

        sup.stop_one(&id("a"), &token).await.unwrap(); // 11s..16s
        let st = sup.get_one(&id("a")).unwrap().unwrap();
        assert_eq!(st.status, Status::Stopped);
        assert!(st.last_error.is_none());
        assert_eq!(a.starts(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn late_relaunch_success_does_not_override_manual_start() {
        let (sup, _events) = supervisor(Duration::from_secs(10));
        let a = Arc::new(FakeUnit {
            start_delay: Duration::from_secs(2),
            // initial start fails, relaunch succeeds, manual start fails
            start_script: Mutex::new(VecDeque::from([true, false, true])),
            ..FakeUnit::default()
        });
        let mut policies = HashMap::new();
        policies.insert(id("a"), on_failure(5, Duration::from_secs(1)));
        sup.initialize(vec![(id("a"), a.clone() as UnitRef)], policies)
            .unwrap();

        let token = CancellationToken::new();
        sup.start_all(&token).await.unwrap(); // Failed at t=2s

        // tick at 10s relaunches; the relaunch succeeds at 12s
        time::sleep(Duration::from_secs(9)).await;
        settle().await;
        assert_eq!(status(&sup, "a"), Status::Restarting);

        sup.stop_one(&id("a"), &token).await.unwrap(); // immediate
        assert_eq!(status(&sup, "a"), Status::Stopped);

        sup.start_one(&id("a"), &token).await.unwrap(); // 11s..13s, fails
        let st = sup.get_one(&id("a")).unwrap().unwrap();
        assert_eq!(st.status, Status::Failed);
        assert_eq!(st.last_error, Some(UnitError::fail("start refused")));
        assert_eq!(a.starts(), 3);
    }
}

//! # Custom Subscriber Example
//!
//! Implements a subscriber that counts transitions per status and prints a
//! summary once the supervised set is stopped.
//!
//! ## Run
//! ```bash
//! cargo run --example subscriber
//! ```

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicU32, AtomicU64, Ordering},
    },
    time::Duration,
};

use tokio_util::sync::CancellationToken;
use watchvisor::{
    Event, EventKind, Policy, RestartPolicy, Status, Subscribe, Supervisor, SupervisorConfig,
    UnitError, UnitFn, UnitId, UnitRef,
};

#[derive(Default)]
struct TransitionCounter {
    running: AtomicU64,
    failed: AtomicU64,
    restarting: AtomicU64,
    stopped: AtomicU64,
}

impl TransitionCounter {
    fn print_stats(&self) {
        println!();
        println!("Transitions:");
        println!(" ├─► Running:    {}", self.running.load(Ordering::Relaxed));
        println!(" ├─► Failed:     {}", self.failed.load(Ordering::Relaxed));
        println!(" ├─► Restarting: {}", self.restarting.load(Ordering::Relaxed));
        println!(" └─► Stopped:    {}", self.stopped.load(Ordering::Relaxed));
    }
}

#[async_trait::async_trait]
impl Subscribe for TransitionCounter {
    async fn on_event(&self, ev: &Event) {
        if ev.kind != EventKind::StatusChanged {
            return;
        }
        let Some(state) = &ev.state else { return };
        let counter = match state.status {
            Status::Running => &self.running,
            Status::Failed => &self.failed,
            Status::Restarting => &self.restarting,
            Status::Stopped => &self.stopped,
            _ => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        println!("[{}] {} → {}", ev.seq, state.id, state.status);
    }

    fn name(&self) -> &'static str {
        "transition-counter"
    }
}

fn flaky() -> UnitRef {
    let calls = Arc::new(AtomicU32::new(0));
    UnitFn::arc(
        "flaky",
        move |_ctx: CancellationToken| {
            let n = calls.fetch_add(1, Ordering::Relaxed) + 1;
            async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                if n < 3 {
                    Err(UnitError::fail(format!("warming up ({n})")))
                } else {
                    Ok(())
                }
            }
        },
        |_ctx: CancellationToken| async { Ok::<_, UnitError>(()) },
    )
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let counter = Arc::new(TransitionCounter::default());

    let cfg = SupervisorConfig {
        scan_interval: Duration::from_millis(200),
        ..SupervisorConfig::default()
    };
    let sup = Supervisor::builder(cfg)
        .with_subscriber(counter.clone())
        .build();

    let mut policies = HashMap::new();
    policies.insert(
        UnitId::from("flaky"),
        Policy::default()
            .with_restart(RestartPolicy::OnFailure)
            .with_restart_delay(Duration::from_millis(100)),
    );
    sup.initialize(vec![(UnitId::from("flaky"), flaky())], policies)?;

    let token = CancellationToken::new();
    sup.start_all(&token).await?;
    tokio::time::sleep(Duration::from_secs(2)).await;
    sup.stop_all(&token).await?;

    // let the subscriber worker drain its queue
    tokio::time::sleep(Duration::from_millis(50)).await;
    counter.print_stats();
    Ok(())
}

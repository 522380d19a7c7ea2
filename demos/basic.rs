//! # Basic Example
//!
//! Supervises two units until Ctrl-C:
//! - `heartbeat` starts automatically and runs a background ticker
//! - `mailer` fails to start twice and is relaunched by the restart scanner
//!
//! Transitions are written through the built-in [`LogWriter`](watchvisor::LogWriter).
//!
//! ## Run
//! ```bash
//! RUST_LOG=info cargo run --example basic --features logging
//! ```

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicU32, Ordering},
    },
    time::Duration,
};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use watchvisor::{
    LogWriter, Policy, RestartPolicy, Supervisor, SupervisorConfig, UnitError, UnitFn, UnitId,
    UnitRef,
};

fn heartbeat() -> UnitRef {
    let worker: Arc<Mutex<Option<(CancellationToken, JoinHandle<()>)>>> = Arc::default();
    let on_start = Arc::clone(&worker);
    let on_stop = worker;

    UnitFn::arc(
        "heartbeat",
        move |_ctx: CancellationToken| {
            let slot = Arc::clone(&on_start);
            async move {
                let stop = CancellationToken::new();
                let child = stop.clone();
                let handle = tokio::spawn(async move {
                    let mut ticker = tokio::time::interval(Duration::from_secs(2));
                    loop {
                        tokio::select! {
                            _ = child.cancelled() => break,
                            _ = ticker.tick() => tracing::info!("heartbeat"),
                        }
                    }
                });
                *slot.lock().map_err(|_| UnitError::fail("poisoned"))? = Some((stop, handle));
                Ok(())
            }
        },
        move |_ctx: CancellationToken| {
            let slot = Arc::clone(&on_stop);
            async move {
                let taken = slot.lock().map_err(|_| UnitError::fail("poisoned"))?.take();
                if let Some((stop, handle)) = taken {
                    stop.cancel();
                    handle
                        .await
                        .map_err(|e| UnitError::fail(e.to_string()))?;
                }
                Ok(())
            }
        },
    )
}

fn mailer() -> UnitRef {
    let attempts = Arc::new(AtomicU32::new(0));
    UnitFn::arc(
        "mailer",
        move |_ctx: CancellationToken| {
            let n = attempts.fetch_add(1, Ordering::Relaxed) + 1;
            async move {
                if n <= 2 {
                    Err(UnitError::fail(format!("smtp unreachable (attempt {n})")))
                } else {
                    Ok(())
                }
            }
        },
        |_ctx: CancellationToken| async { Ok::<_, UnitError>(()) },
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = SupervisorConfig {
        scan_interval: Duration::from_secs(1),
        grace: Duration::from_secs(5),
        ..SupervisorConfig::default()
    };
    let sup = Supervisor::builder(cfg)
        .with_subscriber(Arc::new(LogWriter::new()))
        .build();

    let mut policies = HashMap::new();
    policies.insert(
        UnitId::from("mailer"),
        Policy::default()
            .with_restart(RestartPolicy::OnFailure)
            .with_restart_delay(Duration::from_secs(2)),
    );
    sup.initialize(
        vec![
            (UnitId::from("heartbeat"), heartbeat()),
            (UnitId::from("mailer"), mailer()),
        ],
        policies,
    )?;

    println!("running; press Ctrl-C to stop");
    sup.run(&CancellationToken::new()).await?;
    Ok(())
}

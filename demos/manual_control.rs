//! # Manual Control Example
//!
//! Drives units by hand:
//! - `api` starts with `start_all`; `admin` is `Manual` and waits for `start_one`
//! - a closure subscriber prints every transition
//! - shutdown walks `ids()` in reverse registration order
//!
//! ## Run
//! ```bash
//! cargo run --example manual_control
//! ```

use std::{collections::HashMap, time::Duration};

use tokio_util::sync::CancellationToken;
use watchvisor::{
    Event, Policy, StartupPolicy, SubscribeFn, Supervisor, SupervisorConfig, UnitError, UnitFn,
    UnitId, UnitRef,
};

fn unit(name: &'static str) -> UnitRef {
    UnitFn::arc(
        name,
        move |_ctx: CancellationToken| async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            println!("  {name}: started");
            Ok::<_, UnitError>(())
        },
        move |_ctx: CancellationToken| async move {
            println!("  {name}: stopped");
            Ok::<_, UnitError>(())
        },
    )
}

fn print_table(sup: &Supervisor) -> anyhow::Result<()> {
    for (id, st) in sup.get_all()? {
        println!("  {id:<8} {:<10} attempts={}", st.status, st.restart_attempts);
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let sup = Supervisor::builder(SupervisorConfig::default()).build();
    sup.subscribe(SubscribeFn::arc("printer", |ev: &Event| {
        if let Some(st) = &ev.state {
            println!("event #{}: {} is {}", ev.seq, st.id, st.status);
        }
    }));

    let mut policies = HashMap::new();
    policies.insert(
        UnitId::from("admin"),
        Policy::default().with_startup(StartupPolicy::Manual),
    );
    sup.initialize(
        vec![
            (UnitId::from("db"), unit("db")),
            (UnitId::from("api"), unit("api")),
            (UnitId::from("admin"), unit("admin")),
        ],
        policies,
    )?;

    let token = CancellationToken::new();

    println!("start_all:");
    sup.start_all(&token).await?;
    print_table(&sup)?;

    println!("start_one(admin):");
    sup.start_one(&UnitId::from("admin"), &token).await?;
    print_table(&sup)?;

    println!("ordered shutdown:");
    for id in sup.ids()?.into_iter().rev() {
        sup.stop_one(&id, &token).await?;
    }
    print_table(&sup)?;

    tokio::time::sleep(Duration::from_millis(20)).await;
    Ok(())
}

//! # Event fan-out to multiple subscribers.
//!
//! Provides [`SubscriberSet`], the supervisor's event sink. It distributes
//! events to every registered subscriber without blocking the publisher.
//!
//! ## Architecture
//! ```text
//! emit(event)
//!     │
//!     ├──► [queue 1] ──► worker 1 ──► subscriber1.on_event()
//!     │                      └──────► panic → SubscriberPanicked
//!     ├──► [queue 2] ──► worker 2 ──► subscriber2.on_event()
//!     └──► [queue N] ──► worker N ──► subscriberN.on_event()
//! ```
//!
//! ## Rules
//! - **Exactly once**: queues are unbounded, nothing is dropped
//! - **Per-subscriber FIFO**: each subscriber sees events in emission order
//! - **No cross-subscriber ordering**: subscriber A may process event N while B processes N+5
//! - **Non-blocking**: `emit()` only enqueues; it is safe to call under a unit's lock
//! - **Isolation**: a slow or panicking subscriber doesn't affect others
//!
//! ## Panic handling
//! Worker tasks use `catch_unwind`: the panic is logged, converted to a
//! `SubscriberPanicked` event for the other subscribers, and the worker moves on.
//!
//! **Warning**: `AssertUnwindSafe` is used, which can leave shared state inconsistent
//! if a subscriber uses `Arc<Mutex<T>>` and panics while holding the lock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::error::panic_message;
use crate::events::Event;
use crate::subscribers::Subscribe;

/// Handle returned by [`SubscriberSet::subscribe`], used to unsubscribe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Per-subscriber channel metadata.
struct SubscriberChannel {
    id: SubscriptionId,
    name: &'static str,
    sender: mpsc::UnboundedSender<Arc<Event>>,
    worker: JoinHandle<()>,
}

/// Fan-out coordinator for event subscribers.
///
/// Workers are spawned on the current tokio runtime, so subscribing must happen
/// inside one.
pub struct SubscriberSet {
    channels: RwLock<Vec<SubscriberChannel>>,
    /// Workers of removed subscribers still draining their queues.
    retired: Mutex<Vec<JoinHandle<()>>>,
    next_id: AtomicU64,
    me: Weak<SubscriberSet>,
}

impl SubscriberSet {
    /// Creates a new set and spawns one worker task per subscriber.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>) -> Arc<Self> {
        let set = Arc::new_cyclic(|me| Self {
            channels: RwLock::new(Vec::with_capacity(subs.len())),
            retired: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
            me: me.clone(),
        });
        for sub in subs {
            set.subscribe(sub);
        }
        set
    }

    /// Registers a subscriber; it receives every event emitted from now on.
    pub fn subscribe(&self, sub: Arc<dyn Subscribe>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let name = sub.name();
        let (tx, rx) = mpsc::unbounded_channel::<Arc<Event>>();
        let worker = spawn_worker(sub, rx, self.me.clone());

        self.channels
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(SubscriberChannel {
                id,
                name,
                sender: tx,
                worker,
            });
        tracing::debug!(subscriber = name, "subscriber registered");
        id
    }

    /// Removes a subscriber. Events already queued for it are still delivered.
    ///
    /// Returns false if the id is unknown (already removed).
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut channels = self
            .channels
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        match channels.iter().position(|c| c.id == id) {
            Some(pos) => {
                let SubscriberChannel { name, worker, .. } = channels.remove(pos);
                let mut retired = self.retired.lock().unwrap_or_else(PoisonError::into_inner);
                retired.retain(|w| !w.is_finished());
                retired.push(worker);
                tracing::debug!(subscriber = name, "subscriber removed");
                true
            }
            None => false,
        }
    }

    /// Number of registered subscribers.
    pub fn len(&self) -> usize {
        self.channels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if no subscriber is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Enqueues an event for every subscriber.
    pub fn emit(&self, event: Event) {
        let event = Arc::new(event);
        let channels = self.channels.read().unwrap_or_else(PoisonError::into_inner);
        for channel in channels.iter() {
            if channel.sender.send(Arc::clone(&event)).is_err() {
                tracing::debug!(subscriber = channel.name, "subscriber worker is gone");
            }
        }
    }

    /// Removes every subscriber and waits until their queues are drained,
    /// including queues of subscribers removed earlier.
    pub async fn close(&self) {
        let drained: Vec<SubscriberChannel> = {
            let mut channels = self
                .channels
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            channels.drain(..).collect()
        };

        let mut workers: Vec<JoinHandle<()>> = std::mem::take(
            &mut *self.retired.lock().unwrap_or_else(PoisonError::into_inner),
        );
        for channel in drained {
            drop(channel.sender);
            workers.push(channel.worker);
        }
        for worker in workers {
            let _ = worker.await;
        }
    }
}

fn spawn_worker(
    sub: Arc<dyn Subscribe>,
    mut rx: mpsc::UnboundedReceiver<Arc<Event>>,
    set: Weak<SubscriberSet>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(ev) = rx.recv().await {
            let fut = sub.on_event(ev.as_ref());

            if let Err(panic_err) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
                let info = panic_message(panic_err.as_ref());
                tracing::warn!(subscriber = sub.name(), info = %info, "subscriber panicked");

                // A panic while handling a panic report is not reported again.
                if !ev.is_subscriber_panic() {
                    if let Some(set) = set.upgrade() {
                        set.emit(Event::subscriber_panicked(sub.name(), info));
                    }
                }
            }
        }
    })
}

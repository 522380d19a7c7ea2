//! # Unit registry.
//!
//! The registry maps each [`UnitId`] to its unit handle, its [`Policy`] and its
//! live [`UnitState`]. It is built once by
//! [`Supervisor::initialize`](crate::Supervisor::initialize) and never gains or
//! loses entries afterwards; only the per-entry state changes.
//!
//! ## Architecture
//! ```text
//! Registry
//!   ├─ order:   [id0, id1, ...]            (registration order)
//!   ├─ index:   id → position
//!   └─ entries: [Arc<Entry>, ...]
//!                  └─ Entry { id, unit, policy, state: Mutex<UnitState> }
//! ```
//!
//! ## Rules
//! - Every guard check + transition pair runs under the entry's own mutex
//! - Different units never contend with each other
//! - The transition event is emitted while the mutex is held (per-unit order)
//! - Unit operations (`start`/`stop`) always run outside the mutex

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::core::state::{Status, UnitState};
use crate::error::UnitError;
use crate::events::Event;
use crate::policies::Policy;
use crate::subscribers::SubscriberSet;
use crate::units::{UnitId, UnitRef};

/// One registered unit.
pub(crate) struct Entry {
    pub id: UnitId,
    pub unit: UnitRef,
    pub policy: Policy,
    state: Mutex<UnitState>,
}

impl Entry {
    fn new(id: UnitId, unit: UnitRef, policy: Policy) -> Self {
        Self {
            state: Mutex::new(UnitState::new(id.clone())),
            id,
            unit,
            policy,
        }
    }

    fn lock(&self) -> MutexGuard<'_, UnitState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns a copy of the current state.
    pub fn snapshot(&self) -> UnitState {
        self.lock().clone()
    }

    /// Current status.
    pub fn status(&self) -> Status {
        self.lock().status
    }

    /// Applies `next` if `guard` accepts the current state and the transition is legal.
    ///
    /// Returns the post-transition snapshot, or `None` when nothing changed.
    pub fn transition_if(
        &self,
        guard: impl FnOnce(&UnitState) -> bool,
        next: Status,
        error: Option<UnitError>,
        sink: &SubscriberSet,
    ) -> Option<UnitState> {
        let mut state = self.lock();
        if !guard(&state) || !state.apply(next, error, &self.policy) {
            return None;
        }
        let snapshot = state.clone();
        sink.emit(Event::status_changed(snapshot.clone()));
        Some(snapshot)
    }

    /// Applies `next` if the transition is legal.
    #[cfg(test)]
    pub fn transition(
        &self,
        next: Status,
        error: Option<UnitError>,
        sink: &SubscriberSet,
    ) -> Option<UnitState> {
        self.transition_if(|_| true, next, error, sink)
    }
}

/// Registry of managed units, immutable in shape after construction.
pub(crate) struct Registry {
    entries: Vec<Arc<Entry>>,
    index: HashMap<UnitId, usize>,
}

impl Registry {
    /// Builds the registry.
    ///
    /// - handles pointer-identical to `exclude` are skipped (self-supervision)
    /// - a repeated identity keeps the first registration
    /// - units without an entry in `policies` get `default_policy`
    pub fn build(
        units: impl IntoIterator<Item = (UnitId, UnitRef)>,
        mut policies: HashMap<UnitId, Policy>,
        default_policy: Policy,
        exclude: *const (),
    ) -> Self {
        let mut entries: Vec<Arc<Entry>> = Vec::new();
        let mut index = HashMap::new();

        for (id, unit) in units {
            if std::ptr::eq(Arc::as_ptr(&unit) as *const (), exclude) {
                tracing::debug!(unit = %id, "skipping self-registration of the supervisor");
                continue;
            }
            if index.contains_key(&id) {
                tracing::warn!(unit = %id, "duplicate unit identity; keeping the first registration");
                continue;
            }
            let policy = policies.remove(&id).unwrap_or(default_policy);
            index.insert(id.clone(), entries.len());
            entries.push(Arc::new(Entry::new(id, unit, policy)));
        }

        for id in policies.keys() {
            tracing::debug!(unit = %id, "policy supplied for an unregistered unit; ignored");
        }

        Self { entries, index }
    }

    /// Looks up an entry.
    pub fn get(&self, id: &UnitId) -> Option<&Arc<Entry>> {
        self.index.get(id).map(|&i| &self.entries[i])
    }

    /// Entries in registration order.
    pub fn entries(&self) -> impl Iterator<Item = &Arc<Entry>> {
        self.entries.iter()
    }

    /// Identities in registration order.
    pub fn ids(&self) -> Vec<UnitId> {
        self.entries.iter().map(|e| e.id.clone()).collect()
    }

    /// Snapshot of every unit's state.
    pub fn snapshot(&self) -> BTreeMap<UnitId, UnitState> {
        self.entries
            .iter()
            .map(|e| (e.id.clone(), e.snapshot()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

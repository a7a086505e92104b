// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! State store: authoritative map, optimistic overlay, listener fan-out.

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use super::{MergedState, StateKey, StateValue};

/// Callback receiving a merged-state snapshot on every change.
type Listener = Arc<dyn Fn(MergedState) + Send + Sync>;

#[derive(Default)]
struct Inner {
    next_id: AtomicU64,
    authoritative: RwLock<HashMap<StateKey, StateValue>>,
    overlay: RwLock<HashMap<StateKey, StateValue>>,
    /// Listeners in registration order.
    listeners: RwLock<Vec<(u64, Listener)>>,
}

/// Holds the reconciled view of one feeder's state.
///
/// Writers are the owning session only; any number of readers may take
/// snapshots or subscribe. Every mutation notifies all listeners
/// synchronously, in registration order, with the same owned snapshot.
///
/// Listeners must be fast and must not subscribe or unsubscribe from
/// within a callback; fan-out holds the listener registry for the
/// duration of a notification.
#[derive(Clone, Default)]
pub struct StateStore {
    inner: Arc<Inner>,
}

impl StateStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges an authoritative patch reported by the device.
    ///
    /// Keys in the patch replace or add to the authoritative map; keys
    /// not in the patch are untouched, because polling is incremental
    /// per endpoint (a schedule query must not erase the device name).
    ///
    /// If the patch reports a key that currently has an overlay entry,
    /// the overlay entry is dropped: the device-confirmed value
    /// supersedes the local assertion.
    pub fn merge(&self, patch: impl IntoIterator<Item = (StateKey, StateValue)>) {
        {
            let mut authoritative = self.inner.authoritative.write();
            let mut overlay = self.inner.overlay.write();
            for (key, value) in patch {
                overlay.remove(&key);
                authoritative.insert(key, value);
            }
        }
        self.notify();
    }

    /// Records a locally asserted value for a property the device never
    /// reports back.
    ///
    /// Only call after the corresponding command was confirmed sent;
    /// speculative writes would present unconfirmed state as fact.
    pub fn set_optimistic(&self, key: StateKey, value: impl Into<StateValue>) {
        self.inner.overlay.write().insert(key, value.into());
        self.notify();
    }

    /// Drops all authoritative state, keeping the overlay.
    ///
    /// Used on disconnect: overlay entries represent user intent rather
    /// than device-reported fact and survive a transient disconnect.
    pub fn clear_authoritative(&self) {
        self.inner.authoritative.write().clear();
        self.notify();
    }

    /// Returns an owned snapshot of the merged view (overlay wins on
    /// key collision).
    #[must_use]
    pub fn snapshot(&self) -> MergedState {
        let mut entries = self.inner.authoritative.read().clone();
        for (key, value) in self.inner.overlay.read().iter() {
            entries.insert(*key, value.clone());
        }
        MergedState::new(entries)
    }

    /// Registers a listener; returns the handle that deregisters it.
    ///
    /// Listeners are invoked in registration order on every change.
    pub fn subscribe<F>(&self, listener: F) -> ListenerHandle
    where
        F: Fn(MergedState) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.listeners.write().push((id, Arc::new(listener)));
        ListenerHandle {
            id,
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Returns the number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.read().len()
    }

    fn notify(&self) {
        let snapshot = self.snapshot();
        let listeners = self.inner.listeners.read();
        for (id, listener) in listeners.iter() {
            // One failing listener must not break the rest of the
            // fan-out or surface to the mutating caller.
            let result = catch_unwind(AssertUnwindSafe(|| listener(snapshot.clone())));
            if result.is_err() {
                tracing::warn!(listener = id, "state listener panicked, skipping");
            }
        }
    }
}

impl std::fmt::Debug for StateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateStore")
            .field("authoritative_keys", &self.inner.authoritative.read().len())
            .field("overlay_keys", &self.inner.overlay.read().len())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// Capability that deregisters exactly one listener.
///
/// [`unsubscribe`](Self::unsubscribe) is idempotent; once it returns,
/// the listener will not be invoked again. Dropping the handle without
/// calling it leaves the listener registered.
#[derive(Debug)]
pub struct ListenerHandle {
    id: u64,
    inner: Weak<Inner>,
}

impl ListenerHandle {
    /// Removes the listener this handle was created for.
    pub fn unsubscribe(&self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.listeners.write().retain(|(id, _)| *id != self.id);
        }
    }
}

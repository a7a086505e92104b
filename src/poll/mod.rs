// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Time-driven refresh of a device session.
//!
//! [`PollCoordinator`] runs the cycle `Idle → Refreshing → (Idle |
//! Failed)`: a ticker fires or a caller requests an immediate refresh,
//! the session refreshes, and the merged snapshot is republished to
//! subscribers. A failed cycle is observable but never sticky — the
//! next trigger always gets a fresh attempt.
//!
//! The timer is an explicit injected [`Ticker`] so the cycle is testable
//! with synthetic ticks instead of wall-clock waits.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::{Notify, watch};

use crate::protocol::FeederProtocol;
use crate::session::DeviceSession;
use crate::state::{ListenerHandle, MergedState, StateStore};

/// Default polling interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Observable state of the refresh cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    /// Waiting for the next trigger.
    Idle,
    /// A refresh is in flight.
    Refreshing,
    /// The last cycle produced no update; cleared by the next trigger.
    Failed,
}

/// Source of refresh triggers.
///
/// Production code uses [`IntervalTicker`]; tests drive the coordinator
/// with hand-fed ticks.
#[allow(async_fn_in_trait)]
pub trait Ticker {
    /// Completes when the next tick is due.
    async fn tick(&mut self);
}

/// Ticker backed by `tokio::time::interval`.
#[derive(Debug)]
pub struct IntervalTicker(tokio::time::Interval);

impl IntervalTicker {
    /// Creates a ticker firing every `period`.
    ///
    /// The initial immediate tick of `tokio::time::interval` is kept:
    /// the first cycle runs as soon as the coordinator loop starts.
    #[must_use]
    pub fn new(period: Duration) -> Self {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        Self(interval)
    }
}

impl Ticker for IntervalTicker {
    async fn tick(&mut self) {
        self.0.tick().await;
    }
}

/// Drives time-based refresh of one [`DeviceSession`] and publishes
/// merged snapshots to its subscribers.
///
/// Holds non-owning references to the session and its store; it never
/// mutates either directly. Timer ticks and on-demand refreshes feed
/// the same loop, so two refreshes can never run concurrently from
/// here (and the session's critical section serializes against direct
/// callers as well).
pub struct PollCoordinator<P: FeederProtocol> {
    session: Arc<DeviceSession<P>>,
    store: Arc<StateStore>,
    interval: Duration,
    state: RwLock<PollState>,
    last_cycle_failed: RwLock<bool>,
    feed_portions: RwLock<i64>,
    refresh_requested: Notify,
    shutdown_requested: Notify,
    shutting_down: AtomicBool,
    snapshot_tx: watch::Sender<MergedState>,
    store_listener: parking_lot::Mutex<Option<ListenerHandle>>,
}

impl<P: FeederProtocol> PollCoordinator<P> {
    /// Creates a coordinator for `session`, polling every `interval`.
    ///
    /// Subscribes to the session's store so that command-driven state
    /// changes (e.g. an optimistic child-lock write) are republished
    /// immediately, without waiting for the next cycle.
    #[must_use]
    pub fn new(session: Arc<DeviceSession<P>>, interval: Duration) -> Arc<Self> {
        let store = Arc::clone(session.store());
        let (snapshot_tx, _) = watch::channel(store.snapshot());

        let coordinator = Arc::new(Self {
            session,
            store: Arc::clone(&store),
            interval,
            state: RwLock::new(PollState::Idle),
            last_cycle_failed: RwLock::new(false),
            feed_portions: RwLock::new(1),
            refresh_requested: Notify::new(),
            shutdown_requested: Notify::new(),
            shutting_down: AtomicBool::new(false),
            snapshot_tx,
            store_listener: parking_lot::Mutex::new(None),
        });

        let tx = coordinator.snapshot_tx.clone();
        let handle = store.subscribe(move |snapshot| {
            let _ = tx.send(snapshot);
        });
        *coordinator.store_listener.lock() = Some(handle);

        coordinator
    }

    /// Creates a coordinator with the default 60 second interval.
    #[must_use]
    pub fn with_default_interval(session: Arc<DeviceSession<P>>) -> Arc<Self> {
        Self::new(session, DEFAULT_POLL_INTERVAL)
    }

    /// Returns the configured polling interval.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns the session this coordinator drives.
    #[must_use]
    pub fn session(&self) -> &Arc<DeviceSession<P>> {
        &self.session
    }

    /// Subscribes to merged-state snapshots.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<MergedState> {
        self.snapshot_tx.subscribe()
    }

    /// Returns true if the device session is open.
    ///
    /// Connectivity is independent of the last cycle's outcome: a failed
    /// poll does not necessarily mean disconnected.
    #[must_use]
    pub fn connected(&self) -> bool {
        self.session.is_connected()
    }

    /// Returns the current cycle state.
    #[must_use]
    pub fn poll_state(&self) -> PollState {
        *self.state.read()
    }

    /// Returns true if the most recent cycle produced no update.
    #[must_use]
    pub fn last_cycle_failed(&self) -> bool {
        *self.last_cycle_failed.read()
    }

    /// Returns the portion count the next [`feed_now`](Self::feed_now)
    /// will dispense.
    #[must_use]
    pub fn feed_portions(&self) -> i64 {
        *self.feed_portions.read()
    }

    /// Sets the portion count for subsequent manual feeds.
    ///
    /// Stored as supplied; the session clamps into the motor's 1-15
    /// range when the feed is issued.
    pub fn set_feed_portions(&self, portions: i64) {
        *self.feed_portions.write() = portions;
    }

    /// Dispenses the held portion count now.
    ///
    /// Returns the session's success boolean.
    pub async fn feed_now(&self) -> bool {
        self.session.feed(self.feed_portions()).await
    }

    /// Requests an immediate refresh, e.g. after issuing a command.
    ///
    /// Feeds the same loop as timer ticks; if a cycle is already in
    /// flight the request coalesces into the next one.
    pub fn request_refresh(&self) {
        self.refresh_requested.notify_one();
    }

    /// Runs the polling loop with the default interval ticker until
    /// [`shutdown`](Self::shutdown) is called.
    pub async fn run(&self) {
        self.run_with_ticker(IntervalTicker::new(self.interval)).await;
    }

    /// Runs the polling loop with an injected ticker.
    pub async fn run_with_ticker<T: Ticker>(&self, mut ticker: T) {
        while !self.shutting_down.load(Ordering::SeqCst) {
            tokio::select! {
                () = ticker.tick() => {}
                () = self.refresh_requested.notified() => {}
                () = self.shutdown_requested.notified() => break,
            }
            if self.shutting_down.load(Ordering::SeqCst) {
                break;
            }
            self.poll_once().await;
        }
        tracing::debug!(address = %self.session.address(), "poll loop stopped");
    }

    /// Runs one refresh cycle.
    ///
    /// On success publishes the fresh snapshot; on failure records the
    /// failed cycle and leaves the last published snapshot standing.
    pub async fn poll_once(&self) {
        *self.state.write() = PollState::Refreshing;
        let ok = self.session.refresh().await;
        if ok {
            let _ = self.snapshot_tx.send(self.store.snapshot());
            *self.state.write() = PollState::Idle;
        } else {
            tracing::debug!(address = %self.session.address(), "refresh cycle produced no update");
            *self.state.write() = PollState::Failed;
        }
        *self.last_cycle_failed.write() = !ok;
    }

    /// Shuts the coordinator down: stops the loop, unsubscribes from
    /// the store and disconnects the session.
    pub async fn shutdown(&self) {
        self.shutting_down.store(true, Ordering::SeqCst);
        self.shutdown_requested.notify_waiters();
        if let Some(handle) = self.store_listener.lock().take() {
            handle.unsubscribe();
        }
        self.session.disconnect().await;
    }
}

impl<P: FeederProtocol> std::fmt::Debug for PollCoordinator<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollCoordinator")
            .field("address", self.session.address())
            .field("interval", &self.interval)
            .field("state", &self.poll_state())
            .finish_non_exhaustive()
    }
}

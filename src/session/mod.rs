// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device session: the serialized command/query channel to one feeder.
//!
//! [`DeviceSession`] is the only component that talks to the
//! [`FeederProtocol`] collaborator. A single critical section guarantees
//! at most one in-flight protocol exchange per device at any time —
//! feeder firmware does not reliably handle overlapping request/response
//! pairs — and every device-interaction failure is absorbed here into a
//! boolean result rather than propagated.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::FeederConfig;
use crate::protocol::FeederProtocol;
use crate::state::{StateKey, StateStore, StateValue};
use crate::types::{Address, FeedScheduleSlot, Portions, SlotInput};

/// Session with one feeder device.
///
/// Owns the protocol handle and the device's [`StateStore`]. All
/// mutating operations and [`refresh`](Self::refresh) funnel through the
/// same one-at-a-time critical section, so a command and a concurrently
/// scheduled poll can never interleave their protocol exchanges.
///
/// # Examples
///
/// ```no_run
/// # use netizen_feeder::{DeviceSession, FeederConfig};
/// # use netizen_feeder::protocol::{FeederProtocol, Transport};
/// # async fn example<T, P>(transport: T, protocol: P) -> netizen_feeder::Result<()>
/// # where
/// #     T: Transport,
/// #     P: FeederProtocol<Handle = T::Handle>,
/// # {
/// let config = FeederConfig::new("e6:c0:07:09:a3:d3".parse()?);
/// let session = DeviceSession::new(config, protocol);
///
/// let handle = transport.connect(session.address()).await?;
/// if session.connect(handle).await {
///     session.feed(2).await;
/// }
/// # Ok(())
/// # }
/// ```
pub struct DeviceSession<P: FeederProtocol> {
    config: FeederConfig,
    protocol: P,
    store: Arc<StateStore>,
    /// Serializes every protocol exchange.
    exchange: Mutex<()>,
}

impl<P: FeederProtocol> DeviceSession<P> {
    /// Creates a session from persisted configuration and a protocol
    /// instance. No connection is made until [`connect`](Self::connect).
    pub fn new(config: FeederConfig, protocol: P) -> Self {
        Self {
            config,
            protocol,
            store: Arc::new(StateStore::new()),
            exchange: Mutex::new(()),
        }
    }

    /// Returns the device address.
    #[must_use]
    pub fn address(&self) -> &Address {
        &self.config.address
    }

    /// Returns the device's state store.
    #[must_use]
    pub fn store(&self) -> &Arc<StateStore> {
        &self.store
    }

    /// Returns the reported device name, falling back to the address.
    #[must_use]
    pub fn name(&self) -> String {
        self.store
            .snapshot()
            .text(StateKey::DeviceName)
            .map_or_else(|| self.config.address.to_string(), String::from)
    }

    /// Returns true if the protocol session is open.
    ///
    /// Independent of whether the last refresh succeeded.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.protocol.is_connected()
    }

    // ========== Lifecycle ==========

    /// Opens the protocol session over an established transport handle,
    /// then best-effort queries device identity and the current
    /// schedule.
    ///
    /// Returns true iff the underlying protocol connect succeeded; the
    /// post-connect queries are allowed to fail without failing the
    /// connect. Never panics or errors, so the caller can apply its own
    /// retry policy.
    pub async fn connect(&self, handle: P::Handle) -> bool {
        let ok = {
            let _guard = self.exchange.lock().await;
            match self
                .protocol
                .connect(handle, &self.config.verification_code)
                .await
            {
                Ok(ok) => ok,
                Err(e) => {
                    tracing::warn!(address = %self.config.address, error = %e, "connect failed");
                    return false;
                }
            }
        };

        if ok {
            self.fetch_device_info().await;
            self.refresh().await;
        }
        ok
    }

    /// Tears down the protocol session and clears authoritative state.
    ///
    /// Optimistic overlay values represent user intent, not
    /// device-reported fact, and survive the disconnect. Safe to call
    /// when already disconnected. Deliberately does not take the
    /// exchange lock: closing the transport makes any in-flight call
    /// fail into its own absorb path instead of deadlocking here.
    pub async fn disconnect(&self) {
        if let Err(e) = self.protocol.disconnect().await {
            tracing::debug!(address = %self.config.address, error = %e, "disconnect error");
        }
        self.store.clear_authoritative();
    }

    // ========== Queries ==========

    /// Queries device name and firmware version, merging whatever the
    /// device reports. Failures are logged and swallowed.
    async fn fetch_device_info(&self) {
        let _guard = self.exchange.lock().await;
        match self.protocol.get_device_info().await {
            Ok(info) => {
                let mut patch = Vec::new();
                if let Some(name) = info.device_name
                    && !name.is_empty()
                {
                    patch.push((StateKey::DeviceName, StateValue::from(name)));
                }
                if let Some(version) = info.device_version
                    && !version.is_empty()
                {
                    patch.push((StateKey::DeviceVersion, StateValue::from(version)));
                }
                self.store.merge(patch);
            }
            Err(e) => {
                tracing::debug!(address = %self.config.address, error = %e, "get_device_info failed");
            }
        }
    }

    /// Refreshes the feed schedule from the device.
    ///
    /// Malformed entries are replaced by [`FeedScheduleSlot::fallback`]
    /// rather than aborting the refresh; the normalized slot list is
    /// committed to the store in one merge or not at all. A failed query
    /// means "no update this cycle": logged, store untouched, `false`
    /// returned. Never panics or errors.
    pub async fn refresh(&self) -> bool {
        let _guard = self.exchange.lock().await;
        match self.protocol.query_schedule().await {
            Ok(raw) => {
                let slots: Vec<FeedScheduleSlot> =
                    raw.iter().map(FeedScheduleSlot::from_device_entry).collect();
                self.store
                    .merge([(StateKey::FeedPlanSlots, StateValue::from(slots))]);
                true
            }
            Err(e) => {
                tracing::debug!(address = %self.config.address, error = %e, "query_schedule failed");
                false
            }
        }
    }

    // ========== Commands ==========

    /// Dispenses portions now, clamped into 1-15.
    ///
    /// Feeding is momentary, so no state is recorded; returns the
    /// protocol's success boolean, false on any failure.
    pub async fn feed(&self, portions: i64) -> bool {
        let portions = Portions::clamping(portions);
        let _guard = self.exchange.lock().await;
        match self.protocol.feed(portions).await {
            Ok(ok) => ok,
            Err(e) => {
                tracing::warn!(address = %self.config.address, error = %e, "feed failed");
                false
            }
        }
    }

    /// Engages or releases the child lock.
    ///
    /// The device never reports this property back, so on success the
    /// new value is recorded in the optimistic overlay. On failure the
    /// overlay is left untouched and false is returned.
    pub async fn set_child_lock(&self, locked: bool) -> bool {
        let ok = {
            let _guard = self.exchange.lock().await;
            match self.protocol.set_child_lock(locked).await {
                Ok(ok) => ok,
                Err(e) => {
                    tracing::warn!(address = %self.config.address, error = %e, "set child lock failed");
                    false
                }
            }
        };
        if ok {
            self.store.set_optimistic(StateKey::ChildLock, locked);
        }
        ok
    }

    /// Turns the feed prompt sound on or off.
    ///
    /// Same optimistic-on-success-only contract as
    /// [`set_child_lock`](Self::set_child_lock).
    pub async fn set_prompt_sound(&self, on: bool) -> bool {
        let ok = {
            let _guard = self.exchange.lock().await;
            match self.protocol.set_sound(on).await {
                Ok(ok) => ok,
                Err(e) => {
                    tracing::warn!(address = %self.config.address, error = %e, "set sound failed");
                    false
                }
            }
        };
        if ok {
            self.store.set_optimistic(StateKey::PromptSound, on);
        }
        ok
    }

    /// Writes a feed plan to the device.
    ///
    /// Each slot is normalized first (omitted weekdays or `"all"` mean
    /// every day, default time 08:00, portions clamped, enabled by
    /// default). Schedule state is not updated optimistically — the
    /// next [`refresh`](Self::refresh) picks up the authoritative
    /// result.
    pub async fn set_feed_plan(&self, slots: Vec<SlotInput>) -> bool {
        let normalized: Vec<FeedScheduleSlot> =
            slots.iter().map(SlotInput::normalize).collect();
        let _guard = self.exchange.lock().await;
        match self.protocol.set_schedule(&normalized).await {
            Ok(ok) => ok,
            Err(e) => {
                tracing::warn!(address = %self.config.address, error = %e, "set schedule failed");
                false
            }
        }
    }

    /// Pushes host wall-clock time to the feeder clock.
    pub async fn sync_time(&self) -> bool {
        let _guard = self.exchange.lock().await;
        match self.protocol.sync_time(chrono::Local::now()).await {
            Ok(ok) => ok,
            Err(e) => {
                tracing::warn!(address = %self.config.address, error = %e, "sync time failed");
                false
            }
        }
    }
}

impl<P: FeederProtocol> std::fmt::Debug for DeviceSession<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceSession")
            .field("address", &self.config.address)
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

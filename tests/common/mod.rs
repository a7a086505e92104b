// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Instrumented in-memory feeder protocol stub shared by the
//! integration tests.
//!
//! The stub records every exchange and tracks how many are in flight at
//! once, so tests can assert the session never overlaps two
//! request/response pairs. Failure modes are switchable per operation
//! group.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use chrono::{DateTime, Local};
use parking_lot::Mutex;

use netizen_feeder::protocol::{DeviceInfo, FeederProtocol, Transport};
use netizen_feeder::{Address, FeedScheduleSlot, Portions, ProtocolError, VerificationCode};

/// Transport stub producing unit handles.
pub struct StubTransport {
    pub fail_connect: AtomicBool,
}

impl StubTransport {
    pub fn new() -> Self {
        Self {
            fail_connect: AtomicBool::new(false),
        }
    }
}

impl Transport for StubTransport {
    type Handle = ();

    async fn connect(&self, address: &Address) -> Result<(), ProtocolError> {
        if self.fail_connect.load(Ordering::SeqCst) {
            Err(ProtocolError::ConnectionFailed(address.to_string()))
        } else {
            Ok(())
        }
    }

    async fn disconnect(&self, (): ()) {}

    fn is_connected(&self, (): &()) -> bool {
        true
    }
}

#[derive(Default)]
struct StubInner {
    connected: AtomicBool,
    /// Exchanges currently in flight; the firmware contract says this
    /// must never exceed one.
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    exchanges: AtomicUsize,
    exchange_delay: Mutex<Duration>,

    refuse_handshake: AtomicBool,
    fail_connect: AtomicBool,
    fail_info: AtomicBool,
    fail_schedule_query: AtomicBool,
    fail_commands: AtomicBool,

    device_info: Mutex<DeviceInfo>,
    schedule: Mutex<Vec<serde_json::Value>>,

    seen_code: Mutex<Option<String>>,
    feed_calls: Mutex<Vec<u8>>,
    lock_calls: Mutex<Vec<bool>>,
    sound_calls: Mutex<Vec<bool>>,
    schedule_writes: Mutex<Vec<Vec<FeedScheduleSlot>>>,
    time_syncs: AtomicUsize,
}

/// Instrumented protocol stub; cheap to clone, all clones share state.
#[derive(Clone, Default)]
pub struct StubProtocol {
    inner: Arc<StubInner>,
}

impl StubProtocol {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the device info served by `get_device_info`.
    pub fn with_device_info(self, name: &str, version: &str) -> Self {
        *self.inner.device_info.lock() = DeviceInfo {
            device_name: Some(name.to_string()),
            device_version: Some(version.to_string()),
        };
        self
    }

    /// Sets the raw entries served by `query_schedule`.
    pub fn set_schedule_response(&self, entries: Vec<serde_json::Value>) {
        *self.inner.schedule.lock() = entries;
    }

    /// Makes every exchange take `delay`, widening any overlap window.
    pub fn set_exchange_delay(&self, delay: Duration) {
        *self.inner.exchange_delay.lock() = delay;
    }

    pub fn set_fail_connect(&self, fail: bool) {
        self.inner.fail_connect.store(fail, Ordering::SeqCst);
    }

    pub fn set_refuse_handshake(&self, refuse: bool) {
        self.inner.refuse_handshake.store(refuse, Ordering::SeqCst);
    }

    pub fn set_fail_info(&self, fail: bool) {
        self.inner.fail_info.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_schedule_query(&self, fail: bool) {
        self.inner.fail_schedule_query.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_commands(&self, fail: bool) {
        self.inner.fail_commands.store(fail, Ordering::SeqCst);
    }

    pub fn max_in_flight(&self) -> usize {
        self.inner.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn exchange_count(&self) -> usize {
        self.inner.exchanges.load(Ordering::SeqCst)
    }

    pub fn seen_code(&self) -> Option<String> {
        self.inner.seen_code.lock().clone()
    }

    pub fn feed_calls(&self) -> Vec<u8> {
        self.inner.feed_calls.lock().clone()
    }

    pub fn lock_calls(&self) -> Vec<bool> {
        self.inner.lock_calls.lock().clone()
    }

    pub fn sound_calls(&self) -> Vec<bool> {
        self.inner.sound_calls.lock().clone()
    }

    pub fn schedule_writes(&self) -> Vec<Vec<FeedScheduleSlot>> {
        self.inner.schedule_writes.lock().clone()
    }

    pub fn time_sync_count(&self) -> usize {
        self.inner.time_syncs.load(Ordering::SeqCst)
    }

    async fn begin_exchange(&self) -> ExchangeGuard<'_> {
        let now = self.inner.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.inner.exchanges.fetch_add(1, Ordering::SeqCst);
        let delay = *self.inner.exchange_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        ExchangeGuard(&self.inner)
    }

    fn command_result(&self) -> Result<bool, ProtocolError> {
        if self.inner.fail_commands.load(Ordering::SeqCst) {
            Err(ProtocolError::Timeout(1000))
        } else {
            Ok(true)
        }
    }
}

struct ExchangeGuard<'a>(&'a StubInner);

impl Drop for ExchangeGuard<'_> {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl FeederProtocol for StubProtocol {
    type Handle = ();

    async fn connect(&self, (): (), code: &VerificationCode) -> Result<bool, ProtocolError> {
        let _guard = self.begin_exchange().await;
        *self.inner.seen_code.lock() = Some(code.as_str().to_string());
        if self.inner.fail_connect.load(Ordering::SeqCst) {
            return Err(ProtocolError::ConnectionFailed("stub".to_string()));
        }
        if self.inner.refuse_handshake.load(Ordering::SeqCst) {
            return Ok(false);
        }
        self.inner.connected.store(true, Ordering::SeqCst);
        Ok(true)
    }

    async fn disconnect(&self) -> Result<(), ProtocolError> {
        self.inner.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::SeqCst)
    }

    async fn get_device_info(&self) -> Result<DeviceInfo, ProtocolError> {
        let _guard = self.begin_exchange().await;
        if self.inner.fail_info.load(Ordering::SeqCst) {
            return Err(ProtocolError::Timeout(1000));
        }
        Ok(self.inner.device_info.lock().clone())
    }

    async fn query_schedule(&self) -> Result<Vec<serde_json::Value>, ProtocolError> {
        let _guard = self.begin_exchange().await;
        if self.inner.fail_schedule_query.load(Ordering::SeqCst) {
            return Err(ProtocolError::Timeout(1000));
        }
        Ok(self.inner.schedule.lock().clone())
    }

    async fn set_schedule(&self, slots: &[FeedScheduleSlot]) -> Result<bool, ProtocolError> {
        let _guard = self.begin_exchange().await;
        let result = self.command_result()?;
        self.inner.schedule_writes.lock().push(slots.to_vec());
        Ok(result)
    }

    async fn feed(&self, portions: Portions) -> Result<bool, ProtocolError> {
        let _guard = self.begin_exchange().await;
        let result = self.command_result()?;
        self.inner.feed_calls.lock().push(portions.value());
        Ok(result)
    }

    async fn set_child_lock(&self, locked: bool) -> Result<bool, ProtocolError> {
        let _guard = self.begin_exchange().await;
        let result = self.command_result()?;
        self.inner.lock_calls.lock().push(locked);
        Ok(result)
    }

    async fn set_sound(&self, on: bool) -> Result<bool, ProtocolError> {
        let _guard = self.begin_exchange().await;
        let result = self.command_result()?;
        self.inner.sound_calls.lock().push(on);
        Ok(result)
    }

    async fn sync_time(&self, _now: DateTime<Local>) -> Result<bool, ProtocolError> {
        let _guard = self.begin_exchange().await;
        let result = self.command_result()?;
        self.inner.time_syncs.fetch_add(1, Ordering::SeqCst);
        Ok(result)
    }
}

/// Test address used throughout the integration tests.
pub fn test_address() -> Address {
    "e6:c0:07:09:a3:d3".parse().unwrap()
}

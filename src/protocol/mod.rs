// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Collaborator boundaries for the radio transport and the feeder wire
//! protocol.
//!
//! Neither side is implemented here: the session layer drives these
//! traits and a concrete BLE stack plugs in underneath. Scanning,
//! reconnect-with-backoff and the command byte format all live behind
//! these seams.

use chrono::{DateTime, Local};

use crate::error::ProtocolError;
use crate::types::{Address, FeedScheduleSlot, Portions, VerificationCode};

/// Identity and firmware info reported by a feeder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Human-readable device name, if the device reports one.
    pub device_name: Option<String>,
    /// Firmware version string, if the device reports one.
    pub device_version: Option<String>,
}

/// Radio transport collaborator.
///
/// Produces the opaque connection handle a [`FeederProtocol`] session is
/// opened over. Timeouts and radio-level retry policy belong to the
/// implementation, not to the session layer.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Opaque open-connection handle.
    type Handle: Send;

    /// Establishes a raw connection to the device at `address`.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if no connection could be established.
    async fn connect(&self, address: &Address) -> Result<Self::Handle, ProtocolError>;

    /// Tears down a raw connection.
    async fn disconnect(&self, handle: Self::Handle);

    /// Returns true if the handle still refers to an open connection.
    fn is_connected(&self, handle: &Self::Handle) -> bool;
}

/// Feeder wire-protocol collaborator.
///
/// Typed operations over one device session. Implementations own the
/// encoding, framing and checksum details; every method represents one
/// complete request/response exchange. The session layer guarantees the
/// exchanges never overlap, because feeder firmware does not reliably
/// handle concurrent command/response pairs.
#[allow(async_fn_in_trait)]
pub trait FeederProtocol {
    /// Transport handle this protocol runs over.
    type Handle: Send;

    /// Opens the protocol session over an established transport handle,
    /// performing the verification-code handshake.
    ///
    /// Returns `Ok(false)` when the device refuses the handshake.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` on transport failure.
    async fn connect(
        &self,
        handle: Self::Handle,
        code: &VerificationCode,
    ) -> Result<bool, ProtocolError>;

    /// Closes the protocol session and the underlying transport.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if teardown fails; callers treat this as
    /// best-effort.
    async fn disconnect(&self) -> Result<(), ProtocolError>;

    /// Returns true if the protocol session is open.
    fn is_connected(&self) -> bool;

    /// Queries device identity and firmware version.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the query fails.
    async fn get_device_info(&self) -> Result<DeviceInfo, ProtocolError>;

    /// Queries the current feed schedule.
    ///
    /// Entries are loose JSON values; devices in the field return
    /// malformed entries often enough that decoding is deferred to the
    /// caller, which substitutes defaults per entry.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the query fails.
    async fn query_schedule(&self) -> Result<Vec<serde_json::Value>, ProtocolError>;

    /// Writes a feed schedule to the device.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the command fails.
    async fn set_schedule(&self, slots: &[FeedScheduleSlot]) -> Result<bool, ProtocolError>;

    /// Dispenses the given number of portions now.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the command fails.
    async fn feed(&self, portions: Portions) -> Result<bool, ProtocolError>;

    /// Enables or disables the child lock.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the command fails.
    async fn set_child_lock(&self, locked: bool) -> Result<bool, ProtocolError>;

    /// Enables or disables the feed prompt sound.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the command fails.
    async fn set_sound(&self, on: bool) -> Result<bool, ProtocolError>;

    /// Pushes wall-clock time to the device clock.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the command fails.
    async fn sync_time(&self, now: DateTime<Local>) -> Result<bool, ProtocolError>;
}

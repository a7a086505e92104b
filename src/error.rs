// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `netizen_feeder` library.
//!
//! This module provides the error hierarchy for failures across the
//! library: value validation, protocol communication, and registry
//! lookups. Note that most device-interaction failures never surface as
//! errors at all — the session layer absorbs them into boolean results
//! (see [`DeviceSession`](crate::session::DeviceSession)).

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred during value validation.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// Error occurred during protocol communication.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Device was not found in the session registry.
    #[error("device not found")]
    DeviceNotFound,
}

/// Errors related to value validation and constraints.
///
/// These errors occur when attempting to create constrained types
/// with invalid values, or when an admin request fails validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// A numeric value is outside the allowed range.
    #[error("value {actual} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Minimum allowed value.
        min: i64,
        /// Maximum allowed value.
        max: i64,
        /// The actual value that was provided.
        actual: i64,
    },

    /// A device address could not be normalized to a 6-byte hardware address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// An unrecognized weekday name was provided.
    #[error("invalid weekday: {0}")]
    InvalidWeekday(String),

    /// A time string did not match the HH:MM format.
    #[error("invalid time: {0}")]
    InvalidTime(String),

    /// A schedule slot was given an empty weekday list where one is required.
    #[error("weekdays must not be empty")]
    EmptyWeekdays,
}

/// Errors related to transport and device-protocol communication.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Connection to the device failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Request timed out.
    #[error("request timed out after {0} ms")]
    Timeout(u64),

    /// The device rejected or NACKed a command.
    #[error("command rejected: {0}")]
    CommandRejected(String),

    /// The device returned a response that could not be decoded.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// No open session to the device.
    #[error("device is not connected")]
    NotConnected,
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

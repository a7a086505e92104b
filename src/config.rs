// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Persisted feeder configuration.

use serde::Deserialize;

use crate::types::{Address, VerificationCode};

/// Configuration for one feeder, loaded once at session construction.
///
/// The core never mutates it.
///
/// # Examples
///
/// ```
/// use netizen_feeder::FeederConfig;
///
/// let config = FeederConfig::new("e6c00709a3d3".parse().unwrap())
///     .with_verification_code("12345678")
///     .with_variant("Du-W12B");
/// assert_eq!(config.address.as_str(), "E6:C0:07:09:A3:D3");
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct FeederConfig {
    /// Normalized device address.
    pub address: Address,
    /// Verification code; the all-zero device default when omitted.
    #[serde(default)]
    pub verification_code: VerificationCode,
    /// Device variant tag (model name prefix), if known.
    #[serde(default)]
    pub variant: Option<String>,
}

impl FeederConfig {
    /// Creates a configuration with the default verification code.
    #[must_use]
    pub fn new(address: Address) -> Self {
        Self {
            address,
            verification_code: VerificationCode::default(),
            variant: None,
        }
    }

    /// Sets the verification code; empty input keeps the default.
    #[must_use]
    pub fn with_verification_code(mut self, code: impl Into<String>) -> Self {
        self.verification_code = VerificationCode::new(code);
        self
    }

    /// Sets the device variant tag.
    #[must_use]
    pub fn with_variant(mut self, variant: impl Into<String>) -> Self {
        self.variant = Some(variant.into());
        self
    }
}

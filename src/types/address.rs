// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Canonical device hardware address.

use std::fmt;
use std::str::FromStr;

use crate::error::ValueError;

/// Canonical 6-byte hardware address of a feeder device.
///
/// Input is accepted as bare hex (`"e6c00709a3d3"`) or separated by `:`
/// or `-` in any case; the stored form is always uppercase and
/// colon-separated (`"E6:C0:07:09:A3:D3"`): exactly 17 characters with
/// 5 separators.
///
/// # Examples
///
/// ```
/// use netizen_feeder::types::Address;
///
/// let addr: Address = "e6-c0-07-09-a3-d3".parse().unwrap();
/// assert_eq!(addr.as_str(), "E6:C0:07:09:A3:D3");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address(String);

impl Address {
    /// Parses and normalizes an address string.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::InvalidAddress`] if the input does not
    /// contain exactly 12 hexadecimal digits after removing separators.
    pub fn new(input: &str) -> Result<Self, ValueError> {
        let hex: String = input
            .chars()
            .filter(|c| *c != ':' && *c != '-')
            .collect::<String>()
            .to_ascii_uppercase();

        if hex.len() != 12 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ValueError::InvalidAddress(input.to_string()));
        }

        let canonical = hex
            .as_bytes()
            .chunks(2)
            .map(|pair| std::str::from_utf8(pair).unwrap_or_default())
            .collect::<Vec<_>>()
            .join(":");

        Ok(Self(canonical))
    }

    /// Returns the canonical string form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the last four bytes of the address without separators,
    /// suitable for a short display label (e.g. `"0709A3D3"`).
    #[must_use]
    pub fn short_label(&self) -> String {
        self.0[6..].replace(':', "")
    }
}

impl FromStr for Address {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl serde::Serialize for Address {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for Address {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::new(&raw).map_err(serde::de::Error::custom)
    }
}

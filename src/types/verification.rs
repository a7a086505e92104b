// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device verification code.

use std::fmt;

/// Well-known verification code shipped with feeders that have never
/// been paired against the vendor cloud.
pub const DEFAULT_VERIFICATION_CODE: &str = "00000000";

/// Opaque credential used to authenticate to a feeder during connect.
///
/// Feeders ship with the all-zero code, so an empty or absent user value
/// falls back to [`DEFAULT_VERIFICATION_CODE`]. The code is not treated
/// as a secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationCode(String);

impl VerificationCode {
    /// Creates a verification code, falling back to the device default
    /// when the input is empty.
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        let code = code.into();
        if code.is_empty() {
            Self::default()
        } else {
            Self(code)
        }
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for VerificationCode {
    fn default() -> Self {
        Self(DEFAULT_VERIFICATION_CODE.to_string())
    }
}

impl fmt::Display for VerificationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VerificationCode {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

impl serde::Serialize for VerificationCode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for VerificationCode {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::new(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_all_zero() {
        assert_eq!(VerificationCode::default().as_str(), "00000000");
    }

    #[test]
    fn empty_falls_back_to_default() {
        assert_eq!(VerificationCode::new("").as_str(), "00000000");
    }

    #[test]
    fn user_code_is_kept() {
        assert_eq!(VerificationCode::new("12345678").as_str(), "12345678");
    }

    #[test]
    fn deserialize_empty_falls_back() {
        let code: VerificationCode = serde_json::from_str("\"\"").unwrap();
        assert_eq!(code.as_str(), "00000000");
    }
}

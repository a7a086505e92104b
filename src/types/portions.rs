// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Feed portion count.

use std::fmt;

use crate::error::ValueError;

/// Number of portions for a feed operation (1-15).
///
/// The feeder motor dispenses between 1 and 15 portions per command.
/// [`Portions::new`] validates, [`Portions::clamping`] saturates any
/// integer into range.
///
/// # Examples
///
/// ```
/// use netizen_feeder::types::Portions;
///
/// let p = Portions::new(3).unwrap();
/// assert_eq!(p.value(), 3);
///
/// assert_eq!(Portions::clamping(100).value(), 15);
/// assert_eq!(Portions::clamping(-5).value(), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Portions(u8);

/// Minimum portions per feed command.
pub const MIN_PORTIONS: u8 = 1;
/// Maximum portions per feed command.
pub const MAX_PORTIONS: u8 = 15;

impl Portions {
    /// Creates a portion count.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::OutOfRange`] if `value` is outside 1-15.
    pub fn new(value: u8) -> Result<Self, ValueError> {
        if (MIN_PORTIONS..=MAX_PORTIONS).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ValueError::OutOfRange {
                min: i64::from(MIN_PORTIONS),
                max: i64::from(MAX_PORTIONS),
                actual: i64::from(value),
            })
        }
    }

    /// Creates a portion count, clamping into the valid range.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn clamping(value: i64) -> Self {
        Self(value.clamp(i64::from(MIN_PORTIONS), i64::from(MAX_PORTIONS)) as u8)
    }

    /// Returns the portion count.
    #[must_use]
    pub fn value(&self) -> u8 {
        self.0
    }
}

impl Default for Portions {
    fn default() -> Self {
        Self(MIN_PORTIONS)
    }
}

impl fmt::Display for Portions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<i64> for Portions {
    type Error = ValueError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if (i64::from(MIN_PORTIONS)..=i64::from(MAX_PORTIONS)).contains(&value) {
            Ok(Self::clamping(value))
        } else {
            Err(ValueError::OutOfRange {
                min: i64::from(MIN_PORTIONS),
                max: i64::from(MAX_PORTIONS),
                actual: value,
            })
        }
    }
}

impl From<Portions> for i64 {
    fn from(portions: Portions) -> Self {
        Self::from(portions.0)
    }
}

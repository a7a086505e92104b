// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Feed schedule types.
//!
//! A feed schedule is an ordered sequence of [`FeedScheduleSlot`]s. Slot
//! order carries no meaning to the feeder but is preserved round-trip.
//! Two input shapes exist alongside the canonical slot:
//!
//! - [`SlotInput`]: the loose shape accepted by
//!   [`set_feed_plan`](crate::session::DeviceSession::set_feed_plan),
//!   where every field is optional and defaulted.
//! - Raw device entries (`serde_json::Value`) returned by the schedule
//!   query, normalized via [`FeedScheduleSlot::from_device_entry`].

use std::fmt;
use std::str::FromStr;

use chrono::Timelike;
use serde::{Deserialize, Serialize};

use crate::error::ValueError;

use super::Portions;

/// Day of the week a schedule slot fires on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    /// Monday.
    Mon,
    /// Tuesday.
    Tue,
    /// Wednesday.
    Wed,
    /// Thursday.
    Thu,
    /// Friday.
    Fri,
    /// Saturday.
    Sat,
    /// Sunday.
    Sun,
}

impl Weekday {
    /// Every day of the week, Monday first.
    pub const ALL_DAYS: [Self; 7] = [
        Self::Mon,
        Self::Tue,
        Self::Wed,
        Self::Thu,
        Self::Fri,
        Self::Sat,
        Self::Sun,
    ];

    /// Returns the short lowercase name (`"mon"`).
    #[must_use]
    pub fn short_name(&self) -> &'static str {
        match self {
            Self::Mon => "mon",
            Self::Tue => "tue",
            Self::Wed => "wed",
            Self::Thu => "thu",
            Self::Fri => "fri",
            Self::Sat => "sat",
            Self::Sun => "sun",
        }
    }
}

impl FromStr for Weekday {
    type Err = ValueError;

    /// Parses short (`"mon"`) or long (`"monday"`) English names,
    /// case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mon" | "monday" => Ok(Self::Mon),
            "tue" | "tues" | "tuesday" => Ok(Self::Tue),
            "wed" | "wednesday" => Ok(Self::Wed),
            "thu" | "thur" | "thurs" | "thursday" => Ok(Self::Thu),
            "fri" | "friday" => Ok(Self::Fri),
            "sat" | "saturday" => Ok(Self::Sat),
            "sun" | "sunday" => Ok(Self::Sun),
            _ => Err(ValueError::InvalidWeekday(s.to_string())),
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Wall-clock time of day (`HH:MM`) a schedule slot fires at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeedTime {
    hour: u8,
    minute: u8,
}

impl FeedTime {
    /// Creates a feed time.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::InvalidTime`] if the hour or minute is out
    /// of range.
    pub fn new(hour: u8, minute: u8) -> Result<Self, ValueError> {
        if hour > 23 || minute > 59 {
            return Err(ValueError::InvalidTime(format!("{hour:02}:{minute:02}")));
        }
        Ok(Self { hour, minute })
    }

    /// Midnight, the fallback for malformed device entries.
    #[must_use]
    pub fn midnight() -> Self {
        Self { hour: 0, minute: 0 }
    }

    /// `08:00`, the default for omitted slot times.
    #[must_use]
    pub fn default_slot_time() -> Self {
        Self { hour: 8, minute: 0 }
    }

    /// Returns the hour (0-23).
    #[must_use]
    pub fn hour(&self) -> u8 {
        self.hour
    }

    /// Returns the minute (0-59).
    #[must_use]
    pub fn minute(&self) -> u8 {
        self.minute
    }
}

impl FromStr for FeedTime {
    type Err = ValueError;

    #[allow(clippy::cast_possible_truncation)]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parsed = chrono::NaiveTime::parse_from_str(s, "%H:%M")
            .map_err(|_| ValueError::InvalidTime(s.to_string()))?;
        Ok(Self {
            hour: parsed.hour() as u8,
            minute: parsed.minute() as u8,
        })
    }
}

impl fmt::Display for FeedTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl Serialize for FeedTime {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for FeedTime {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// One slot of a feed schedule.
///
/// # Examples
///
/// ```
/// use netizen_feeder::types::{FeedScheduleSlot, FeedTime, Portions, Weekday};
///
/// let slot = FeedScheduleSlot {
///     weekdays: vec![Weekday::Mon, Weekday::Fri],
///     time: "07:30".parse().unwrap(),
///     portions: Portions::new(2).unwrap(),
///     enabled: true,
/// };
/// assert_eq!(slot.time.to_string(), "07:30");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedScheduleSlot {
    /// Days the slot fires on.
    pub weekdays: Vec<Weekday>,
    /// Time of day the slot fires at.
    pub time: FeedTime,
    /// Portions dispensed when the slot fires.
    pub portions: Portions,
    /// Whether the slot is active.
    pub enabled: bool,
}

impl FeedScheduleSlot {
    /// The safe default slot substituted for malformed device entries:
    /// no weekdays, midnight, one portion, enabled.
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            weekdays: Vec::new(),
            time: FeedTime::midnight(),
            portions: Portions::default(),
            enabled: true,
        }
    }

    /// Normalizes one raw schedule entry reported by the device.
    ///
    /// Device responses are loose JSON. An entry that is not an object
    /// at all becomes [`FeedScheduleSlot::fallback`]; within an object,
    /// each missing or malformed field is defaulted individually so one
    /// bad field does not discard the rest of the entry. Unknown weekday
    /// names are dropped.
    #[must_use]
    pub fn from_device_entry(entry: &serde_json::Value) -> Self {
        let Some(obj) = entry.as_object() else {
            return Self::fallback();
        };

        let weekdays = obj
            .get("weekdays")
            .and_then(serde_json::Value::as_array)
            .map(|days| {
                days.iter()
                    .filter_map(serde_json::Value::as_str)
                    .filter_map(|d| d.parse().ok())
                    .collect()
            })
            .unwrap_or_default();

        let time = obj
            .get("time")
            .and_then(serde_json::Value::as_str)
            .and_then(|t| t.parse().ok())
            .unwrap_or_else(FeedTime::midnight);

        let portions = obj
            .get("portions")
            .and_then(serde_json::Value::as_i64)
            .map_or_else(Portions::default, Portions::clamping);

        let enabled = obj
            .get("enabled")
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(true);

        Self {
            weekdays,
            time,
            portions,
            enabled,
        }
    }
}

/// Weekday field of a [`SlotInput`]: either the literal token `"all"`
/// or an explicit list of day names.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WeekdaysInput {
    /// A single token; only `"all"` (any case) is meaningful.
    Token(String),
    /// Explicit day names.
    List(Vec<String>),
}

/// Loose slot shape accepted by `set_feed_plan`.
///
/// Every field is optional: omitted weekdays (or the literal `"all"`)
/// mean every day, the default time is `08:00`, portions are clamped to
/// 1-15, and slots are enabled unless said otherwise.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SlotInput {
    /// Days the slot fires on; `None` or `"all"` means every day.
    #[serde(default)]
    pub weekdays: Option<WeekdaysInput>,
    /// Time of day as `HH:MM`.
    #[serde(default)]
    pub time: Option<String>,
    /// Portions to dispense.
    #[serde(default)]
    pub portions: Option<i64>,
    /// Whether the slot is active.
    #[serde(default)]
    pub enabled: Option<bool>,
}

impl SlotInput {
    /// Normalizes into a complete [`FeedScheduleSlot`].
    #[must_use]
    pub fn normalize(&self) -> FeedScheduleSlot {
        let weekdays = match &self.weekdays {
            None => Weekday::ALL_DAYS.to_vec(),
            Some(WeekdaysInput::Token(token)) => {
                if token.eq_ignore_ascii_case("all") {
                    Weekday::ALL_DAYS.to_vec()
                } else {
                    token
                        .parse::<Weekday>()
                        .map_or_else(|_| Weekday::ALL_DAYS.to_vec(), |day| vec![day])
                }
            }
            Some(WeekdaysInput::List(days)) => {
                let parsed: Vec<Weekday> =
                    days.iter().filter_map(|d| d.parse().ok()).collect();
                if parsed.is_empty() {
                    Weekday::ALL_DAYS.to_vec()
                } else {
                    parsed
                }
            }
        };

        let time = self
            .time
            .as_deref()
            .and_then(|t| t.parse().ok())
            .unwrap_or_else(FeedTime::default_slot_time);

        let portions = self.portions.map_or_else(Portions::default, Portions::clamping);

        FeedScheduleSlot {
            weekdays,
            time,
            portions,
            enabled: self.enabled.unwrap_or(true),
        }
    }
}

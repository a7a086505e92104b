// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Merged state snapshot and its keys/values.

use std::collections::HashMap;
use std::fmt;

use crate::types::FeedScheduleSlot;

/// Key of one tracked piece of device state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKey {
    /// Human-readable device name (authoritative only).
    DeviceName,
    /// Firmware version (authoritative only).
    DeviceVersion,
    /// Current feed schedule (authoritative only).
    FeedPlanSlots,
    /// Child lock engaged (optimistic only; never echoed by the device).
    ChildLock,
    /// Feed prompt sound on (optimistic only; never echoed by the device).
    PromptSound,
}

impl StateKey {
    /// Returns the wire-style snake_case name of the key.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::DeviceName => "device_name",
            Self::DeviceVersion => "device_version",
            Self::FeedPlanSlots => "feed_plan_slots",
            Self::ChildLock => "child_lock",
            Self::PromptSound => "prompt_sound",
        }
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Value of one tracked piece of device state.
#[derive(Debug, Clone, PartialEq)]
pub enum StateValue {
    /// Boolean property.
    Bool(bool),
    /// Free-text property.
    Text(String),
    /// Feed schedule.
    Slots(Vec<FeedScheduleSlot>),
}

impl StateValue {
    /// Returns the boolean if this is a [`StateValue::Bool`].
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the text if this is a [`StateValue::Text`].
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the slots if this is a [`StateValue::Slots`].
    #[must_use]
    pub fn as_slots(&self) -> Option<&[FeedScheduleSlot]> {
        match self {
            Self::Slots(slots) => Some(slots),
            _ => None,
        }
    }
}

impl From<bool> for StateValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<String> for StateValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for StateValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<Vec<FeedScheduleSlot>> for StateValue {
    fn from(slots: Vec<FeedScheduleSlot>) -> Self {
        Self::Slots(slots)
    }
}

/// Immutable snapshot of the merged device state.
///
/// Handed to listeners and snapshot callers as an owned copy; it never
/// aliases the store's internal maps, so a snapshot stays valid while
/// the owning session keeps mutating the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedState {
    entries: HashMap<StateKey, StateValue>,
}

impl MergedState {
    pub(crate) fn new(entries: HashMap<StateKey, StateValue>) -> Self {
        Self { entries }
    }

    /// Looks up a value by key.
    #[must_use]
    pub fn get(&self, key: StateKey) -> Option<&StateValue> {
        self.entries.get(&key)
    }

    /// Looks up a boolean property.
    #[must_use]
    pub fn bool(&self, key: StateKey) -> Option<bool> {
        self.get(key).and_then(StateValue::as_bool)
    }

    /// Looks up a text property.
    #[must_use]
    pub fn text(&self, key: StateKey) -> Option<&str> {
        self.get(key).and_then(StateValue::as_text)
    }

    /// Returns the feed schedule, if known.
    #[must_use]
    pub fn slots(&self) -> Option<&[FeedScheduleSlot]> {
        self.get(StateKey::FeedPlanSlots)
            .and_then(StateValue::as_slots)
    }

    /// Returns true if the key is present.
    #[must_use]
    pub fn contains(&self, key: StateKey) -> bool {
        self.entries.contains_key(&key)
    }

    /// Returns the number of known entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

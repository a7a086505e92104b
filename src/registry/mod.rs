// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Session registry and the administrative command surface.
//!
//! The registry maps device addresses to their poll coordinators with an
//! explicit lifecycle (`register`/`lookup`/`unregister`). It is a plain
//! object owned by the embedding process and passed where needed, never
//! ambient global state.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Deserialize;

use crate::error::{Error, Result, ValueError};
use crate::poll::PollCoordinator;
use crate::protocol::FeederProtocol;
use crate::types::{Address, SlotInput, WeekdaysInput};

/// One slot of an administrative `set_feed_plan` request.
///
/// Stricter than [`SlotInput`]: weekdays must be a non-empty list of
/// strings and portions must be in 0-15 (0 still dispenses the single
/// minimum portion once forwarded, since the session clamps to 1-15).
#[derive(Debug, Clone, Deserialize)]
pub struct FeedPlanSlotRequest {
    /// Day names, non-empty.
    pub weekdays: Vec<String>,
    /// Time of day as `HH:MM`.
    pub time: String,
    /// Portions, 0-15.
    #[serde(default = "default_portions")]
    pub portions: i64,
    /// Whether the slot is active.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_portions() -> i64 {
    1
}

fn default_enabled() -> bool {
    true
}

impl FeedPlanSlotRequest {
    /// Validates the request and converts it into the session's loose
    /// slot shape.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::EmptyWeekdays`] for an empty weekday list,
    /// [`ValueError::InvalidWeekday`] for an unknown day name,
    /// [`ValueError::InvalidTime`] for a malformed time, and
    /// [`ValueError::OutOfRange`] for portions outside 0-15.
    pub fn validate(&self) -> std::result::Result<SlotInput, ValueError> {
        if self.weekdays.is_empty() {
            return Err(ValueError::EmptyWeekdays);
        }
        for day in &self.weekdays {
            day.parse::<crate::types::Weekday>()?;
        }
        self.time.parse::<crate::types::FeedTime>()?;
        if !(0..=15).contains(&self.portions) {
            return Err(ValueError::OutOfRange {
                min: 0,
                max: 15,
                actual: self.portions,
            });
        }
        Ok(SlotInput {
            weekdays: Some(WeekdaysInput::List(self.weekdays.clone())),
            time: Some(self.time.clone()),
            portions: Some(self.portions),
            enabled: Some(self.enabled),
        })
    }
}

/// Registry of active poll coordinators, keyed by device address.
pub struct SessionRegistry<P: FeederProtocol> {
    sessions: RwLock<HashMap<Address, Arc<PollCoordinator<P>>>>,
}

impl<P: FeederProtocol> SessionRegistry<P> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a coordinator under its device address.
    ///
    /// Returns the coordinator previously registered for the same
    /// address, if any.
    pub fn register(
        &self,
        coordinator: Arc<PollCoordinator<P>>,
    ) -> Option<Arc<PollCoordinator<P>>> {
        let address = coordinator.session().address().clone();
        tracing::debug!(address = %address, "registering session");
        self.sessions.write().insert(address, coordinator)
    }

    /// Looks up the coordinator for a device address.
    #[must_use]
    pub fn lookup(&self, address: &Address) -> Option<Arc<PollCoordinator<P>>> {
        self.sessions.read().get(address).cloned()
    }

    /// Removes and returns the coordinator for a device address.
    pub fn unregister(&self, address: &Address) -> Option<Arc<PollCoordinator<P>>> {
        tracing::debug!(address = %address, "unregistering session");
        self.sessions.write().remove(address)
    }

    /// Returns the addresses of all registered devices.
    #[must_use]
    pub fn addresses(&self) -> Vec<Address> {
        self.sessions.read().keys().cloned().collect()
    }

    /// Returns the number of registered devices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    /// Returns true if no devices are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    /// Administrative bulk operation: validates and writes a feed plan
    /// to the device at `address`, then requests an immediate refresh
    /// so the authoritative schedule is picked up.
    ///
    /// Returns the session's success boolean.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeviceNotFound`] for an unknown address and a
    /// [`ValueError`] if any slot fails validation; nothing is sent to
    /// the device in either case.
    pub async fn set_feed_plan(
        &self,
        address: &Address,
        slots: Vec<FeedPlanSlotRequest>,
    ) -> Result<bool> {
        let coordinator = self.lookup(address).ok_or(Error::DeviceNotFound)?;

        let mut inputs = Vec::with_capacity(slots.len());
        for slot in &slots {
            inputs.push(slot.validate()?);
        }

        let ok = coordinator.session().set_feed_plan(inputs).await;
        if ok {
            coordinator.request_refresh();
        }
        Ok(ok)
    }
}

impl<P: FeederProtocol> Default for SessionRegistry<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: FeederProtocol> std::fmt::Debug for SessionRegistry<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("sessions", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(value: serde_json::Value) -> FeedPlanSlotRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn request_defaults() {
        let req = request(json!({"weekdays": ["mon"], "time": "08:00"}));
        assert_eq!(req.portions, 1);
        assert!(req.enabled);
    }

    #[test]
    fn validate_accepts_zero_portions() {
        let req = request(json!({"weekdays": ["mon"], "time": "08:00", "portions": 0}));
        let input = req.validate().unwrap();
        // The session clamps to the 1-15 motor range.
        assert_eq!(input.normalize().portions.value(), 1);
    }

    #[test]
    fn validate_rejects_empty_weekdays() {
        let req = request(json!({"weekdays": [], "time": "08:00"}));
        assert_eq!(req.validate().unwrap_err(), ValueError::EmptyWeekdays);
    }

    #[test]
    fn validate_rejects_unknown_weekday() {
        let req = request(json!({"weekdays": ["caturday"], "time": "08:00"}));
        assert!(matches!(
            req.validate(),
            Err(ValueError::InvalidWeekday(_))
        ));
    }

    #[test]
    fn validate_rejects_bad_time() {
        let req = request(json!({"weekdays": ["mon"], "time": "late"}));
        assert!(matches!(req.validate(), Err(ValueError::InvalidTime(_))));
    }

    #[test]
    fn validate_rejects_portions_above_range() {
        let req = request(json!({"weekdays": ["mon"], "time": "08:00", "portions": 16}));
        assert!(matches!(
            req.validate(),
            Err(ValueError::OutOfRange { max: 15, .. })
        ));
    }
}

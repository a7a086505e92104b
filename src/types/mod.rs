// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Core value types for feeder devices.
//!
//! All constrained values use validated newtypes so that invalid state
//! is unrepresentable once constructed: [`Address`] is always a canonical
//! hardware address, [`Portions`] is always within the range the feeder
//! motor accepts, and [`FeedScheduleSlot`] is always a complete slot.

mod address;
mod portions;
mod schedule;
mod verification;

pub use address::Address;
pub use portions::Portions;
pub use schedule::{FeedScheduleSlot, FeedTime, SlotInput, Weekday, WeekdaysInput};
pub use verification::VerificationCode;

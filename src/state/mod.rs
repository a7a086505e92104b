// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device state reconciliation.
//!
//! State has two layers: the **authoritative** map holds only values the
//! device actually reported, the **optimistic overlay** holds values the
//! local process asserted after a confirmed command whose effect the
//! device never echoes back (child lock, prompt sound). Consumers only
//! ever see the merged view, where the overlay wins.

mod merged;
mod store;

pub use merged::{MergedState, StateKey, StateValue};
pub use store::{ListenerHandle, StateStore};

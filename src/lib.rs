// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `netizen_feeder` - A Rust library to manage Pet Netizen BLE pet feeders.
//!
//! This library provides the session and state-reconciliation layer for
//! feeder devices reachable over a short-range wireless link: connection
//! lifecycle, a serialized command/query channel, a cached device state
//! merged from authoritative and optimistic values, and a failure-tolerant
//! polling loop.
//!
//! The radio transport and the feeder wire protocol are collaborator
//! traits (see [`protocol`]); this crate contains no BLE stack and no
//! byte codec.
//!
//! # Core pieces
//!
//! - [`DeviceSession`]: owns the protocol handle for one feeder and
//!   serializes every exchange; translates intents (feed, lock,
//!   schedule) into protocol calls and absorbs device failures into
//!   boolean results.
//! - [`StateStore`](state::StateStore): authoritative state plus an
//!   optimistic overlay for properties the device never reports back;
//!   listeners receive merged snapshots on every change.
//! - [`PollCoordinator`]: drives periodic refresh with per-cycle
//!   failure tolerance and republishes snapshots to subscribers.
//! - [`SessionRegistry`]: maps device addresses to coordinators and
//!   hosts the administrative `set_feed_plan` bulk operation.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use netizen_feeder::protocol::{FeederProtocol, Transport};
//! use netizen_feeder::{DeviceSession, FeederConfig, PollCoordinator};
//!
//! # async fn example<T, P>(transport: T, protocol: P) -> netizen_feeder::Result<()>
//! # where
//! #     T: Transport,
//! #     P: FeederProtocol<Handle = T::Handle>,
//! # {
//! let config = FeederConfig::new("e6:c0:07:09:a3:d3".parse()?)
//!     .with_verification_code("00000000");
//! let session = Arc::new(DeviceSession::new(config, protocol));
//!
//! let handle = transport.connect(session.address()).await?;
//! if !session.connect(handle).await {
//!     // caller decides retry/backoff policy
//!     return Ok(());
//! }
//!
//! let coordinator = PollCoordinator::with_default_interval(Arc::clone(&session));
//! let mut snapshots = coordinator.subscribe();
//!
//! // Dispense two portions now, then pick up fresh state.
//! session.feed(2).await;
//! coordinator.request_refresh();
//!
//! snapshots.changed().await.ok();
//! println!("state: {:?}", *snapshots.borrow());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod poll;
pub mod protocol;
pub mod registry;
pub mod session;
pub mod state;
pub mod types;

pub use config::FeederConfig;
pub use error::{Error, ProtocolError, Result, ValueError};
pub use poll::{DEFAULT_POLL_INTERVAL, IntervalTicker, PollCoordinator, PollState, Ticker};
pub use registry::{FeedPlanSlotRequest, SessionRegistry};
pub use session::DeviceSession;
pub use state::{ListenerHandle, MergedState, StateKey, StateStore, StateValue};
pub use types::{
    Address, FeedScheduleSlot, FeedTime, Portions, SlotInput, VerificationCode, Weekday,
};

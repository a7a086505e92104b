// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for the poll coordinator and session registry.

mod common;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::sync::mpsc;
use tokio::time::timeout;

use netizen_feeder::{
    DeviceSession, Error, FeederConfig, PollCoordinator, PollState, SessionRegistry, StateKey,
    Ticker,
};

use common::{StubProtocol, test_address};

/// Ticker driven by hand-fed ticks; parks forever once the sender is
/// dropped so a shut-down loop can be observed exiting via `shutdown`.
struct ManualTicker(mpsc::UnboundedReceiver<()>);

impl Ticker for ManualTicker {
    async fn tick(&mut self) {
        if self.0.recv().await.is_none() {
            std::future::pending::<()>().await;
        }
    }
}

fn manual_ticker() -> (mpsc::UnboundedSender<()>, ManualTicker) {
    let (tx, rx) = mpsc::unbounded_channel();
    (tx, ManualTicker(rx))
}

fn coordinator(protocol: StubProtocol) -> Arc<PollCoordinator<StubProtocol>> {
    let session = Arc::new(DeviceSession::new(
        FeederConfig::new(test_address()),
        protocol,
    ));
    PollCoordinator::new(session, Duration::from_secs(60))
}

async fn wait_changed(rx: &mut tokio::sync::watch::Receiver<netizen_feeder::MergedState>) {
    timeout(Duration::from_secs(5), rx.changed())
        .await
        .expect("timed out waiting for snapshot")
        .expect("snapshot channel closed");
}

// ============================================================================
// Cycle state machine
// ============================================================================

mod cycle {
    use super::*;

    #[tokio::test]
    async fn successful_cycle_publishes_and_returns_to_idle() {
        let protocol = StubProtocol::new();
        protocol.set_schedule_response(vec![json!({
            "weekdays": ["mon"], "time": "08:00", "portions": 2, "enabled": true
        })]);
        let coordinator = coordinator(protocol);
        let mut snapshots = coordinator.subscribe();

        assert_eq!(coordinator.poll_state(), PollState::Idle);
        coordinator.poll_once().await;

        assert_eq!(coordinator.poll_state(), PollState::Idle);
        assert!(!coordinator.last_cycle_failed());

        wait_changed(&mut snapshots).await;
        assert_eq!(snapshots.borrow().slots().map(<[_]>::len), Some(1));
    }

    #[tokio::test]
    async fn failed_cycle_is_observable_but_not_sticky() {
        let protocol = StubProtocol::new();
        protocol.set_fail_schedule_query(true);
        let coordinator = coordinator(protocol.clone());
        let snapshots = coordinator.subscribe();

        coordinator.poll_once().await;
        assert_eq!(coordinator.poll_state(), PollState::Failed);
        assert!(coordinator.last_cycle_failed());
        // The last published snapshot stands.
        assert!(snapshots.borrow().slots().is_none());

        // The next cycle gets a fresh attempt and recovers.
        protocol.set_fail_schedule_query(false);
        coordinator.poll_once().await;
        assert_eq!(coordinator.poll_state(), PollState::Idle);
        assert!(!coordinator.last_cycle_failed());
    }

    #[tokio::test]
    async fn connectivity_is_independent_of_cycle_outcome() {
        let protocol = StubProtocol::new();
        let coordinator = coordinator(protocol.clone());
        coordinator.session().connect(()).await;
        assert!(coordinator.connected());

        protocol.set_fail_schedule_query(true);
        coordinator.poll_once().await;

        // A failed poll does not mean disconnected.
        assert!(coordinator.last_cycle_failed());
        assert!(coordinator.connected());
    }
}

// ============================================================================
// Loop driving
// ============================================================================

mod looping {
    use super::*;

    #[tokio::test]
    async fn synthetic_ticks_drive_refreshes() {
        let protocol = StubProtocol::new();
        let coordinator = coordinator(protocol.clone());
        let mut snapshots = coordinator.subscribe();
        let (ticks, ticker) = manual_ticker();

        let runner = {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move { coordinator.run_with_ticker(ticker).await })
        };

        ticks.send(()).unwrap();
        wait_changed(&mut snapshots).await;
        assert_eq!(protocol.exchange_count(), 1);

        ticks.send(()).unwrap();
        wait_changed(&mut snapshots).await;
        assert_eq!(protocol.exchange_count(), 2);

        coordinator.shutdown().await;
        timeout(Duration::from_secs(5), runner)
            .await
            .expect("loop did not stop")
            .unwrap();
    }

    #[tokio::test]
    async fn on_demand_refresh_flows_through_the_same_loop() {
        let protocol = StubProtocol::new();
        let coordinator = coordinator(protocol.clone());
        let mut snapshots = coordinator.subscribe();
        let (_ticks, ticker) = manual_ticker();

        let runner = {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move { coordinator.run_with_ticker(ticker).await })
        };

        coordinator.request_refresh();
        wait_changed(&mut snapshots).await;
        assert_eq!(protocol.exchange_count(), 1);

        coordinator.shutdown().await;
        timeout(Duration::from_secs(5), runner)
            .await
            .expect("loop did not stop")
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn interval_ticker_fires_on_schedule() {
        let protocol = StubProtocol::new();
        let coordinator = coordinator(protocol.clone());
        let mut snapshots = coordinator.subscribe();

        let runner = {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move { coordinator.run().await })
        };

        // Immediate first tick, then one per interval; paused time
        // auto-advances to each deadline.
        snapshots.changed().await.unwrap();
        assert_eq!(protocol.exchange_count(), 1);

        snapshots.changed().await.unwrap();
        assert_eq!(protocol.exchange_count(), 2);

        coordinator.shutdown().await;
        runner.await.unwrap();
    }

    #[tokio::test]
    async fn command_state_change_is_republished_without_a_tick() {
        let coordinator = coordinator(StubProtocol::new());
        let mut snapshots = coordinator.subscribe();

        assert!(coordinator.session().set_child_lock(true).await);

        wait_changed(&mut snapshots).await;
        assert_eq!(snapshots.borrow().bool(StateKey::ChildLock), Some(true));
    }

    #[tokio::test]
    async fn shutdown_disconnects_and_stops_republishing() {
        let protocol = StubProtocol::new();
        let coordinator = coordinator(protocol.clone());
        coordinator.session().connect(()).await;

        coordinator.shutdown().await;
        assert!(!coordinator.connected());

        // The store listener is gone; direct store changes no longer
        // reach coordinator subscribers.
        let snapshots = coordinator.subscribe();
        coordinator.session().store().set_optimistic(StateKey::PromptSound, true);
        assert!(!snapshots.has_changed().unwrap());
    }
}

// ============================================================================
// Manual feeding
// ============================================================================

mod feeding {
    use super::*;

    #[tokio::test]
    async fn feed_now_dispenses_the_held_portion_count() {
        let protocol = StubProtocol::new();
        let coordinator = coordinator(protocol.clone());

        // One portion until told otherwise.
        assert_eq!(coordinator.feed_portions(), 1);
        assert!(coordinator.feed_now().await);

        coordinator.set_feed_portions(5);
        assert_eq!(coordinator.feed_portions(), 5);
        assert!(coordinator.feed_now().await);

        assert_eq!(protocol.feed_calls(), vec![1, 5]);
    }

    #[tokio::test]
    async fn held_portions_are_clamped_when_fed() {
        let protocol = StubProtocol::new();
        let coordinator = coordinator(protocol.clone());

        coordinator.set_feed_portions(100);
        assert!(coordinator.feed_now().await);
        coordinator.set_feed_portions(-3);
        assert!(coordinator.feed_now().await);

        assert_eq!(protocol.feed_calls(), vec![15, 1]);
    }
}

// ============================================================================
// Registry and admin surface
// ============================================================================

mod registry {
    use super::*;

    #[tokio::test]
    async fn register_lookup_unregister() {
        let registry = SessionRegistry::new();
        let coordinator = coordinator(StubProtocol::new());

        assert!(registry.is_empty());
        assert!(registry.register(Arc::clone(&coordinator)).is_none());
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.addresses(), vec![test_address()]);

        let found = registry.lookup(&test_address()).expect("registered");
        assert_eq!(found.session().address(), &test_address());

        assert!(registry.unregister(&test_address()).is_some());
        assert!(registry.lookup(&test_address()).is_none());
    }

    #[tokio::test]
    async fn register_replaces_previous_coordinator() {
        let registry = SessionRegistry::new();
        registry.register(coordinator(StubProtocol::new()));
        let previous = registry.register(coordinator(StubProtocol::new()));
        assert!(previous.is_some());
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn set_feed_plan_unknown_device() {
        let registry: SessionRegistry<StubProtocol> = SessionRegistry::new();
        let slots = vec![serde_json::from_value(
            json!({"weekdays": ["mon"], "time": "08:00"}),
        )
        .unwrap()];

        let result = registry.set_feed_plan(&test_address(), slots).await;
        assert!(matches!(result, Err(Error::DeviceNotFound)));
    }

    #[tokio::test]
    async fn set_feed_plan_forwards_validated_slots() {
        let protocol = StubProtocol::new();
        let registry = SessionRegistry::new();
        registry.register(coordinator(protocol.clone()));

        let slots = vec![serde_json::from_value(json!({
            "weekdays": ["mon", "wed"], "time": "06:45", "portions": 4
        }))
        .unwrap()];

        let ok = registry.set_feed_plan(&test_address(), slots).await.unwrap();
        assert!(ok);

        let writes = protocol.schedule_writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0][0].time.to_string(), "06:45");
        assert_eq!(writes[0][0].portions.value(), 4);
    }

    #[tokio::test]
    async fn set_feed_plan_rejects_invalid_request_before_sending() {
        let protocol = StubProtocol::new();
        let registry = SessionRegistry::new();
        registry.register(coordinator(protocol.clone()));

        let slots = vec![serde_json::from_value(json!({"weekdays": [], "time": "08:00"}))
            .unwrap()];

        let result = registry.set_feed_plan(&test_address(), slots).await;
        assert!(result.is_err());
        assert!(protocol.schedule_writes().is_empty());
    }
}

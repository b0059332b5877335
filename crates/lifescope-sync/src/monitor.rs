//! Connection health derivation.
//!
//! Both transport adapters report their link observations here, and the
//! monitor folds them into the single [`ConnectionState`] the store
//! publishes. Presentation code reads that state; it never talks to the
//! adapters directly.
//!
//! The derivation is strict about what each state claims:
//!
//! - `Connected` only while the push socket is open. A healthy pull
//!   path without push is `Degraded`, because live streaming is down.
//! - `Disconnected` only when push is down *and* every pull lane has
//!   crossed its consecutive-failure threshold.
//! - `Connecting` until the first pull success of the session, so a
//!   slow startup is not misreported as an outage.
//!
//! All report fields are atomics; reports arrive concurrently from the
//! lane tasks and the socket task without locking.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use lifescope_types::{ConnectionState, DataKind};

use crate::store::WorldStore;

/// Bit assigned to each pull lane in the degraded mask.
const fn lane_bit(kind: DataKind) -> u32 {
    match kind {
        DataKind::Snapshot => 0b0001,
        DataKind::Agents => 0b0010,
        DataKind::Events => 0b0100,
        DataKind::Stats => 0b1000,
    }
}

/// Mask value with every pull lane marked degraded.
const ALL_LANES_DEGRADED: u32 = 0b1111;

/// Folds adapter link reports into the published connection state.
#[derive(Debug)]
pub struct ConnectionMonitor {
    store: WorldStore,
    push_live: AtomicBool,
    degraded_lanes: AtomicU32,
    any_pull_success: AtomicBool,
}

impl ConnectionMonitor {
    /// Create a monitor publishing into `store`.
    pub const fn new(store: WorldStore) -> Self {
        Self {
            store,
            push_live: AtomicBool::new(false),
            degraded_lanes: AtomicU32::new(0),
            any_pull_success: AtomicBool::new(false),
        }
    }

    /// Report that the push socket completed its handshake.
    pub async fn push_connected(&self) {
        self.push_live.store(true, Ordering::Release);
        self.publish().await;
    }

    /// Report that the push socket closed or failed.
    pub async fn push_lost(&self) {
        self.push_live.store(false, Ordering::Release);
        self.publish().await;
    }

    /// Report a successful poll on one pull lane.
    pub async fn lane_healthy(&self, kind: DataKind) {
        self.any_pull_success.store(true, Ordering::Release);
        self.degraded_lanes
            .fetch_and(!lane_bit(kind), Ordering::AcqRel);
        self.publish().await;
    }

    /// Report that one pull lane crossed its failure threshold.
    pub async fn lane_degraded(&self, kind: DataKind) {
        self.degraded_lanes
            .fetch_or(lane_bit(kind), Ordering::AcqRel);
        self.publish().await;
    }

    /// Fold the current reports into a state.
    fn derive(&self) -> ConnectionState {
        if self.push_live.load(Ordering::Acquire) {
            return ConnectionState::Connected;
        }
        if self.degraded_lanes.load(Ordering::Acquire) == ALL_LANES_DEGRADED {
            return ConnectionState::Disconnected;
        }
        if self.any_pull_success.load(Ordering::Acquire) {
            return ConnectionState::Degraded;
        }
        ConnectionState::Connecting
    }

    /// Push the derived state into the store. The store drops repeat
    /// states, so publishing after every report is harmless.
    async fn publish(&self) {
        self.store.set_connection(self.derive()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn published(store: &WorldStore) -> ConnectionState {
        store.view().await.connection
    }

    #[tokio::test]
    async fn starts_connecting() {
        let store = WorldStore::new();
        let monitor = ConnectionMonitor::new(store.clone());
        assert_eq!(monitor.derive(), ConnectionState::Connecting);
        assert_eq!(published(&store).await, ConnectionState::Connecting);
    }

    #[tokio::test]
    async fn push_socket_wins_over_everything() {
        let store = WorldStore::new();
        let monitor = ConnectionMonitor::new(store.clone());

        for kind in DataKind::ALL {
            monitor.lane_degraded(kind).await;
        }
        monitor.push_connected().await;

        assert_eq!(published(&store).await, ConnectionState::Connected);
    }

    #[tokio::test]
    async fn losing_push_with_working_pull_is_degraded() {
        let store = WorldStore::new();
        let monitor = ConnectionMonitor::new(store.clone());

        monitor.push_connected().await;
        monitor.lane_healthy(DataKind::Snapshot).await;
        monitor.push_lost().await;

        assert_eq!(published(&store).await, ConnectionState::Degraded);
    }

    #[tokio::test]
    async fn all_lanes_down_without_push_is_disconnected() {
        let store = WorldStore::new();
        let monitor = ConnectionMonitor::new(store.clone());

        monitor.lane_healthy(DataKind::Agents).await;
        for kind in DataKind::ALL {
            monitor.lane_degraded(kind).await;
        }

        assert_eq!(published(&store).await, ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn one_recovering_lane_lifts_disconnected_to_degraded() {
        let store = WorldStore::new();
        let monitor = ConnectionMonitor::new(store.clone());

        for kind in DataKind::ALL {
            monitor.lane_degraded(kind).await;
        }
        monitor.lane_healthy(DataKind::Events).await;

        assert_eq!(published(&store).await, ConnectionState::Degraded);
    }

    #[tokio::test]
    async fn failures_before_any_success_stay_connecting() {
        let store = WorldStore::new();
        let monitor = ConnectionMonitor::new(store.clone());

        monitor.lane_degraded(DataKind::Snapshot).await;
        monitor.lane_degraded(DataKind::Agents).await;

        assert_eq!(published(&store).await, ConnectionState::Connecting);
    }
}

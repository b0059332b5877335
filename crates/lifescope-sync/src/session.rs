//! Session assembly: configuration and adapter task lifecycles.
//!
//! A [`SyncSession`] owns one store, one freshness clock, and the full
//! set of adapter tasks (four poll lanes, the push socket, the command
//! sweeper). The store and clock are created together and die together:
//! freshness marks are meaningless across sessions, so restarting means
//! starting a new session with a fresh pair, never reviving an old
//! store under a new clock.

use std::sync::Arc;
use std::time::Duration;

use lifescope_types::DataKind;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::clock::FreshnessClock;
use crate::dispatch::CommandDispatcher;
use crate::error::SyncError;
use crate::monitor::ConnectionMonitor;
use crate::push::PushAdapter;
use crate::rest::{PollLane, RestClient};
use crate::store::WorldStore;

/// Default REST base URL.
pub const DEFAULT_REST_URL: &str = "http://127.0.0.1:8000/api";

/// Default WebSocket URL.
pub const DEFAULT_WS_URL: &str = "ws://127.0.0.1:8000/ws";

/// How long shutdown waits for each task before giving up on it.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Poll cadence per pull lane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollIntervals {
    /// World snapshot cadence.
    pub snapshot: Duration,
    /// Agents cadence; the fastest lane, since agents drive the scene.
    pub agents: Duration,
    /// Events cadence.
    pub events: Duration,
    /// Deep-life statistics cadence; the slowest lane.
    pub stats: Duration,
}

impl PollIntervals {
    /// The cadence for one lane.
    pub const fn for_kind(&self, kind: DataKind) -> Duration {
        match kind {
            DataKind::Snapshot => self.snapshot,
            DataKind::Agents => self.agents,
            DataKind::Events => self.events,
            DataKind::Stats => self.stats,
        }
    }
}

impl Default for PollIntervals {
    fn default() -> Self {
        Self {
            snapshot: Duration::from_secs(3),
            agents: Duration::from_secs(2),
            events: Duration::from_secs(5),
            stats: Duration::from_secs(15),
        }
    }
}

/// Configuration for one sync session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// REST base URL, through the `/api` prefix.
    pub rest_url: String,
    /// WebSocket URL.
    pub ws_url: String,
    /// Poll cadences.
    pub poll: PollIntervals,
    /// `limit` query parameter for the events endpoint.
    pub events_limit: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            rest_url: DEFAULT_REST_URL.to_owned(),
            ws_url: DEFAULT_WS_URL.to_owned(),
            poll: PollIntervals::default(),
            events_limit: 50,
        }
    }
}

/// A running sync session.
///
/// Dropping a session without calling [`shutdown`](Self::shutdown)
/// also stops the tasks: the shutdown channel's sender goes away and
/// every task treats that as a stop signal at its next wait point.
#[derive(Debug)]
pub struct SyncSession {
    store: WorldStore,
    dispatcher: Arc<CommandDispatcher>,
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl SyncSession {
    /// Validate the configuration, build the shared state, and spawn
    /// the adapter tasks. Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Config`] for malformed URLs.
    pub fn start(config: SyncConfig) -> Result<Self, SyncError> {
        if !config.ws_url.starts_with("ws://") && !config.ws_url.starts_with("wss://") {
            return Err(SyncError::Config(format!(
                "WebSocket URL must be ws(s): {}",
                config.ws_url
            )));
        }

        let store = WorldStore::new();
        let clock = Arc::new(FreshnessClock::new());
        let rest = Arc::new(RestClient::new(&config.rest_url)?);
        let monitor = Arc::new(ConnectionMonitor::new(store.clone()));
        let dispatcher = Arc::new(CommandDispatcher::new(Arc::clone(&rest), store.clone()));
        let (shutdown, _) = watch::channel(false);

        let mut tasks = Vec::with_capacity(6);
        for kind in DataKind::ALL {
            let lane = PollLane {
                kind,
                interval: config.poll.for_kind(kind),
                events_limit: config.events_limit,
                rest: Arc::clone(&rest),
                store: store.clone(),
                clock: Arc::clone(&clock),
                monitor: Arc::clone(&monitor),
            };
            tasks.push(tokio::spawn(lane.run(shutdown.subscribe())));
        }

        let push = PushAdapter {
            ws_url: config.ws_url.clone(),
            store: store.clone(),
            clock: Arc::clone(&clock),
            monitor: Arc::clone(&monitor),
            dispatcher: Arc::clone(&dispatcher),
        };
        tasks.push(tokio::spawn(push.run(shutdown.subscribe())));
        tasks.push(tokio::spawn(
            Arc::clone(&dispatcher).run_sweeper(shutdown.subscribe()),
        ));

        info!(
            rest_url = %config.rest_url,
            ws_url = %config.ws_url,
            poll_lanes = DataKind::ALL.len(),
            "sync session started"
        );

        Ok(Self {
            store,
            dispatcher,
            shutdown,
            tasks,
        })
    }

    /// Handle to the reconciliation store.
    pub const fn store(&self) -> &WorldStore {
        &self.store
    }

    /// Handle to the command dispatcher.
    pub fn dispatcher(&self) -> Arc<CommandDispatcher> {
        Arc::clone(&self.dispatcher)
    }

    /// Signal every task to stop and wait (bounded) for each.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        for task in self.tasks {
            match tokio::time::timeout(SHUTDOWN_TIMEOUT, task).await {
                Ok(Ok(())) => {}
                Ok(Err(error)) => warn!(error = %error, "sync task ended abnormally"),
                Err(_elapsed) => warn!("sync task did not stop within the shutdown timeout"),
            }
        }
        info!("sync session stopped");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Config pointing at ports nothing listens on.
    fn dead_end_config() -> SyncConfig {
        SyncConfig {
            rest_url: String::from("http://127.0.0.1:9/api"),
            ws_url: String::from("ws://127.0.0.1:9/ws"),
            ..SyncConfig::default()
        }
    }

    #[test]
    fn default_cadences_are_tiered() {
        let poll = PollIntervals::default();
        assert!(poll.agents < poll.snapshot);
        assert!(poll.snapshot < poll.events);
        assert!(poll.events < poll.stats);
        assert_eq!(poll.for_kind(DataKind::Stats), poll.stats);
    }

    #[tokio::test]
    async fn rejects_non_ws_urls() {
        let config = SyncConfig {
            ws_url: String::from("http://127.0.0.1:8000/ws"),
            ..dead_end_config()
        };
        assert!(matches!(
            SyncSession::start(config),
            Err(SyncError::Config(_))
        ));
    }

    #[tokio::test]
    async fn rejects_non_http_rest_urls() {
        let config = SyncConfig {
            rest_url: String::from("127.0.0.1:8000/api"),
            ..dead_end_config()
        };
        assert!(SyncSession::start(config).is_err());
    }

    #[tokio::test]
    async fn starts_empty_and_shuts_down_cleanly() {
        let session = SyncSession::start(dead_end_config()).unwrap();

        let view = session.store().view().await;
        assert!(!view.has_ever_synced);
        assert_eq!(view.revision, 0);

        session.shutdown().await;
    }
}

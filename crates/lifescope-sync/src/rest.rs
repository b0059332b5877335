//! The pull adapter: REST fetches, control commands, and polling lanes.
//!
//! Four independent lanes poll the backend's read endpoints on their own
//! cadences and offer each decoded payload to the store under a mark
//! drawn at request *issue* time. A lane that fails backs off
//! exponentially on its own; the other lanes keep their cadence, so one
//! broken endpoint degrades one slice instead of the whole picture.
//!
//! Control commands go through [`RestClient::send_control`] exactly
//! once per dispatch. Commands are never retried here or anywhere else;
//! a lost command is reported as failed and the operator decides.

use std::sync::Arc;
use std::time::Duration;

use lifescope_types::{
    Agent, AgentsEnvelope, ControlAction, ControlReply, DataKind, EventsEnvelope, ExtendedStats,
    StatsEnvelope, WorldEvent, WorldSnapshot,
};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::clock::FreshnessClock;
use crate::error::SyncError;
use crate::monitor::ConnectionMonitor;
use crate::store::{Applied, WorldStore};

/// Per-request timeout. A hung request must not stall its lane past
/// the point where backoff should be driving retries.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// First retry delay after a lane failure.
const BACKOFF_BASE: Duration = Duration::from_millis(500);

/// Ceiling on the retry delay.
const BACKOFF_CAP: Duration = Duration::from_secs(30);

/// Consecutive failures after which a lane reports itself degraded.
const DEGRADED_THRESHOLD: u32 = 3;

// ---------------------------------------------------------------------------
// REST client
// ---------------------------------------------------------------------------

/// HTTP client for the backend's REST surface.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base: String,
}

impl RestClient {
    /// Create a client for the given base URL (for example
    /// `http://127.0.0.1:8000/api`).
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Config`] when the URL is not http(s), and
    /// [`SyncError::Http`] when the underlying client cannot be built.
    pub fn new(base_url: &str) -> Result<Self, SyncError> {
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(SyncError::Config(format!(
                "REST base URL must be http(s): {base_url}"
            )));
        }
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SyncError::Http(format!("building HTTP client failed: {e}")))?;
        Ok(Self {
            http,
            base: base_url.trim_end_matches('/').to_owned(),
        })
    }

    /// GET a path relative to the base URL and decode the JSON body.
    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, SyncError> {
        let url = format!("{}/{path}", self.base);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| SyncError::Http(format!("GET {path} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Http(format!("GET {path} returned {status}")));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| SyncError::Http(format!("GET {path} response parse failed: {e}")))
    }

    /// Fetch the world snapshot.
    pub async fn fetch_snapshot(&self) -> Result<WorldSnapshot, SyncError> {
        self.get_json("simulation").await
    }

    /// Fetch all living agents.
    pub async fn fetch_agents(&self) -> Result<Vec<Agent>, SyncError> {
        let envelope: AgentsEnvelope = self.get_json("agents").await?;
        Ok(envelope.agents)
    }

    /// Fetch up to `limit` recent events, newest first.
    pub async fn fetch_events(&self, limit: u32) -> Result<Vec<WorldEvent>, SyncError> {
        let envelope: EventsEnvelope = self.get_json(&format!("events?limit={limit}")).await?;
        Ok(envelope.events)
    }

    /// Fetch the deep-life statistics record.
    pub async fn fetch_stats(&self) -> Result<ExtendedStats, SyncError> {
        let envelope: StatsEnvelope = self.get_json("phase10").await?;
        Ok(envelope.systems)
    }

    /// Send one control command and decode the backend's verdict.
    ///
    /// Sent exactly once: the caller resolves the command from this
    /// result, never by retrying.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::CommandRejected`] when the backend answers
    /// with an error body (it does so under HTTP 200), and
    /// [`SyncError::Http`] for transport or status failures.
    pub async fn send_control(&self, action: ControlAction) -> Result<ControlReply, SyncError> {
        let path = action.wire_path();
        let url = format!("{}/{path}", self.base);
        let response = self
            .http
            .post(&url)
            .send()
            .await
            .map_err(|e| SyncError::Http(format!("POST {path} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Http(format!("POST {path} returned {status}")));
        }

        let reply: ControlReply = response
            .json()
            .await
            .map_err(|e| SyncError::Http(format!("POST {path} response parse failed: {e}")))?;

        if let Some(reason) = reply.failure_reason() {
            return Err(SyncError::CommandRejected {
                action: action.label().to_owned(),
                reason: reason.to_owned(),
            });
        }
        Ok(reply)
    }
}

// ---------------------------------------------------------------------------
// Backoff
// ---------------------------------------------------------------------------

/// Per-lane exponential backoff state.
///
/// Delays double from [`BACKOFF_BASE`] up to [`BACKOFF_CAP`]; a single
/// success resets the ladder.
#[derive(Debug, Default)]
pub struct Backoff {
    consecutive_failures: u32,
}

impl Backoff {
    /// Fresh state with no recorded failures.
    pub const fn new() -> Self {
        Self {
            consecutive_failures: 0,
        }
    }

    /// Record a failure and return how long to wait before retrying.
    pub fn record_failure(&mut self) -> Duration {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        // Clamped shift keeps the multiplier in range; the cap bounds
        // the result regardless.
        let exponent = self.consecutive_failures.saturating_sub(1).min(16);
        let multiplier = 1u32.checked_shl(exponent).unwrap_or(u32::MAX);
        BACKOFF_BASE.saturating_mul(multiplier).min(BACKOFF_CAP)
    }

    /// Record a success, resetting the ladder.
    pub fn reset(&mut self) {
        self.consecutive_failures = 0;
    }

    /// Number of consecutive failures recorded.
    pub const fn failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Whether this lane should report itself degraded.
    pub const fn is_degraded(&self) -> bool {
        self.consecutive_failures >= DEGRADED_THRESHOLD
    }
}

// ---------------------------------------------------------------------------
// Polling lanes
// ---------------------------------------------------------------------------

/// Run one poll: draw a mark, fetch, offer the payload to the store.
///
/// The mark is drawn when the request is *issued*, not when the
/// response arrives. A response that crossed a push frame in flight
/// therefore carries the smaller mark and loses at the store.
async fn poll_once(
    kind: DataKind,
    events_limit: u32,
    rest: &RestClient,
    store: &WorldStore,
    clock: &FreshnessClock,
) -> Result<Applied, SyncError> {
    let mark = clock.next();
    match kind {
        DataKind::Snapshot => {
            let snapshot = rest.fetch_snapshot().await?;
            Ok(store.apply_snapshot(snapshot, mark).await)
        }
        DataKind::Agents => {
            let agents = rest.fetch_agents().await?;
            Ok(store.apply_agents(agents, mark).await)
        }
        DataKind::Events => {
            let events = rest.fetch_events(events_limit).await?;
            Ok(store.apply_events(events, mark).await)
        }
        DataKind::Stats => {
            let stats = rest.fetch_stats().await?;
            Ok(store.apply_stats(stats, mark).await)
        }
    }
}

/// Wiring for one polling lane.
pub(crate) struct PollLane {
    /// Which slice this lane fetches.
    pub(crate) kind: DataKind,
    /// Cadence while healthy.
    pub(crate) interval: Duration,
    /// `limit` query parameter for the events endpoint.
    pub(crate) events_limit: u32,
    /// Shared REST client.
    pub(crate) rest: Arc<RestClient>,
    /// Store to offer payloads to.
    pub(crate) store: WorldStore,
    /// Session freshness clock.
    pub(crate) clock: Arc<FreshnessClock>,
    /// Health sink.
    pub(crate) monitor: Arc<ConnectionMonitor>,
}

impl PollLane {
    /// Drive this lane until shutdown.
    ///
    /// Polls immediately on startup, then on `interval` while healthy
    /// and on the backoff ladder while failing. Reports lane health to
    /// the monitor as it goes.
    pub(crate) async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut backoff = Backoff::new();
        loop {
            let wait = match poll_once(
                self.kind,
                self.events_limit,
                &self.rest,
                &self.store,
                &self.clock,
            )
            .await
            {
                Ok(applied) => {
                    backoff.reset();
                    self.monitor.lane_healthy(self.kind).await;
                    debug!(kind = %self.kind, applied = ?applied, "poll completed");
                    self.interval
                }
                Err(error) => {
                    let delay = backoff.record_failure();
                    warn!(
                        kind = %self.kind,
                        error = %error,
                        consecutive_failures = backoff.failures(),
                        retry_in_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "poll failed"
                    );
                    if backoff.is_degraded() {
                        self.monitor.lane_degraded(self.kind).await;
                    }
                    delay
                }
            };

            tokio::select! {
                () = tokio::time::sleep(wait) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
    }
}

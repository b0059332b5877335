//! The reconciliation store.
//!
//! One write-locked record of everything the client believes about the
//! remote world, fed by both transport adapters and read by everyone
//! else. Admission is freshness-gated: a payload is applied only when
//! its mark supersedes the stored mark for that slice, which makes the
//! store's contents independent of payload *arrival* order. Accepted
//! slices replace wholesale (events merge into a bounded ring instead);
//! records are never field-merged across channels, so a view can never
//! show half of one payload and half of another.
//!
//! Optimistic command effects live in a separate overlay that views are
//! composed through. The authoritative slices underneath are never
//! speculatively mutated, so dropping the overlay is a complete
//! rollback and an accepted authoritative snapshot silently retires it.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use lifescope_types::{
    Agent, AgentId, ConnectionState, DataKind, ExtendedStats, Freshness, SnapshotPatch,
    UpdateBundle, WorldEvent, WorldSnapshot, WorldView,
};
use tokio::sync::{RwLock, broadcast};
use tracing::debug;

/// Maximum number of events retained in the ring.
pub const EVENT_RING_CAPACITY: usize = 200;

/// Capacity of the change broadcast channel.
///
/// A subscriber that falls behind by more than this many notifications
/// receives a `Lagged` error and resumes from the newest change, which
/// is always safe because notifications carry no payload.
const CHANGE_CAPACITY: usize = 256;

/// What the store did with an offered payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The payload superseded the stored slice and was applied.
    Fresh,
    /// The payload carried the slice's current mark; a duplicate
    /// delivery, discarded without effect.
    Duplicate,
    /// The payload was older than the stored slice and was discarded.
    Stale,
}

impl Applied {
    /// Whether the payload was applied.
    pub const fn is_fresh(self) -> bool {
        matches!(self, Self::Fresh)
    }
}

/// A store change notification.
///
/// Notifications carry no data; subscribers pull a fresh
/// [`WorldView`] when they care. Exactly one notification is sent per
/// accepted change, and none for discarded payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreChange {
    /// One slice was accepted from an adapter.
    Slice {
        /// Which slice changed.
        kind: DataKind,
        /// Store revision after the change.
        revision: u64,
    },
    /// A push bundle was accepted; any subset of slices may have changed.
    Bundle {
        /// Store revision after the change.
        revision: u64,
    },
    /// The optimistic overlay was installed, replaced, or dropped.
    Overlay {
        /// Store revision after the change.
        revision: u64,
    },
    /// The connection state transitioned.
    Connection {
        /// The new state.
        state: ConnectionState,
        /// Store revision after the change.
        revision: u64,
    },
}

impl StoreChange {
    /// Store revision after this change.
    pub const fn revision(self) -> u64 {
        match self {
            Self::Slice { revision, .. }
            | Self::Bundle { revision }
            | Self::Overlay { revision }
            | Self::Connection { revision, .. } => revision,
        }
    }
}

/// Per-slice freshness marks.
#[derive(Debug, Clone, Copy, Default)]
struct SliceMarks {
    snapshot: Freshness,
    agents: Freshness,
    events: Freshness,
    stats: Freshness,
}

impl SliceMarks {
    const fn get(self, kind: DataKind) -> Freshness {
        match kind {
            DataKind::Snapshot => self.snapshot,
            DataKind::Agents => self.agents,
            DataKind::Events => self.events,
            DataKind::Stats => self.stats,
        }
    }

    fn set(&mut self, kind: DataKind, mark: Freshness) {
        match kind {
            DataKind::Snapshot => self.snapshot = mark,
            DataKind::Agents => self.agents = mark,
            DataKind::Events => self.events = mark,
            DataKind::Stats => self.stats = mark,
        }
    }

    /// Decide what to do with a payload mark, without applying it.
    fn decide(self, kind: DataKind, mark: Freshness) -> Applied {
        let stored = self.get(kind);
        if mark.supersedes(stored) {
            Applied::Fresh
        } else if mark.is_duplicate_of(stored) {
            Applied::Duplicate
        } else {
            Applied::Stale
        }
    }
}

/// Everything behind the store's lock.
#[derive(Debug, Default)]
struct StoreInner {
    snapshot: WorldSnapshot,
    agents: BTreeMap<AgentId, Agent>,
    events: Vec<WorldEvent>,
    stats: ExtendedStats,
    marks: SliceMarks,
    overlay: Option<SnapshotPatch>,
    connection: ConnectionState,
    has_ever_synced: bool,
    revision: u64,
}

impl StoreInner {
    /// Record an accepted change: bump the revision and remember that
    /// we have synced at least once.
    fn commit(&mut self, kind: DataKind, mark: Freshness) {
        self.marks.set(kind, mark);
        self.has_ever_synced = true;
        self.revision = self.revision.saturating_add(1);
    }

    /// Merge an incoming newest-first event list into the ring.
    ///
    /// Incoming events lead (they are at least as new), known ids are
    /// dropped from the remainder, and the result is truncated to
    /// [`EVENT_RING_CAPACITY`].
    fn merge_events(&mut self, incoming: Vec<WorldEvent>) {
        let seen: BTreeSet<_> = incoming.iter().map(|e| e.id.clone()).collect();
        let mut merged = incoming;
        merged.extend(
            std::mem::take(&mut self.events)
                .into_iter()
                .filter(|e| !seen.contains(&e.id)),
        );
        merged.truncate(EVENT_RING_CAPACITY);
        self.events = merged;
    }

    /// The composed view: authoritative slices with the optimistic
    /// overlay applied on top.
    fn view(&self) -> WorldView {
        let snapshot = self.overlay.as_ref().map_or_else(
            || self.snapshot.clone(),
            |patch| self.snapshot.with_patch(patch),
        );
        WorldView {
            revision: self.revision,
            snapshot,
            agents: self.agents.clone(),
            events: self.events.clone(),
            stats: self.stats.clone(),
            connection: self.connection,
            has_ever_synced: self.has_ever_synced,
        }
    }
}

/// Handle to the shared reconciliation store.
///
/// Cheap to clone; all clones share the same state and change channel.
#[derive(Debug, Clone)]
pub struct WorldStore {
    inner: Arc<RwLock<StoreInner>>,
    tx: broadcast::Sender<StoreChange>,
}

impl WorldStore {
    /// Create an empty store for a new session.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANGE_CAPACITY);
        Self {
            inner: Arc::new(RwLock::new(StoreInner::default())),
            tx,
        }
    }

    /// Subscribe to change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.tx.subscribe()
    }

    /// Notify subscribers of an accepted change.
    ///
    /// Zero receivers is normal (nothing rendering yet), not an error.
    fn notify(&self, change: StoreChange) {
        let _ = self.tx.send(change);
    }

    // -----------------------------------------------------------------------
    // Slice application
    // -----------------------------------------------------------------------

    /// Offer an authoritative world snapshot.
    ///
    /// Accepting a snapshot retires any optimistic overlay: the
    /// authoritative record wins silently, with no rollback
    /// notification of its own.
    pub async fn apply_snapshot(&self, snapshot: WorldSnapshot, mark: Freshness) -> Applied {
        let mut inner = self.inner.write().await;
        let verdict = inner.marks.decide(DataKind::Snapshot, mark);
        if verdict.is_fresh() {
            inner.snapshot = snapshot;
            inner.overlay = None;
            inner.commit(DataKind::Snapshot, mark);
            let revision = inner.revision;
            drop(inner);
            self.notify(StoreChange::Slice {
                kind: DataKind::Snapshot,
                revision,
            });
        } else {
            discard_log(DataKind::Snapshot, mark, inner.marks.get(DataKind::Snapshot), verdict);
        }
        verdict
    }

    /// Offer the full agent collection.
    pub async fn apply_agents(&self, agents: Vec<Agent>, mark: Freshness) -> Applied {
        let mut inner = self.inner.write().await;
        let verdict = inner.marks.decide(DataKind::Agents, mark);
        if verdict.is_fresh() {
            inner.agents = key_agents(agents);
            inner.commit(DataKind::Agents, mark);
            let revision = inner.revision;
            drop(inner);
            self.notify(StoreChange::Slice {
                kind: DataKind::Agents,
                revision,
            });
        } else {
            discard_log(DataKind::Agents, mark, inner.marks.get(DataKind::Agents), verdict);
        }
        verdict
    }

    /// Offer a newest-first batch of recent events.
    pub async fn apply_events(&self, events: Vec<WorldEvent>, mark: Freshness) -> Applied {
        let mut inner = self.inner.write().await;
        let verdict = inner.marks.decide(DataKind::Events, mark);
        if verdict.is_fresh() {
            inner.merge_events(events);
            inner.commit(DataKind::Events, mark);
            let revision = inner.revision;
            drop(inner);
            self.notify(StoreChange::Slice {
                kind: DataKind::Events,
                revision,
            });
        } else {
            discard_log(DataKind::Events, mark, inner.marks.get(DataKind::Events), verdict);
        }
        verdict
    }

    /// Offer the deep-life statistics record.
    pub async fn apply_stats(&self, stats: ExtendedStats, mark: Freshness) -> Applied {
        let mut inner = self.inner.write().await;
        let verdict = inner.marks.decide(DataKind::Stats, mark);
        if verdict.is_fresh() {
            inner.stats = stats;
            inner.commit(DataKind::Stats, mark);
            let revision = inner.revision;
            drop(inner);
            self.notify(StoreChange::Slice {
                kind: DataKind::Stats,
                revision,
            });
        } else {
            discard_log(DataKind::Stats, mark, inner.marks.get(DataKind::Stats), verdict);
        }
        verdict
    }

    /// Offer a push bundle: up to three slices under one mark, one
    /// lock acquisition, and at most one notification.
    ///
    /// Each carried slice is admitted independently against its own
    /// stored mark. Returns [`Applied::Fresh`] when any slice applied,
    /// [`Applied::Stale`] when every carried slice was superseded, and
    /// [`Applied::Duplicate`] for redelivery or an empty bundle.
    pub async fn apply_bundle(&self, bundle: UpdateBundle, mark: Freshness) -> Applied {
        let mut inner = self.inner.write().await;
        let mut any_fresh = false;
        let mut any_stale = false;

        if let Some(snapshot) = bundle.simulation {
            if inner.marks.decide(DataKind::Snapshot, mark).is_fresh() {
                inner.snapshot = snapshot;
                inner.overlay = None;
                inner.marks.set(DataKind::Snapshot, mark);
                any_fresh = true;
            } else {
                any_stale = true;
            }
        }
        if let Some(envelope) = bundle.agents {
            if inner.marks.decide(DataKind::Agents, mark).is_fresh() {
                inner.agents = key_agents(envelope.agents);
                inner.marks.set(DataKind::Agents, mark);
                any_fresh = true;
            } else {
                any_stale = true;
            }
        }
        if let Some(envelope) = bundle.events {
            if inner.marks.decide(DataKind::Events, mark).is_fresh() {
                inner.merge_events(envelope.events);
                inner.marks.set(DataKind::Events, mark);
                any_fresh = true;
            } else {
                any_stale = true;
            }
        }

        if any_fresh {
            inner.has_ever_synced = true;
            inner.revision = inner.revision.saturating_add(1);
            let revision = inner.revision;
            drop(inner);
            self.notify(StoreChange::Bundle { revision });
            Applied::Fresh
        } else if any_stale {
            debug!(mark = %mark, "discarded stale push bundle");
            Applied::Stale
        } else {
            Applied::Duplicate
        }
    }

    // -----------------------------------------------------------------------
    // Optimistic overlay
    // -----------------------------------------------------------------------

    /// Install (or replace) the optimistic overlay.
    ///
    /// The latest dispatched command owns the overlay slot; views
    /// compose through it until an authoritative snapshot arrives or
    /// the owning command rolls it back.
    pub async fn install_overlay(&self, patch: SnapshotPatch) {
        let mut inner = self.inner.write().await;
        inner.overlay = Some(patch);
        inner.revision = inner.revision.saturating_add(1);
        let revision = inner.revision;
        drop(inner);
        self.notify(StoreChange::Overlay { revision });
    }

    /// Drop the optimistic overlay, restoring the purely authoritative
    /// view. No-op when no overlay is installed.
    pub async fn clear_overlay(&self) {
        let mut inner = self.inner.write().await;
        if inner.overlay.take().is_none() {
            return;
        }
        inner.revision = inner.revision.saturating_add(1);
        let revision = inner.revision;
        drop(inner);
        self.notify(StoreChange::Overlay { revision });
    }

    // -----------------------------------------------------------------------
    // Connection state
    // -----------------------------------------------------------------------

    /// Record a connection state transition. No-op (and no
    /// notification) when the state is unchanged.
    pub async fn set_connection(&self, state: ConnectionState) {
        let mut inner = self.inner.write().await;
        if inner.connection == state {
            return;
        }
        inner.connection = state;
        inner.revision = inner.revision.saturating_add(1);
        let revision = inner.revision;
        drop(inner);
        debug!(state = %state, "connection state changed");
        self.notify(StoreChange::Connection { state, revision });
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// A coherent copy of the current composed view.
    pub async fn view(&self) -> WorldView {
        self.inner.read().await.view()
    }

    /// Current change counter without copying the view.
    pub async fn revision(&self) -> u64 {
        self.inner.read().await.revision
    }
}

impl Default for WorldStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Key a decoded agent list by id. Later duplicates win.
fn key_agents(agents: Vec<Agent>) -> BTreeMap<AgentId, Agent> {
    agents
        .into_iter()
        .map(|agent| (agent.id.clone(), agent))
        .collect()
}

fn discard_log(kind: DataKind, mark: Freshness, stored: Freshness, verdict: Applied) {
    match verdict {
        Applied::Stale => debug!(kind = %kind, mark = %mark, stored = %stored, "discarded stale payload"),
        Applied::Duplicate => {
            debug!(kind = %kind, mark = %mark, "discarded duplicate delivery");
        }
        Applied::Fresh => {}
    }
}

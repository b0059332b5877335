//! The composed world view handed to consumers.
//!
//! A [`WorldView`] is a coherent copy of everything the client currently
//! believes about the remote world: the four state slices plus link
//! health. The reconciliation store produces it; the projector and
//! console consume it. It is a value, detached from the store, so
//! consumers never observe a slice mid-update.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::enums::ConnectionState;
use crate::ids::{AgentId, GroupName};
use crate::structs::{Agent, ExtendedStats, WorldEvent, WorldSnapshot};

/// One coherent copy of the client's current belief about the world.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldView {
    /// Monotonic change counter; bumps once per accepted update.
    ///
    /// Consumers that cache derived work can compare revisions instead
    /// of diffing slices.
    pub revision: u64,
    /// Scalar world facts. Reflects any optimistic command overlay.
    pub snapshot: WorldSnapshot,
    /// All known agents keyed by id.
    pub agents: BTreeMap<AgentId, Agent>,
    /// Recent events, newest first, bounded by the store's ring size.
    pub events: Vec<WorldEvent>,
    /// Deep-life statistics.
    pub stats: ExtendedStats,
    /// Current link health.
    pub connection: ConnectionState,
    /// Whether any authoritative data has ever been accepted this
    /// session. False means the view's slices are still placeholders.
    pub has_ever_synced: bool,
}

impl WorldView {
    /// Distinct group affiliations present among the agents, sorted.
    pub fn group_names(&self) -> BTreeSet<GroupName> {
        self.agents
            .values()
            .map(|agent| agent.tribe.clone())
            .collect()
    }

    /// Look up one agent by id.
    pub fn agent(&self, id: &AgentId) -> Option<&Agent> {
        self.agents.get(id)
    }

    /// Whether the link is healthy enough to trust the view as current.
    pub const fn is_live(&self) -> bool {
        self.connection.is_live()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn make_agent(id: &str, tribe: &str) -> Agent {
        serde_json::from_value(serde_json::json!({"id": id, "tribe": tribe})).unwrap()
    }

    #[test]
    fn default_view_is_empty_and_unsynced() {
        let view = WorldView::default();
        assert_eq!(view.revision, 0);
        assert!(view.agents.is_empty());
        assert!(!view.has_ever_synced);
        assert_eq!(view.connection, ConnectionState::Connecting);
    }

    #[test]
    fn group_names_deduplicate_and_sort() {
        let mut view = WorldView::default();
        for (id, tribe) in [
            ("aedan", "Storm Tribe"),
            ("kara", "Storm Tribe"),
            ("theron", "River Clan"),
        ] {
            view.agents.insert(AgentId::from(id), make_agent(id, tribe));
        }
        let names: Vec<GroupName> = view.group_names().into_iter().collect();
        assert_eq!(
            names,
            vec![GroupName::from("River Clan"), GroupName::from("Storm Tribe")]
        );
        assert_eq!(view.agent(&AgentId::from("kara")).map(|a| a.tribe.clone()),
            Some(GroupName::from("Storm Tribe")));
    }
}

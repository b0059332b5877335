//! Enumeration types for the observatory view model.
//!
//! The backend speaks free-form strings for agent status and event
//! categories. Everything here is a closed set with one explicit default
//! arm so the scene and presentation layers can match totally -- an
//! unknown string from the wire can never open a rendering gap.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Agent status
// ---------------------------------------------------------------------------

/// Discrete activity status of an agent.
///
/// Unknown wire values decode to [`AgentStatus::Unknown`] instead of
/// failing the payload; the scene layer renders them with the fallback
/// tint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    /// Going about ordinary business.
    #[default]
    Active,
    /// Sleeping or recovering.
    Resting,
    /// Ranging away from the group.
    Exploring,
    /// Any status string this client does not recognize.
    #[serde(other)]
    Unknown,
}

impl core::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let label = match self {
            Self::Active => "active",
            Self::Resting => "resting",
            Self::Exploring => "exploring",
            Self::Unknown => "unknown",
        };
        write!(f, "{label}")
    }
}

// ---------------------------------------------------------------------------
// Event category
// ---------------------------------------------------------------------------

/// Broad category of a world event.
///
/// The backend's current generation emits the four canonical category
/// strings directly; its older generation emits free-form type strings
/// (`"natural_wonder"`, `"tribal_dispute"`). [`EventCategory::classify`]
/// maps both generations totally, falling back to [`Self::Discovery`]
/// exactly as the backend's own categorizer does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventCategory {
    /// A new agent entered the world.
    Birth,
    /// Fights, wars, and disputes.
    Conflict,
    /// Festivals, bonds deepening, shared joy.
    Celebration,
    /// Everything else; the backend's own default bucket.
    #[default]
    #[serde(other)]
    Discovery,
}

impl EventCategory {
    /// Total mapping from any type string to a category.
    ///
    /// Keyword sets mirror the backend's categorizer so both event
    /// generations land in the same buckets.
    pub fn classify(raw: &str) -> Self {
        let lowered = raw.to_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| lowered.contains(w));
        if has(&["birth", "born", "child"]) {
            Self::Birth
        } else if has(&["conflict", "fight", "war", "dispute"]) {
            Self::Conflict
        } else if has(&["celebration", "festival", "party", "joy"]) {
            Self::Celebration
        } else {
            Self::Discovery
        }
    }
}

impl core::fmt::Display for EventCategory {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let label = match self {
            Self::Birth => "birth",
            Self::Conflict => "conflict",
            Self::Celebration => "celebration",
            Self::Discovery => "discovery",
        };
        write!(f, "{label}")
    }
}

// ---------------------------------------------------------------------------
// Event theme
// ---------------------------------------------------------------------------

/// Optional deep-life theme attached to an event by the backend's
/// extended statistics pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventTheme {
    /// Courtship and partnership events.
    Romance,
    /// Family formation and bonding events.
    Family,
    /// Mood and empathy events.
    Emotional,
    /// Life-purpose discovery events.
    Purpose,
}

// ---------------------------------------------------------------------------
// Control actions
// ---------------------------------------------------------------------------

/// An operator command the client can issue to the backend.
///
/// Actions map to `POST {base}/control/...` paths; they are never
/// serialized as JSON bodies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlAction {
    /// Start (or resume) the simulation.
    Start,
    /// Pause the simulation; state is retained.
    Pause,
    /// Stop the simulation.
    Stop,
    /// Advance exactly one simulation day.
    Step,
    /// Change the speed multiplier (clamped server-side to 0.1..=10.0).
    SetSpeed(f64),
}

impl ControlAction {
    /// URL path fragment for this action, relative to the REST base.
    pub fn wire_path(self) -> String {
        match self {
            Self::Start => String::from("control/start"),
            Self::Pause => String::from("control/pause"),
            Self::Stop => String::from("control/stop"),
            Self::Step => String::from("control/step"),
            Self::SetSpeed(speed) => format!("control/speed/{speed}"),
        }
    }

    /// Short human-readable name for logs and notifications.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Pause => "pause",
            Self::Stop => "stop",
            Self::Step => "step",
            Self::SetSpeed(_) => "speed-change",
        }
    }
}

impl core::fmt::Display for ControlAction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::SetSpeed(speed) => write!(f, "speed-change({speed})"),
            other => write!(f, "{}", other.label()),
        }
    }
}

/// Lifecycle of a dispatched command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandState {
    /// Sent, awaiting the backend's verdict.
    Pending,
    /// The backend accepted the command.
    Confirmed,
    /// The backend rejected the command, or the request failed.
    Failed {
        /// Operator-facing description of what went wrong.
        reason: String,
    },
}

impl CommandState {
    /// Whether the command has reached a terminal state.
    pub const fn is_resolved(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

// ---------------------------------------------------------------------------
// Connection state
// ---------------------------------------------------------------------------

/// Derived health of the link to the backend.
///
/// Computed by the connection monitor from the push channel's phase and
/// the pull lanes' recent history; presentation reads it, never writes it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// First connection attempt is still in flight.
    #[default]
    Connecting,
    /// The push channel is up.
    Connected,
    /// Push is down but polling still reaches the backend.
    Degraded,
    /// Nothing reaches the backend; the view model is frozen.
    Disconnected,
}

impl ConnectionState {
    /// Whether any channel is currently delivering fresh data.
    pub const fn is_live(self) -> bool {
        matches!(self, Self::Connected | Self::Degraded)
    }
}

impl core::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let label = match self {
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Degraded => "degraded",
            Self::Disconnected => "disconnected",
        };
        write!(f, "{label}")
    }
}

// ---------------------------------------------------------------------------
// Data kinds
// ---------------------------------------------------------------------------

/// The four independently-reconciled slices of the view model.
///
/// Each kind carries its own freshness lane and its own poll cadence;
/// the store never compares marks across kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataKind {
    /// Scalar world facts (day, population, run flag, ...).
    Snapshot,
    /// The full agent collection.
    Agents,
    /// The bounded event ring.
    Events,
    /// Deep-life extended statistics.
    Stats,
}

impl DataKind {
    /// All kinds, in store order.
    pub const ALL: [Self; 4] = [Self::Snapshot, Self::Agents, Self::Events, Self::Stats];
}

impl core::fmt::Display for DataKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let label = match self {
            Self::Snapshot => "snapshot",
            Self::Agents => "agents",
            Self::Events => "events",
            Self::Stats => "stats",
        };
        write!(f, "{label}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_status_decodes_to_fallback() {
        let status: Result<AgentStatus, _> = serde_json::from_str("\"meditating\"");
        assert_eq!(status.ok(), Some(AgentStatus::Unknown));
    }

    #[test]
    fn known_status_round_trips() {
        let json = serde_json::to_string(&AgentStatus::Exploring).unwrap_or_default();
        assert_eq!(json, "\"exploring\"");
        let back: Result<AgentStatus, _> = serde_json::from_str(&json);
        assert_eq!(back.ok(), Some(AgentStatus::Exploring));
    }

    #[test]
    fn classify_matches_backend_buckets() {
        assert_eq!(EventCategory::classify("birth"), EventCategory::Birth);
        assert_eq!(EventCategory::classify("child_born"), EventCategory::Birth);
        assert_eq!(
            EventCategory::classify("tribal_dispute"),
            EventCategory::Conflict
        );
        assert_eq!(
            EventCategory::classify("harvest_festival"),
            EventCategory::Celebration
        );
        assert_eq!(
            EventCategory::classify("natural_wonder"),
            EventCategory::Discovery
        );
        // The default bucket is discovery, as on the backend.
        assert_eq!(EventCategory::classify(""), EventCategory::Discovery);
    }

    #[test]
    fn control_action_paths() {
        assert_eq!(ControlAction::Start.wire_path(), "control/start");
        assert_eq!(ControlAction::Step.wire_path(), "control/step");
        assert_eq!(
            ControlAction::SetSpeed(2.5).wire_path(),
            "control/speed/2.5"
        );
    }

    #[test]
    fn command_state_resolution() {
        assert!(!CommandState::Pending.is_resolved());
        assert!(CommandState::Confirmed.is_resolved());
        assert!(
            CommandState::Failed {
                reason: String::from("rejected")
            }
            .is_resolved()
        );
    }

    #[test]
    fn connection_liveness() {
        assert!(ConnectionState::Connected.is_live());
        assert!(ConnectionState::Degraded.is_live());
        assert!(!ConnectionState::Connecting.is_live());
        assert!(!ConnectionState::Disconnected.is_live());
    }
}

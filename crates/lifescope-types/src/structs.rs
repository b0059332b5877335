//! Core view-model structs and their wire shapes.
//!
//! Field names and casing follow the backend's JSON exactly (camelCase
//! envelope fields, snake_case sub-records); serde renames keep the Rust
//! side uniformly snake_case. Where the backend's older generation used
//! different field names, serde aliases accept them so stale pull
//! payloads still decode.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::enums::{AgentStatus, CommandState, ControlAction, EventCategory, EventTheme};
use crate::ids::{AgentId, CommandId, EventId, GroupName};

// ---------------------------------------------------------------------------
// Simulation-space positions
// ---------------------------------------------------------------------------

/// Lower bound of the simulation coordinate range on both axes.
pub const SIM_COORD_MIN: f64 = 0.0;

/// Upper bound of the simulation coordinate range on both axes.
pub const SIM_COORD_MAX: f64 = 100.0;

/// A 2D position in simulation space.
///
/// Both axes are bounded to `SIM_COORD_MIN..=SIM_COORD_MAX`; the backend
/// occasionally emits positions slightly outside after migrations, so
/// consumers clamp via [`SimPosition::clamped`] before projecting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SimPosition {
    /// Horizontal simulation coordinate.
    pub x: f64,
    /// Vertical simulation coordinate.
    pub y: f64,
}

impl SimPosition {
    /// Create a position from raw coordinates.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// This position with both axes clamped into the simulation bounds.
    pub fn clamped(self) -> Self {
        Self {
            x: self.x.clamp(SIM_COORD_MIN, SIM_COORD_MAX),
            y: self.y.clamp(SIM_COORD_MIN, SIM_COORD_MAX),
        }
    }
}

// ---------------------------------------------------------------------------
// World snapshot
// ---------------------------------------------------------------------------

/// Aggregate world statistics nested inside a snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldStats {
    /// Total recorded activities since the world began.
    #[serde(rename = "totalActivities", default)]
    pub total_activities: u64,
    /// Number of distinct tribal groups.
    #[serde(rename = "tribalGroups", default)]
    pub tribal_groups: u64,
    /// Number of discovered technologies.
    #[serde(default)]
    pub technologies: u64,
    /// Number of created cultural artifacts.
    #[serde(rename = "culturalArtifacts", default)]
    pub cultural_artifacts: u64,
}

/// Scalar facts about the world at one observed instant.
///
/// Immutable once received; an accepted snapshot replaces the previous
/// one wholesale. Optimistic command effects are composed over it via
/// [`SnapshotPatch`], never written into it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// Current simulation day counter.
    #[serde(default)]
    pub day: u64,
    /// Number of living agents.
    #[serde(default)]
    pub population: u64,
    /// Name of the current civilizational phase.
    #[serde(default)]
    pub phase: String,
    /// Progress through the current phase, 0..=100.
    #[serde(rename = "phaseProgress", default)]
    pub phase_progress: f64,
    /// Whether the simulation loop is currently running.
    #[serde(rename = "isRunning", default)]
    pub is_running: bool,
    /// Speed multiplier applied to the simulation loop.
    #[serde(default = "default_speed")]
    pub speed: f64,
    /// Total events recorded since the world began.
    #[serde(rename = "totalEvents", default)]
    pub total_events: u64,
    /// Aggregate world statistics.
    #[serde(rename = "worldStats", default)]
    pub world_stats: WorldStats,
}

const fn default_speed() -> f64 {
    1.0
}

impl WorldSnapshot {
    /// This snapshot with an optimistic patch composed over it.
    ///
    /// The receiver is not modified; optimistic effects exist only in
    /// the composed view so an authoritative snapshot supersedes them
    /// silently and a rollback is just dropping the patch.
    pub fn with_patch(&self, patch: &SnapshotPatch) -> Self {
        let mut composed = self.clone();
        if let Some(running) = patch.is_running {
            composed.is_running = running;
        }
        if let Some(speed) = patch.speed {
            composed.speed = speed;
        }
        composed
    }
}

/// Speculative overrides for snapshot fields with a known optimistic
/// command effect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotPatch {
    /// Override for the run flag.
    pub is_running: Option<bool>,
    /// Override for the speed multiplier.
    pub speed: Option<f64>,
}

impl SnapshotPatch {
    /// Whether the patch overrides nothing.
    pub const fn is_empty(&self) -> bool {
        self.is_running.is_none() && self.speed.is_none()
    }
}

impl ControlAction {
    /// The optimistic local effect of this action, if it has one.
    ///
    /// `Step` deliberately has none: predicting the next day counter
    /// would fight the authoritative snapshot whenever the step fails
    /// server-side.
    pub const fn optimistic_patch(self) -> Option<SnapshotPatch> {
        match self {
            Self::Start => Some(SnapshotPatch {
                is_running: Some(true),
                speed: None,
            }),
            Self::Pause | Self::Stop => Some(SnapshotPatch {
                is_running: Some(false),
                speed: None,
            }),
            Self::SetSpeed(speed) => Some(SnapshotPatch {
                is_running: None,
                speed: Some(speed),
            }),
            Self::Step => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Agent sub-records
// ---------------------------------------------------------------------------

/// Emotional state sub-record of an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentEmotions {
    /// Current overall mood label.
    #[serde(default = "default_mood")]
    pub current_mood: String,
    /// Strongest single emotion right now.
    #[serde(default = "default_emotion")]
    pub dominant_emotion: String,
    /// Emotional stability, 0..=100.
    #[serde(default = "default_stability")]
    pub emotional_stability: f64,
    /// Empathy level, 0..=100.
    #[serde(default = "default_empathy")]
    pub empathy_level: f64,
}

fn default_mood() -> String {
    String::from("neutral")
}

fn default_emotion() -> String {
    String::from("calm")
}

const fn default_stability() -> f64 {
    70.0
}

const fn default_empathy() -> f64 {
    50.0
}

impl Default for AgentEmotions {
    fn default() -> Self {
        Self {
            current_mood: default_mood(),
            dominant_emotion: default_emotion(),
            emotional_stability: default_stability(),
            empathy_level: default_empathy(),
        }
    }
}

/// Life-purpose sub-record of an agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LifePurpose {
    /// Purpose archetype (`"Leader"`, `"Creator"`, ...), if discovered.
    #[serde(default)]
    pub category: Option<String>,
    /// Free-text description of the purpose.
    #[serde(default)]
    pub description: Option<String>,
    /// How clearly the agent understands its purpose, 0..=100.
    #[serde(default)]
    pub clarity: f64,
    /// How fulfilled the agent currently is, 0..=100.
    #[serde(default)]
    pub fulfillment: f64,
}

/// Family-bond sub-record of an agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FamilyBonds {
    /// Ids of this agent's children.
    #[serde(default)]
    pub children: Vec<AgentId>,
    /// Ids of this agent's parents.
    #[serde(default)]
    pub parents: Vec<AgentId>,
    /// Ids of this agent's siblings.
    #[serde(default)]
    pub siblings: Vec<AgentId>,
    /// Id of this agent's partner, if bonded.
    #[serde(default)]
    pub partner: Option<AgentId>,
    /// Aggregate bond strength, 0..=100.
    #[serde(default)]
    pub bond_strength: f64,
}

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

/// One agent as presented by the backend.
///
/// Agents are keyed by [`AgentId`]; an accepted agent payload replaces
/// the whole collection, and an individual record is never field-merged
/// across channels (that is what prevents cross-channel tearing).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    /// Stable backend-assigned identifier.
    pub id: AgentId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Age in simulation years.
    #[serde(default)]
    pub age: u32,
    /// Group affiliation.
    #[serde(default = "default_tribe")]
    pub tribe: GroupName,
    /// Position in simulation space.
    #[serde(default)]
    pub position: SimPosition,
    /// Discrete activity status.
    #[serde(default)]
    pub status: AgentStatus,
    /// Trait levels by trait name.
    ///
    /// The backend's older generation sends a bare array of trait names;
    /// those decode as level 1.0 each.
    #[serde(default, deserialize_with = "trait_levels")]
    pub traits: BTreeMap<String, f64>,
    /// Relationship labels keyed by the other agent's id.
    #[serde(default)]
    pub relationships: BTreeMap<AgentId, String>,
    /// Skill levels by skill name, 0..=100.
    #[serde(default)]
    pub skills: BTreeMap<String, f64>,
    /// Number of memories the agent has accumulated.
    #[serde(default)]
    pub memories_count: u64,
    /// Emotional state, when the backend includes it.
    #[serde(default)]
    pub emotions: Option<AgentEmotions>,
    /// Life purpose, when the backend includes it.
    #[serde(rename = "lifePurpose", default)]
    pub life_purpose: Option<LifePurpose>,
    /// Family bonds, when the backend includes it.
    #[serde(rename = "familyBonds", default)]
    pub family_bonds: Option<FamilyBonds>,
}

fn default_tribe() -> GroupName {
    GroupName::from("Independent")
}

/// Accept both trait wire shapes: `{"name": level}` maps and legacy
/// `["name", ...]` arrays (each name valued at 1.0).
fn trait_levels<'de, D>(deserializer: D) -> Result<BTreeMap<String, f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TraitsWire {
        Leveled(BTreeMap<String, f64>),
        Named(Vec<String>),
    }

    Ok(match TraitsWire::deserialize(deserializer)? {
        TraitsWire::Leveled(map) => map,
        TraitsWire::Named(names) => names.into_iter().map(|name| (name, 1.0)).collect(),
    })
}

// ---------------------------------------------------------------------------
// World events
// ---------------------------------------------------------------------------

/// An immutable world event.
///
/// This is the canonical (current-generation) event shape. The older
/// engine generation is accepted through serde aliases: `event_id` for
/// the id, `event_type` for the category string, `participants` for the
/// involved agents. The category string -- canonical or free-form -- is
/// folded through [`EventCategory::classify`] so every event lands in a
/// closed category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldEvent {
    /// Deduplication key for the event ring.
    #[serde(alias = "event_id")]
    pub id: EventId,
    /// Closed category, classified from the wire type string.
    #[serde(
        rename = "type",
        alias = "event_type",
        default,
        deserialize_with = "category_from_wire"
    )]
    pub category: EventCategory,
    /// Short headline; the older generation has none.
    #[serde(default)]
    pub title: String,
    /// Free-text description of what happened.
    #[serde(default)]
    pub description: String,
    /// Epoch milliseconds when the event occurred; 0.0 when the source
    /// did not say.
    #[serde(default)]
    pub timestamp: f64,
    /// Display names of the agents involved.
    #[serde(default, alias = "participants")]
    pub agents: Vec<String>,
    /// Deep-life theme, when the backend tagged one.
    #[serde(rename = "phase10_category", default)]
    pub theme: Option<EventTheme>,
}

impl WorldEvent {
    /// The event's timestamp as UTC wall-clock time, when it carries a
    /// plausible one.
    #[allow(clippy::cast_possible_truncation)]
    pub fn occurred_at(&self) -> Option<DateTime<Utc>> {
        if self.timestamp <= 0.0 || !self.timestamp.is_finite() {
            return None;
        }
        DateTime::from_timestamp_millis(self.timestamp.round() as i64)
    }
}

/// Classify whatever category string the wire carries.
fn category_from_wire<'de, D>(deserializer: D) -> Result<EventCategory, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(EventCategory::classify(&raw))
}

// ---------------------------------------------------------------------------
// Extended statistics
// ---------------------------------------------------------------------------

/// Courtship and partnership aggregates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RomanceStats {
    /// Number of currently partnered pairs.
    #[serde(default)]
    pub active_relationships: u64,
    /// Total romance-themed events recorded.
    #[serde(default)]
    pub total_events: u64,
    /// Number of agents currently expecting a child.
    #[serde(default)]
    pub pregnancies: u64,
}

/// Family-structure aggregates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FamilyStats {
    /// Number of distinct family units.
    #[serde(default)]
    pub family_units: u64,
    /// Total family-themed events recorded.
    #[serde(default)]
    pub total_events: u64,
    /// Mean bond strength across all agents.
    #[serde(default)]
    pub avg_bond_strength: f64,
}

/// Emotional-complexity aggregates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmotionStats {
    /// Total emotion-themed events recorded.
    #[serde(default)]
    pub total_events: u64,
    /// Mean empathy level across all agents.
    #[serde(default)]
    pub avg_empathy: f64,
    /// Number of distinct dominant emotions present.
    #[serde(default)]
    pub emotional_range: u64,
}

/// Life-purpose aggregates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurposeStats {
    /// Number of agents that have discovered a purpose.
    #[serde(default)]
    pub agents_with_purpose: u64,
    /// Total purpose-themed events recorded.
    #[serde(default)]
    pub total_events: u64,
    /// Count of agents per purpose archetype.
    #[serde(default)]
    pub purpose_distribution: BTreeMap<String, u64>,
}

/// The backend's deep-life statistics record, pulled on its own slow
/// cadence as the fourth store slice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtendedStats {
    /// Courtship and partnership aggregates.
    #[serde(default)]
    pub love_romance: RomanceStats,
    /// Family-structure aggregates.
    #[serde(default)]
    pub family_bonds: FamilyStats,
    /// Emotional-complexity aggregates.
    #[serde(default)]
    pub emotional_complexity: EmotionStats,
    /// Life-purpose aggregates.
    #[serde(default)]
    pub life_purpose: PurposeStats,
}

// ---------------------------------------------------------------------------
// Command outcomes
// ---------------------------------------------------------------------------

/// One-shot record of a dispatched command reaching a state worth
/// telling the operator about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandOutcome {
    /// Correlation id assigned at dispatch.
    pub id: CommandId,
    /// The action that was dispatched.
    pub action: ControlAction,
    /// The state the command reached.
    pub state: CommandState,
    /// When the command was dispatched.
    pub issued_at: DateTime<Utc>,
}

//! Frame composition: a world view in, a drawable scene out.
//!
//! Composition runs in two stages. [`Projector::project_base`] does the
//! per-revision work: projecting agents onto the terrain, laying out
//! territory rings, folding events into feed lines. [`Projector::animate`]
//! does the per-frame work: applying time-driven motion to a base. The
//! driver reuses one [`FrameBase`] across frames while the store
//! revision is unchanged and only re-animates it.

use lifescope_types::{
    AgentId, AgentStatus, ConnectionState, EventCategory, EventId, EventTheme, ExtendedStats,
    GroupName, WorldEvent, WorldView,
};
use serde::{Deserialize, Serialize};

use crate::animate::{agent_phase, bob_offset, highlight_pulse};
use crate::palette::{Tint, category_tint, group_tint, status_tint};
use crate::terrain::TerrainField;
use crate::territory::TerritoryLayout;
use crate::transform::{MapTransform, ScenePoint};

// ---------------------------------------------------------------------------
// Frame elements
// ---------------------------------------------------------------------------

/// Where one agent stands while the store revision is unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentAnchor {
    /// The agent's id.
    pub id: AgentId,
    /// Display name.
    pub name: String,
    /// Group affiliation.
    pub tribe: GroupName,
    /// Activity status.
    pub status: AgentStatus,
    /// Ground-plane position.
    pub point: ScenePoint,
    /// Terrain height under the figure.
    pub rest_y: f64,
    /// Animation phase angle, stable per agent.
    pub phase: f64,
    /// Figure tint.
    pub tint: Tint,
}

/// One fully placed and animated figure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentFigure {
    /// The agent's id.
    pub id: AgentId,
    /// Display name.
    pub name: String,
    /// Group affiliation.
    pub tribe: GroupName,
    /// Activity status.
    pub status: AgentStatus,
    /// Scene X.
    pub x: f64,
    /// Scene Y, terrain height plus bob.
    pub y: f64,
    /// Scene Z.
    pub z: f64,
    /// Figure tint.
    pub tint: Tint,
}

/// One group's territory ring projected onto the stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerritoryOverlay {
    /// The group this ring belongs to.
    pub group: GroupName,
    /// Ring center on the ground plane.
    pub center: ScenePoint,
    /// Terrain height at the ring center.
    pub ground_y: f64,
    /// Ring radius, scene units.
    pub radius: f64,
    /// Ring tint.
    pub tint: Tint,
}

/// One line of the event feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedLine {
    /// Source event id.
    pub id: EventId,
    /// Event category.
    pub category: EventCategory,
    /// Deep-life theme, when tagged.
    pub theme: Option<EventTheme>,
    /// Headline text.
    pub text: String,
    /// Line tint.
    pub tint: Tint,
}

impl FeedLine {
    fn from_event(event: &WorldEvent) -> Self {
        let text = if event.title.is_empty() {
            event.description.clone()
        } else {
            event.title.clone()
        };
        Self {
            id: event.id.clone(),
            category: event.category,
            theme: event.theme,
            text,
            tint: category_tint(event.category),
        }
    }
}

/// Scalar facts shown alongside the stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HudSummary {
    /// Simulation day.
    pub day: u64,
    /// Living agents.
    pub population: u64,
    /// Current phase name.
    pub phase: String,
    /// Progress through the phase, 0..=100.
    pub phase_progress: f64,
    /// Whether the simulation is running.
    pub is_running: bool,
    /// Simulation speed multiplier.
    pub speed: f64,
    /// Total events recorded.
    pub total_events: u64,
    /// Link health.
    pub connection: ConnectionState,
    /// True until the first authoritative data arrives.
    pub awaiting_first_sync: bool,
    /// Deep-life statistics.
    pub stats: ExtendedStats,
}

// ---------------------------------------------------------------------------
// Frame base and frames
// ---------------------------------------------------------------------------

/// Everything about a scene that only changes when the store does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameBase {
    /// Store revision this base was projected from.
    revision: u64,
    /// Static agent placements, ordered by agent id.
    anchors: Vec<AgentAnchor>,
    /// Territory rings, ordered by group name.
    territories: Vec<TerritoryOverlay>,
    /// Event feed, newest first.
    feed: Vec<FeedLine>,
    /// HUD scalars.
    hud: HudSummary,
}

impl FrameBase {
    /// Store revision this base was projected from.
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Static agent placements.
    pub fn anchors(&self) -> &[AgentAnchor] {
        &self.anchors
    }
}

/// One drawable frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneFrame {
    /// Frame clock, seconds since the driver started.
    pub clock_secs: f64,
    /// Highlight pulse at this instant, `0..=1`.
    pub pulse: f64,
    /// Animated figures, ordered by agent id.
    pub figures: Vec<AgentFigure>,
    /// Territory rings, ordered by group name.
    pub territories: Vec<TerritoryOverlay>,
    /// Event feed, newest first.
    pub feed: Vec<FeedLine>,
    /// HUD scalars.
    pub hud: HudSummary,
}

// ---------------------------------------------------------------------------
// Projector
// ---------------------------------------------------------------------------

/// The session's projection state: transform, terrain, and the current
/// territory layout.
#[derive(Debug, Clone)]
pub struct Projector {
    seed: u64,
    transform: MapTransform,
    terrain: TerrainField,
    territory: TerritoryLayout,
}

impl Projector {
    /// Build the projector for a session seed.
    ///
    /// Terrain is generated once here; everything else about the
    /// projector is layout that follows the data.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            transform: MapTransform::new(),
            terrain: TerrainField::generate(seed),
            territory: TerritoryLayout::default(),
        }
    }

    /// Session seed.
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// The session-constant map between simulation and scene space.
    pub const fn transform(&self) -> MapTransform {
        self.transform
    }

    /// The session's terrain.
    pub const fn terrain(&self) -> &TerrainField {
        &self.terrain
    }

    /// The current territory layout.
    pub const fn territory(&self) -> &TerritoryLayout {
        &self.territory
    }

    /// Project the per-revision scene base for a world view.
    ///
    /// Territory regions are regenerated only when the set of groups
    /// present has changed; placement itself is hash-derived, so a
    /// regeneration never moves the regions of groups that persist.
    pub fn project_base(&mut self, view: &WorldView) -> FrameBase {
        let groups = view.group_names();
        if !self.territory.covers(&groups) {
            self.territory = TerritoryLayout::generate(self.seed, groups);
        }

        let anchors = view
            .agents
            .values()
            .map(|agent| {
                let point = self.transform.project(agent.position);
                AgentAnchor {
                    id: agent.id.clone(),
                    name: agent.name.clone(),
                    tribe: agent.tribe.clone(),
                    status: agent.status,
                    rest_y: self.terrain.height_at(point.x, point.z),
                    phase: agent_phase(&agent.id),
                    tint: status_tint(agent.status),
                    point,
                }
            })
            .collect();

        let territories = self
            .territory
            .regions()
            .map(|region| {
                let center = self.transform.project(region.center);
                TerritoryOverlay {
                    group: region.group.clone(),
                    ground_y: self.terrain.height_at(center.x, center.z),
                    radius: region.radius * self.transform.scale(),
                    tint: group_tint(&region.group),
                    center,
                }
            })
            .collect();

        FrameBase {
            revision: view.revision,
            anchors,
            territories,
            feed: view.events.iter().map(FeedLine::from_event).collect(),
            hud: HudSummary {
                day: view.snapshot.day,
                population: view.snapshot.population,
                phase: view.snapshot.phase.clone(),
                phase_progress: view.snapshot.phase_progress,
                is_running: view.snapshot.is_running,
                speed: view.snapshot.speed,
                total_events: view.snapshot.total_events,
                connection: view.connection,
                awaiting_first_sync: !view.has_ever_synced,
                stats: view.stats.clone(),
            },
        }
    }

    /// Animate a base into a drawable frame for one instant.
    pub fn animate(&self, base: &FrameBase, clock_secs: f64) -> SceneFrame {
        let figures = base
            .anchors
            .iter()
            .map(|anchor| AgentFigure {
                id: anchor.id.clone(),
                name: anchor.name.clone(),
                tribe: anchor.tribe.clone(),
                status: anchor.status,
                x: anchor.point.x,
                y: anchor.rest_y + bob_offset(clock_secs, anchor.phase),
                z: anchor.point.z,
                tint: anchor.tint,
            })
            .collect();

        SceneFrame {
            clock_secs,
            pulse: highlight_pulse(clock_secs),
            figures,
            territories: base.territories.clone(),
            feed: base.feed.clone(),
            hud: base.hud.clone(),
        }
    }
}

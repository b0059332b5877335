//! Deterministic group territories.
//!
//! Each group gets a circular home region on the simulation plane,
//! placed purely from a hash of the seed and the group's name. A
//! group's region therefore never depends on which other groups exist
//! or in what order they were discovered, and it lands on the same spot
//! every session for the same seed.

use std::collections::{BTreeMap, BTreeSet};
use std::f64::consts::TAU;

use lifescope_types::{GroupName, SIM_COORD_MAX, SIM_COORD_MIN, SimPosition};
use serde::{Deserialize, Serialize};

use crate::hash::{fold_u64, hash_bytes, unit};

/// Midpoint of the simulation plane on both axes.
const SIM_MID: f64 = (SIM_COORD_MIN + SIM_COORD_MAX) / 2.0;
/// Closest a territory center may sit to the world center.
const RING_MIN: f64 = 20.0;
/// Farthest a territory center may sit from the world center.
const RING_MAX: f64 = 32.0;
/// Smallest territory radius.
const REGION_RADIUS_MIN: f64 = 10.0;
/// Largest territory radius. `RING_MAX + REGION_RADIUS_MAX` stays
/// within the simulation bounds so regions never spill off the plane.
const REGION_RADIUS_MAX: f64 = 16.0;

/// One group's circular home region, in simulation coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerritoryRegion {
    /// The group this region belongs to.
    pub group: GroupName,
    /// Region center.
    pub center: SimPosition,
    /// Region radius, simulation units.
    pub radius: f64,
}

/// The set of regions for the groups currently present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TerritoryLayout {
    /// Seed the regions were placed from.
    seed: u64,
    /// Regions keyed (and iterated) by group name.
    regions: BTreeMap<GroupName, TerritoryRegion>,
}

impl TerritoryLayout {
    /// Place a region for every given group.
    pub fn generate(seed: u64, groups: impl IntoIterator<Item = GroupName>) -> Self {
        let regions = groups
            .into_iter()
            .map(|group| {
                let region = place(seed, &group);
                (group, region)
            })
            .collect();
        Self { seed, regions }
    }

    /// Seed the regions were placed from.
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Look up one group's region.
    pub fn region(&self, group: &GroupName) -> Option<&TerritoryRegion> {
        self.regions.get(group)
    }

    /// All regions, ordered by group name.
    pub fn regions(&self) -> impl Iterator<Item = &TerritoryRegion> {
        self.regions.values()
    }

    /// Number of regions.
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Whether no regions are present.
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Whether this layout covers exactly the given group set.
    pub fn covers(&self, groups: &BTreeSet<GroupName>) -> bool {
        self.regions.len() == groups.len() && groups.iter().all(|g| self.regions.contains_key(g))
    }
}

/// Place one group's region from the seed and the group name alone.
fn place(seed: u64, group: &GroupName) -> TerritoryRegion {
    let base = fold_u64(hash_bytes(group.as_str().as_bytes()), seed);

    let angle = unit(fold_u64(base, 0)) * TAU;
    let ring = RING_MIN + unit(fold_u64(base, 1)) * (RING_MAX - RING_MIN);
    let radius =
        REGION_RADIUS_MIN + unit(fold_u64(base, 2)) * (REGION_RADIUS_MAX - REGION_RADIUS_MIN);

    TerritoryRegion {
        group: group.clone(),
        center: SimPosition::new(SIM_MID + angle.cos() * ring, SIM_MID + angle.sin() * ring),
        radius,
    }
}

//! Affine projection between simulation space and scene space.
//!
//! The backend reports agent positions on a bounded 2D plane; the scene
//! is a Y-up 3D stage whose ground plane spans
//! `-SCENE_HALF_EXTENT..=SCENE_HALF_EXTENT` on X and Z. One uniform
//! center-and-scale affine map carries simulation X to scene X and
//! simulation Y to scene Z. The map is fixed for the whole session so a
//! given simulation position always lands on the same scene spot, and
//! it is exactly invertible so picking in scene space recovers
//! simulation coordinates.

use lifescope_types::{SIM_COORD_MAX, SIM_COORD_MIN, SimPosition};
use serde::{Deserialize, Serialize};

/// Half-extent of the square scene ground plane on both axes.
pub const SCENE_HALF_EXTENT: f64 = 60.0;

/// A point on the scene ground plane.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenePoint {
    /// Scene X, west-east.
    pub x: f64,
    /// Scene Z, north-south.
    pub z: f64,
}

impl ScenePoint {
    /// Create a ground-plane point.
    pub const fn new(x: f64, z: f64) -> Self {
        Self { x, z }
    }
}

/// The session-constant map between simulation space and the scene
/// ground plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapTransform {
    /// Midpoint of the simulation coordinate range on both axes.
    sim_mid: f64,
    /// Scene units per simulation unit.
    scale: f64,
}

impl MapTransform {
    /// The transform for the fixed simulation bounds and scene extent.
    pub const fn new() -> Self {
        let span = SIM_COORD_MAX - SIM_COORD_MIN;
        Self {
            sim_mid: SIM_COORD_MIN + span / 2.0,
            scale: (SCENE_HALF_EXTENT * 2.0) / span,
        }
    }

    /// Scene units per simulation unit.
    pub const fn scale(self) -> f64 {
        self.scale
    }

    /// Project a simulation position onto the scene ground plane.
    ///
    /// Out-of-range input is clamped to the simulation bounds first, so
    /// the result always lies within the scene extent.
    pub fn project(self, pos: SimPosition) -> ScenePoint {
        let pos = pos.clamped();
        ScenePoint {
            x: (pos.x - self.sim_mid) * self.scale,
            z: (pos.y - self.sim_mid) * self.scale,
        }
    }

    /// Recover the simulation position under a scene ground point.
    ///
    /// Inverse of [`MapTransform::project`] for in-range input; points
    /// outside the scene extent clamp to the simulation boundary.
    pub fn unproject(self, point: ScenePoint) -> SimPosition {
        SimPosition::new(
            point.x / self.scale + self.sim_mid,
            point.z / self.scale + self.sim_mid,
        )
        .clamped()
    }
}

impl Default for MapTransform {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn corners_and_center_land_where_expected() {
        let map = MapTransform::new();

        let origin = map.project(SimPosition::new(SIM_COORD_MIN, SIM_COORD_MIN));
        assert!(approx(origin.x, -SCENE_HALF_EXTENT));
        assert!(approx(origin.z, -SCENE_HALF_EXTENT));

        let far = map.project(SimPosition::new(SIM_COORD_MAX, SIM_COORD_MAX));
        assert!(approx(far.x, SCENE_HALF_EXTENT));
        assert!(approx(far.z, SCENE_HALF_EXTENT));

        let mid = map.project(SimPosition::new(50.0, 50.0));
        assert!(approx(mid.x, 0.0));
        assert!(approx(mid.z, 0.0));
    }

    #[test]
    fn projection_round_trips_in_range_positions() {
        let map = MapTransform::new();
        for (x, y) in [(0.0, 0.0), (12.5, 93.0), (45.0, 60.0), (100.0, 1.0)] {
            let back = map.unproject(map.project(SimPosition::new(x, y)));
            assert!(approx(back.x, x), "x drifted: {x} -> {}", back.x);
            assert!(approx(back.y, y), "y drifted: {y} -> {}", back.y);
        }
    }

    #[test]
    fn out_of_range_positions_clamp_to_the_edge() {
        let map = MapTransform::new();
        let clamped = map.project(SimPosition::new(-25.0, 140.0));
        let edge = map.project(SimPosition::new(SIM_COORD_MIN, SIM_COORD_MAX));
        assert!(approx(clamped.x, edge.x));
        assert!(approx(clamped.z, edge.z));
    }

    #[test]
    fn unproject_clamps_points_beyond_the_stage() {
        let map = MapTransform::new();
        let pos = map.unproject(ScenePoint::new(SCENE_HALF_EXTENT * 3.0, -500.0));
        assert!(approx(pos.x, SIM_COORD_MAX));
        assert!(approx(pos.y, SIM_COORD_MIN));
    }

    #[test]
    fn scale_is_uniform_and_positive() {
        let map = MapTransform::default();
        assert!(approx(map.scale(), 1.2));
    }
}

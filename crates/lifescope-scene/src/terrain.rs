//! Deterministic rolling terrain.
//!
//! The stage floor is a square heightfield spanning the scene extent,
//! generated from fractal value noise: hashed lattice values, smoothstep
//! bilinear interpolation, three octaves with halving amplitude. All
//! randomness comes from [`crate::hash`], so a given seed regenerates
//! the exact same field on every run and platform. Agents stand on the
//! field via [`TerrainField::height_at`].

use serde::{Deserialize, Serialize};

use crate::hash::{lattice_hash, unit};
use crate::transform::SCENE_HALF_EXTENT;

/// Vertices per side of the sampled height grid.
pub const TERRAIN_GRID_SIZE: usize = 65;
/// Octaves of value noise summed into the height function.
pub const TERRAIN_OCTAVES: u32 = 3;
/// Peak height of the hills above (and valleys below) zero, scene units.
pub const TERRAIN_AMPLITUDE: f64 = 3.0;

/// Lattice cells per side at the coarsest octave.
const BASE_CELLS: f64 = 8.0;
/// Highest vertex index on each axis.
const LAST_VERTEX: usize = TERRAIN_GRID_SIZE - 1;
/// Highest cell origin on each axis.
const LAST_CELL: usize = TERRAIN_GRID_SIZE - 2;

/// A seeded heightfield covering the scene ground plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainField {
    /// Seed the field was generated from.
    seed: u64,
    /// Row-major vertex heights, `TERRAIN_GRID_SIZE` squared entries.
    heights: Vec<f64>,
}

impl TerrainField {
    /// Generate the heightfield for a seed.
    ///
    /// Bit-identical for equal seeds; the vertex heights lie in
    /// `-TERRAIN_AMPLITUDE..=TERRAIN_AMPLITUDE`.
    #[allow(clippy::cast_precision_loss)] // vertex indices are <= 64, exactly representable
    pub fn generate(seed: u64) -> Self {
        let mut heights = Vec::with_capacity(TERRAIN_GRID_SIZE.saturating_mul(TERRAIN_GRID_SIZE));
        for iz in 0..TERRAIN_GRID_SIZE {
            for ix in 0..TERRAIN_GRID_SIZE {
                let u = ix as f64 / LAST_VERTEX as f64;
                let v = iz as f64 / LAST_VERTEX as f64;
                heights.push((fractal(seed, u, v) - 0.5) * 2.0 * TERRAIN_AMPLITUDE);
            }
        }
        Self { seed, heights }
    }

    /// Seed this field was generated from.
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// The raw vertex heights, row-major.
    pub fn heights(&self) -> &[f64] {
        &self.heights
    }

    /// Ground height under a scene ground-plane coordinate.
    ///
    /// Bilinear over the stored grid; coordinates beyond the scene
    /// extent clamp to the boundary vertices.
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    // grid coordinates are clamped to 0..=64 before the float-to-index casts
    pub fn height_at(&self, x: f64, z: f64) -> f64 {
        let gx = to_grid(x);
        let gz = to_grid(z);

        let x0 = gx.floor().min(LAST_CELL as f64) as usize;
        let z0 = gz.floor().min(LAST_CELL as f64) as usize;
        let tx = gx - x0 as f64;
        let tz = gz - z0 as f64;

        let h00 = self.vertex(x0, z0);
        let h10 = self.vertex(x0.saturating_add(1), z0);
        let h01 = self.vertex(x0, z0.saturating_add(1));
        let h11 = self.vertex(x0.saturating_add(1), z0.saturating_add(1));

        lerp(lerp(h00, h10, tx), lerp(h01, h11, tx), tz)
    }

    fn vertex(&self, ix: usize, iz: usize) -> f64 {
        let idx = iz.saturating_mul(TERRAIN_GRID_SIZE).saturating_add(ix);
        self.heights.get(idx).copied().unwrap_or(0.0)
    }
}

/// Map a scene coordinate into grid space, clamped to the grid.
#[allow(clippy::cast_precision_loss)] // LAST_VERTEX is 64, exactly representable
fn to_grid(coord: f64) -> f64 {
    let normalized = (coord + SCENE_HALF_EXTENT) / (SCENE_HALF_EXTENT * 2.0);
    (normalized * LAST_VERTEX as f64).clamp(0.0, LAST_VERTEX as f64)
}

/// Fractal value noise over the unit square, in `[0, 1]`.
fn fractal(seed: u64, u: f64, v: f64) -> f64 {
    let mut total = 0.0;
    let mut weight = 0.0;
    let mut amplitude = 1.0;
    let mut frequency = BASE_CELLS;
    for octave in 0..TERRAIN_OCTAVES {
        total += octave_value(seed, octave, u * frequency, v * frequency) * amplitude;
        weight += amplitude;
        amplitude *= 0.5;
        frequency *= 2.0;
    }
    total / weight
}

/// One octave of value noise at a lattice-space coordinate.
#[allow(clippy::cast_possible_truncation)] // lattice coordinates stay far below i64 range
fn octave_value(seed: u64, octave: u32, x: f64, z: f64) -> f64 {
    let xi = x.floor() as i64;
    let zi = z.floor() as i64;
    let tx = smoothstep(x - x.floor());
    let tz = smoothstep(z - z.floor());

    let tag = u64::from(octave);
    let v00 = unit(lattice_hash(seed, tag, xi, zi));
    let v10 = unit(lattice_hash(seed, tag, xi.saturating_add(1), zi));
    let v01 = unit(lattice_hash(seed, tag, xi, zi.saturating_add(1)));
    let v11 = unit(lattice_hash(seed, tag, xi.saturating_add(1), zi.saturating_add(1)));

    lerp(lerp(v00, v10, tx), lerp(v01, v11, tx), tz)
}

fn smoothstep(t: f64) -> f64 {
    t * t * (3.0 - 2.0 * t)
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_regenerates_bit_identical_heights() {
        let a = TerrainField::generate(42);
        let b = TerrainField::generate(42);
        assert_eq!(
            a.heights().len(),
            TERRAIN_GRID_SIZE.saturating_mul(TERRAIN_GRID_SIZE)
        );
        assert!(
            a.heights()
                .iter()
                .zip(b.heights())
                .all(|(x, y)| x.to_bits() == y.to_bits()),
            "regeneration must be bit-identical"
        );
    }

    #[test]
    fn different_seeds_differ() {
        let a = TerrainField::generate(42);
        let b = TerrainField::generate(43);
        assert!(
            a.heights()
                .iter()
                .zip(b.heights())
                .any(|(x, y)| x.to_bits() != y.to_bits())
        );
    }

    #[test]
    fn heights_stay_within_amplitude() {
        let field = TerrainField::generate(7);
        assert!(
            field
                .heights()
                .iter()
                .all(|h| h.abs() <= TERRAIN_AMPLITUDE)
        );
    }

    #[test]
    fn sampling_at_a_vertex_matches_the_stored_height() {
        let field = TerrainField::generate(11);
        // Vertex (0, 0) sits at the scene's (-extent, -extent) corner.
        let stored = field.heights().first().copied().unwrap_or_default();
        let sampled = field.height_at(-SCENE_HALF_EXTENT, -SCENE_HALF_EXTENT);
        assert!((stored - sampled).abs() < 1e-9);
    }

    #[test]
    fn sampling_beyond_the_extent_clamps() {
        let field = TerrainField::generate(11);
        let corner = field.height_at(SCENE_HALF_EXTENT, SCENE_HALF_EXTENT);
        let beyond = field.height_at(SCENE_HALF_EXTENT * 10.0, SCENE_HALF_EXTENT * 10.0);
        assert!((corner - beyond).abs() < 1e-9);
    }

    #[test]
    fn nearby_samples_stay_close() {
        let field = TerrainField::generate(3);
        let mut x = -SCENE_HALF_EXTENT;
        while x < SCENE_HALF_EXTENT {
            let here = field.height_at(x, 0.0);
            let there = field.height_at(x + 0.5, 0.0);
            assert!(
                (here - there).abs() < TERRAIN_AMPLITUDE,
                "height jumped at x = {x}"
            );
            x += 0.5;
        }
    }
}

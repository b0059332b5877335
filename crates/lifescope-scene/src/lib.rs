//! Deterministic spatial projection for the Lifescope observatory client.
//!
//! This crate turns a [`lifescope_types::WorldView`] into a drawable
//! scene: simulation positions projected onto a bounded Y-up stage,
//! agents standing on seeded fractal terrain, hash-placed group
//! territories, and pure time-driven animation. Everything is
//! deterministic -- the same seed, view, and clock always compose the
//! same frame -- and nothing here performs I/O.
//!
//! # Modules
//!
//! - [`transform`] -- Affine map between simulation space and the scene ground plane
//! - [`terrain`] -- Seeded fractal heightfield the figures stand on
//! - [`territory`] -- Hash-placed circular group regions
//! - [`animate`] -- Pure time-driven motion (bob, pulse)
//! - [`palette`] -- Tints for figures, rings, and feed lines
//! - [`frame`] -- The projector and the frame types it composes

pub mod animate;
pub mod frame;
mod hash;
pub mod palette;
pub mod terrain;
pub mod territory;
pub mod transform;

// Re-export the composition surface at crate root for convenience.
pub use frame::{
    AgentAnchor, AgentFigure, FeedLine, FrameBase, HudSummary, Projector, SceneFrame,
    TerritoryOverlay,
};
pub use palette::{Tint, category_tint, group_tint, status_tint, theme_tint};
pub use terrain::{TERRAIN_AMPLITUDE, TERRAIN_GRID_SIZE, TERRAIN_OCTAVES, TerrainField};
pub use territory::{TerritoryLayout, TerritoryRegion};
pub use transform::{MapTransform, SCENE_HALF_EXTENT, ScenePoint};

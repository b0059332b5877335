//! Shared type definitions for the Lifescope observatory client.
//!
//! This crate is the single source of truth for the view-model every
//! other Lifescope crate consumes: wire-faithful state structs, closed
//! enums folded from the backend's free-form strings, and the freshness
//! marks the reconciliation store orders updates by.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe wrappers for agent, event, group, and command identifiers
//! - [`enums`] -- Closed enumeration types (status, categories, actions, connection state)
//! - [`freshness`] -- Session-monotonic freshness marks
//! - [`structs`] -- Core view-model structs (snapshot, agents, events, statistics)
//! - [`view`] -- The composed world view handed to consumers
//! - [`wire`] -- REST envelopes and WebSocket frame types

pub mod enums;
pub mod freshness;
pub mod ids;
pub mod structs;
pub mod view;
pub mod wire;

// Re-export all public types at crate root for convenience.
pub use enums::{
    AgentStatus, CommandState, ConnectionState, ControlAction, DataKind, EventCategory, EventTheme,
};
pub use freshness::Freshness;
pub use ids::{AgentId, CommandId, EventId, GroupName};
pub use structs::{
    Agent, AgentEmotions, CommandOutcome, EmotionStats, ExtendedStats, FamilyBonds, FamilyStats,
    LifePurpose, PurposeStats, RomanceStats, SIM_COORD_MAX, SIM_COORD_MIN, SimPosition,
    SnapshotPatch, WorldEvent, WorldSnapshot, WorldStats,
};
pub use view::WorldView;
pub use wire::{
    AgentsEnvelope, ClientMessage, ControlReply, EventsEnvelope, ServerMessage, StatsEnvelope,
    UpdateBundle,
};

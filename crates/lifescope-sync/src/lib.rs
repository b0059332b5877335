//! Synchronization layer for the Lifescope observatory client.
//!
//! This crate keeps a local, renderable copy of a remote life-simulation
//! world coherent over two unreliable transports:
//!
//! - **Pull**: four REST polling lanes on independent cadences, with
//!   per-lane exponential backoff
//! - **Push**: a WebSocket frame stream with keepalive and fixed-delay
//!   reconnect
//!
//! Both adapters feed the same [`WorldStore`], which admits payloads by
//! freshness mark rather than arrival order: pull payloads are stamped
//! when their request is issued, push frames when they are received, so
//! whichever channel is genuinely newer wins every race. Control
//! commands go through the [`CommandDispatcher`], which composes their
//! optimistic effects over the store and tracks each command to a
//! confirmed or failed outcome without ever retrying.
//!
//! # Architecture
//!
//! [`SyncSession`] assembles one store, one [`FreshnessClock`], and the
//! adapter tasks, and owns their lifetimes. Consumers read composed
//! [`WorldView`](lifescope_types::WorldView)s from the store and listen
//! on its change channel; nothing outside this crate writes state.

pub mod clock;
pub mod dispatch;
pub mod error;
pub mod monitor;
pub mod push;
pub mod rest;
pub mod session;
pub mod store;

// Re-export primary types for convenience.
pub use clock::FreshnessClock;
pub use dispatch::CommandDispatcher;
pub use error::SyncError;
pub use monitor::ConnectionMonitor;
pub use rest::{Backoff, RestClient};
pub use session::{DEFAULT_REST_URL, DEFAULT_WS_URL, PollIntervals, SyncConfig, SyncSession};
pub use store::{Applied, EVENT_RING_CAPACITY, StoreChange, WorldStore};

//! Pure time-driven animation.
//!
//! Everything here is a function of the frame clock and static inputs
//! only. No animation state survives between frames, so a frame can be
//! composed for any instant in isolation and two drivers at the same
//! clock produce the same motion.

use std::f64::consts::TAU;

use lifescope_types::AgentId;

use crate::hash::{hash_bytes, unit};

/// Vertical bob amplitude, scene units.
pub const BOB_AMPLITUDE: f64 = 0.25;
/// Idle bob cycles per second.
pub const BOB_FREQUENCY_HZ: f64 = 1.2;
/// Highlight pulse cycles per second.
pub const PULSE_FREQUENCY_HZ: f64 = 0.8;

/// A stable per-agent phase angle so figures do not bob in lockstep.
pub fn agent_phase(id: &AgentId) -> f64 {
    unit(hash_bytes(id.as_str().as_bytes())) * TAU
}

/// Idle bob offset above resting height at a moment in time.
pub fn bob_offset(clock_secs: f64, phase: f64) -> f64 {
    (clock_secs * BOB_FREQUENCY_HZ * TAU + phase).sin() * BOB_AMPLITUDE
}

/// Slow `0..=1` pulse for highlighted elements.
pub fn highlight_pulse(clock_secs: f64) -> f64 {
    ((clock_secs * PULSE_FREQUENCY_HZ * TAU).sin() + 1.0) / 2.0
}

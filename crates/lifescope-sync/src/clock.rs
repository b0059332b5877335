//! The session-wide freshness clock.
//!
//! One atomic counter serves every adapter. Pull lanes draw a mark when
//! a request is *issued*; the push adapter draws one when a frame is
//! *received*. Because both sides share this clock, a poll response that
//! was overtaken by a push frame carries the smaller mark and loses at
//! the store, regardless of arrival order.

use std::sync::atomic::{AtomicU64, Ordering};

use lifescope_types::Freshness;

/// Monotonic source of [`Freshness`] marks for one session.
///
/// Shared between adapter tasks via [`std::sync::Arc`]; drawing a mark
/// is a single lock-free fetch-add.
#[derive(Debug)]
pub struct FreshnessClock {
    /// The next mark to hand out. Starts at 1 so every real mark
    /// supersedes [`Freshness::INITIAL`].
    next: AtomicU64,
}

impl FreshnessClock {
    /// Create a clock at the start of a session.
    pub const fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Draw the next mark. Every call returns a strictly larger mark
    /// than every earlier call on this clock.
    pub fn next(&self) -> Freshness {
        Freshness(self.next.fetch_add(1, Ordering::AcqRel))
    }
}

impl Default for FreshnessClock {
    fn default() -> Self {
        Self::new()
    }
}

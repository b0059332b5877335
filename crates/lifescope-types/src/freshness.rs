//! Freshness marks: the comparable tokens that order payloads.
//!
//! The backend provides no sequence numbers, so the client stamps every
//! payload with a [`Freshness`] mark drawn from a session-wide monotonic
//! counter (the clock itself lives in the sync crate). The store applies
//! a payload only when its mark is at least the stored mark for that
//! data kind; strictly-older payloads are discarded, and an equal mark
//! is a duplicate delivery that changes nothing.
//!
//! Marks are meaningful only within one session. A new session resets
//! the clock and the store together, so marks never compare across
//! session boundaries.

use serde::{Deserialize, Serialize};

/// A monotonic per-session payload mark.
///
/// Ordering is total: a larger mark supersedes a smaller one within the
/// same [`DataKind`](crate::DataKind) lane. Marks from different lanes
/// are never compared.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Freshness(pub u64);

impl Freshness {
    /// The mark every lane starts at before any payload is applied.
    ///
    /// Real marks start at 1, so the first payload of a session always
    /// supersedes the empty state.
    pub const INITIAL: Self = Self(0);

    /// Return the raw counter value.
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Whether a payload carrying this mark supersedes state stored at
    /// `stored`.
    pub const fn supersedes(self, stored: Self) -> bool {
        self.0 > stored.0
    }

    /// Whether this mark is a duplicate delivery of already-applied
    /// state.
    pub const fn is_duplicate_of(self, stored: Self) -> bool {
        self.0 == stored.0 && self.0 != Self::INITIAL.0
    }
}

impl core::fmt::Display for Freshness {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

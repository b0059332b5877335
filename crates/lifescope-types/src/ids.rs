//! Type-safe identifier wrappers for entities in the view model.
//!
//! The backend keys agents and events by short human-readable strings
//! (`"aedan"`, `"event_012"`), not UUIDs, so the wrappers here hold a
//! [`String`] while still preventing accidental mixing of identifier
//! kinds at compile time. Command correlation ids are generated on the
//! client and use UUID v4 via [`CommandId`].

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generates a newtype wrapper around [`String`] with standard derives.
macro_rules! define_str_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Wrap an owned string as this identifier kind.
            pub const fn new(raw: String) -> Self {
                Self(raw)
            }

            /// Borrow the raw identifier.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the wrapper and return the raw string.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                Self(raw)
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self(raw.to_owned())
            }
        }
    };
}

define_str_id! {
    /// Stable identifier for an agent, assigned by the backend.
    AgentId
}

define_str_id! {
    /// Identifier for a world event, assigned by the backend.
    ///
    /// Events are deduplicated by this key when merged into the bounded
    /// event ring.
    EventId
}

define_str_id! {
    /// Name of a group (tribe) an agent is affiliated with.
    ///
    /// Group names double as territory keys in the scene layer, so they
    /// get the same newtype discipline as entity ids.
    GroupName
}

/// Client-generated correlation id for an operator command.
///
/// Unlike the backend-assigned string ids above, command ids never cross
/// the wire as identity; they only correlate a dispatched command with
/// its later confirmation or failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandId(pub Uuid);

impl CommandId {
    /// Create a fresh random correlation id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Return the inner [`Uuid`] value.
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for CommandId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for CommandId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

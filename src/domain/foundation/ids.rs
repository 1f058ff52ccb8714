//! Strongly-typed identifier value objects.
//!
//! Identifiers are opaque UUID tokens. Nothing in the crate relies on their
//! internal structure beyond uniqueness and string equality.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! uuid_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

uuid_identifier!(
    /// Unique identifier for a battle (one estimation session).
    BattleId
);

uuid_identifier!(
    /// Unique identifier for a plan (an estimable work item).
    PlanId
);

uuid_identifier!(
    /// Unique identifier for a warrior (a participant).
    ///
    /// Warrior identity is global; battle membership is a separate relation.
    WarriorId
);

uuid_identifier!(
    /// Identifies one live participant connection.
    ///
    /// Generated server-side on connect. A warrior with two open tabs has
    /// two client ids.
    ClientId
);

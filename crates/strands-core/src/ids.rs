//! Identifiers for strikes, boards and positions.
//!
//! Zero is reserved as "none" for every identifier, matching the on-chain
//! convention where an unset mapping slot reads as zero.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! id_newtype {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// The reserved "none" value.
            pub const NONE: Self = Self(0);

            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            pub const fn get(&self) -> u64 {
                self.0
            }

            /// Returns true for the reserved zero id.
            pub fn is_none(&self) -> bool {
                self.0 == 0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", $label, self.0)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }
    };
}

id_newtype!(
    /// Strike identifier in the options market.
    StrikeId,
    "strike"
);

id_newtype!(
    /// Board (expiry) identifier in the options market.
    BoardId,
    "board"
);

id_newtype!(
    /// Option position identifier issued by the option-token registry.
    OptionPositionId,
    "option"
);

id_newtype!(
    /// Creation sequence of a hedged position inside the strategy (1-based).
    PositionIndex,
    "position"
);

impl PositionIndex {
    /// The index that follows this one.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

//! Strongly typed, zero-cost identifier wrappers.
//!
//! These IDs name things that never get destroyed during a run (agents,
//! item kinds, reaction definitions), so a plain index is enough.  World
//! entities that can disappear (rooms, facilities, storages) are referenced
//! through [`Handle`][crate::Handle] instead.

use std::fmt;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid ID".
            pub const INVALID: $name = $name(<$inner>::MAX);

            /// Cast to `usize` for direct use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<$name, Self::Error> {
                <$inner>::try_from(n).map($name)
            }
        }
    };
}

typed_id! {
    /// Index of an agent in the simulation's per-agent arrays.
    pub struct AgentId(u32);
}

typed_id! {
    /// Kind of item (grain, bread, plank, …).  Application-defined meaning.
    pub struct ItemId(u16);
}

typed_id! {
    /// Index of a reaction definition in the reaction book.
    pub struct ReactionId(u16);
}

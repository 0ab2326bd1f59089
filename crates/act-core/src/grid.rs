//! Integer grid coordinates.
//!
//! The world is a 2-D tile grid.  Agents occupy exactly one tile and move at
//! most one tile (8-neighbourhood) per tick, so a single `Move` action is
//! always between two adjacent cells.

use std::fmt;

/// A tile coordinate.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

/// Offsets of the 8-neighbourhood, orthogonal first so that paths prefer
/// straight moves on ties.
const NEIGHBOUR_OFFSETS: [(i32, i32); 8] = [
    (1, 0), (-1, 0), (0, 1), (0, -1),
    (1, 1), (1, -1), (-1, 1), (-1, -1),
];

impl GridPos {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chebyshev distance: number of 8-connected steps between two tiles.
    #[inline]
    pub fn chebyshev(self, other: GridPos) -> u32 {
        (self.x - other.x).unsigned_abs().max((self.y - other.y).unsigned_abs())
    }

    #[inline]
    pub fn manhattan(self, other: GridPos) -> u32 {
        (self.x - other.x).unsigned_abs() + (self.y - other.y).unsigned_abs()
    }

    /// `true` if `other` is one of the 8 surrounding tiles (not `self`).
    #[inline]
    pub fn is_adjacent(self, other: GridPos) -> bool {
        self != other && self.chebyshev(other) == 1
    }

    /// The 8 surrounding tiles, unfiltered.
    pub fn neighbours(self) -> impl Iterator<Item = GridPos> {
        NEIGHBOUR_OFFSETS
            .iter()
            .map(move |&(dx, dy)| GridPos::new(self.x + dx, self.y + dy))
    }
}

impl fmt::Display for GridPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

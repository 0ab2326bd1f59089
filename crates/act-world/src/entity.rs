//! Destructible world entities: rooms, facilities and storages.

use std::fmt;

use act_core::{GridPos, Handle};

use crate::Inventory;

pub type RoomId     = Handle<Room>;
pub type FacilityId = Handle<Facility>;
pub type StorageId  = Handle<Storage>;

// ── Room ──────────────────────────────────────────────────────────────────────

/// An axis-aligned rectangle of tiles with a name ("granary", "house 3").
#[derive(Clone, Debug)]
pub struct Room {
    pub name: String,
    pub min:  GridPos,
    pub max:  GridPos,
}

impl Room {
    pub fn new(name: impl Into<String>, min: GridPos, max: GridPos) -> Self {
        Self { name: name.into(), min, max }
    }

    /// Inclusive bounds check.
    #[inline]
    pub fn contains(&self, pos: GridPos) -> bool {
        (self.min.x..=self.max.x).contains(&pos.x) && (self.min.y..=self.max.y).contains(&pos.y)
    }
}

// ── Facility ──────────────────────────────────────────────────────────────────

/// Application-defined facility type ("field", "oven", "loom").
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FacilityKind(pub String);

impl FacilityKind {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl fmt::Display for FacilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A workplace.  One agent at a time stands on `work_spot` to use it;
/// whatever it produces lands in `output` until someone hauls it away.
#[derive(Clone, Debug)]
pub struct Facility {
    pub kind:        FacilityKind,
    pub work_spot:   GridPos,
    /// Extra tiles inside the work area a worker may step aside to.
    pub spare_spots: Vec<GridPos>,
    pub output:      Inventory,
}

impl Facility {
    pub fn new(kind: FacilityKind, work_spot: GridPos, output_capacity: u32) -> Self {
        Self {
            kind,
            work_spot,
            spare_spots: Vec::new(),
            output: Inventory::new(output_capacity),
        }
    }

    pub fn with_spare_spots(mut self, spots: Vec<GridPos>) -> Self {
        self.spare_spots = spots;
        self
    }
}

// ── Storage ───────────────────────────────────────────────────────────────────

/// A container occupying a blocked tile (chest, granary bin, pantry).
/// Agents interact with it from any adjacent tile.
#[derive(Clone, Debug)]
pub struct Storage {
    pub name:     String,
    pub pos:      GridPos,
    pub contents: Inventory,
}

impl Storage {
    pub fn new(name: impl Into<String>, pos: GridPos, capacity: u32) -> Self {
        Self { name: name.into(), pos, contents: Inventory::new(capacity) }
    }
}

// ── Container ─────────────────────────────────────────────────────────────────

/// Anything an agent can take items from or put items into.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Container {
    Storage(StorageId),
    /// A facility's output pile.
    FacilityOutput(FacilityId),
}

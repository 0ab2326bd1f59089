//! R-tree over facilities and storages.
//!
//! Perception asks "what is within `r` tiles of me" once per agent per
//! tick.  A square envelope query on the R-tree answers that in
//! O(log n + k) instead of scanning every entity.

use act_core::GridPos;
use rstar::{AABB, PointDistance, RTree, RTreeObject};

use crate::{FacilityId, StorageId};

/// What an index entry points at.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Indexed {
    Facility(FacilityId),
    Storage(StorageId),
}

#[derive(Clone, Debug, PartialEq)]
struct IndexEntry {
    point:  [i32; 2],
    target: Indexed,
}

impl RTreeObject for IndexEntry {
    type Envelope = AABB<[i32; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for IndexEntry {
    fn distance_2(&self, point: &[i32; 2]) -> i32 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        dx * dx + dy * dy
    }
}

#[derive(Default)]
pub struct SpatialIndex {
    tree: RTree<IndexEntry>,
}

impl SpatialIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, pos: GridPos, target: Indexed) {
        self.tree.insert(IndexEntry { point: [pos.x, pos.y], target });
    }

    pub fn remove(&mut self, pos: GridPos, target: Indexed) {
        self.tree.remove(&IndexEntry { point: [pos.x, pos.y], target });
    }

    /// Entities whose tile lies within Chebyshev distance `radius` of
    /// `center`.
    pub fn within(&self, center: GridPos, radius: u32) -> impl Iterator<Item = Indexed> + '_ {
        let r = radius as i32;
        // The circle of radius r·√2 covers the square; trim its corners.
        self.tree
            .locate_within_distance([center.x, center.y], 2 * r * r)
            .filter(move |e| GridPos::new(e.point[0], e.point[1]).chebyshev(center) <= radius)
            .map(|e| e.target)
    }

    /// Nearest entity matching `filter`, by Euclidean distance.
    pub fn nearest(&self, from: GridPos, filter: impl Fn(Indexed) -> bool) -> Option<Indexed> {
        self.tree
            .nearest_neighbor_iter(&[from.x, from.y])
            .map(|e| e.target)
            .find(|&t| filter(t))
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

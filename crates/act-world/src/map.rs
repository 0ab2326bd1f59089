//! Walkability grid.

use act_core::GridPos;

use crate::{WorldError, WorldResult};

/// Dense `width × height` grid of walkable / blocked tiles, row-major.
#[derive(Clone, Debug)]
pub struct GridMap {
    pub width:  u32,
    pub height: u32,
    blocked:    Vec<bool>,
}

impl GridMap {
    /// All-walkable map.
    pub fn open(width: u32, height: u32) -> Self {
        Self { width, height, blocked: vec![false; (width * height) as usize] }
    }

    #[inline]
    pub fn in_bounds(&self, pos: GridPos) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < self.width && (pos.y as u32) < self.height
    }

    #[inline]
    fn idx(&self, pos: GridPos) -> usize {
        pos.y as usize * self.width as usize + pos.x as usize
    }

    /// In bounds and not blocked.
    #[inline]
    pub fn is_walkable(&self, pos: GridPos) -> bool {
        self.in_bounds(pos) && !self.blocked[self.idx(pos)]
    }

    pub fn set_blocked(&mut self, pos: GridPos, blocked: bool) -> WorldResult<()> {
        if !self.in_bounds(pos) {
            return Err(WorldError::OutOfBounds(pos));
        }
        let i = self.idx(pos);
        self.blocked[i] = blocked;
        Ok(())
    }

    /// Walkable 8-neighbours of `pos`.  Diagonal steps are only allowed when
    /// both orthogonal tiles they pass between are walkable (no corner
    /// cutting through walls).
    pub fn walkable_neighbours(&self, pos: GridPos) -> impl Iterator<Item = GridPos> + '_ {
        pos.neighbours().filter(move |&n| {
            if !self.is_walkable(n) {
                return false;
            }
            let (dx, dy) = (n.x - pos.x, n.y - pos.y);
            if dx != 0 && dy != 0 {
                self.is_walkable(GridPos::new(pos.x + dx, pos.y))
                    && self.is_walkable(GridPos::new(pos.x, pos.y + dy))
            } else {
                true
            }
        })
    }
}

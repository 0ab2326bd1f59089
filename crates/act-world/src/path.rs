//! Goals, the pathfinder trait, and the default A* implementation.
//!
//! # Pluggability
//!
//! Navigation calls search through the [`Pathfinder`] trait so applications
//! can swap in hierarchical or flow-field search without touching the
//! activity engine.  The default [`AStar`] is sufficient for village-sized
//! maps.
//!
//! # Budget
//!
//! Every search is bounded by a node-expansion budget.  Running out of
//! budget is reported as [`PathOutcome::Incomplete`], a transient result:
//! the caller retries next tick (the navigator grows the budget).
//! [`PathOutcome::Unreachable`] means the open set was exhausted.
//!
//! # Thread safety
//!
//! Search only reads the map, so it runs inside the parallel decision phase.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, VecDeque};

use act_core::GridPos;
use rustc_hash::FxHashMap;

use crate::GridMap;

/// Cost of an orthogonal step; a diagonal step costs 14 (≈ 10·√2).
const STRAIGHT: u32 = 10;
const DIAGONAL: u32 = 14;

// ── Goal ──────────────────────────────────────────────────────────────────────

/// Where a navigating agent is trying to end up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Goal {
    /// Stand exactly on this tile.
    Exact(GridPos),
    /// Stand on any tile next to this one (used for blocked containers).
    Adjacent(GridPos),
    /// Stand on any of these tiles.
    AnyOf(Vec<GridPos>),
}

impl Goal {
    pub fn is_reached(&self, pos: GridPos) -> bool {
        match self {
            Goal::Exact(p)     => pos == *p,
            Goal::Adjacent(p)  => pos.is_adjacent(*p),
            Goal::AnyOf(ps)    => ps.contains(&pos),
        }
    }

    /// Octile-distance lower bound on the cost from `pos` to the goal.
    fn heuristic(&self, pos: GridPos) -> u32 {
        match self {
            Goal::Exact(p)     => octile(pos, *p),
            Goal::Adjacent(p)  => octile(pos, *p).saturating_sub(DIAGONAL),
            Goal::AnyOf(ps)    => ps.iter().map(|&p| octile(pos, p)).min().unwrap_or(0),
        }
    }
}

fn octile(a: GridPos, b: GridPos) -> u32 {
    let dx = (a.x - b.x).unsigned_abs();
    let dy = (a.y - b.y).unsigned_abs();
    let (lo, hi) = if dx < dy { (dx, dy) } else { (dy, dx) };
    DIAGONAL * lo + STRAIGHT * (hi - lo)
}

// ── PathOutcome ───────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathOutcome {
    /// Tiles to step onto in order, excluding the start tile.  Empty when
    /// the start already satisfies the goal.
    Found(VecDeque<GridPos>),
    /// Budget exhausted before the goal was reached.  Retry later.
    Incomplete,
    /// No walkable route exists.
    Unreachable,
}

// ── Pathfinder trait ──────────────────────────────────────────────────────────

/// Pluggable search.  Implementations must be `Send + Sync`; a single
/// instance is shared by every decision task.
pub trait Pathfinder: Send + Sync {
    fn find_path(&self, map: &GridMap, from: GridPos, goal: &Goal, budget: usize) -> PathOutcome;
}

// ── AStar ─────────────────────────────────────────────────────────────────────

/// A* over the 8-connected grid with the octile heuristic.
#[derive(Clone, Copy, Debug, Default)]
pub struct AStar;

impl Pathfinder for AStar {
    fn find_path(&self, map: &GridMap, from: GridPos, goal: &Goal, budget: usize) -> PathOutcome {
        astar(map, from, goal, budget)
    }
}

fn astar(map: &GridMap, from: GridPos, goal: &Goal, budget: usize) -> PathOutcome {
    if goal.is_reached(from) {
        return PathOutcome::Found(VecDeque::new());
    }

    let mut best: FxHashMap<GridPos, u32>     = FxHashMap::default();
    let mut prev: FxHashMap<GridPos, GridPos> = FxHashMap::default();
    best.insert(from, 0);

    // Min-heap on (f, g, pos).  Position is the final tie-breaker so the
    // chosen path is deterministic.
    let mut open: BinaryHeap<Reverse<(u32, u32, GridPos)>> = BinaryHeap::new();
    open.push(Reverse((goal.heuristic(from), 0, from)));

    let mut expanded = 0usize;
    while let Some(Reverse((_, cost, pos))) = open.pop() {
        if goal.is_reached(pos) {
            return PathOutcome::Found(reconstruct(&prev, from, pos));
        }
        // Skip stale heap entries.
        if cost > best.get(&pos).copied().unwrap_or(u32::MAX) {
            continue;
        }
        if expanded >= budget {
            return PathOutcome::Incomplete;
        }
        expanded += 1;

        for next in map.walkable_neighbours(pos) {
            let step = if next.x != pos.x && next.y != pos.y { DIAGONAL } else { STRAIGHT };
            let new_cost = cost.saturating_add(step);
            if new_cost < best.get(&next).copied().unwrap_or(u32::MAX) {
                best.insert(next, new_cost);
                prev.insert(next, pos);
                open.push(Reverse((new_cost + goal.heuristic(next), new_cost, next)));
            }
        }
    }

    PathOutcome::Unreachable
}

fn reconstruct(prev: &FxHashMap<GridPos, GridPos>, from: GridPos, to: GridPos) -> VecDeque<GridPos> {
    let mut path = VecDeque::new();
    let mut cur = to;
    while cur != from {
        path.push_front(cur);
        match prev.get(&cur) {
            Some(&p) => cur = p,
            None => break,
        }
    }
    path
}

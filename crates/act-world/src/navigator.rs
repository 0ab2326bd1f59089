//! Goal-seeking navigator.
//!
//! Contract: set a goal, ask each tick whether it is reached, ask each tick
//! for the next step, and read [`Navigator::is_stuck`] once the agent has
//! failed to make progress for `max_stuck` consecutive attempts.
//!
//! A navigator caches its path.  It has no way of noticing that the agent
//! was carried somewhere else while it was not being polled, which is why
//! activities throw the whole navigator away after an interruption instead
//! of reusing it.

use std::collections::VecDeque;

use act_core::GridPos;

use crate::{Goal, GridMap, PathOutcome, Pathfinder};

/// Upper bound for the growing search budget.
const MAX_BUDGET: usize = 1 << 16;

/// Result of one [`Navigator::advance`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavStep {
    /// The current position satisfies the goal.
    Arrived,
    /// Move onto this adjacent tile.
    Step(GridPos),
    /// No step this tick (search incomplete, no route, or blocked).
    Waiting,
}

#[derive(Clone, Debug)]
pub struct Navigator {
    goal:      Goal,
    path:      VecDeque<GridPos>,
    /// Step handed out last tick; compared with the new position to detect
    /// rejected moves.
    pending:   Option<GridPos>,
    stuck:     u32,
    max_stuck: u32,
    budget:    usize,
    searches:  u32,
}

impl Navigator {
    pub fn new(goal: Goal, max_stuck: u32, budget: usize) -> Self {
        Self {
            goal,
            path:      VecDeque::new(),
            pending:   None,
            stuck:     0,
            max_stuck: max_stuck.max(1),
            budget:    budget.max(1),
            searches:  0,
        }
    }

    /// Replace the goal and forget any cached path and stuck history.
    pub fn set_goal(&mut self, goal: Goal) {
        self.goal = goal;
        self.path.clear();
        self.pending = None;
        self.stuck = 0;
    }

    pub fn goal(&self) -> &Goal {
        &self.goal
    }

    #[inline]
    pub fn is_at_goal(&self, pos: GridPos) -> bool {
        self.goal.is_reached(pos)
    }

    /// Consecutive ticks without progress so far.
    pub fn stuck_ticks(&self) -> u32 {
        self.stuck
    }

    /// `true` once `max_stuck` consecutive attempts made no progress.
    pub fn is_stuck(&self) -> bool {
        self.stuck >= self.max_stuck
    }

    /// Number of searches run so far (diagnostics / tests).
    pub fn searches(&self) -> u32 {
        self.searches
    }

    /// Decide this tick's step from `pos`.
    pub fn advance<P: Pathfinder + ?Sized>(
        &mut self,
        pos:        GridPos,
        map:        &GridMap,
        pathfinder: &P,
    ) -> NavStep {
        if self.goal.is_reached(pos) {
            self.pending = None;
            return NavStep::Arrived;
        }

        if let Some(expected) = self.pending.take() {
            if expected == pos {
                self.stuck = 0;
            } else {
                // The move was rejected (or we were displaced).  Retry the
                // same tile once; a second miss forces a fresh search.
                self.stuck += 1;
                if pos.is_adjacent(expected) && self.stuck < 2 {
                    self.path.push_front(expected);
                } else {
                    self.path.clear();
                }
            }
        }

        if self.path.is_empty() {
            self.searches += 1;
            match pathfinder.find_path(map, pos, &self.goal, self.budget) {
                PathOutcome::Found(path) => self.path = path,
                PathOutcome::Incomplete => {
                    self.budget = (self.budget * 2).min(MAX_BUDGET);
                    self.stuck += 1;
                    return NavStep::Waiting;
                }
                PathOutcome::Unreachable => {
                    self.stuck += 1;
                    return NavStep::Waiting;
                }
            }
        }

        match self.path.pop_front() {
            Some(next) if pos.is_adjacent(next) && map.is_walkable(next) => {
                self.pending = Some(next);
                NavStep::Step(next)
            }
            Some(_) => {
                // Path no longer starts next to us; search again next tick.
                self.path.clear();
                self.stuck += 1;
                NavStep::Waiting
            }
            None => NavStep::Arrived,
        }
    }
}

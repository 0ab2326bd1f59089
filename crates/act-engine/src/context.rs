//! Everything an activity may read (and the little it may write) while it
//! decides its next action.

use act_core::{AgentId, AgentRng, GridPos, Tick};
use act_world::{Perception, Pathfinder, StorageMemory, World};

/// Per-agent, per-tick view handed to [`Activity::next_action`][crate::Activity::next_action].
///
/// The world is shared read-only with every other agent's decision task.
/// Memory and RNG belong to this agent alone, which is why they are the only
/// mutable borrows.
pub struct ActivityContext<'a> {
    pub tick:       Tick,
    pub agent:      AgentId,
    pub position:   GridPos,
    pub perception: &'a Perception,
    pub world:      &'a World,
    pub memory:     &'a mut StorageMemory,
    pub rng:        &'a mut AgentRng,
    pub pathfinder: &'a dyn Pathfinder,
}

impl<'a> ActivityContext<'a> {
    /// Build a context for `perception.agent` at `perception.position`.
    pub fn new(
        perception: &'a Perception,
        world:      &'a World,
        memory:     &'a mut StorageMemory,
        rng:        &'a mut AgentRng,
        pathfinder: &'a dyn Pathfinder,
    ) -> Self {
        Self {
            tick:     perception.tick,
            agent:    perception.agent,
            position: perception.position,
            perception,
            world,
            memory,
            rng,
            pathfinder,
        }
    }

    /// Fold every storage in view into this agent's memory.
    pub fn remember_visible_storages(&mut self) {
        for seen in &self.perception.storages {
            self.memory.observe_storage(seen.id, &seen.contents, self.tick);
        }
    }
}

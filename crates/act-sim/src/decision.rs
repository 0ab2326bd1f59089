//! The seam between the tick loop and whatever decides what agents do.

use act_core::{AgentId, AgentRng};
use act_engine::Activity;
use act_world::{Perception, World};

/// Picks a new activity for an agent that has none.
///
/// Called from the decision phase (possibly on a worker thread) with the
/// same read-only view every activity gets.  Implementations must be
/// `Sync`; any randomness comes from the agent's own `rng`.
pub trait DecisionLayer: Send + Sync {
    /// `None` leaves the agent idle this tick; it is asked again next tick.
    fn choose(
        &self,
        agent:      AgentId,
        world:      &World,
        perception: &Perception,
        rng:        &mut AgentRng,
    ) -> Option<Box<dyn Activity>>;
}

/// A [`DecisionLayer`] that never starts anything.  Agents only act on
/// commands and activities started through the builder.
pub struct StayIdle;

impl DecisionLayer for StayIdle {
    fn choose(&self, _: AgentId, _: &World, _: &Perception, _: &mut AgentRng) -> Option<Box<dyn Activity>> {
        None
    }
}

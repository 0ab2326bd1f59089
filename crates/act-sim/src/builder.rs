//! Fluent builder for constructing a [`Sim`].

use act_core::{AgentId, SimConfig};
use act_engine::Activity;
use act_world::{Pathfinder, World};

use crate::{DecisionLayer, Mind, Sim, SimError, SimResult};

/// Fluent builder for [`Sim<D, P>`].
///
/// # Required inputs
///
/// - [`SimConfig`]: seed, total ticks, perception radius, …
/// - [`World`] with its agents already spawned
/// - `D: DecisionLayer`: picks activities for idle agents
/// - `P: Pathfinder`: e.g. [`act_world::AStar`]
///
/// # Optional inputs
///
/// | Method                  | Default                                    |
/// |-------------------------|--------------------------------------------|
/// | `.activity(agent, a)`   | Agent starts idle and asks the decision layer |
///
/// # Example
///
/// ```rust,ignore
/// let mut sim = SimBuilder::new(config, world, StayIdle, AStar)
///     .activity(AgentId(0), Box::new(Wait::new(10, 0)))
///     .build()?;
/// sim.run(&mut NoopObserver)?;
/// ```
pub struct SimBuilder<D: DecisionLayer, P: Pathfinder> {
    config:     SimConfig,
    world:      World,
    decisions:  D,
    pathfinder: P,
    initial:    Vec<(AgentId, Box<dyn Activity>)>,
}

impl<D: DecisionLayer, P: Pathfinder> SimBuilder<D, P> {
    /// Create a builder with all required inputs.
    pub fn new(config: SimConfig, world: World, decisions: D, pathfinder: P) -> Self {
        Self { config, world, decisions, pathfinder, initial: Vec::new() }
    }

    /// Start `agent` with `activity` instead of asking the decision layer
    /// on the first tick.  A later call for the same agent wins.
    pub fn activity(mut self, agent: AgentId, activity: Box<dyn Activity>) -> Self {
        self.initial.push((agent, activity));
        self
    }

    /// Validate inputs, create one [`Mind`] per agent and return a
    /// ready-to-run [`Sim`].
    pub fn build(self) -> SimResult<Sim<D, P>> {
        self.config.validate()?;

        let mut world = self.world;
        world.clock.ticks_per_day = self.config.ticks_per_day;

        let mut minds: Vec<Mind> = world
            .agents
            .ids()
            .map(|agent| Mind::new(agent, self.config.seed, self.config.memory_expiry_ticks))
            .collect();

        for (agent, activity) in self.initial {
            let mind = minds.get_mut(agent.index()).ok_or(SimError::UnknownAgent(agent))?;
            mind.host.start(activity, &world);
        }

        #[cfg(feature = "parallel")]
        let pool = match self.config.num_threads {
            Some(n) => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| SimError::Config(format!("thread pool: {e}")))?,
            ),
            None => None,
        };

        Ok(Sim {
            config:     self.config,
            world,
            minds,
            decisions:  self.decisions,
            pathfinder: self.pathfinder,
            #[cfg(feature = "parallel")]
            pool,
        })
    }
}

//! Daily routine: eat when hungry, work during the day, rest at night.

use act_behavior::{Consume, Craft, DistributionRound, WorkShift, Wait};
use act_core::{AgentId, AgentRng};
use act_engine::{Activity, Priority};
use act_world::{NeedKind, Perception, World};
use tracing::warn;

use crate::layout::{BehaviorSpec, Job};

const EAT:  Priority = 0;
const WORK: Priority = 10;
const REST: Priority = 20;

pub struct HamletLife {
    jobs:      Vec<Job>,
    behavior:  BehaviorSpec,
    day_hours: [u32; 2],
}

impl HamletLife {
    pub fn new(jobs: Vec<Job>, behavior: BehaviorSpec) -> Self {
        let day_hours = behavior.day_hours.unwrap_or([6, 20]);
        Self { jobs, behavior, day_hours }
    }

    fn work(&self, agent: AgentId, world: &World) -> Option<Box<dyn Activity>> {
        let built: Result<Box<dyn Activity>, _> = match self.jobs.get(agent.index())? {
            Job::Farm { facility, item, skill } => {
                WorkShift::new(*facility, *item, *skill, self.behavior.work_shift.clone(), WORK)
                    .map(|a| Box::new(a) as Box<dyn Activity>)
            }
            Job::Carry { granary, households } => {
                DistributionRound::new(*granary, households.clone(), self.behavior.distribution.clone(), WORK)
                    .map(|a| Box::new(a) as Box<dyn Activity>)
            }
            Job::Craft(reaction) => {
                Craft::new(*reaction, &world.reactions, self.behavior.craft.clone(), WORK)
                    .map(|a| Box::new(a) as Box<dyn Activity>)
            }
            Job::Loaf => return None,
        };
        built
            .map_err(|e| warn!(agent = %agent, error = %e, "cannot start job"))
            .ok()
    }
}

impl act_sim::DecisionLayer for HamletLife {
    fn choose(
        &self,
        agent:       AgentId,
        world:       &World,
        _perception: &Perception,
        rng:         &mut AgentRng,
    ) -> Option<Box<dyn Activity>> {
        if world.agents.needs(agent).get(NeedKind::Hunger).is_low() && !self.behavior.eat.foods.is_empty() {
            return Some(Box::new(Consume::new(self.behavior.eat.clone(), EAT)));
        }

        let [open, close] = self.day_hours;
        if (open..close).contains(&world.clock.hour()) {
            if let Some(job) = self.work(agent, world) {
                return Some(job);
            }
        }
        Some(Box::new(Wait::new(rng.jitter(30, 10), REST)))
    }
}

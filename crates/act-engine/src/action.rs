//! Atomic, single-tick effects.
//!
//! An [`Action`] is a request, not a mutation.  Activities build them during
//! the (parallel, read-only) decision phase; the coordinator calls
//! [`Action::execute`] at the synchronisation point.  Execution either
//! applies the whole effect or leaves the world untouched, so re-proposing
//! a rejected action next tick is always safe.

use act_core::{AgentId, GridPos, ItemId, ReactionId};
use act_world::{Container, FacilityId, NeedKind, Skill, World, WorldError};
use thiserror::Error;

/// Scheduling precedence.  Lower value wins.
pub type Priority = i32;

/// What an action does when executed.
#[derive(Clone, Debug, PartialEq)]
pub enum ActionKind {
    /// Do nothing this tick while keeping the issuer's scheduling slot.
    Idle,
    /// Step onto an adjacent walkable tile.
    Move { to: GridPos },
    /// Move items from a container into the agent's inventory.
    TakeItem { from: Container, item: ItemId, qty: u32 },
    /// Move items from the agent's inventory into a container.
    PutItem { to: Container, item: ItemId, qty: u32 },
    /// Work a facility: add output to its pile and grant skill XP.
    Produce { facility: FacilityId, item: ItemId, qty: u32, skill: Skill, xp: f32 },
    /// Run a reaction at a facility, turning carried inputs into carried
    /// outputs.
    Transform { facility: FacilityId, reaction: ReactionId },
    /// Eat or use one carried item to restore a need.
    Consume { item: ItemId, need: NeedKind, restore: f32 },
}

impl ActionKind {
    /// Short label for logs and observers.
    pub fn label(&self) -> &'static str {
        match self {
            ActionKind::Idle              => "idle",
            ActionKind::Move { .. }       => "move",
            ActionKind::TakeItem { .. }   => "take",
            ActionKind::PutItem { .. }    => "put",
            ActionKind::Produce { .. }    => "produce",
            ActionKind::Transform { .. }  => "transform",
            ActionKind::Consume { .. }    => "consume",
        }
    }
}

/// One agent's proposed effect for one tick.
#[derive(Clone, Debug, PartialEq)]
pub struct Action {
    pub agent:    AgentId,
    /// Name of the activity that emitted this action.
    pub issuer:   &'static str,
    pub priority: Priority,
    pub kind:     ActionKind,
}

/// Why an action was not applied.
#[derive(Debug, Error)]
pub enum Rejection {
    /// Another agent stands on the destination tile.
    #[error("tile occupied by {0}")]
    Blocked(AgentId),

    #[error("{to} is not adjacent to {from}")]
    NotAdjacent { from: GridPos, to: GridPos },

    #[error("container out of reach")]
    OutOfReach,

    #[error("agent is not at the facility's work spot")]
    NotAtWorkSpot,

    #[error("unknown reaction {0}")]
    UnknownReaction(ReactionId),

    #[error(transparent)]
    World(#[from] WorldError),
}

#[derive(Debug)]
pub enum ActionOutcome {
    Done,
    Rejected(Rejection),
}

impl ActionOutcome {
    pub fn is_done(&self) -> bool {
        matches!(self, ActionOutcome::Done)
    }
}

impl Action {
    pub fn new(agent: AgentId, issuer: &'static str, priority: Priority, kind: ActionKind) -> Self {
        Self { agent, issuer, priority, kind }
    }

    #[inline]
    pub fn is_idle(&self) -> bool {
        matches!(self.kind, ActionKind::Idle)
    }

    /// Apply the action.  Must only be called at the synchronisation point.
    pub fn execute(&self, world: &mut World) -> ActionOutcome {
        match self.apply(world) {
            Ok(()) => ActionOutcome::Done,
            Err(r) => ActionOutcome::Rejected(r),
        }
    }

    fn apply(&self, world: &mut World) -> Result<(), Rejection> {
        let agent = self.agent;
        if !world.agents.contains(agent) {
            return Err(WorldError::UnknownAgent(agent).into());
        }
        let pos = world.agents.position(agent);

        match self.kind {
            ActionKind::Idle => Ok(()),

            ActionKind::Move { to } => {
                if !pos.is_adjacent(to) {
                    return Err(Rejection::NotAdjacent { from: pos, to });
                }
                if !world.map.is_walkable(to) {
                    return Err(WorldError::NotWalkable(to).into());
                }
                if let Some(by) = world.agents.occupant(to).filter(|&by| by != agent) {
                    return Err(Rejection::Blocked(by));
                }
                world.agents.move_agent(agent, to)?;
                Ok(())
            }

            ActionKind::TakeItem { from, item, qty } => {
                if !world.can_reach(pos, from) {
                    return Err(Rejection::OutOfReach);
                }
                let free = world.agents.inventory(agent).free_space();
                if free < qty {
                    return Err(WorldError::ContainerFull { free, wanted: qty }.into());
                }
                world.container_mut(from)?.take(item, qty)?;
                world.agents.inventories[agent.index()].add(item, qty)?;
                Ok(())
            }

            ActionKind::PutItem { to, item, qty } => {
                if !world.can_reach(pos, to) {
                    return Err(Rejection::OutOfReach);
                }
                let free = world.container(to)?.free_space();
                if free < qty {
                    return Err(WorldError::ContainerFull { free, wanted: qty }.into());
                }
                world.agents.inventories[agent.index()].take(item, qty)?;
                world.container_mut(to)?.add(item, qty)?;
                Ok(())
            }

            ActionKind::Produce { facility, item, qty, skill, xp } => {
                let site = world.facilities.get_mut(facility)?;
                if site.work_spot != pos {
                    return Err(Rejection::NotAtWorkSpot);
                }
                site.output.add(item, qty)?;
                world.agents.grant_xp(agent, skill, xp);
                Ok(())
            }

            ActionKind::Transform { facility, reaction } => {
                if world.facility(facility)?.work_spot != pos {
                    return Err(Rejection::NotAtWorkSpot);
                }
                let def = world
                    .reactions
                    .get(reaction)
                    .ok_or(Rejection::UnknownReaction(reaction))?;
                let inventory = world.agents.inventory(agent);
                for &(item, qty) in &def.inputs {
                    let have = inventory.count(item);
                    if have < qty {
                        return Err(WorldError::InsufficientItems { item, wanted: qty, have }.into());
                    }
                }
                let consumed: u32 = def.inputs.iter().map(|&(_, q)| q).sum();
                let free = inventory.free_space() + consumed;
                if free < def.output_units() {
                    return Err(WorldError::ContainerFull { free, wanted: def.output_units() }.into());
                }
                let (inputs, outputs, effort) =
                    (def.inputs.clone(), def.outputs.clone(), def.duration_ticks as f32);
                let inventory = &mut world.agents.inventories[agent.index()];
                for (item, qty) in inputs {
                    inventory.take(item, qty)?;
                }
                for (item, qty) in outputs {
                    inventory.add(item, qty)?;
                }
                world.agents.grant_xp(agent, Skill::Crafting, effort / 10.0);
                Ok(())
            }

            ActionKind::Consume { item, need, restore } => {
                world.agents.inventories[agent.index()].take(item, 1)?;
                world.agents.needs[agent.index()].get_mut(need).restore(restore);
                Ok(())
            }
        }
    }
}

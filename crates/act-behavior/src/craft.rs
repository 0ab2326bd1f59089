//! Running one reaction: fetch the inputs, process them at a facility of
//! the right kind, store the outputs.
//!
//! ```text
//!  GoingToInputs ─Arrived─▶ FetchingInputs ─InputsReady─▶ GoingToFacility ─Arrived─▶ Processing
//!        │ ▲                     │                                                     │
//!        │ └──── Retarget ───────┘                                                 Processed
//!        └───────────── InputsReady (already carried) ──▶ GoingToFacility              ▼
//!                                      StoringOutputs ◀─Arrived─ GoingToStorage ◀──────┘
//! ```
//!
//! Zones: `{FetchingInputs}` → `GoingToInputs`, `{Processing}` →
//! `GoingToFacility`, `{StoringOutputs}` → `GoingToStorage`.  Processing
//! progress is kept across interruptions; the agent walks back and picks up
//! where it left off.
//!
//! Energy decays at the reaction's `energy_multiplier` for the whole
//! activity, walking and fetching included.

use act_core::{AgentId, GridPos, ItemId, ReactionId};
use act_engine::{
    Action, ActionKind, Activity, ActivityContext, ActivityCore, MachineBuilder, Priority,
    StateMachine, StatefulActivity, SubActivityResult,
};
use act_world::{
    Container, FacilityId, Goal, InterruptionReason, Inventory, NeedKind, ReactionBook, ReactionDef, StorageId,
    World,
};
use tracing::debug;

use crate::{BehaviorError, BehaviorResult, Navigate, NavigateConfig};

const MAX_STEPS_PER_TICK: usize = 8;

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CraftConfig {
    /// Ticks to wait for a busy facility of the right kind.
    pub max_wait_ticks: u32,
    pub navigate:       NavigateConfig,
}

impl Default for CraftConfig {
    fn default() -> Self {
        Self { max_wait_ticks: 60, navigate: NavigateConfig::default() }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CraftPhase {
    GoingToInputs,
    FetchingInputs,
    GoingToFacility,
    Processing,
    GoingToStorage,
    StoringOutputs,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CraftTrigger {
    Arrived,
    InputsReady,
    Processed,
    Retarget,
    Interrupted,
    Resumed,
}

fn machine() -> BehaviorResult<StateMachine<CraftPhase, CraftTrigger>> {
    use CraftPhase::*;
    use CraftTrigger::*;
    Ok(MachineBuilder::new(GoingToInputs, Interrupted, Resumed)
        .navigation(GoingToInputs)
        .navigation(GoingToFacility)
        .navigation(GoingToStorage)
        .permit(GoingToInputs, Arrived, FetchingInputs)
        .permit(GoingToInputs, InputsReady, GoingToFacility)
        .permit(FetchingInputs, InputsReady, GoingToFacility)
        .permit(FetchingInputs, Retarget, GoingToInputs)
        .permit(GoingToFacility, Arrived, Processing)
        .permit(Processing, Processed, GoingToStorage)
        .permit(GoingToStorage, Arrived, StoringOutputs)
        .permit(StoringOutputs, Retarget, GoingToStorage)
        .zone(&[FetchingInputs], GoingToInputs)
        .zone(&[Processing], GoingToFacility)
        .zone(&[StoringOutputs], GoingToStorage)
        .build()?)
}

enum Flow {
    Act(Action),
    Stop,
    Again,
}

pub struct Craft {
    sm:       StatefulActivity<CraftPhase, CraftTrigger>,
    reaction: ReactionDef,
    config:   CraftConfig,
    source:   Option<StorageId>,
    facility: Option<FacilityId>,
    storage:  Option<StorageId>,
    /// Processing ticks done so far.
    progress: u32,
    /// Carried output counts captured when `Transform` was issued.
    baseline: Option<Vec<(ItemId, u32)>>,
    waited:   u32,
}

impl Craft {
    pub fn new(
        reaction: ReactionId,
        book:     &ReactionBook,
        config:   CraftConfig,
        priority: Priority,
    ) -> BehaviorResult<Self> {
        let def = book.get(reaction).ok_or(BehaviorError::UnknownReaction(reaction))?.clone();
        let core = ActivityCore::new("craft", priority).with_need_decay(NeedKind::Energy, def.energy_multiplier);
        Ok(Self {
            sm: StatefulActivity::new(core, machine()?),
            reaction: def,
            config,
            source: None,
            facility: None,
            storage: None,
            progress: 0,
            baseline: None,
            waited: 0,
        })
    }

    pub fn phase(&self) -> CraftPhase {
        self.sm.phase()
    }

    pub fn progress(&self) -> u32 {
        self.progress
    }

    pub fn facility(&self) -> Option<FacilityId> {
        self.facility
    }

    /// Inputs still to be picked up, as `(item, qty)`.
    fn missing_inputs(&self, world: &World, agent: AgentId) -> Vec<(ItemId, u32)> {
        let inventory = world.agents.inventory(agent);
        self.reaction
            .inputs
            .iter()
            .filter_map(|&(item, qty)| {
                let have = inventory.count(item);
                (have < qty).then_some((item, qty - have))
            })
            .collect()
    }

    fn carried_outputs(&self, world: &World, agent: AgentId) -> Vec<(ItemId, u32)> {
        let inventory = world.agents.inventory(agent);
        self.reaction.outputs.iter().map(|&(item, _)| (item, inventory.count(item))).collect()
    }

    fn walk(&mut self, ctx: &mut ActivityContext<'_>, goal: Goal) -> Flow {
        let (priority, cfg) = (self.sm.core.priority(), &self.config.navigate);
        match self.sm.run_phase_sub(ctx, |_| Navigate::boxed(goal, priority, cfg)) {
            SubActivityResult::Continue(action) => Flow::Act(action),
            SubActivityResult::Completed => {
                self.sm.advance(CraftTrigger::Arrived);
                Flow::Again
            }
            SubActivityResult::Failed => {
                self.sm.core.fail(format!("could not reach {:?} phase target", self.sm.phase()));
                Flow::Stop
            }
        }
    }

    // ── Inputs ───────────────────────────────────────────────────────────────

    fn going_to_inputs(&mut self, ctx: &mut ActivityContext<'_>) -> Flow {
        let world = ctx.world;
        let missing = self.missing_inputs(world, ctx.agent);
        if missing.is_empty() {
            self.sm.advance(CraftTrigger::InputsReady);
            return Flow::Again;
        }
        let holds_missing = |contents: &Inventory| missing.iter().any(|&(item, _)| contents.count(item) > 0);

        let current = self.source.and_then(|s| world.storage(s).ok());
        let pos = match current {
            Some(st) if holds_missing(&st.contents) => st.pos,
            _ => {
                let found = world
                    .nearest_storage(ctx.position, |s| holds_missing(&s.contents))
                    .and_then(|id| world.storage(id).ok().map(|st| (id, st.pos)));
                let Some((source, pos)) = found else {
                    self.sm.core.fail(format!("inputs for {} are not available", self.reaction.name));
                    return Flow::Stop;
                };
                self.source = Some(source);
                self.sm.clear_sub();
                pos
            }
        };
        self.walk(ctx, Goal::Adjacent(pos))
    }

    fn fetching_inputs(&mut self, ctx: &mut ActivityContext<'_>) -> Flow {
        let world = ctx.world;
        let missing = self.missing_inputs(world, ctx.agent);
        if missing.is_empty() {
            self.sm.advance(CraftTrigger::InputsReady);
            return Flow::Again;
        }
        let Some(source) = self.source else {
            self.sm.advance(CraftTrigger::Retarget);
            return Flow::Again;
        };
        let container = Container::Storage(source);
        let Ok(contents) = world.container(container) else {
            self.source = None;
            self.sm.advance(CraftTrigger::Retarget);
            return Flow::Again;
        };
        if !world.can_reach(ctx.position, container) {
            self.sm.advance(CraftTrigger::Retarget);
            return Flow::Again;
        }
        let room = world.agents.inventory(ctx.agent).free_space();
        if room == 0 {
            self.sm.core.fail("no room to carry the inputs");
            return Flow::Stop;
        }
        let take = missing.iter().find_map(|&(item, qty)| {
            let have = contents.count(item);
            (have > 0).then(|| (item, qty.min(have).min(room)))
        });
        match take {
            Some((item, qty)) => Flow::Act(self.sm.core.action(ActionKind::TakeItem { from: container, item, qty })),
            None => {
                // This source has nothing more we need.
                self.source = None;
                self.sm.advance(CraftTrigger::Retarget);
                Flow::Again
            }
        }
    }

    // ── Facility ─────────────────────────────────────────────────────────────

    fn going_to_facility(&mut self, ctx: &mut ActivityContext<'_>) -> Flow {
        let world = ctx.world;
        let me = ctx.agent;
        if self.progress == 0 && !self.missing_inputs(world, me).is_empty() {
            self.sm.core.fail("inputs were lost before processing");
            return Flow::Stop;
        }
        let kind = &self.reaction.facility;
        let free_for_me = |id: FacilityId| world.claims.facility_holder(id).is_none_or(|h| h == me);

        let chosen = self.facility.filter(|&f| world.facility(f).is_ok_and(|site| site.kind == *kind));
        let facility = match chosen {
            Some(f) => f,
            None => match world.nearest_facility(ctx.position, |id, f| f.kind == *kind && free_for_me(id)) {
                Some(f) => {
                    self.facility = Some(f);
                    self.sm.clear_sub();
                    f
                }
                None => {
                    if world.facilities.iter().all(|(_, f)| f.kind != *kind) {
                        self.sm.core.fail(format!("no {kind} facility exists"));
                        return Flow::Stop;
                    }
                    return self.wait_for_facility(ctx);
                }
            },
        };
        if !free_for_me(facility) {
            return self.wait_for_facility(ctx);
        }
        self.waited = 0;
        let Ok(site) = world.facility(facility) else {
            self.sm.core.fail(format!("facility {facility} no longer exists"));
            return Flow::Stop;
        };
        self.walk(ctx, Goal::Exact(site.work_spot))
    }

    fn wait_for_facility(&mut self, ctx: &ActivityContext<'_>) -> Flow {
        self.waited += 1;
        debug!(agent = %ctx.agent, waited = self.waited, kind = %self.reaction.facility, "facility busy");
        if self.waited > self.config.max_wait_ticks {
            self.sm.core.fail(format!("every {} facility stayed busy", self.reaction.facility));
            return Flow::Stop;
        }
        Flow::Act(self.sm.core.idle())
    }

    fn processing(&mut self, ctx: &mut ActivityContext<'_>) -> Flow {
        let world = ctx.world;
        let Some(facility) = self.facility else {
            self.sm.advance(CraftTrigger::Interrupted);
            return Flow::Again;
        };
        let Ok(site) = world.facility(facility) else {
            self.sm.core.fail(format!("facility {facility} no longer exists"));
            return Flow::Stop;
        };
        if ctx.position != site.work_spot {
            self.sm.advance(CraftTrigger::Interrupted);
            return Flow::Again;
        }

        if self.progress < self.reaction.duration_ticks {
            self.progress += 1;
            return Flow::Act(self.sm.core.idle());
        }

        match self.baseline.take() {
            None => {
                self.baseline = Some(self.carried_outputs(world, ctx.agent));
                Flow::Act(self.sm.core.action(ActionKind::Transform { facility, reaction: self.reaction.id }))
            }
            Some(before) => {
                let made = self.reaction.outputs.iter().zip(&before).all(|(&(item, qty), &(_, had))| {
                    world.agents.inventory(ctx.agent).count(item) >= had + qty
                });
                if made {
                    self.sm.advance(CraftTrigger::Processed);
                    Flow::Again
                } else {
                    self.sm.core.fail(format!("{} did not produce its outputs", self.reaction.name));
                    Flow::Stop
                }
            }
        }
    }

    // ── Outputs ──────────────────────────────────────────────────────────────

    fn pick_storage(world: &World, from: GridPos, except: Option<StorageId>) -> Option<StorageId> {
        let skip = except.and_then(|id| world.storage(id).ok()).map(|s| s.pos);
        world.nearest_storage(from, |s| s.contents.free_space() > 0 && Some(s.pos) != skip)
    }

    fn going_to_storage(&mut self, ctx: &mut ActivityContext<'_>) -> Flow {
        let world = ctx.world;
        if self.carried_outputs(world, ctx.agent).iter().all(|&(_, n)| n == 0) {
            self.sm.core.complete();
            return Flow::Stop;
        }
        let pos = match self.storage.and_then(|s| world.storage(s).ok()) {
            Some(st) => st.pos,
            None => {
                self.storage = Self::pick_storage(world, ctx.position, None);
                self.sm.clear_sub();
                match self.storage.and_then(|s| world.storage(s).ok()) {
                    Some(st) => st.pos,
                    None => {
                        self.sm.core.fail("no storage with room for the outputs");
                        return Flow::Stop;
                    }
                }
            }
        };
        self.walk(ctx, Goal::Adjacent(pos))
    }

    fn storing_outputs(&mut self, ctx: &mut ActivityContext<'_>) -> Flow {
        let world = ctx.world;
        let Some((item, carried)) = self.carried_outputs(world, ctx.agent).into_iter().find(|&(_, n)| n > 0) else {
            self.sm.core.complete();
            return Flow::Stop;
        };
        let Some(storage) = self.storage else {
            self.sm.advance(CraftTrigger::Retarget);
            return Flow::Again;
        };
        let container = Container::Storage(storage);
        let free = world.container(container).map_or(0, |inv| inv.free_space());
        if free == 0 || !world.can_reach(ctx.position, container) {
            self.storage = Self::pick_storage(world, ctx.position, Some(storage));
            if self.storage.is_none() {
                self.sm.core.fail("no storage with room for the outputs");
                return Flow::Stop;
            }
            self.sm.advance(CraftTrigger::Retarget);
            return Flow::Again;
        }
        Flow::Act(self.sm.core.action(ActionKind::PutItem { to: container, item, qty: carried.min(free) }))
    }
}

impl Activity for Craft {
    fn core(&self) -> &ActivityCore {
        &self.sm.core
    }

    fn core_mut(&mut self) -> &mut ActivityCore {
        &mut self.sm.core
    }

    fn display_name(&self) -> String {
        format!(
            "Crafting {} ({:?}, {}/{})",
            self.reaction.name,
            self.sm.phase(),
            self.progress,
            self.reaction.duration_ticks
        )
    }

    fn on_interrupted(&mut self, reason: InterruptionReason) {
        self.sm.interrupt(reason);
    }

    fn on_resume(&mut self) {
        self.sm.resume();
    }

    fn cleanup(&mut self) {
        self.sm.clear_sub();
    }

    fn target_facility(&self) -> Option<FacilityId> {
        match self.sm.phase() {
            CraftPhase::GoingToFacility | CraftPhase::Processing => self.facility,
            _ => None,
        }
    }

    fn alternative_goal_positions(&self, world: &World) -> Vec<GridPos> {
        self.facility
            .and_then(|f| world.facility(f).ok())
            .map(|f| f.spare_spots.clone())
            .unwrap_or_default()
    }

    fn next_action(&mut self, ctx: &mut ActivityContext<'_>) -> Option<Action> {
        for _ in 0..MAX_STEPS_PER_TICK {
            if !self.sm.core.is_running() {
                return None;
            }
            let flow = match self.sm.phase() {
                CraftPhase::GoingToInputs   => self.going_to_inputs(ctx),
                CraftPhase::FetchingInputs  => self.fetching_inputs(ctx),
                CraftPhase::GoingToFacility => self.going_to_facility(ctx),
                CraftPhase::Processing      => self.processing(ctx),
                CraftPhase::GoingToStorage  => self.going_to_storage(ctx),
                CraftPhase::StoringOutputs  => self.storing_outputs(ctx),
            };
            match flow {
                Flow::Act(action) => return Some(action),
                Flow::Stop        => return None,
                Flow::Again       => continue,
            }
        }
        Some(self.sm.core.idle())
    }
}

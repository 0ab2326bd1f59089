//! A shift at a production facility.
//!
//! ```text
//!  GoingToWork ──Arrived──▶ Working ──WorkDone──▶ Gathering ──Gathered──▶ GoingToStorage ──Arrived──▶ Depositing
//!                            │   ▲                                             ▲                          │
//!                   BreakStart   BreakOver                                     └──────── Retarget ────────┘
//!                            ▼   │
//!                            OnBreak
//! ```
//!
//! Zones: `{Working, OnBreak, Gathering}` regress to `GoingToWork`;
//! `{Depositing}` regresses to `GoingToStorage`.  Both `Going*` phases are
//! navigation phases.
//!
//! Work progress (`work_ticks`, `produced`) lives outside the machine and
//! survives every regression.
//!
//! Skips and failures:
//! - facility destroyed → fail.
//! - facility held by someone else → wait, fail after `max_wait_ticks`.
//! - nothing gathered → complete without the storage trip.
//! - no storage with free space → fail.

use act_core::{GridPos, ItemId};
use act_engine::{
    Action, ActionKind, Activity, ActivityContext, ActivityCore, MachineBuilder, Priority,
    StateMachine, StatefulActivity, SubActivityResult,
};
use act_world::{Container, FacilityId, Goal, InterruptionReason, NeedKind, Skill, StorageId, World};

use crate::{BehaviorError, BehaviorResult, Navigate, NavigateConfig, Wait};

const MAX_STEPS_PER_TICK: usize = 8;

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WorkShiftConfig {
    /// Working ticks in one shift (breaks excluded).
    pub duration_ticks:    u64,
    /// Shift length varies uniformly by ± this many ticks.
    pub duration_variance: u64,
    pub items_per_shift:   u32,
    /// Chance per working tick of starting a break.
    pub break_probability: f64,
    pub break_ticks:       u64,
    /// Energy decay multiplier for the whole shift.
    pub energy_multiplier: f32,
    pub xp_per_item:       f32,
    /// Ticks to wait for a facility someone else is using.
    pub max_wait_ticks:    u32,
    pub navigate:          NavigateConfig,
}

impl Default for WorkShiftConfig {
    fn default() -> Self {
        Self {
            duration_ticks:    480,
            duration_variance: 30,
            items_per_shift:   12,
            break_probability: 0.002,
            break_ticks:       30,
            energy_multiplier: 1.5,
            xp_per_item:       1.0,
            max_wait_ticks:    60,
            navigate:          NavigateConfig::default(),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum WorkPhase {
    GoingToWork,
    Working,
    OnBreak,
    Gathering,
    GoingToStorage,
    Depositing,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum WorkTrigger {
    Arrived,
    BreakStart,
    BreakOver,
    WorkDone,
    Gathered,
    Retarget,
    Interrupted,
    Resumed,
}

fn machine() -> BehaviorResult<StateMachine<WorkPhase, WorkTrigger>> {
    use WorkPhase::*;
    use WorkTrigger::*;
    Ok(MachineBuilder::new(GoingToWork, Interrupted, Resumed)
        .navigation(GoingToWork)
        .navigation(GoingToStorage)
        .permit(GoingToWork, Arrived, Working)
        .permit(Working, BreakStart, OnBreak)
        .permit(OnBreak, BreakOver, Working)
        .permit(Working, WorkDone, Gathering)
        .permit(Gathering, Gathered, GoingToStorage)
        .permit(GoingToStorage, Arrived, Depositing)
        .permit(Depositing, Retarget, GoingToStorage)
        .zone(&[Working, OnBreak, Gathering], GoingToWork)
        .zone(&[Depositing], GoingToStorage)
        .build()?)
}

enum Flow {
    Act(Action),
    Stop,
    Again,
}

pub struct WorkShift {
    sm:         StatefulActivity<WorkPhase, WorkTrigger>,
    facility:   FacilityId,
    item:       ItemId,
    skill:      Skill,
    config:     WorkShiftConfig,
    /// Jittered on the first working tick.
    duration:   Option<u64>,
    work_ticks: u64,
    produced:   u32,
    waited:     u32,
    storage:    Option<StorageId>,
}

impl WorkShift {
    pub fn new(
        facility: FacilityId,
        item:     ItemId,
        skill:    Skill,
        config:   WorkShiftConfig,
        priority: Priority,
    ) -> BehaviorResult<Self> {
        if config.items_per_shift == 0 || config.duration_ticks == 0 {
            return Err(BehaviorError::Config(
                "work shift needs duration_ticks > 0 and items_per_shift > 0".into(),
            ));
        }
        let core = ActivityCore::new("work_shift", priority)
            .with_need_decay(NeedKind::Energy, config.energy_multiplier);
        Ok(Self {
            sm: StatefulActivity::new(core, machine()?),
            facility,
            item,
            skill,
            config,
            duration: None,
            work_ticks: 0,
            produced: 0,
            waited: 0,
            storage: None,
        })
    }

    pub fn phase(&self) -> WorkPhase {
        self.sm.phase()
    }

    pub fn work_ticks(&self) -> u64 {
        self.work_ticks
    }

    pub fn produced(&self) -> u32 {
        self.produced
    }

    pub fn storage(&self) -> Option<StorageId> {
        self.storage
    }

    /// Fold a navigation result: on arrival fire `Arrived` and keep going.
    fn follow(&mut self, result: SubActivityResult, what: &str) -> Flow {
        match result {
            SubActivityResult::Continue(action) => Flow::Act(action),
            SubActivityResult::Completed => {
                self.sm.advance(WorkTrigger::Arrived);
                Flow::Again
            }
            SubActivityResult::Failed => {
                self.sm.core.fail(format!("could not reach {what}"));
                Flow::Stop
            }
        }
    }

    /// Nearest storage with room, other than `except`.
    fn pick_storage(world: &World, from: GridPos, except: Option<StorageId>) -> Option<StorageId> {
        let skip = except.and_then(|id| world.storage(id).ok()).map(|s| s.pos);
        world.nearest_storage(from, |s| s.contents.free_space() > 0 && Some(s.pos) != skip)
    }

    fn going_to_work(&mut self, ctx: &mut ActivityContext<'_>, work_spot: GridPos) -> Flow {
        let me = ctx.agent;
        if let Some(holder) = ctx.world.claims.facility_holder(self.facility).filter(|&h| h != me) {
            self.waited += 1;
            if self.waited > self.config.max_wait_ticks {
                self.sm.core.fail(format!("facility {} held by {holder}", self.facility));
                return Flow::Stop;
            }
            return Flow::Act(self.sm.core.idle());
        }
        self.waited = 0;
        let (priority, cfg) = (self.sm.core.priority(), &self.config.navigate);
        let result = self.sm.run_phase_sub(ctx, |_| Navigate::boxed(Goal::Exact(work_spot), priority, cfg));
        self.follow(result, "the workplace")
    }

    fn working(&mut self, ctx: &mut ActivityContext<'_>, work_spot: GridPos) -> Flow {
        if ctx.position != work_spot {
            // Standing elsewhere is treated like an interruption.
            self.sm.advance(WorkTrigger::Interrupted);
            return Flow::Again;
        }
        let cfg = &self.config;
        let duration = *self
            .duration
            .get_or_insert_with(|| ctx.rng.jitter(cfg.duration_ticks, cfg.duration_variance));

        if ctx.rng.roll(cfg.break_probability) {
            self.sm.advance(WorkTrigger::BreakStart);
            return Flow::Again;
        }

        self.work_ticks += 1;
        let interval = (duration / u64::from(cfg.items_per_shift)).max(1);
        let action = if self.work_ticks % interval == 0 && self.produced < cfg.items_per_shift {
            self.produced += 1;
            self.sm.core.action(ActionKind::Produce {
                facility: self.facility,
                item:     self.item,
                qty:      1,
                skill:    self.skill,
                xp:       cfg.xp_per_item,
            })
        } else {
            self.sm.core.idle()
        };
        if self.work_ticks >= duration {
            self.sm.advance(WorkTrigger::WorkDone);
        }
        Flow::Act(action)
    }

    fn on_break(&mut self, ctx: &mut ActivityContext<'_>) -> Flow {
        let (ticks, priority) = (self.config.break_ticks, self.sm.core.priority());
        match self.sm.run_phase_sub(ctx, move |_| Box::new(Wait::new(ticks, priority))) {
            SubActivityResult::Continue(action) => Flow::Act(action),
            _ => {
                self.sm.advance(WorkTrigger::BreakOver);
                Flow::Again
            }
        }
    }

    fn gathering(&mut self, ctx: &mut ActivityContext<'_>) -> Flow {
        let world = ctx.world;
        let output = Container::FacilityOutput(self.facility);
        if !world.can_reach(ctx.position, output) {
            self.sm.advance(WorkTrigger::Interrupted);
            return Flow::Again;
        }
        let available = world.container(output).map_or(0, |inv| inv.count(self.item));
        let room = world.agents.inventory(ctx.agent).free_space();
        let qty = available.min(room);
        if qty > 0 {
            return Flow::Act(self.sm.core.action(ActionKind::TakeItem { from: output, item: self.item, qty }));
        }

        if world.agents.inventory(ctx.agent).count(self.item) == 0 {
            self.sm.core.complete();
            return Flow::Stop;
        }
        match Self::pick_storage(world, ctx.position, None) {
            Some(storage) => {
                self.storage = Some(storage);
                self.sm.advance(WorkTrigger::Gathered);
                Flow::Again
            }
            None => {
                self.sm.core.fail("no storage with free space");
                Flow::Stop
            }
        }
    }

    fn going_to_storage(&mut self, ctx: &mut ActivityContext<'_>) -> Flow {
        let world = ctx.world;
        let Some(pos) = self.storage.and_then(|s| world.storage(s).ok()).map(|s| s.pos) else {
            self.storage = Self::pick_storage(world, ctx.position, None);
            if self.storage.is_none() {
                self.sm.core.fail("storage vanished and no other has room");
                return Flow::Stop;
            }
            // Same phase, new destination: restart the walk.
            self.sm.clear_sub();
            return Flow::Again;
        };
        let (priority, cfg) = (self.sm.core.priority(), &self.config.navigate);
        let result = self.sm.run_phase_sub(ctx, |_| Navigate::boxed(Goal::Adjacent(pos), priority, cfg));
        self.follow(result, "storage")
    }

    fn depositing(&mut self, ctx: &mut ActivityContext<'_>) -> Flow {
        let world = ctx.world;
        let carried = world.agents.inventory(ctx.agent).count(self.item);
        if carried == 0 {
            self.sm.core.complete();
            return Flow::Stop;
        }
        let Some(storage) = self.storage else {
            self.sm.advance(WorkTrigger::Retarget);
            return Flow::Again;
        };
        let target = Container::Storage(storage);
        let free = world.container(target).map_or(0, |inv| inv.free_space());
        if free == 0 || !world.can_reach(ctx.position, target) {
            self.storage = Self::pick_storage(world, ctx.position, Some(storage));
            if self.storage.is_none() {
                self.sm.core.fail("no storage with free space");
                return Flow::Stop;
            }
            self.sm.advance(WorkTrigger::Retarget);
            return Flow::Again;
        }
        Flow::Act(self.sm.core.action(ActionKind::PutItem { to: target, item: self.item, qty: carried.min(free) }))
    }
}

impl Activity for WorkShift {
    fn core(&self) -> &ActivityCore {
        &self.sm.core
    }

    fn core_mut(&mut self) -> &mut ActivityCore {
        &mut self.sm.core
    }

    fn display_name(&self) -> String {
        format!("Work shift at {} ({:?}, {} made)", self.facility, self.sm.phase(), self.produced)
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
            WorkPhase::GoingToWork | WorkPhase::Working | WorkPhase::OnBreak | WorkPhase::Gathering => {
                Some(self.facility)
            }
            WorkPhase::GoingToStorage | WorkPhase::Depositing => None,
        }
    }

    fn alternative_goal_positions(&self, world: &World) -> Vec<GridPos> {
        world.facility(self.facility).map(|f| f.spare_spots.clone()).unwrap_or_default()
    }

    fn next_action(&mut self, ctx: &mut ActivityContext<'_>) -> Option<Action> {
        let Ok(facility) = ctx.world.facility(self.facility) else {
            self.sm.core.fail(format!("facility {} no longer exists", self.facility));
            return None;
        };
        let work_spot = facility.work_spot;

        for _ in 0..MAX_STEPS_PER_TICK {
            if !self.sm.core.is_running() {
                return None;
            }
            let flow = match self.sm.phase() {
                WorkPhase::GoingToWork    => self.going_to_work(ctx, work_spot),
                WorkPhase::Working        => self.working(ctx, work_spot),
                WorkPhase::OnBreak        => self.on_break(ctx),
                WorkPhase::Gathering      => self.gathering(ctx),
                WorkPhase::GoingToStorage => self.going_to_storage(ctx),
                WorkPhase::Depositing     => self.depositing(ctx),
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

//! Unit tests for act-engine.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use act_core::{AgentId, AgentRng, GridPos, ItemId, SimClock};
use act_world::{AStar, GridMap, InterruptionReason, PerceptionEvent, StorageMemory, World};

use crate::{
    Action, ActionKind, Activity, ActivityContext, ActivityCore, Lifecycle, MachineBuilder,
    StateMachine, StatefulActivity, SubActivityResult,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn p(x: i32, y: i32) -> GridPos {
    GridPos::new(x, y)
}

struct Harness {
    world:  World,
    memory: StorageMemory,
    rng:    AgentRng,
    agent:  AgentId,
}

impl Harness {
    fn new() -> Self {
        let mut world = World::new(GridMap::open(10, 10), SimClock::new(100));
        let agent = world.agents.spawn(p(0, 0), 10).unwrap();
        Self { world, memory: StorageMemory::new(100), rng: AgentRng::new(7, agent), agent }
    }

    fn with_ctx<R>(&mut self, events: Vec<PerceptionEvent>, f: impl FnOnce(&mut ActivityContext<'_>) -> R) -> R {
        let perception = self.world.perceive(self.agent, 5, events);
        let mut ctx =
            ActivityContext::new(&perception, &self.world, &mut self.memory, &mut self.rng, &AStar);
        f(&mut ctx)
    }

    /// Process events then poll, as an owner does each tick.
    fn drive(&mut self, activity: &mut dyn Activity, events: Vec<PerceptionEvent>) -> Option<Action> {
        self.with_ctx(events, |ctx| {
            activity.process_events(ctx.perception);
            activity.next_action(ctx)
        })
    }
}

#[derive(Clone, Default)]
struct Counters {
    polls:    Arc<AtomicUsize>,
    cleanups: Arc<AtomicUsize>,
}

impl Counters {
    fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }
    fn cleanups(&self) -> usize {
        self.cleanups.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Copy, Debug)]
enum Step {
    Act,
    Skip,
    Complete,
    Fail,
}

/// Plays back a fixed script, one step per poll.
struct Scripted {
    core:              ActivityCore,
    steps:             VecDeque<Step>,
    counters:          Counters,
    fail_on_interrupt: bool,
}

impl Scripted {
    fn new(priority: i32, steps: &[Step], counters: &Counters) -> Self {
        Self {
            core: ActivityCore::new("scripted", priority),
            steps: steps.iter().copied().collect(),
            counters: counters.clone(),
            fail_on_interrupt: false,
        }
    }

    /// `n` move actions, then completion.
    fn acting(n: usize, counters: &Counters) -> Self {
        let mut steps = vec![Step::Act; n];
        steps.push(Step::Complete);
        Self::new(0, &steps, counters)
    }
}

impl Activity for Scripted {
    fn core(&self) -> &ActivityCore {
        &self.core
    }
    fn core_mut(&mut self) -> &mut ActivityCore {
        &mut self.core
    }
    fn display_name(&self) -> String {
        "Scripted".into()
    }
    fn next_action(&mut self, _ctx: &mut ActivityContext<'_>) -> Option<Action> {
        self.counters.polls.fetch_add(1, Ordering::SeqCst);
        match self.steps.pop_front().unwrap_or(Step::Complete) {
            Step::Act => Some(self.core.action(ActionKind::Move { to: p(1, 0) })),
            Step::Skip => None,
            Step::Complete => {
                self.core.complete();
                None
            }
            Step::Fail => {
                self.core.fail("scripted failure");
                None
            }
        }
    }
    fn on_interrupted(&mut self, _reason: InterruptionReason) {
        if self.fail_on_interrupt {
            self.core.fail("interrupted");
        }
    }
    fn cleanup(&mut self) {
        self.counters.cleanups.fetch_add(1, Ordering::SeqCst);
    }
}

// ── A small stateful behavior ─────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
enum Phase {
    Walk,
    Work,
    Rest,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
enum Trigger {
    Arrived,
    Tired,
    Rested,
    Interrupted,
    Resumed,
}

fn errand_machine() -> StateMachine<Phase, Trigger> {
    MachineBuilder::new(Phase::Walk, Trigger::Interrupted, Trigger::Resumed)
        .navigation(Phase::Walk)
        .permit(Phase::Walk, Trigger::Arrived, Phase::Work)
        .permit(Phase::Work, Trigger::Tired, Phase::Rest)
        .permit(Phase::Rest, Trigger::Rested, Phase::Work)
        .zone(&[Phase::Work, Phase::Rest], Phase::Walk)
        .build()
        .unwrap()
}

/// Walk (a scripted sub-activity of `walk_len` moves), then work for
/// `work_total` ticks.
struct Errand {
    sm:         StatefulActivity<Phase, Trigger>,
    walks:      Arc<AtomicUsize>,
    walk_len:   usize,
    worked:     u32,
    work_total: u32,
}

impl Errand {
    fn new(walk_len: usize, work_total: u32) -> Self {
        Self {
            sm: StatefulActivity::new(ActivityCore::new("errand", 3), errand_machine()),
            walks: Arc::default(),
            walk_len,
            worked: 0,
            work_total,
        }
    }

    fn walks(&self) -> usize {
        self.walks.load(Ordering::SeqCst)
    }
}

impl Activity for Errand {
    fn core(&self) -> &ActivityCore {
        &self.sm.core
    }
    fn core_mut(&mut self) -> &mut ActivityCore {
        &mut self.sm.core
    }
    fn display_name(&self) -> String {
        format!("Errand ({:?})", self.sm.phase())
    }
    fn on_interrupted(&mut self, reason: InterruptionReason) {
        self.sm.interrupt(reason);
    }
    fn on_resume(&mut self) {
        self.sm.resume();
    }
    fn next_action(&mut self, ctx: &mut ActivityContext<'_>) -> Option<Action> {
        match self.sm.phase() {
            Phase::Walk => {
                let (walks, len) = (Arc::clone(&self.walks), self.walk_len);
                let result = self.sm.run_phase_sub(ctx, move |_| {
                    walks.fetch_add(1, Ordering::SeqCst);
                    Box::new(Scripted::acting(len, &Counters::default()))
                });
                match result {
                    SubActivityResult::Continue(action) => Some(action),
                    SubActivityResult::Completed => {
                        self.sm.advance(Trigger::Arrived);
                        Some(self.sm.core.idle())
                    }
                    SubActivityResult::Failed => {
                        self.sm.core.fail("could not walk");
                        None
                    }
                }
            }
            Phase::Work => {
                self.worked += 1;
                if self.worked >= self.work_total {
                    self.sm.core.complete();
                    return None;
                }
                Some(self.sm.core.idle())
            }
            Phase::Rest => {
                self.sm.advance(Trigger::Rested);
                Some(self.sm.core.idle())
            }
        }
    }
}

fn interrupted() -> Vec<PerceptionEvent> {
    vec![PerceptionEvent::Interrupted(InterruptionReason::Command)]
}

fn resumed() -> Vec<PerceptionEvent> {
    vec![PerceptionEvent::Resumed]
}

// ── Lifecycle ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod lifecycle_tests {
    use super::*;
    use crate::ActivityHost;

    #[test]
    fn terminal_transition_happens_once() {
        let mut core = ActivityCore::new("x", 0);
        core.complete();
        core.fail("too late");
        assert_eq!(core.lifecycle(), Lifecycle::Completed);
        assert_eq!(core.failure(), None);
    }

    #[test]
    fn failure_records_reason() {
        let mut core = ActivityCore::new("x", 0);
        core.fail("no path");
        core.complete();
        assert_eq!(core.lifecycle(), Lifecycle::Failed);
        assert_eq!(core.failure(), Some("no path"));
    }

    #[test]
    fn need_decay_defaults_to_one() {
        use act_world::NeedKind;
        let core = ActivityCore::new("x", 0)
            .with_need_decay(NeedKind::Energy, 1.5)
            .with_need_decay(NeedKind::Hunger, -2.0);
        assert_eq!(core.need_decay_multiplier(NeedKind::Energy), 1.5);
        assert_eq!(core.need_decay_multiplier(NeedKind::Hunger), 1.0);
    }

    #[test]
    fn host_never_polls_terminal_activity_and_cleans_up_once() {
        let mut h = Harness::new();
        let counters = Counters::default();
        let mut host = ActivityHost::new(h.agent);
        host.start(Box::new(Scripted::new(0, &[Step::Act, Step::Complete], &counters)), &h.world);

        let first = h.with_ctx(vec![], |ctx| host.poll(ctx));
        assert!(first.action.is_some());
        assert!(first.finished.is_empty());

        let second = h.with_ctx(vec![], |ctx| host.poll(ctx));
        assert!(second.action.is_none());
        assert_eq!(second.finished.len(), 1);
        assert_eq!(second.finished[0].state, Lifecycle::Completed);

        for _ in 0..3 {
            let later = h.with_ctx(vec![], |ctx| host.poll(ctx));
            assert!(later.action.is_none() && later.finished.is_empty());
        }
        assert_eq!(counters.polls(), 2);
        assert_eq!(counters.cleanups(), 1);
        assert!(host.is_idle());
        drop(host);
        assert_eq!(counters.cleanups(), 1);
    }

    #[test]
    fn replaced_activity_is_cleaned_up() {
        let h = Harness::new();
        let counters = Counters::default();
        let mut host = ActivityHost::new(h.agent);
        host.start(Box::new(Scripted::acting(5, &counters)), &h.world);
        let replaced = host.start(Box::new(Scripted::acting(5, &Counters::default())), &h.world);
        assert_eq!(replaced.map(|f| f.state), Some(Lifecycle::Running));
        assert_eq!(counters.cleanups(), 1);
    }

    #[test]
    fn interrupted_activity_is_not_polled_until_resumed() {
        let mut h = Harness::new();
        let counters = Counters::default();
        let mut host = ActivityHost::new(h.agent);
        host.start(Box::new(Scripted::acting(5, &counters)), &h.world);

        assert!(h.with_ctx(interrupted(), |ctx| host.poll(ctx)).action.is_none());
        assert!(h.with_ctx(vec![], |ctx| host.poll(ctx)).action.is_none());
        assert_eq!(counters.polls(), 0);

        assert!(h.with_ctx(resumed(), |ctx| host.poll(ctx)).action.is_some());
        assert_eq!(counters.polls(), 1);
    }

    #[test]
    fn command_suspends_current_activity() {
        let mut h = Harness::new();
        let regular = Counters::default();
        let order = Counters::default();
        let mut host = ActivityHost::new(h.agent);
        host.start(Box::new(Scripted::acting(5, &regular)), &h.world);
        host.command(Box::new(Scripted::acting(1, &order)), &h.world);

        // Interrupted(Command) reaches the regular activity; the command drives.
        let out = h.with_ctx(interrupted(), |ctx| host.poll(ctx));
        assert!(out.action.is_some());
        let out = h.with_ctx(vec![], |ctx| host.poll(ctx));
        assert!(out.action.is_none());
        assert!(out.finished.iter().any(|f| f.command && f.state == Lifecycle::Completed));
        assert!(!host.has_command());
        assert_eq!(regular.polls(), 0);

        // Resumed hands control back.
        assert!(h.with_ctx(resumed(), |ctx| host.poll(ctx)).action.is_some());
        assert_eq!(regular.polls(), 1);
    }

    fn pushed() -> Vec<PerceptionEvent> {
        vec![PerceptionEvent::Interrupted(InterruptionReason::Pushed)]
    }

    #[test]
    fn command_sees_interruption_before_it_is_polled() {
        let mut h = Harness::new();
        let order = Counters::default();
        let mut host = ActivityHost::new(h.agent);
        let mut command = Scripted::acting(3, &order);
        command.fail_on_interrupt = true;
        host.command(Box::new(command), &h.world);

        let out = h.with_ctx(pushed(), |ctx| host.poll(ctx));
        assert!(out.action.is_none());
        assert_eq!(out.finished.len(), 1);
        assert!(out.finished[0].command);
        assert_eq!(out.finished[0].state, Lifecycle::Failed);
        assert_eq!(order.polls(), 0);
        assert_eq!(order.cleanups(), 1);
        assert!(!host.has_command());
    }

    #[test]
    fn interrupted_command_waits_for_resume() {
        let mut h = Harness::new();
        let order = Counters::default();
        let mut host = ActivityHost::new(h.agent);
        host.command(Box::new(Scripted::acting(3, &order)), &h.world);

        assert!(h.with_ctx(pushed(), |ctx| host.poll(ctx)).action.is_none());
        assert!(h.with_ctx(vec![], |ctx| host.poll(ctx)).action.is_none());
        assert_eq!(order.polls(), 0);

        assert!(h.with_ctx(resumed(), |ctx| host.poll(ctx)).action.is_some());
        assert_eq!(order.polls(), 1);
    }

    #[test]
    fn pushed_command_regresses_to_its_navigation_phase() {
        let mut h = Harness::new();
        let mut host = ActivityHost::new(h.agent);
        host.command(Box::new(Errand::new(0, 100)), &h.world);

        h.with_ctx(vec![], |ctx| host.poll(ctx));
        h.with_ctx(vec![], |ctx| host.poll(ctx));
        assert_eq!(host.active().map(|a| a.display_name()).as_deref(), Some("Errand (Work)"));

        h.with_ctx(pushed(), |ctx| host.poll(ctx));
        assert_eq!(host.active().map(|a| a.display_name()).as_deref(), Some("Errand (Walk)"));
    }

    #[test]
    fn command_ignores_its_own_assignment_events() {
        let mut h = Harness::new();
        let regular = Counters::default();
        let order = Counters::default();
        let mut host = ActivityHost::new(h.agent);
        host.start(Box::new(Scripted::acting(5, &regular)), &h.world);
        host.command(Box::new(Scripted::acting(2, &order)), &h.world);

        let events = vec![
            PerceptionEvent::Interrupted(InterruptionReason::Command),
            PerceptionEvent::CommandAssigned,
        ];
        assert!(h.with_ctx(events, |ctx| host.poll(ctx)).action.is_some());
        assert_eq!(order.polls(), 1);
        assert!(host.current().is_some_and(|a| a.core().is_interrupted()));
    }
}

// ── Runner ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod runner_tests {
    use super::*;
    use crate::run_sub_activity;

    #[test]
    fn running_sub_without_action_yields_idle_at_parent_priority() {
        let mut h = Harness::new();
        let parent = ActivityCore::new("parent", -4);
        let mut sub = Scripted::new(9, &[Step::Skip], &Counters::default());
        sub.initialize(h.agent, &h.world);

        let result = h.with_ctx(vec![], |ctx| run_sub_activity(&mut sub, ctx, &parent));
        match result {
            SubActivityResult::Continue(action) => {
                assert!(action.is_idle());
                assert_eq!(action.priority, -4);
                assert_eq!(action.issuer, "parent");
            }
            other => panic!("expected Continue, got {other:?}"),
        }
        assert_eq!(sub.state(), Lifecycle::Running);
    }

    #[test]
    fn sub_action_passes_through() {
        let mut h = Harness::new();
        let parent = ActivityCore::new("parent", 0);
        let mut sub = Scripted::acting(1, &Counters::default());
        sub.initialize(h.agent, &h.world);
        let result = h.with_ctx(vec![], |ctx| run_sub_activity(&mut sub, ctx, &parent));
        assert!(matches!(
            result,
            SubActivityResult::Continue(Action { kind: ActionKind::Move { .. }, agent, .. }) if agent == h.agent
        ));
    }

    #[test]
    fn terminal_sub_is_not_polled_again() {
        let mut h = Harness::new();
        let parent = ActivityCore::new("parent", 0);
        let counters = Counters::default();
        let mut sub = Scripted::new(0, &[Step::Fail], &counters);

        let first = h.with_ctx(vec![], |ctx| run_sub_activity(&mut sub, ctx, &parent));
        let second = h.with_ctx(vec![], |ctx| run_sub_activity(&mut sub, ctx, &parent));
        assert_eq!(first, SubActivityResult::Failed);
        assert_eq!(second, SubActivityResult::Failed);
        assert_eq!(counters.polls(), 1);
    }

    #[test]
    fn event_that_ends_sub_is_reported_without_polling() {
        let mut h = Harness::new();
        let parent = ActivityCore::new("parent", 0);
        let counters = Counters::default();
        let mut sub = Scripted::acting(3, &counters);
        sub.fail_on_interrupt = true;

        let result = h.with_ctx(interrupted(), |ctx| run_sub_activity(&mut sub, ctx, &parent));
        assert_eq!(result, SubActivityResult::Failed);
        assert_eq!(counters.polls(), 0);
    }
}

// ── State machine ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod machine_tests {
    use super::*;
    use crate::EngineError;

    #[test]
    fn fire_without_transition_is_an_error() {
        let mut m = errand_machine();
        assert!(!m.can_fire(Trigger::Rested));
        assert!(matches!(m.fire(Trigger::Rested), Err(EngineError::NoTransition { .. })));
        assert_eq!(m.phase(), Phase::Walk);
        assert_eq!(m.fire(Trigger::Arrived).unwrap(), Phase::Work);
    }

    #[test]
    fn reachable_phase_without_interrupt_rejected() {
        let err = MachineBuilder::new(Phase::Walk, Trigger::Interrupted, Trigger::Resumed)
            .navigation(Phase::Walk)
            .permit(Phase::Walk, Trigger::Arrived, Phase::Work)
            .build()
            .unwrap_err();
        assert!(matches!(err, EngineError::MissingInterruptTransition { phase } if phase == "Work"));
    }

    #[test]
    fn unreachable_phase_needs_no_interrupt() {
        let m = MachineBuilder::new(Phase::Walk, Trigger::Interrupted, Trigger::Resumed)
            .navigation(Phase::Walk)
            .permit(Phase::Rest, Trigger::Rested, Phase::Work)
            .build();
        assert!(m.is_ok());
    }

    #[test]
    fn overlapping_zones_rejected() {
        let err = MachineBuilder::new(Phase::Walk, Trigger::Interrupted, Trigger::Resumed)
            .navigation(Phase::Walk)
            .zone(&[Phase::Work], Phase::Walk)
            .zone(&[Phase::Work, Phase::Rest], Phase::Walk)
            .build()
            .unwrap_err();
        assert!(matches!(err, EngineError::OverlappingZones { .. }));
    }

    #[test]
    fn navigation_phase_must_reenter_itself() {
        let err = MachineBuilder::new(Phase::Walk, Trigger::Interrupted, Trigger::Resumed)
            .navigation(Phase::Walk)
            .permit(Phase::Walk, Trigger::Resumed, Phase::Work)
            .zone(&[Phase::Work], Phase::Walk)
            .build()
            .unwrap_err();
        assert!(matches!(err, EngineError::NavigationReentry { .. }));
    }
}

// ── Stateful activity ─────────────────────────────────────────────────────────

#[cfg(test)]
mod stateful_tests {
    use super::*;

    /// Drive `errand` until it reaches `phase` (bounded).
    fn drive_to(h: &mut Harness, errand: &mut Errand, phase: Phase) {
        for _ in 0..20 {
            if errand.sm.phase() == phase {
                return;
            }
            h.drive(errand, vec![]);
        }
        panic!("never reached {phase:?}");
    }

    #[test]
    fn interrupt_regresses_every_zone_phase_to_entry_with_empty_slot() {
        for start in [Phase::Work, Phase::Rest] {
            let mut h = Harness::new();
            let mut errand = Errand::new(1, 100);
            errand.initialize(h.agent, &h.world);
            drive_to(&mut h, &mut errand, Phase::Work);
            if start == Phase::Rest {
                errand.sm.fire(Trigger::Tired).unwrap();
            }
            assert_eq!(errand.sm.phase(), start);

            errand.on_interrupted(InterruptionReason::Pushed);
            assert_eq!(errand.sm.phase(), Phase::Walk, "from {start:?}");
            assert!(errand.sm.sub_is_empty());
        }
    }

    #[test]
    fn transition_clears_slot() {
        let mut h = Harness::new();
        let mut errand = Errand::new(3, 100);
        errand.initialize(h.agent, &h.world);
        h.drive(&mut errand, vec![]);
        assert!(!errand.sm.sub_is_empty());
        errand.sm.fire(Trigger::Arrived).unwrap();
        assert!(errand.sm.sub_is_empty());
    }

    #[test]
    fn navigation_phase_recreates_sub_after_every_resume_and_interrupt() {
        let mut h = Harness::new();
        let mut errand = Errand::new(10, 100);
        errand.initialize(h.agent, &h.world);

        h.drive(&mut errand, vec![]);
        h.drive(&mut errand, vec![]);
        assert_eq!(errand.walks(), 1);

        h.drive(&mut errand, resumed());
        assert_eq!(errand.walks(), 2);
        h.drive(&mut errand, vec![]);
        assert_eq!(errand.walks(), 2);

        h.drive(&mut errand, interrupted());
        assert_eq!(errand.walks(), 3);
        h.drive(&mut errand, resumed());
        assert_eq!(errand.walks(), 4);
        assert_eq!(errand.sm.phase(), Phase::Walk);
    }

    #[test]
    fn work_progress_survives_interruption() {
        let mut h = Harness::new();
        let mut errand = Errand::new(0, 100);
        errand.initialize(h.agent, &h.world);
        drive_to(&mut h, &mut errand, Phase::Work);
        for _ in 0..3 {
            h.drive(&mut errand, vec![]);
        }
        assert_eq!(errand.worked, 3);

        errand.on_interrupted(InterruptionReason::Command);
        assert_eq!(errand.sm.phase(), Phase::Walk);
        errand.on_resume();
        // Walk again (instantly), land back in Work.
        h.drive(&mut errand, vec![]);
        assert_eq!(errand.sm.phase(), Phase::Work);
        assert_eq!(errand.worked, 3, "navigation regression must not touch work progress");

        h.drive(&mut errand, vec![]);
        assert_eq!(errand.worked, 4);
    }

    #[test]
    fn resume_outside_navigation_is_a_no_op() {
        let mut h = Harness::new();
        let mut errand = Errand::new(0, 100);
        errand.initialize(h.agent, &h.world);
        drive_to(&mut h, &mut errand, Phase::Work);
        errand.on_resume();
        assert_eq!(errand.sm.phase(), Phase::Work);
        assert_eq!(errand.state(), Lifecycle::Running);
    }

    #[test]
    fn failed_sub_is_reported() {
        let mut h = Harness::new();
        let mut sm = StatefulActivity::new(ActivityCore::new("p", 0), errand_machine());
        sm.core.bind(h.agent);
        let result = h.with_ctx(vec![], |ctx| {
            sm.run_phase_sub(ctx, |_| Box::new(Scripted::new(0, &[Step::Fail], &Counters::default())))
        });
        assert_eq!(result, SubActivityResult::Failed);
    }

    #[test]
    fn sub_cleanup_runs_on_transition() {
        let mut h = Harness::new();
        let counters = Counters::default();
        let mut sm = StatefulActivity::new(ActivityCore::new("p", 0), errand_machine());
        let c = counters.clone();
        h.with_ctx(vec![], |ctx| sm.run_phase_sub(ctx, move |_| Box::new(Scripted::acting(3, &c))));
        assert_eq!(counters.cleanups(), 0);
        sm.fire(Trigger::Arrived).unwrap();
        assert_eq!(counters.cleanups(), 1);
    }
}

// ── Contention ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod contention_tests {
    use act_world::{Facility, FacilityId, FacilityKind};

    use super::*;
    use crate::{MoveRequest, MoveResponse};

    struct Worker {
        core:     ActivityCore,
        facility: FacilityId,
    }

    impl Activity for Worker {
        fn core(&self) -> &ActivityCore {
            &self.core
        }
        fn core_mut(&mut self) -> &mut ActivityCore {
            &mut self.core
        }
        fn display_name(&self) -> String {
            "Worker".into()
        }
        fn next_action(&mut self, _ctx: &mut ActivityContext<'_>) -> Option<Action> {
            Some(self.core.idle())
        }
        fn target_facility(&self) -> Option<FacilityId> {
            Some(self.facility)
        }
        fn alternative_goal_positions(&self, world: &World) -> Vec<GridPos> {
            world.facility(self.facility).map(|f| f.spare_spots.clone()).unwrap_or_default()
        }
    }

    fn request(facility: Option<FacilityId>) -> MoveRequest {
        MoveRequest {
            requester:       AgentId(1),
            from:            p(1, 0),
            to:              p(2, 0),
            target_room:     None,
            target_facility: facility,
        }
    }

    #[test]
    fn same_facility_queues_other_steps_aside_else_defers() {
        let mut h = Harness::new();
        let spare = p(2, 1);
        let f = h
            .world
            .add_facility(Facility::new(FacilityKind::new("loom"), p(2, 0), 4).with_spare_spots(vec![spare]))
            .unwrap();
        let other = h
            .world
            .add_facility(Facility::new(FacilityKind::new("oven"), p(5, 5), 4))
            .unwrap();
        let worker = Worker { core: ActivityCore::new("worker", 0), facility: f };

        assert_eq!(worker.handle_move_request(&request(Some(f)), &h.world), MoveResponse::Queue);
        assert_eq!(worker.handle_move_request(&request(Some(other)), &h.world), MoveResponse::StepAside(spare));

        h.world.agents.spawn(spare, 5).unwrap();
        assert_eq!(worker.handle_move_request(&request(None), &h.world), MoveResponse::Defer);
    }
}

// ── Actions ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod action_tests {
    use act_core::ReactionId;
    use act_world::{
        Container, Facility, FacilityKind, NeedKind, ReactionBook, ReactionDef, Skill, Storage,
    };

    use super::*;
    use crate::{ActionOutcome, Rejection};

    const GRAIN: ItemId = ItemId(1);
    const FLOUR: ItemId = ItemId(2);

    fn act(agent: AgentId, kind: ActionKind) -> Action {
        Action::new(agent, "test", 0, kind)
    }

    #[test]
    fn move_into_occupied_tile_is_blocked() {
        let mut h = Harness::new();
        let other = h.world.agents.spawn(p(1, 0), 5).unwrap();
        let out = act(h.agent, ActionKind::Move { to: p(1, 0) }).execute(&mut h.world);
        assert!(matches!(out, ActionOutcome::Rejected(Rejection::Blocked(by)) if by == other));
        assert_eq!(h.world.agents.position(h.agent), p(0, 0));

        assert!(act(h.agent, ActionKind::Move { to: p(0, 1) }).execute(&mut h.world).is_done());
        assert!(matches!(
            act(h.agent, ActionKind::Move { to: p(5, 5) }).execute(&mut h.world),
            ActionOutcome::Rejected(Rejection::NotAdjacent { .. })
        ));
    }

    #[test]
    fn take_and_put_move_items() {
        let mut h = Harness::new();
        let s = h
            .world
            .add_storage(Storage { contents: act_world::Inventory::new(20).with(GRAIN, 5), ..Storage::new("bin", p(1, 1), 20) })
            .unwrap();
        let bin = Container::Storage(s);

        assert!(act(h.agent, ActionKind::TakeItem { from: bin, item: GRAIN, qty: 3 }).execute(&mut h.world).is_done());
        assert_eq!(h.world.agents.inventory(h.agent).count(GRAIN), 3);
        assert_eq!(h.world.container(bin).unwrap().count(GRAIN), 2);

        // Too many: nothing changes.
        assert!(!act(h.agent, ActionKind::PutItem { to: bin, item: GRAIN, qty: 4 }).execute(&mut h.world).is_done());
        assert_eq!(h.world.agents.inventory(h.agent).count(GRAIN), 3);

        assert!(act(h.agent, ActionKind::PutItem { to: bin, item: GRAIN, qty: 3 }).execute(&mut h.world).is_done());
        assert_eq!(h.world.container(bin).unwrap().count(GRAIN), 5);
    }

    #[test]
    fn container_out_of_reach() {
        let mut h = Harness::new();
        let s = h.world.add_storage(Storage::new("far", p(8, 8), 20)).unwrap();
        let out = act(h.agent, ActionKind::TakeItem { from: Container::Storage(s), item: GRAIN, qty: 1 })
            .execute(&mut h.world);
        assert!(matches!(out, ActionOutcome::Rejected(Rejection::OutOfReach)));
    }

    #[test]
    fn produce_requires_work_spot() {
        let mut h = Harness::new();
        let f = h.world.add_facility(Facility::new(FacilityKind::new("field"), p(0, 0), 5)).unwrap();
        let far = h.world.add_facility(Facility::new(FacilityKind::new("field"), p(3, 3), 5)).unwrap();
        let produce = |facility| ActionKind::Produce { facility, item: GRAIN, qty: 1, skill: Skill::Farming, xp: 0.5 };

        assert!(act(h.agent, produce(f)).execute(&mut h.world).is_done());
        assert_eq!(h.world.facility(f).unwrap().output.count(GRAIN), 1);
        assert_eq!(h.world.agents.xp(h.agent, Skill::Farming), 0.5);
        assert!(matches!(
            act(h.agent, produce(far)).execute(&mut h.world),
            ActionOutcome::Rejected(Rejection::NotAtWorkSpot)
        ));
    }

    #[test]
    fn transform_runs_reaction() {
        let mut h = Harness::new();
        h.world.reactions = ReactionBook::new(vec![ReactionDef {
            id:                ReactionId(0),
            name:              "mill".into(),
            facility:          FacilityKind::new("mill"),
            inputs:            vec![(GRAIN, 2)],
            outputs:           vec![(FLOUR, 1)],
            duration_ticks:    10,
            energy_multiplier: 1.2,
        }])
        .unwrap();
        let mill = h.world.add_facility(Facility::new(FacilityKind::new("mill"), p(0, 0), 5)).unwrap();
        let transform = act(h.agent, ActionKind::Transform { facility: mill, reaction: ReactionId(0) });

        assert!(!transform.execute(&mut h.world).is_done());
        h.world.agents.inventories[h.agent.index()].add(GRAIN, 3).unwrap();
        assert!(transform.execute(&mut h.world).is_done());
        let inv = h.world.agents.inventory(h.agent);
        assert_eq!((inv.count(GRAIN), inv.count(FLOUR)), (1, 1));
        assert!(h.world.agents.xp(h.agent, Skill::Crafting) > 0.0);
    }

    #[test]
    fn consume_restores_need() {
        let mut h = Harness::new();
        h.world.agents.needs[h.agent.index()].get_mut(NeedKind::Hunger).value = 20.0;
        h.world.agents.inventories[h.agent.index()].add(FLOUR, 1).unwrap();
        let eat = act(h.agent, ActionKind::Consume { item: FLOUR, need: NeedKind::Hunger, restore: 30.0 });
        assert!(eat.execute(&mut h.world).is_done());
        assert_eq!(h.world.agents.needs(h.agent).get(NeedKind::Hunger).value, 50.0);
        assert!(!eat.execute(&mut h.world).is_done());
    }
}

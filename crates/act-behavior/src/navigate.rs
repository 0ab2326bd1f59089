//! Walking to a goal.

use act_core::GridPos;
use act_engine::{Action, ActionKind, Activity, ActivityContext, ActivityCore, Priority};
use act_world::{Goal, InterruptionReason, NavStep, Navigator};

/// Navigation tuning.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct NavigateConfig {
    /// Consecutive ticks without progress (no route, rejected move,
    /// unfinished search) before the walk fails.
    pub max_stuck_ticks: u32,
    /// Initial node-expansion budget per search.
    pub search_budget:   usize,
}

impl Default for NavigateConfig {
    fn default() -> Self {
        Self { max_stuck_ticks: 20, search_budget: 2_048 }
    }
}

/// Walk until `goal` is reached.
///
/// Fails on the `max_stuck_ticks`-th consecutive tick without progress.
/// Interruption or resumption drops the cached navigator: a route planned
/// before the agent was moved is not trusted afterwards.
pub struct Navigate {
    core:      ActivityCore,
    goal:      Goal,
    config:    NavigateConfig,
    navigator: Option<Navigator>,
}

impl Navigate {
    pub fn new(goal: Goal, priority: Priority, config: NavigateConfig) -> Self {
        Self {
            core: ActivityCore::new("navigate", priority),
            goal,
            config,
            navigator: None,
        }
    }

    pub fn to(pos: GridPos, priority: Priority, config: NavigateConfig) -> Self {
        Self::new(Goal::Exact(pos), priority, config)
    }

    pub fn next_to(pos: GridPos, priority: Priority, config: NavigateConfig) -> Self {
        Self::new(Goal::Adjacent(pos), priority, config)
    }

    /// Boxed for use as a phase sub-activity.
    pub fn boxed(goal: Goal, priority: Priority, config: &NavigateConfig) -> Box<dyn Activity> {
        Box::new(Self::new(goal, priority, config.clone()))
    }

    pub fn goal(&self) -> &Goal {
        &self.goal
    }

    pub fn stuck_ticks(&self) -> u32 {
        self.navigator.as_ref().map_or(0, Navigator::stuck_ticks)
    }
}

impl Activity for Navigate {
    fn core(&self) -> &ActivityCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ActivityCore {
        &mut self.core
    }

    fn display_name(&self) -> String {
        match &self.goal {
            Goal::Exact(p)    => format!("Walking to {p}"),
            Goal::Adjacent(p) => format!("Walking next to {p}"),
            Goal::AnyOf(ps)   => format!("Walking to one of {} spots", ps.len()),
        }
    }

    fn on_interrupted(&mut self, _reason: InterruptionReason) {
        self.navigator = None;
    }

    fn on_resume(&mut self) {
        self.navigator = None;
    }

    fn next_action(&mut self, ctx: &mut ActivityContext<'_>) -> Option<Action> {
        let (goal, cfg) = (&self.goal, &self.config);
        let nav = self
            .navigator
            .get_or_insert_with(|| Navigator::new(goal.clone(), cfg.max_stuck_ticks, cfg.search_budget));

        let step = nav.advance(ctx.position, &ctx.world.map, ctx.pathfinder);
        if step == NavStep::Arrived {
            self.core.complete();
            return None;
        }
        if nav.is_stuck() {
            let stuck = nav.stuck_ticks();
            self.core.fail(format!("no progress towards {:?} for {stuck} ticks", self.goal));
            return None;
        }
        match step {
            NavStep::Step(to) => Some(self.core.action(ActionKind::Move { to })),
            _ => Some(self.core.idle()),
        }
    }
}

//! Eating (or otherwise consuming an item to restore a need).
//!
//! Not a state machine: three stages held in a plain enum, with the walk to
//! the pantry driven through the runner like any other sub-activity.
//!
//! Food already carried is eaten on the spot.  Otherwise the agent picks
//! the nearest storage it *knows* holds food (perception is folded into
//! memory every tick) and walks there.  A source that turns out to be gone
//! or empty is forgotten and the next one is tried, up to `max_attempts`
//! times.  No known food at all fails the activity.

use act_core::{AgentId, GridPos, ItemId};
use act_engine::{
    Action, ActionKind, Activity, ActivityContext, ActivityCore, Priority, SubActivityResult,
    run_sub_activity,
};
use act_world::{Container, InterruptionReason, NeedKind, StorageId, World};
use tracing::debug;

use crate::{Navigate, NavigateConfig};

/// Upper bound on stage changes evaluated in one poll.
const MAX_STEPS_PER_TICK: usize = 8;

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ConsumeConfig {
    pub need:         NeedKind,
    /// Acceptable items and how much each restores, in preference order.
    pub foods:        Vec<(ItemId, f32)>,
    pub max_attempts: u32,
    pub navigate:     NavigateConfig,
}

impl Default for ConsumeConfig {
    fn default() -> Self {
        Self {
            need:         NeedKind::Hunger,
            foods:        Vec::new(),
            max_attempts: 3,
            navigate:     NavigateConfig::default(),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Stage {
    Choose,
    Fetch(StorageId),
    Eat,
    Done,
}

pub struct Consume {
    core:     ActivityCore,
    config:   ConsumeConfig,
    stage:    Stage,
    walk:     Option<Box<dyn Activity>>,
    attempts: u32,
}

impl Consume {
    pub fn new(config: ConsumeConfig, priority: Priority) -> Self {
        Self {
            core: ActivityCore::new("consume", priority),
            config,
            stage: Stage::Choose,
            walk: None,
            attempts: 0,
        }
    }

    fn carried_food(&self, world: &World, agent: AgentId) -> Option<(ItemId, f32)> {
        let inventory = world.agents.inventory(agent);
        self.config.foods.iter().copied().find(|&(item, _)| inventory.count(item) > 0)
    }

    /// Nearest live storage remembered to hold any acceptable food.
    fn find_source(&self, ctx: &mut ActivityContext<'_>) -> Option<StorageId> {
        let mut best: Option<(u32, StorageId)> = None;
        for &(item, _) in &self.config.foods {
            for id in ctx.memory.known_sources(item, ctx.tick) {
                let Ok(storage) = ctx.world.storage(id) else {
                    ctx.memory.forget(id);
                    continue;
                };
                let d = storage.pos.chebyshev(ctx.position);
                if best.is_none_or(|(bd, bid)| (d, id) < (bd, bid)) {
                    best = Some((d, id));
                }
            }
        }
        best.map(|(_, id)| id)
    }

    /// Give up on the current source and choose again.
    fn retry(&mut self, reason: &str) {
        self.attempts += 1;
        self.clear_walk();
        debug!(agent = %self.core.owner(), attempt = self.attempts, reason, "food source rejected");
        if self.attempts > self.config.max_attempts {
            self.core.fail(format!("gave up looking for food: {reason}"));
        }
        self.stage = Stage::Choose;
    }

    fn clear_walk(&mut self) {
        if let Some(mut walk) = self.walk.take() {
            walk.cleanup();
        }
    }

    fn walk_to(&mut self, pos: GridPos, ctx: &mut ActivityContext<'_>) -> SubActivityResult {
        let owner = self.core.owner();
        let (priority, cfg) = (self.core.priority(), self.config.navigate.clone());
        let walk = self.walk.get_or_insert_with(|| {
            let mut walk: Box<dyn Activity> = Box::new(Navigate::next_to(pos, priority, cfg));
            walk.initialize(owner, ctx.world);
            walk
        });
        run_sub_activity(walk.as_mut(), ctx, &self.core)
    }
}

impl Activity for Consume {
    fn core(&self) -> &ActivityCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ActivityCore {
        &mut self.core
    }

    fn display_name(&self) -> String {
        match self.stage {
            Stage::Choose   => format!("Looking for something to restore {}", self.config.need),
            Stage::Fetch(s) => format!("Fetching food from storage {s}"),
            Stage::Eat | Stage::Done => "Eating".into(),
        }
    }

    fn on_interrupted(&mut self, _reason: InterruptionReason) {
        self.clear_walk();
    }

    fn on_resume(&mut self) {
        self.clear_walk();
    }

    fn cleanup(&mut self) {
        self.clear_walk();
    }

    fn next_action(&mut self, ctx: &mut ActivityContext<'_>) -> Option<Action> {
        ctx.remember_visible_storages();
        let world = ctx.world;

        for _ in 0..MAX_STEPS_PER_TICK {
            if !self.core.is_running() {
                return None;
            }
            match self.stage {
                Stage::Choose => {
                    if self.carried_food(world, ctx.agent).is_some() {
                        self.stage = Stage::Eat;
                        continue;
                    }
                    match self.find_source(ctx) {
                        Some(storage) => self.stage = Stage::Fetch(storage),
                        None => {
                            self.core.fail("no known food");
                            return None;
                        }
                    }
                }

                Stage::Fetch(storage) => {
                    let Ok(site) = world.storage(storage) else {
                        ctx.memory.forget(storage);
                        self.retry("storage no longer exists");
                        continue;
                    };
                    let container = Container::Storage(storage);
                    if world.can_reach(ctx.position, container) {
                        self.clear_walk();
                        let food = self
                            .config
                            .foods
                            .iter()
                            .find(|&&(item, _)| site.contents.count(item) > 0)
                            .map(|&(item, _)| item);
                        let Some(item) = food else {
                            ctx.memory.observe_storage(storage, &site.contents, ctx.tick);
                            self.retry("storage has no food");
                            continue;
                        };
                        self.stage = Stage::Eat;
                        return Some(self.core.action(ActionKind::TakeItem { from: container, item, qty: 1 }));
                    }
                    let pos = site.pos;
                    match self.walk_to(pos, ctx) {
                        SubActivityResult::Continue(action) => return Some(action),
                        SubActivityResult::Completed => self.clear_walk(),
                        SubActivityResult::Failed => {
                            self.core.fail("could not reach food");
                            return None;
                        }
                    }
                }

                Stage::Eat => match self.carried_food(world, ctx.agent) {
                    Some((item, restore)) => {
                        self.stage = Stage::Done;
                        let need = self.config.need;
                        return Some(self.core.action(ActionKind::Consume { item, need, restore }));
                    }
                    None => self.retry("food was taken before we got it"),
                },

                Stage::Done => {
                    self.core.complete();
                    return None;
                }
            }
        }
        Some(self.core.idle())
    }
}

//! A distribution round: take the granary's surplus round the households,
//! even out their stocks, bring back what is left.
//!
//! ```text
//!  GoingToGranary ─Arrived─▶ CheckingGranary ─HasSurplus─▶ CollectingSurplus
//!                                  │                              │
//!                              NoSurplus                      Collected
//!                                  ▼                              ▼
//!  ReturningToGranary ◀─RoundDone─ GoingToHousehold ◀─────────────┘
//!        │                       ▲    │
//!     Arrived          NextHousehold  Arrived
//!        ▼                       │    ▼
//!  DepositingRemainder     CheckingHousehold ─NeedsExchange─▶ ExchangingItems
//! ```
//!
//! Zones:
//!
//! | Phases                                | Re-entry            |
//! |---------------------------------------|---------------------|
//! | `CheckingGranary`, `CollectingSurplus`| `CheckingGranary`   |
//! | `CheckingHousehold`, `ExchangingItems`| `CheckingHousehold` |
//! | `DepositingRemainder`                 | `ReturningToGranary`|
//!
//! The three `Going*`/`Returning*` phases are navigation phases.  Checking
//! phases fire `Travel` back to their navigation phase when the agent is
//! not next to the container (it was pushed away, or resumed elsewhere).
//!
//! Skips:
//! - no surplus in the granary → straight to the households.
//! - a household that is balanced, perceived now or remembered → skipped.
//! - a household that no longer exists → skipped.
//! - the granary no longer exists → fail.

use act_core::{GridPos, ItemId};
use act_engine::{
    Action, ActionKind, Activity, ActivityContext, ActivityCore, MachineBuilder, Priority,
    StateMachine, StatefulActivity, SubActivityResult,
};
use act_world::{Container, Goal, InterruptionReason, StorageId};
use tracing::debug;

use crate::{BehaviorError, BehaviorResult, Navigate, NavigateConfig};

const MAX_STEPS_PER_TICK: usize = 12;

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DistributionConfig {
    pub item:             ItemId,
    /// Stock each household should end up holding.
    pub household_target: u32,
    /// Stock the granary keeps back; anything above is surplus.
    pub granary_reserve:  u32,
    pub navigate:         NavigateConfig,
}

impl Default for DistributionConfig {
    fn default() -> Self {
        Self {
            item:             ItemId(0),
            household_target: 5,
            granary_reserve:  20,
            navigate:         NavigateConfig::default(),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RoundPhase {
    GoingToGranary,
    CheckingGranary,
    CollectingSurplus,
    GoingToHousehold,
    CheckingHousehold,
    ExchangingItems,
    ReturningToGranary,
    DepositingRemainder,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RoundTrigger {
    Arrived,
    Travel,
    HasSurplus,
    NoSurplus,
    Collected,
    NeedsExchange,
    NextHousehold,
    RoundDone,
    Interrupted,
    Resumed,
}

fn machine() -> BehaviorResult<StateMachine<RoundPhase, RoundTrigger>> {
    use RoundPhase::*;
    use RoundTrigger::*;
    Ok(MachineBuilder::new(GoingToGranary, Interrupted, Resumed)
        .navigation(GoingToGranary)
        .navigation(GoingToHousehold)
        .navigation(ReturningToGranary)
        .permit(GoingToGranary, Arrived, CheckingGranary)
        .permit(CheckingGranary, Travel, GoingToGranary)
        .permit(CheckingGranary, HasSurplus, CollectingSurplus)
        .permit(CheckingGranary, NoSurplus, GoingToHousehold)
        .permit(CollectingSurplus, Collected, GoingToHousehold)
        .permit(GoingToHousehold, Arrived, CheckingHousehold)
        .permit(GoingToHousehold, RoundDone, ReturningToGranary)
        .permit(CheckingHousehold, Travel, GoingToHousehold)
        .permit(CheckingHousehold, NextHousehold, GoingToHousehold)
        .permit(CheckingHousehold, NeedsExchange, ExchangingItems)
        .permit(ExchangingItems, NextHousehold, GoingToHousehold)
        .permit(ReturningToGranary, Arrived, DepositingRemainder)
        .permit(DepositingRemainder, Travel, ReturningToGranary)
        .zone(&[CheckingGranary, CollectingSurplus], CheckingGranary)
        .zone(&[CheckingHousehold, ExchangingItems], CheckingHousehold)
        .zone(&[DepositingRemainder], ReturningToGranary)
        .build()?)
}

enum Flow {
    Act(Action),
    Stop,
    Again,
}

pub struct DistributionRound {
    sm:         StatefulActivity<RoundPhase, RoundTrigger>,
    granary:    StorageId,
    households: Vec<StorageId>,
    config:     DistributionConfig,
    /// Index into `households` of the one being visited.
    current:    usize,
}

impl DistributionRound {
    pub fn new(
        granary:    StorageId,
        households: Vec<StorageId>,
        config:     DistributionConfig,
        priority:   Priority,
    ) -> BehaviorResult<Self> {
        if households.contains(&granary) {
            return Err(BehaviorError::Config("the granary cannot also be a household".into()));
        }
        Ok(Self {
            sm: StatefulActivity::new(ActivityCore::new("distribution", priority), machine()?),
            granary,
            households,
            config,
            current: 0,
        })
    }

    pub fn phase(&self) -> RoundPhase {
        self.sm.phase()
    }

    /// The household being visited, `None` once all have been.
    pub fn current_household(&self) -> Option<StorageId> {
        self.households.get(self.current).copied()
    }

    /// Whether a household holding `stock` has anything to exchange with an
    /// agent carrying `carried`.
    fn needs_exchange(&self, stock: u32, carried: u32) -> bool {
        let target = self.config.household_target;
        stock > target || (stock < target && carried > 0)
    }

    fn walk(&mut self, ctx: &mut ActivityContext<'_>, pos: GridPos) -> Flow {
        let (priority, cfg) = (self.sm.core.priority(), &self.config.navigate);
        match self.sm.run_phase_sub(ctx, |_| Navigate::boxed(Goal::Adjacent(pos), priority, cfg)) {
            SubActivityResult::Continue(action) => Flow::Act(action),
            SubActivityResult::Completed => {
                self.sm.advance(RoundTrigger::Arrived);
                Flow::Again
            }
            SubActivityResult::Failed => {
                self.sm.core.fail(format!("could not reach {pos}"));
                Flow::Stop
            }
        }
    }

    fn carried(&self, ctx: &ActivityContext<'_>) -> u32 {
        ctx.world.agents.inventory(ctx.agent).count(self.config.item)
    }

    // ── Granary ──────────────────────────────────────────────────────────────

    fn checking_granary(&mut self, ctx: &mut ActivityContext<'_>) -> Flow {
        let world = ctx.world;
        let container = Container::Storage(self.granary);
        if !world.can_reach(ctx.position, container) {
            self.sm.advance(RoundTrigger::Travel);
            return Flow::Again;
        }
        let Ok(granary) = world.storage(self.granary) else {
            return Flow::Stop;
        };
        ctx.memory.observe_storage(self.granary, &granary.contents, ctx.tick);
        let surplus = granary.contents.count(self.config.item).saturating_sub(self.config.granary_reserve);
        let room = world.agents.inventory(ctx.agent).free_space();
        if surplus > 0 && room > 0 {
            self.sm.advance(RoundTrigger::HasSurplus);
        } else {
            debug!(agent = %ctx.agent, surplus, room, "nothing to collect");
            self.sm.advance(RoundTrigger::NoSurplus);
        }
        Flow::Again
    }

    fn collecting(&mut self, ctx: &mut ActivityContext<'_>) -> Flow {
        let world = ctx.world;
        let container = Container::Storage(self.granary);
        let stock = world.container(container).map_or(0, |inv| inv.count(self.config.item));
        let surplus = stock.saturating_sub(self.config.granary_reserve);
        let qty = surplus.min(world.agents.inventory(ctx.agent).free_space());
        if qty == 0 {
            self.sm.advance(RoundTrigger::Collected);
            return Flow::Again;
        }
        Flow::Act(self.sm.core.action(ActionKind::TakeItem { from: container, item: self.config.item, qty }))
    }

    // ── Households ───────────────────────────────────────────────────────────

    /// Best knowledge of a household's stock: what is seen now, else what
    /// is remembered, else unknown.
    fn known_stock(&self, ctx: &ActivityContext<'_>, household: StorageId) -> Option<u32> {
        let item = self.config.item;
        ctx.perception
            .storage(household)
            .map(|seen| seen.contents.count(item))
            .or_else(|| ctx.memory.recall_storage_contents(household, ctx.tick).map(|inv| inv.count(item)))
    }

    fn going_to_household(&mut self, ctx: &mut ActivityContext<'_>) -> Flow {
        let carried = self.carried(ctx);
        let before = self.current;
        let target = loop {
            let Some(&household) = self.households.get(self.current) else {
                break None;
            };
            let Ok(site) = ctx.world.storage(household) else {
                debug!(agent = %ctx.agent, %household, "household gone, skipping");
                self.current += 1;
                continue;
            };
            match self.known_stock(ctx, household) {
                Some(stock) if !self.needs_exchange(stock, carried) => {
                    debug!(agent = %ctx.agent, %household, stock, "household balanced, skipping");
                    self.current += 1;
                }
                _ => break Some(site.pos),
            }
        };
        if self.current != before {
            // The walk in progress was for a household that is now skipped.
            self.sm.clear_sub();
        }
        match target {
            Some(pos) => self.walk(ctx, pos),
            None => {
                self.sm.advance(RoundTrigger::RoundDone);
                Flow::Again
            }
        }
    }

    fn checking_household(&mut self, ctx: &mut ActivityContext<'_>) -> Flow {
        let world = ctx.world;
        let Some(household) = self.current_household() else {
            self.sm.advance(RoundTrigger::NextHousehold);
            return Flow::Again;
        };
        let Ok(site) = world.storage(household) else {
            self.current += 1;
            self.sm.advance(RoundTrigger::NextHousehold);
            return Flow::Again;
        };
        if !world.can_reach(ctx.position, Container::Storage(household)) {
            self.sm.advance(RoundTrigger::Travel);
            return Flow::Again;
        }
        ctx.memory.observe_storage(household, &site.contents, ctx.tick);
        if self.needs_exchange(site.contents.count(self.config.item), self.carried(ctx)) {
            self.sm.advance(RoundTrigger::NeedsExchange);
        } else {
            self.current += 1;
            self.sm.advance(RoundTrigger::NextHousehold);
        }
        Flow::Again
    }

    fn exchanging(&mut self, ctx: &mut ActivityContext<'_>) -> Flow {
        let world = ctx.world;
        let item = self.config.item;
        let target = self.config.household_target;
        let Some(household) = self.current_household() else {
            self.sm.advance(RoundTrigger::NextHousehold);
            return Flow::Again;
        };
        let container = Container::Storage(household);
        let Ok(stock) = world.container(container) else {
            self.current += 1;
            self.sm.advance(RoundTrigger::NextHousehold);
            return Flow::Again;
        };
        let have = stock.count(item);
        let agent_inv = world.agents.inventory(ctx.agent);
        let carried = agent_inv.count(item);

        let action = if have > target && agent_inv.free_space() > 0 {
            let qty = (have - target).min(agent_inv.free_space());
            Some(ActionKind::TakeItem { from: container, item, qty })
        } else if have < target && carried > 0 && stock.free_space() > 0 {
            let qty = (target - have).min(carried).min(stock.free_space());
            Some(ActionKind::PutItem { to: container, item, qty })
        } else {
            None
        };
        match action {
            Some(kind) => Flow::Act(self.sm.core.action(kind)),
            None => {
                self.current += 1;
                self.sm.advance(RoundTrigger::NextHousehold);
                Flow::Again
            }
        }
    }

    // ── Return ───────────────────────────────────────────────────────────────

    fn depositing(&mut self, ctx: &mut ActivityContext<'_>) -> Flow {
        let world = ctx.world;
        let carried = self.carried(ctx);
        if carried == 0 {
            self.sm.core.complete();
            return Flow::Stop;
        }
        let container = Container::Storage(self.granary);
        if !world.can_reach(ctx.position, container) {
            self.sm.advance(RoundTrigger::Travel);
            return Flow::Again;
        }
        let free = world.container(container).map_or(0, |inv| inv.free_space());
        if free == 0 {
            self.sm.core.fail("granary is full");
            return Flow::Stop;
        }
        let qty = carried.min(free);
        Flow::Act(self.sm.core.action(ActionKind::PutItem { to: container, item: self.config.item, qty }))
    }
}

impl Activity for DistributionRound {
    fn core(&self) -> &ActivityCore {
        &self.sm.core
    }

    fn core_mut(&mut self) -> &mut ActivityCore {
        &mut self.sm.core
    }

    fn display_name(&self) -> String {
        format!(
            "Distribution round ({:?}, household {}/{})",
            self.sm.phase(),
            self.current.min(self.households.len()),
            self.households.len()
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

    fn next_action(&mut self, ctx: &mut ActivityContext<'_>) -> Option<Action> {
        let Ok(granary) = ctx.world.storage(self.granary) else {
            self.sm.core.fail(format!("granary {} no longer exists", self.granary));
            return None;
        };
        let granary_pos = granary.pos;

        for _ in 0..MAX_STEPS_PER_TICK {
            if !self.sm.core.is_running() {
                return None;
            }
            let flow = match self.sm.phase() {
                RoundPhase::GoingToGranary | RoundPhase::ReturningToGranary => self.walk(ctx, granary_pos),
                RoundPhase::CheckingGranary     => self.checking_granary(ctx),
                RoundPhase::CollectingSurplus   => self.collecting(ctx),
                RoundPhase::GoingToHousehold    => self.going_to_household(ctx),
                RoundPhase::CheckingHousehold   => self.checking_household(ctx),
                RoundPhase::ExchangingItems     => self.exchanging(ctx),
                RoundPhase::DepositingRemainder => self.depositing(ctx),
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

//! The `Sim` struct and its tick loop.

use std::sync::mpsc;

use act_core::{AgentId, GridPos, SimConfig, Tick};
use act_engine::{
    Action, ActionKind, ActionOutcome, Activity, ActivityContext, FinishedActivity, MoveRequest,
    MoveResponse, Rejection,
};
use act_world::{InterruptionReason, NeedKind, Pathfinder, PerceptionEvent, World};
use tracing::{debug, info, warn};

use crate::{DecisionLayer, Mind, SimError, SimObserver, SimResult, TickStats};

// ── Decision-phase output ─────────────────────────────────────────────────────

/// What one agent's decision task sends back to the coordinator.
struct Proposal {
    agent:    AgentId,
    action:   Option<Action>,
    finished: Vec<FinishedActivity>,
    started:  bool,
}

// ── Sim ───────────────────────────────────────────────────────────────────────

/// The main simulation runner.
///
/// `Sim<D, P>` owns the world and one [`Mind`] per agent and drives the
/// tick loop:
///
/// 1. **Claims**: every host's target facility and room is written into
///    `world.claims`, so this tick's perception sees last tick's intentions.
/// 2. **Decision phase** (optionally parallel with the `parallel` feature):
///    each agent perceives, gets an activity from the [`DecisionLayer`] if
///    it has none, and polls its host once.  Proposals go through an mpsc
///    channel.
/// 3. **Apply phase** (sequential, ascending `AgentId`): actions are
///    executed against the world.  A move blocked by another agent asks the
///    occupant's activity how to resolve it.
/// 4. **Needs decay**, scaled by each agent's active activity.
///
/// Create via [`SimBuilder`][crate::SimBuilder].
pub struct Sim<D: DecisionLayer, P: Pathfinder> {
    pub config: SimConfig,

    /// World state.  Only mutated by the apply phase and between ticks.
    pub world: World,

    /// Per-agent hosts, memories, RNGs and pending events, indexed by
    /// `AgentId`.
    pub minds: Vec<Mind>,

    /// Picks activities for idle agents.
    pub decisions: D,

    pub pathfinder: P,

    #[cfg(feature = "parallel")]
    pub(crate) pool: Option<rayon::ThreadPool>,
}

impl<D: DecisionLayer, P: Pathfinder> Sim<D, P> {
    // ── Public API ────────────────────────────────────────────────────────

    /// Run the simulation from the current tick to `config.end_tick()`.
    ///
    /// Use [`NoopObserver`][crate::NoopObserver] if you don't need callbacks.
    pub fn run<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<()> {
        while self.now() < self.config.end_tick() {
            self.step(observer)?;
        }
        observer.on_sim_end(self.now(), &self.world);
        Ok(())
    }

    /// Run exactly `n` ticks from the current position (ignores `end_tick`).
    pub fn run_ticks<O: SimObserver>(&mut self, n: u64, observer: &mut O) -> SimResult<()> {
        for _ in 0..n {
            self.step(observer)?;
        }
        Ok(())
    }

    /// Process one tick and advance the clock.
    pub fn step<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<TickStats> {
        let now = self.now();
        observer.on_tick_start(now);
        let stats = self.process_tick(now, observer)?;
        observer.on_tick_end(now, &stats);
        self.world.clock.advance();
        Ok(stats)
    }

    #[inline]
    pub fn now(&self) -> Tick {
        self.world.now()
    }

    pub fn mind(&self, agent: AgentId) -> SimResult<&Mind> {
        self.minds.get(agent.index()).ok_or(SimError::UnknownAgent(agent))
    }

    fn mind_mut(&mut self, agent: AgentId) -> SimResult<&mut Mind> {
        self.minds.get_mut(agent.index()).ok_or(SimError::UnknownAgent(agent))
    }

    // ── External control ──────────────────────────────────────────────────
    //
    // Everything here reaches the agent's activity as a perception event on
    // the next tick.

    /// Impose `activity` on `agent` as a command.
    ///
    /// The regular activity, if any, is interrupted and stays suspended
    /// until the command ends.  Returns the command this one replaced.
    pub fn command(&mut self, agent: AgentId, activity: Box<dyn Activity>) -> SimResult<Option<FinishedActivity>> {
        let world = &self.world;
        let mind = self.minds.get_mut(agent.index()).ok_or(SimError::UnknownAgent(agent))?;
        if mind.host.current().is_some() && !mind.host.has_command() {
            mind.push_event(PerceptionEvent::Interrupted(InterruptionReason::Command));
            mind.push_event(PerceptionEvent::CommandAssigned);
        }
        Ok(mind.host.command(activity, world))
    }

    /// End the agent's command from outside and let the suspended activity
    /// resume.
    pub fn complete_command(&mut self, agent: AgentId) -> SimResult<Option<FinishedActivity>> {
        let mind = self.mind_mut(agent)?;
        let done = mind.host.cancel_command();
        if done.is_some() {
            release_suspended(mind);
        }
        Ok(done)
    }

    /// Drop the agent's command and regular activity.  The decision layer
    /// picks a new one next tick.
    pub fn cancel(&mut self, agent: AgentId) -> SimResult<Vec<FinishedActivity>> {
        let mind = self.mind_mut(agent)?;
        Ok(mind.host.cancel_command().into_iter().chain(mind.host.cancel()).collect())
    }

    /// Interrupt the agent's active activity next tick.  It stays parked,
    /// and the decision layer is not consulted for this agent, until a
    /// matching [`resume`](Self::resume) arrives.
    pub fn interrupt(&mut self, agent: AgentId, reason: InterruptionReason) -> SimResult<()> {
        self.mind_mut(agent)?.push_event(PerceptionEvent::Interrupted(reason));
        Ok(())
    }

    pub fn resume(&mut self, agent: AgentId) -> SimResult<()> {
        self.mind_mut(agent)?.push_event(PerceptionEvent::Resumed);
        Ok(())
    }

    // ── Core tick processing ──────────────────────────────────────────────

    fn process_tick<O: SimObserver>(&mut self, now: Tick, observer: &mut O) -> SimResult<TickStats> {
        let mut stats = TickStats::default();

        // ── Phase 1: claim snapshot ───────────────────────────────────────
        self.world.claims.clear();
        for mind in &self.minds {
            if let Some(facility) = mind.host.target_facility() {
                self.world.claims.claim_facility(facility, mind.agent());
            }
            if let Some(room) = mind.host.target_room() {
                self.world.claims.claim_room(room, mind.agent());
            }
        }

        // ── Phase 2: decision phase ───────────────────────────────────────
        let mut proposals = self.collect_proposals();
        proposals.sort_unstable_by_key(|p| p.agent);

        // ── Phase 3: apply phase ──────────────────────────────────────────
        //
        // Ascending AgentId order makes the result independent of how the
        // decision phase was scheduled.
        for Proposal { agent, action, finished, started } in proposals {
            if started {
                stats.started += 1;
            }
            for done in finished {
                self.on_finished(&done);
                observer.on_activity_finished(now, &done);
                stats.finished += 1;
            }
            let Some(action) = action else { continue };

            let outcome = match (action.execute(&mut self.world), &action.kind) {
                (ActionOutcome::Rejected(Rejection::Blocked(occupant)), ActionKind::Move { to }) => {
                    self.resolve_contention(agent, occupant, *to, &mut stats)?
                }
                (outcome, _) => outcome,
            };
            match &outcome {
                ActionOutcome::Done        => stats.done += 1,
                ActionOutcome::Rejected(r) => {
                    debug!(agent = %agent, action = action.kind.label(), reason = %r, "action rejected");
                    stats.rejected += 1;
                }
            }
            observer.on_action(now, &action, &outcome);
        }

        // ── Phase 4: needs decay ──────────────────────────────────────────
        for mind in &self.minds {
            let agent = mind.agent();
            if !self.world.agents.contains(agent) {
                continue;
            }
            let needs = &mut self.world.agents.needs[agent.index()];
            for kind in NeedKind::ALL {
                needs.get_mut(kind).decay(mind.host.need_decay_multiplier(kind));
            }
        }

        Ok(stats)
    }

    /// Run every agent's decision task and drain the proposals.
    fn collect_proposals(&mut self) -> Vec<Proposal> {
        // Explicit field borrows so the borrow checker sees disjoint access.
        let world      = &self.world;
        let decisions  = &self.decisions;
        let pathfinder = &self.pathfinder;
        let radius     = self.config.perception_radius;
        let minds      = &mut self.minds;

        let (tx, rx) = mpsc::channel::<Proposal>();

        #[cfg(not(feature = "parallel"))]
        {
            for mind in minds.iter_mut() {
                // The receiver outlives every sender.
                let _ = tx.send(decide(mind, world, decisions, pathfinder, radius));
            }
            drop(tx);
        }

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;

            let work = move || {
                minds.par_iter_mut().for_each_with(tx, |tx, mind| {
                    let _ = tx.send(decide(mind, world, decisions, pathfinder, radius));
                });
            };
            match &self.pool {
                Some(pool) => pool.install(work),
                None       => work(),
            }
        }

        rx.into_iter().collect()
    }

    fn on_finished(&mut self, done: &FinishedActivity) {
        info!(
            agent    = %done.agent,
            activity = %done.name,
            state    = ?done.state,
            failure  = done.failure.as_deref().unwrap_or(""),
            "activity finished",
        );
        if done.command {
            if let Some(mind) = self.minds.get_mut(done.agent.index()) {
                release_suspended(mind);
            }
        }
    }

    /// `mover` tried to step onto `to`, where `occupant` stands.
    fn resolve_contention(
        &mut self,
        mover:    AgentId,
        occupant: AgentId,
        to:       GridPos,
        stats:    &mut TickStats,
    ) -> SimResult<ActionOutcome> {
        let (Some(mover_mind), Some(occupant_mind)) =
            (self.minds.get(mover.index()), self.minds.get(occupant.index()))
        else {
            return Ok(ActionOutcome::Rejected(Rejection::Blocked(occupant)));
        };

        let response = if occupant_mind.host.is_interruptible() {
            let request = MoveRequest {
                requester:       mover,
                from:            self.world.agents.position(mover),
                to,
                target_room:     mover_mind.host.target_room(),
                target_facility: mover_mind.host.target_facility(),
            };
            occupant_mind.host.handle_move_request(&request, &self.world)
        } else {
            MoveResponse::Queue
        };

        match response {
            MoveResponse::StepAside(spot) if self.world.is_free(spot) => {
                self.world.agents.move_agent(occupant, spot)?;
                self.world.agents.move_agent(mover, to)?;
                debug!(mover = %mover, occupant = %occupant, spot = %spot, "occupant stepped aside");
            }
            MoveResponse::Defer => {
                warn!(mover = %mover, occupant = %occupant, "contention deferred, swapping places");
                self.world.agents.swap(mover, occupant)?;
            }
            MoveResponse::Queue | MoveResponse::StepAside(_) => {
                stats.queued += 1;
                return Ok(ActionOutcome::Rejected(Rejection::Blocked(occupant)));
            }
        }

        let pushed = &mut self.minds[occupant.index()];
        pushed.push_event(PerceptionEvent::PushedBy(mover));
        pushed.push_event(PerceptionEvent::Interrupted(InterruptionReason::Pushed));
        pushed.push_event_later(PerceptionEvent::Resumed);
        stats.pushed += 1;
        Ok(ActionOutcome::Done)
    }
}

/// A command left the host: the suspended activity hears about it next tick.
fn release_suspended(mind: &mut Mind) {
    if mind.host.current().is_some() && !mind.host.has_command() {
        mind.push_event(PerceptionEvent::CommandCompleted);
        mind.push_event(PerceptionEvent::Resumed);
    }
}

/// One agent's decision task.  Reads the world, mutates only `mind`.
fn decide<D: DecisionLayer>(
    mind:       &mut Mind,
    world:      &World,
    decisions:  &D,
    pathfinder: &dyn Pathfinder,
    radius:     u32,
) -> Proposal {
    let agent = mind.agent();
    let mut finished = Vec::new();
    if !world.agents.contains(agent) {
        return Proposal { agent, action: None, finished, started: false };
    }

    let perception = world.perceive(agent, radius, mind.take_events());

    let mut started = false;
    if mind.host.is_idle() {
        if let Some(activity) = decisions.choose(agent, world, &perception, &mut mind.rng) {
            finished.extend(mind.host.start(activity, world));
            started = true;
        }
    }

    mind.memory.forget_expired(perception.tick);
    let mut ctx = ActivityContext::new(&perception, world, &mut mind.memory, &mut mind.rng, pathfinder);
    ctx.remember_visible_storages();
    let outcome = mind.host.poll(&mut ctx);
    finished.extend(outcome.finished);

    Proposal { agent, action: outcome.action, finished, started }
}

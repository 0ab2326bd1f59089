//! State-machine specialisation of an activity.
//!
//! `StatefulActivity` is the part of a multi-phase behavior that is the
//! same for every behavior: the core, the machine, and the single
//! sub-activity slot.  A concrete behavior embeds one, implements
//! [`Activity`] by delegating `core`/`core_mut` to it, routes
//! `on_interrupted`/`on_resume` to [`interrupt`][StatefulActivity::interrupt]
//! and [`resume`][StatefulActivity::resume], and writes one handler per
//! phase.

use act_world::InterruptionReason;
use tracing::{debug, warn};

use crate::{
    Activity, ActivityContext, ActivityCore, EngineResult, MachineLabel, StateMachine,
    SubActivityResult, run_sub_activity,
};

pub struct StatefulActivity<P, T> {
    pub core: ActivityCore,
    machine:  StateMachine<P, T>,
    sub:      Option<Box<dyn Activity>>,
}

impl<P: MachineLabel, T: MachineLabel> StatefulActivity<P, T> {
    pub fn new(core: ActivityCore, machine: StateMachine<P, T>) -> Self {
        Self { core, machine, sub: None }
    }

    #[inline]
    pub fn phase(&self) -> P {
        self.machine.phase()
    }

    #[inline]
    pub fn can_fire(&self, trigger: T) -> bool {
        self.machine.can_fire(trigger)
    }

    /// Take a transition.  The sub-activity slot is emptied on every
    /// transition, including self-transitions.
    pub fn fire(&mut self, trigger: T) -> EngineResult<()> {
        let from = self.machine.phase();
        let to = self.machine.fire(trigger)?;
        self.clear_sub();
        debug!(
            agent = %self.core.owner(),
            activity = self.core.issuer(),
            ?from,
            ?trigger,
            ?to,
            "phase transition"
        );
        Ok(())
    }

    /// Fire `trigger`, failing the activity if the definition has no such
    /// transition.  Phase handlers use this after they have decided a
    /// transition is due; a missing edge is a definition bug, and failing
    /// keeps the agent live instead of stalling.
    pub fn advance(&mut self, trigger: T) {
        if let Err(e) = self.fire(trigger) {
            warn!(agent = %self.core.owner(), activity = self.core.issuer(), error = %e, "bad transition");
            self.core.fail(e.to_string());
        }
    }

    /// Apply the interrupted trigger if the current phase defines it.
    pub fn interrupt(&mut self, reason: InterruptionReason) {
        let trigger = self.machine.interrupted_trigger();
        if self.can_fire(trigger) {
            debug!(agent = %self.core.owner(), activity = self.core.issuer(), ?reason, "interrupted");
            self.advance(trigger);
        }
    }

    /// Apply the resumed trigger if the current phase defines it.
    /// Non-navigation phases normally do not.
    pub fn resume(&mut self) {
        let trigger = self.machine.resumed_trigger();
        if self.can_fire(trigger) {
            self.advance(trigger);
        }
    }

    #[inline]
    pub fn sub_is_empty(&self) -> bool {
        self.sub.is_none()
    }

    /// Drive this phase's sub-activity, creating it with `factory` if the
    /// slot is empty (first visit since the phase was entered).
    pub fn run_phase_sub<F>(&mut self, ctx: &mut ActivityContext<'_>, factory: F) -> SubActivityResult
    where
        F: FnOnce(&mut ActivityContext<'_>) -> Box<dyn Activity>,
    {
        let owner = self.core.owner();
        let issuer = self.core.issuer();
        let phase = self.machine.phase();
        let sub = self.sub.get_or_insert_with(|| {
            let mut sub = factory(ctx);
            sub.initialize(owner, ctx.world);
            debug!(agent = %owner, activity = issuer, ?phase, sub = %sub.display_name(), "sub-activity created");
            sub
        });
        run_sub_activity(sub.as_mut(), ctx, &self.core)
    }

    /// Name of the current sub-activity, if any.
    pub fn sub_display_name(&self) -> Option<String> {
        self.sub.as_ref().map(|s| s.display_name())
    }

    /// Drop the sub-activity, running its cleanup.
    pub fn clear_sub(&mut self) {
        if let Some(mut sub) = self.sub.take() {
            sub.cleanup();
        }
    }
}

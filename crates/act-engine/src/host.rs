//! Per-agent owner of the current activity.
//!
//! The host is what makes the lifecycle rules hold for every activity,
//! however it is written: a terminal activity is never polled again, its
//! cleanup runs exactly once, and an interrupted activity is not polled
//! until it is resumed.
//!
//! A host also holds at most one *command*: an activity imposed from
//! outside (a player order).  While a command runs, the regular activity is
//! suspended; it still receives events so it can regress its phase, but
//! it is not polled.  The command sees every event except the ones about
//! its own assignment and completion.
//!
//! Nothing here times out an interruption: whoever sends `Interrupted`
//! owes the activity a `Resumed`.

use std::borrow::Cow;

use act_core::AgentId;
use act_world::{FacilityId, InterruptionReason, NeedKind, Perception, PerceptionEvent, RoomId, World};
use tracing::{debug, info};

use crate::{Action, Activity, ActivityContext, Lifecycle, MoveRequest, MoveResponse, Priority};

/// Summary of an activity that left the host.
#[derive(Clone, Debug, PartialEq)]
pub struct FinishedActivity {
    pub agent:   AgentId,
    pub name:    String,
    pub issuer:  &'static str,
    /// `Running` when the activity was discarded before finishing.
    pub state:   Lifecycle,
    pub failure: Option<String>,
    pub command: bool,
}

/// Result of one [`ActivityHost::poll`].
#[derive(Debug, Default)]
pub struct PollOutcome {
    pub action:   Option<Action>,
    pub finished: Vec<FinishedActivity>,
}

pub struct ActivityHost {
    agent:   AgentId,
    current: Option<Box<dyn Activity>>,
    command: Option<Box<dyn Activity>>,
}

impl ActivityHost {
    pub fn new(agent: AgentId) -> Self {
        Self { agent, current: None, command: None }
    }

    #[inline]
    pub fn agent(&self) -> AgentId {
        self.agent
    }

    /// No regular activity and no command.
    pub fn is_idle(&self) -> bool {
        self.current.is_none() && self.command.is_none()
    }

    pub fn has_command(&self) -> bool {
        self.command.is_some()
    }

    /// The activity that is actually driving the agent.
    pub fn active(&self) -> Option<&dyn Activity> {
        self.command.as_deref().or(self.current.as_deref())
    }

    /// The regular (non-command) activity, suspended or not.
    pub fn current(&self) -> Option<&dyn Activity> {
        self.current.as_deref()
    }

    /// Start `activity`, discarding (and cleaning up) any previous one.
    pub fn start(&mut self, mut activity: Box<dyn Activity>, world: &World) -> Option<FinishedActivity> {
        let replaced = self.current.take().map(|old| self.retire(old, false));
        activity.initialize(self.agent, world);
        info!(agent = %self.agent, activity = %activity.display_name(), "activity started");
        self.current = Some(activity);
        replaced
    }

    /// Impose a command.  Any previous command is discarded.
    pub fn command(&mut self, mut activity: Box<dyn Activity>, world: &World) -> Option<FinishedActivity> {
        let replaced = self.command.take().map(|old| self.retire(old, true));
        activity.initialize(self.agent, world);
        info!(agent = %self.agent, activity = %activity.display_name(), "command assigned");
        self.command = Some(activity);
        replaced
    }

    /// Cancel the running command, if any.
    pub fn cancel_command(&mut self) -> Option<FinishedActivity> {
        self.command.take().map(|old| self.retire(old, true))
    }

    /// Discard the regular activity.
    pub fn cancel(&mut self) -> Option<FinishedActivity> {
        self.current.take().map(|old| self.retire(old, false))
    }

    /// Drive one tick.
    pub fn poll(&mut self, ctx: &mut ActivityContext<'_>) -> PollOutcome {
        let mut out = PollOutcome::default();

        if let Some(current) = self.current.as_mut() {
            current.process_events(ctx.perception);
            if current.state().is_terminal() {
                self.finish_current(&mut out);
            }
        }

        if let Some(command) = self.command.as_mut() {
            command.process_events(&command_view(ctx.perception));
            if !command.state().is_terminal() && !command.core().is_interrupted() {
                out.action = command.next_action(ctx);
            }
            if command.state().is_terminal() {
                if let Some(done) = self.command.take() {
                    out.finished.push(self.retire(done, true));
                }
            }
            return out;
        }

        if let Some(current) = self.current.as_mut() {
            if current.core().is_interrupted() {
                return out;
            }
            out.action = current.next_action(ctx);
            if current.state().is_terminal() {
                self.finish_current(&mut out);
            }
        }
        out
    }

    fn finish_current(&mut self, out: &mut PollOutcome) {
        if let Some(done) = self.current.take() {
            out.finished.push(self.retire(done, false));
        }
    }

    fn retire(&self, mut activity: Box<dyn Activity>, command: bool) -> FinishedActivity {
        activity.cleanup();
        let finished = FinishedActivity {
            agent:   self.agent,
            name:    activity.display_name(),
            issuer:  activity.core().issuer(),
            state:   activity.state(),
            failure: activity.core().failure().map(str::to_owned),
            command,
        };
        debug!(agent = %self.agent, activity = finished.issuer, state = ?finished.state, "activity retired");
        finished
    }

    // ── Queries other systems make about this agent ───────────────────────

    pub fn priority(&self) -> Option<Priority> {
        self.active().map(|a| a.priority())
    }

    pub fn need_decay_multiplier(&self, need: NeedKind) -> f32 {
        self.active().map_or(1.0, |a| a.need_decay_multiplier(need))
    }

    pub fn target_room(&self) -> Option<RoomId> {
        self.active().and_then(|a| a.target_room())
    }

    pub fn target_facility(&self) -> Option<FacilityId> {
        self.active().and_then(|a| a.target_facility())
    }

    pub fn is_interruptible(&self) -> bool {
        self.active().is_none_or(|a| a.is_interruptible())
    }

    /// Ask the active activity how to resolve `request`.  An idle agent
    /// defers.
    pub fn handle_move_request(&self, request: &MoveRequest, world: &World) -> MoveResponse {
        self.active()
            .map_or(MoveResponse::Defer, |a| a.handle_move_request(request, world))
    }
}

/// `perception` without the events that concern the command's own
/// assignment; those are addressed to the activity it suspends.
fn command_view(perception: &Perception) -> Cow<'_, Perception> {
    let addressed_to_suspended = |e: &PerceptionEvent| {
        matches!(
            e,
            PerceptionEvent::Interrupted(InterruptionReason::Command)
                | PerceptionEvent::CommandAssigned
                | PerceptionEvent::CommandCompleted
        )
    };
    if !perception.events.iter().any(addressed_to_suspended) {
        return Cow::Borrowed(perception);
    }
    let mut view = perception.clone();
    view.events.retain(|e| !addressed_to_suspended(e));
    Cow::Owned(view)
}

impl Drop for ActivityHost {
    fn drop(&mut self) {
        if let Some(mut a) = self.command.take() {
            a.cleanup();
        }
        if let Some(mut a) = self.current.take() {
            a.cleanup();
        }
    }
}

//! The `Activity` trait and the state every activity carries.

use act_core::{AgentId, GridPos};
use act_world::{FacilityId, InterruptionReason, NeedKind, Perception, PerceptionEvent, RoomId, World};
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::{Action, ActionKind, ActivityContext, Priority};

// ── Lifecycle ─────────────────────────────────────────────────────────────────

/// Running → Completed | Failed.  Never reversed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Lifecycle {
    Running,
    Completed,
    Failed,
}

impl Lifecycle {
    #[inline]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Lifecycle::Running)
    }
}

// ── ActivityCore ──────────────────────────────────────────────────────────────

/// Bookkeeping shared by every activity: lifecycle, owner, priority,
/// provenance, interruption flag and need-decay overrides.
///
/// Concrete activities embed one and hand it out through
/// [`Activity::core`] / [`Activity::core_mut`].
#[derive(Clone, Debug)]
pub struct ActivityCore {
    lifecycle:   Lifecycle,
    owner:       AgentId,
    priority:    Priority,
    issuer:      &'static str,
    interrupted: bool,
    need_decay:  FxHashMap<NeedKind, f32>,
    /// Advisory reason recorded by [`fail`][Self::fail].
    failure:     Option<String>,
}

impl ActivityCore {
    pub fn new(issuer: &'static str, priority: Priority) -> Self {
        Self {
            lifecycle:   Lifecycle::Running,
            owner:       AgentId::INVALID,
            priority,
            issuer,
            interrupted: false,
            need_decay:  FxHashMap::default(),
            failure:     None,
        }
    }

    /// Override the decay rate of `need` while this activity is active.
    /// Non-positive multipliers are ignored.
    pub fn with_need_decay(mut self, need: NeedKind, multiplier: f32) -> Self {
        if multiplier > 0.0 {
            self.need_decay.insert(need, multiplier);
        }
        self
    }

    pub fn bind(&mut self, owner: AgentId) {
        self.owner = owner;
    }

    #[inline]
    pub fn owner(&self) -> AgentId {
        self.owner
    }

    #[inline]
    pub fn priority(&self) -> Priority {
        self.priority
    }

    #[inline]
    pub fn issuer(&self) -> &'static str {
        self.issuer
    }

    #[inline]
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.lifecycle == Lifecycle::Running
    }

    #[inline]
    pub fn is_interrupted(&self) -> bool {
        self.interrupted
    }

    pub fn set_interrupted(&mut self, interrupted: bool) {
        self.interrupted = interrupted;
    }

    pub fn need_decay_multiplier(&self, need: NeedKind) -> f32 {
        self.need_decay.get(&need).copied().unwrap_or(1.0)
    }

    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Running → Completed.  A second terminal transition is ignored.
    pub fn complete(&mut self) {
        if self.terminate(Lifecycle::Completed) {
            debug!(agent = %self.owner, activity = self.issuer, "completed");
        }
    }

    /// Running → Failed, recording an advisory reason.
    pub fn fail(&mut self, reason: impl Into<String>) {
        if self.terminate(Lifecycle::Failed) {
            let reason = reason.into();
            debug!(agent = %self.owner, activity = self.issuer, %reason, "failed");
            self.failure = Some(reason);
        }
    }

    fn terminate(&mut self, to: Lifecycle) -> bool {
        if self.lifecycle.is_terminal() {
            warn!(
                agent = %self.owner,
                activity = self.issuer,
                from = ?self.lifecycle,
                to = ?to,
                "ignoring second terminal transition"
            );
            return false;
        }
        self.lifecycle = to;
        true
    }

    /// An action of `kind` stamped with this activity's owner, name and
    /// priority.
    pub fn action(&self, kind: ActionKind) -> Action {
        Action::new(self.owner, self.issuer, self.priority, kind)
    }

    /// A no-op that keeps this activity's scheduling slot.
    pub fn idle(&self) -> Action {
        self.action(ActionKind::Idle)
    }
}

// ── Contention ────────────────────────────────────────────────────────────────

/// Another agent wants to step onto the tile this agent occupies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoveRequest {
    pub requester:       AgentId,
    pub from:            GridPos,
    pub to:              GridPos,
    pub target_room:     Option<RoomId>,
    pub target_facility: Option<FacilityId>,
}

/// How the occupant answers a [`MoveRequest`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MoveResponse {
    /// Requester wants the resource this agent is using: wait your turn.
    Queue,
    /// Occupant will move aside to this free tile.
    StepAside(GridPos),
    /// No opinion; the caller applies its default (swap places).
    Defer,
}

/// Queue same-resource requesters, otherwise step aside to the first free
/// alternative position, otherwise defer.
pub fn default_move_response<A: Activity + ?Sized>(
    activity: &A,
    request:  &MoveRequest,
    world:    &World,
) -> MoveResponse {
    let same_facility = request.target_facility.is_some()
        && request.target_facility == activity.target_facility();
    let same_room = request.target_room.is_some() && request.target_room == activity.target_room();
    if same_facility || same_room {
        return MoveResponse::Queue;
    }
    activity
        .alternative_goal_positions(world)
        .into_iter()
        .find(|&p| p != request.to && p != request.from && world.is_free(p))
        .map_or(MoveResponse::Defer, MoveResponse::StepAside)
}

// ── Activity ──────────────────────────────────────────────────────────────────

/// A multi-tick behavior.
///
/// # Driving contract
///
/// Once per tick the owner calls [`process_events`][Self::process_events]
/// and then [`next_action`][Self::next_action].  `next_action` either
/// returns the action for this tick, or moves the lifecycle to a terminal
/// state and returns `None`.  A `None` while still `Running` means "nothing
/// this tick"; composite parents replace that with an idle action (see
/// [`run_sub_activity`][crate::run_sub_activity]).
///
/// After the lifecycle turns terminal `next_action` is never called again
/// and [`cleanup`][Self::cleanup] runs exactly once.  Instances are never
/// reused.
///
/// # Failure
///
/// Permanent impossibility calls `core_mut().fail(..)`.  Transient
/// obstacles return an idle action and count towards a bounded retry
/// budget instead.
///
/// # Thread safety
///
/// `Send` so an agent's activity can be driven by whichever worker runs
/// that agent's decision task.  No activity is ever shared between threads.
pub trait Activity: Send {
    fn core(&self) -> &ActivityCore;
    fn core_mut(&mut self) -> &mut ActivityCore;

    /// Human-readable status for inspection tooling.
    fn display_name(&self) -> String;

    fn next_action(&mut self, ctx: &mut ActivityContext<'_>) -> Option<Action>;

    /// Bind to the owning agent.  Called once, before the first poll.
    fn initialize(&mut self, owner: AgentId, _world: &World) {
        self.core_mut().bind(owner);
    }

    /// Release external resources.  Called exactly once after termination
    /// or when the owner discards the activity.
    fn cleanup(&mut self) {}

    /// Consume interruption / resume events.  Runs before `next_action`.
    fn process_events(&mut self, perception: &Perception) {
        for event in &perception.events {
            match *event {
                PerceptionEvent::Interrupted(reason) => {
                    self.core_mut().set_interrupted(true);
                    self.on_interrupted(reason);
                }
                PerceptionEvent::Resumed => {
                    self.core_mut().set_interrupted(false);
                    self.on_resume();
                }
                _ => {}
            }
        }
    }

    fn on_interrupted(&mut self, _reason: InterruptionReason) {}

    fn on_resume(&mut self) {}

    #[inline]
    fn state(&self) -> Lifecycle {
        self.core().lifecycle()
    }

    #[inline]
    fn priority(&self) -> Priority {
        self.core().priority()
    }

    fn need_decay_multiplier(&self, need: NeedKind) -> f32 {
        self.core().need_decay_multiplier(need)
    }

    /// Room this activity currently occupies, for other agents' queueing.
    fn target_room(&self) -> Option<RoomId> {
        None
    }

    /// Facility this activity currently occupies.
    fn target_facility(&self) -> Option<FacilityId> {
        None
    }

    /// Tiles inside the work area this agent could step aside to.
    fn alternative_goal_positions(&self, _world: &World) -> Vec<GridPos> {
        Vec::new()
    }

    fn is_interruptible(&self) -> bool {
        true
    }

    fn handle_move_request(&self, request: &MoveRequest, world: &World) -> MoveResponse {
        default_move_response(self, request, world)
    }
}

//! Simulation observer trait for progress reporting and data collection.

use act_core::Tick;
use act_engine::{Action, ActionOutcome, FinishedActivity};
use act_world::World;

/// Counters for one tick, handed to [`SimObserver::on_tick_end`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickStats {
    /// Activities started by the decision layer.
    pub started:  usize,
    /// Actions applied.
    pub done:     usize,
    /// Actions rejected at the sync point.
    pub rejected: usize,
    /// Activities (and commands) that left their host.
    pub finished: usize,
    /// Agents moved off their tile by someone else's move.
    pub pushed:   usize,
    /// Moves that waited because the occupant asked the mover to queue.
    pub queued:   usize,
}

/// Callbacks invoked by [`Sim::run`][crate::Sim::run] at key points in the
/// tick loop.
///
/// All methods have default no-op implementations so implementors only need to
/// override what they care about.
///
/// # Example: finished-activity log
///
/// ```rust,ignore
/// struct Journal(Vec<String>);
///
/// impl SimObserver for Journal {
///     fn on_activity_finished(&mut self, tick: Tick, done: &FinishedActivity) {
///         self.0.push(format!("{tick}: {} {:?}", done.name, done.state));
///     }
/// }
/// ```
pub trait SimObserver {
    /// Called at the very start of each tick, before any processing.
    fn on_tick_start(&mut self, _tick: Tick) {}

    /// Called for every action after it was executed (or rejected).
    fn on_action(&mut self, _tick: Tick, _action: &Action, _outcome: &ActionOutcome) {}

    /// Called when an activity leaves its agent's host.
    fn on_activity_finished(&mut self, _tick: Tick, _finished: &FinishedActivity) {}

    /// Called at the end of each tick.
    fn on_tick_end(&mut self, _tick: Tick, _stats: &TickStats) {}

    /// Called once after the final tick completes.
    fn on_sim_end(&mut self, _final_tick: Tick, _world: &World) {}
}

/// A [`SimObserver`] that does nothing.  Use when you need to call `run` but
/// don't want progress callbacks.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}

//! Driving a nested activity for one tick.

use crate::{Action, Activity, ActivityContext, ActivityCore, Lifecycle};

/// What a parent learns from one tick of its sub-activity.  Never stored.
#[derive(Clone, Debug, PartialEq)]
pub enum SubActivityResult {
    Continue(Action),
    Completed,
    Failed,
}

fn terminal(state: Lifecycle) -> Option<SubActivityResult> {
    match state {
        Lifecycle::Running   => None,
        Lifecycle::Completed => Some(SubActivityResult::Completed),
        Lifecycle::Failed    => Some(SubActivityResult::Failed),
    }
}

/// Poll `sub` once on behalf of `parent`.
///
/// A terminal sub is reported without being polled again.  Events are
/// propagated first and may themselves end the sub.  A running sub that
/// proposes nothing yields an idle action at the **parent's** priority so
/// the parent keeps its scheduling slot: the result is never a
/// `Continue` without an action.
pub fn run_sub_activity(
    sub:    &mut dyn Activity,
    ctx:    &mut ActivityContext<'_>,
    parent: &ActivityCore,
) -> SubActivityResult {
    if let Some(done) = terminal(sub.state()) {
        return done;
    }

    sub.process_events(ctx.perception);
    if let Some(done) = terminal(sub.state()) {
        return done;
    }

    match sub.next_action(ctx) {
        Some(action) => SubActivityResult::Continue(action),
        None => terminal(sub.state()).unwrap_or_else(|| SubActivityResult::Continue(parent.idle())),
    }
}

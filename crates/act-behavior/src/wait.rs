use act_engine::{Action, Activity, ActivityContext, ActivityCore, Priority};

/// Stand still for a fixed number of ticks, then complete.
pub struct Wait {
    core:      ActivityCore,
    remaining: u64,
}

impl Wait {
    pub fn new(ticks: u64, priority: Priority) -> Self {
        Self { core: ActivityCore::new("wait", priority), remaining: ticks }
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }
}

impl Activity for Wait {
    fn core(&self) -> &ActivityCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ActivityCore {
        &mut self.core
    }

    fn display_name(&self) -> String {
        format!("Waiting ({} ticks left)", self.remaining)
    }

    fn next_action(&mut self, _ctx: &mut ActivityContext<'_>) -> Option<Action> {
        if self.remaining == 0 {
            self.core.complete();
            return None;
        }
        self.remaining -= 1;
        Some(self.core.idle())
    }
}

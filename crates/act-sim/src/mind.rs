//! Per-agent state the tick loop keeps next to the world.

use act_core::{AgentId, AgentRng};
use act_engine::ActivityHost;
use act_world::{PerceptionEvent, StorageMemory};

/// Everything one agent's decision task may mutate.
///
/// Minds are stored in a `Vec` indexed by `AgentId`, so the parallel
/// decision phase hands each worker a disjoint `&mut Mind`.
pub struct Mind {
    pub host:   ActivityHost,
    pub memory: StorageMemory,
    pub rng:    AgentRng,
    /// Delivered with next tick's perception.
    next:       Vec<PerceptionEvent>,
    /// Delivered the tick after that.
    after_next: Vec<PerceptionEvent>,
}

impl Mind {
    pub fn new(agent: AgentId, seed: u64, memory_expiry_ticks: u64) -> Self {
        Self {
            host:       ActivityHost::new(agent),
            memory:     StorageMemory::new(memory_expiry_ticks),
            rng:        AgentRng::new(seed, agent),
            next:       Vec::new(),
            after_next: Vec::new(),
        }
    }

    #[inline]
    pub fn agent(&self) -> AgentId {
        self.host.agent()
    }

    pub fn push_event(&mut self, event: PerceptionEvent) {
        self.next.push(event);
    }

    /// Queue `event` one tick later than [`push_event`][Self::push_event].
    pub fn push_event_later(&mut self, event: PerceptionEvent) {
        self.after_next.push(event);
    }

    /// Events waiting for the next perception.
    pub fn pending_events(&self) -> &[PerceptionEvent] {
        &self.next
    }

    /// Hand over this tick's events and shift the later queue forward.
    pub(crate) fn take_events(&mut self) -> Vec<PerceptionEvent> {
        let events = std::mem::take(&mut self.next);
        self.next = std::mem::take(&mut self.after_next);
        events
    }
}

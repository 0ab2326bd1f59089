//! Per-tick, read-only perception snapshot.
//!
//! Built once per agent per tick before the decision phase.  Everything an
//! activity needs to know about its surroundings and about interruptions
//! arrives through this struct; activities never look at other agents'
//! activities directly.

use act_core::{AgentId, GridPos, Tick};

use crate::{FacilityId, FacilityKind, Inventory, StorageId};

/// Why an activity is being interrupted.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum InterruptionReason {
    /// An external command was assigned to the agent.
    Command,
    /// Another agent pushed this one off its tile.
    Pushed,
    /// A high-priority trait (panic, rage, …) took over for a while.
    HighPriorityTrait,
}

/// Something that happened to the agent since its last poll.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PerceptionEvent {
    Interrupted(InterruptionReason),
    /// The interruption is over; carry on.
    Resumed,
    /// A command was assigned (informational; paired with `Interrupted`).
    CommandAssigned,
    /// The assigned command finished.
    CommandCompleted,
    /// Another agent pushed this one aside.
    PushedBy(AgentId),
}

/// A facility within perception range.
#[derive(Clone, Debug)]
pub struct SeenFacility {
    pub id:         FacilityId,
    pub kind:       FacilityKind,
    pub work_spot:  GridPos,
    /// Agent whose activity currently targets this facility, if any.
    pub claimed_by: Option<AgentId>,
    pub output:     Inventory,
}

/// A storage within perception range, with its observable contents.
#[derive(Clone, Debug)]
pub struct SeenStorage {
    pub id:       StorageId,
    pub pos:      GridPos,
    pub contents: Inventory,
}

#[derive(Clone, Debug)]
pub struct Perception {
    pub tick:       Tick,
    pub agent:      AgentId,
    pub position:   GridPos,
    pub events:     Vec<PerceptionEvent>,
    pub agents:     Vec<(AgentId, GridPos)>,
    pub facilities: Vec<SeenFacility>,
    pub storages:   Vec<SeenStorage>,
}

impl Perception {
    /// An empty snapshot: nothing visible, no events.
    pub fn empty(agent: AgentId, position: GridPos, tick: Tick) -> Self {
        Self {
            tick,
            agent,
            position,
            events:     Vec::new(),
            agents:     Vec::new(),
            facilities: Vec::new(),
            storages:   Vec::new(),
        }
    }

    pub fn with_event(mut self, event: PerceptionEvent) -> Self {
        self.events.push(event);
        self
    }

    /// First interruption in this snapshot, if any.
    pub fn interruption(&self) -> Option<InterruptionReason> {
        self.events.iter().find_map(|e| match e {
            PerceptionEvent::Interrupted(r) => Some(*r),
            _ => None,
        })
    }

    pub fn has_resume(&self) -> bool {
        self.events.iter().any(|e| matches!(e, PerceptionEvent::Resumed))
    }

    pub fn storage(&self, id: StorageId) -> Option<&SeenStorage> {
        self.storages.iter().find(|s| s.id == id)
    }

    pub fn facility(&self, id: FacilityId) -> Option<&SeenFacility> {
        self.facilities.iter().find(|f| f.id == id)
    }

    pub fn agent_at(&self, pos: GridPos) -> Option<AgentId> {
        self.agents.iter().find(|(_, p)| *p == pos).map(|(a, _)| *a)
    }
}

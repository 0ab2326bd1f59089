//! Structure-of-Arrays per-agent world state.
//!
//! Every `Vec` has one element per agent; `AgentId` is the index.  The
//! occupancy map is kept in sync by the only two mutators, `move_agent` and
//! `swap`, so "who stands on this tile" is O(1).

use act_core::{AgentId, GridPos};
use rustc_hash::FxHashMap;

use crate::{Inventory, Needs, Skill, WorldError, WorldResult};

pub struct AgentStates {
    positions:       Vec<GridPos>,
    pub inventories: Vec<Inventory>,
    pub needs:       Vec<Needs>,
    pub skill_xp:    Vec<[f32; Skill::COUNT]>,
    occupancy:       FxHashMap<GridPos, AgentId>,
}

impl AgentStates {
    pub fn new() -> Self {
        Self {
            positions:   Vec::new(),
            inventories: Vec::new(),
            needs:       Vec::new(),
            skill_xp:    Vec::new(),
            occupancy:   FxHashMap::default(),
        }
    }

    /// Add an agent standing on `pos`.  Fails if the tile is taken.
    pub fn spawn(&mut self, pos: GridPos, carry_capacity: u32) -> WorldResult<AgentId> {
        if let Some(&by) = self.occupancy.get(&pos) {
            return Err(WorldError::Occupied { pos, by });
        }
        let id = AgentId(self.positions.len() as u32);
        self.positions.push(pos);
        self.inventories.push(Inventory::new(carry_capacity));
        self.needs.push(Needs::default());
        self.skill_xp.push([0.0; Skill::COUNT]);
        self.occupancy.insert(pos, id);
        Ok(id)
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.positions.len()
    }

    pub fn ids(&self) -> impl Iterator<Item = AgentId> + '_ {
        (0..self.positions.len() as u32).map(AgentId)
    }

    #[inline]
    pub fn contains(&self, agent: AgentId) -> bool {
        agent.index() < self.positions.len()
    }

    #[inline]
    pub fn position(&self, agent: AgentId) -> GridPos {
        self.positions[agent.index()]
    }

    #[inline]
    pub fn inventory(&self, agent: AgentId) -> &Inventory {
        &self.inventories[agent.index()]
    }

    #[inline]
    pub fn needs(&self, agent: AgentId) -> &Needs {
        &self.needs[agent.index()]
    }

    #[inline]
    pub fn occupant(&self, pos: GridPos) -> Option<AgentId> {
        self.occupancy.get(&pos).copied()
    }

    pub fn xp(&self, agent: AgentId, skill: Skill) -> f32 {
        self.skill_xp[agent.index()][skill.slot()]
    }

    pub fn grant_xp(&mut self, agent: AgentId, skill: Skill, amount: f32) {
        self.skill_xp[agent.index()][skill.slot()] += amount;
    }

    /// Move `agent` onto `to`.  Walkability is the caller's concern; this
    /// only guards occupancy.
    pub fn move_agent(&mut self, agent: AgentId, to: GridPos) -> WorldResult<()> {
        if !self.contains(agent) {
            return Err(WorldError::UnknownAgent(agent));
        }
        match self.occupancy.get(&to) {
            Some(&by) if by != agent => return Err(WorldError::Occupied { pos: to, by }),
            _ => {}
        }
        let from = self.positions[agent.index()];
        self.occupancy.remove(&from);
        self.occupancy.insert(to, agent);
        self.positions[agent.index()] = to;
        Ok(())
    }

    /// Exchange the tiles of two agents.
    pub fn swap(&mut self, a: AgentId, b: AgentId) -> WorldResult<()> {
        if !self.contains(a) {
            return Err(WorldError::UnknownAgent(a));
        }
        if !self.contains(b) {
            return Err(WorldError::UnknownAgent(b));
        }
        let (pa, pb) = (self.positions[a.index()], self.positions[b.index()]);
        self.positions[a.index()] = pb;
        self.positions[b.index()] = pa;
        self.occupancy.insert(pb, a);
        self.occupancy.insert(pa, b);
        Ok(())
    }
}

impl Default for AgentStates {
    fn default() -> Self {
        Self::new()
    }
}

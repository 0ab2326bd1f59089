//! The `World` aggregate and the per-tick claim snapshot.

use act_core::{AgentId, GridPos, SimClock, Tick};
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::spatial::{Indexed, SpatialIndex};
use crate::{
    AgentStates, Arena, Container, Facility, FacilityId, GridMap, Inventory, Perception,
    PerceptionEvent, ReactionBook, Room, RoomId, SeenFacility, SeenStorage, Storage, StorageId,
    WorldError, WorldResult,
};

// ── Claims ────────────────────────────────────────────────────────────────────

/// Which agent's current activity targets which facility / room.
///
/// Rebuilt at every synchronisation point from each activity's
/// `target_facility` / `target_room`.  This is how one agent's decision task
/// learns about another agent's in-progress claim without touching that
/// agent's activity object.
#[derive(Clone, Debug, Default)]
pub struct Claims {
    facilities: FxHashMap<FacilityId, AgentId>,
    rooms:      FxHashMap<RoomId, Vec<AgentId>>,
}

impl Claims {
    pub fn clear(&mut self) {
        self.facilities.clear();
        self.rooms.clear();
    }

    /// Record a facility claim.  The lowest `AgentId` wins a tie, so the
    /// result is independent of iteration order.
    pub fn claim_facility(&mut self, facility: FacilityId, agent: AgentId) {
        self.facilities
            .entry(facility)
            .and_modify(|holder| *holder = (*holder).min(agent))
            .or_insert(agent);
    }

    pub fn claim_room(&mut self, room: RoomId, agent: AgentId) {
        self.rooms.entry(room).or_default().push(agent);
    }

    pub fn facility_holder(&self, facility: FacilityId) -> Option<AgentId> {
        self.facilities.get(&facility).copied()
    }

    pub fn room_claimants(&self, room: RoomId) -> &[AgentId] {
        self.rooms.get(&room).map(Vec::as_slice).unwrap_or(&[])
    }
}

// ── World ─────────────────────────────────────────────────────────────────────

/// Everything outside the agents' heads.
///
/// Mutated only at the synchronisation point; shared read-only with every
/// decision task in between.
pub struct World {
    pub map:        GridMap,
    pub rooms:      Arena<Room>,
    pub facilities: Arena<Facility>,
    pub storages:   Arena<Storage>,
    pub agents:     AgentStates,
    pub reactions:  ReactionBook,
    pub clock:      SimClock,
    pub claims:     Claims,
    index:          SpatialIndex,
}

impl World {
    pub fn new(map: GridMap, clock: SimClock) -> Self {
        Self {
            map,
            rooms:      Arena::new("room"),
            facilities: Arena::new("facility"),
            storages:   Arena::new("storage"),
            agents:     AgentStates::new(),
            reactions:  ReactionBook::default(),
            clock,
            claims:     Claims::default(),
            index:      SpatialIndex::new(),
        }
    }

    #[inline]
    pub fn now(&self) -> Tick {
        self.clock.current_tick
    }

    // ── Entity registry ───────────────────────────────────────────────────

    pub fn add_room(&mut self, room: Room) -> RoomId {
        self.rooms.insert(room)
    }

    /// Register a facility.  Its work spot must be walkable.
    pub fn add_facility(&mut self, facility: Facility) -> WorldResult<FacilityId> {
        if !self.map.is_walkable(facility.work_spot) {
            return Err(WorldError::NotWalkable(facility.work_spot));
        }
        let pos = facility.work_spot;
        let id = self.facilities.insert(facility);
        self.index.insert(pos, Indexed::Facility(id));
        Ok(id)
    }

    /// Register a storage.  Its tile becomes blocked.
    pub fn add_storage(&mut self, storage: Storage) -> WorldResult<StorageId> {
        let pos = storage.pos;
        self.map.set_blocked(pos, true)?;
        let id = self.storages.insert(storage);
        self.index.insert(pos, Indexed::Storage(id));
        Ok(id)
    }

    /// Destroy a facility.  Outstanding handles go stale.
    pub fn remove_facility(&mut self, id: FacilityId) -> WorldResult<Facility> {
        let facility = self.facilities.remove(id)?;
        self.index.remove(facility.work_spot, Indexed::Facility(id));
        debug!(facility = %id, kind = %facility.kind, "facility removed");
        Ok(facility)
    }

    /// Destroy a storage and unblock its tile.
    pub fn remove_storage(&mut self, id: StorageId) -> WorldResult<Storage> {
        let storage = self.storages.remove(id)?;
        self.index.remove(storage.pos, Indexed::Storage(id));
        self.map.set_blocked(storage.pos, false)?;
        debug!(storage = %id, name = %storage.name, "storage removed");
        Ok(storage)
    }

    #[inline]
    pub fn facility(&self, id: FacilityId) -> WorldResult<&Facility> {
        self.facilities.get(id)
    }

    #[inline]
    pub fn storage(&self, id: StorageId) -> WorldResult<&Storage> {
        self.storages.get(id)
    }

    pub fn room_at(&self, pos: GridPos) -> Option<RoomId> {
        self.rooms.iter().find(|(_, r)| r.contains(pos)).map(|(id, _)| id)
    }

    /// Tile an agent must stand on (or next to) to reach `container`.
    pub fn container_pos(&self, container: Container) -> WorldResult<GridPos> {
        match container {
            Container::Storage(id)        => Ok(self.storages.get(id)?.pos),
            Container::FacilityOutput(id) => Ok(self.facilities.get(id)?.work_spot),
        }
    }

    pub fn container(&self, container: Container) -> WorldResult<&Inventory> {
        match container {
            Container::Storage(id)        => Ok(&self.storages.get(id)?.contents),
            Container::FacilityOutput(id) => Ok(&self.facilities.get(id)?.output),
        }
    }

    pub fn container_mut(&mut self, container: Container) -> WorldResult<&mut Inventory> {
        match container {
            Container::Storage(id)        => Ok(&mut self.storages.get_mut(id)?.contents),
            Container::FacilityOutput(id) => Ok(&mut self.facilities.get_mut(id)?.output),
        }
    }

    /// `true` if an agent at `pos` can reach into `container`.  Storages are
    /// reached from an adjacent tile, facility output from the work spot or
    /// next to it.
    pub fn can_reach(&self, pos: GridPos, container: Container) -> bool {
        match self.container_pos(container) {
            Ok(at) => at == pos || at.is_adjacent(pos),
            Err(_) => false,
        }
    }

    /// Walkable and nobody standing there.
    pub fn is_free(&self, pos: GridPos) -> bool {
        self.map.is_walkable(pos) && self.agents.occupant(pos).is_none()
    }

    // ── Spatial queries ───────────────────────────────────────────────────

    /// Nearest storage satisfying `filter`.
    pub fn nearest_storage(
        &self,
        from:   GridPos,
        filter: impl Fn(&Storage) -> bool,
    ) -> Option<StorageId> {
        self.index
            .nearest(from, |t| match t {
                Indexed::Storage(id) => self.storages.get(id).map(&filter).unwrap_or(false),
                Indexed::Facility(_) => false,
            })
            .and_then(|t| match t {
                Indexed::Storage(id) => Some(id),
                Indexed::Facility(_) => None,
            })
    }

    /// Nearest facility satisfying `filter`.
    pub fn nearest_facility(
        &self,
        from:   GridPos,
        filter: impl Fn(FacilityId, &Facility) -> bool,
    ) -> Option<FacilityId> {
        self.index
            .nearest(from, |t| match t {
                Indexed::Facility(id) => self.facilities.get(id).map(|f| filter(id, f)).unwrap_or(false),
                Indexed::Storage(_) => false,
            })
            .and_then(|t| match t {
                Indexed::Facility(id) => Some(id),
                Indexed::Storage(_) => None,
            })
    }

    // ── Perception ────────────────────────────────────────────────────────

    /// Build `agent`'s perception snapshot for this tick.
    pub fn perceive(&self, agent: AgentId, radius: u32, events: Vec<PerceptionEvent>) -> Perception {
        let position = self.agents.position(agent);
        let mut perception = Perception::empty(agent, position, self.now());
        perception.events = events;

        perception.agents = self
            .agents
            .ids()
            .filter(|&other| other != agent)
            .map(|other| (other, self.agents.position(other)))
            .filter(|(_, p)| p.chebyshev(position) <= radius)
            .collect();

        for target in self.index.within(position, radius) {
            match target {
                Indexed::Facility(id) => {
                    if let Ok(f) = self.facilities.get(id) {
                        perception.facilities.push(SeenFacility {
                            id,
                            kind:       f.kind.clone(),
                            work_spot:  f.work_spot,
                            claimed_by: self.claims.facility_holder(id),
                            output:     f.output.clone(),
                        });
                    }
                }
                Indexed::Storage(id) => {
                    if let Ok(s) = self.storages.get(id) {
                        perception.storages.push(SeenStorage {
                            id,
                            pos:      s.pos,
                            contents: s.contents.clone(),
                        });
                    }
                }
            }
        }
        // R-tree order is arbitrary; keep snapshots deterministic.
        perception.facilities.sort_by_key(|f| f.id);
        perception.storages.sort_by_key(|s| s.id);
        perception
    }
}

//! Unit tests for act-world.

use act_core::{AgentId, GridPos, ItemId, SimClock, Tick};

use crate::{
    AStar, Container, Facility, FacilityKind, Goal, GridMap, Inventory, NavStep, Navigator,
    PathOutcome, Pathfinder, PerceptionEvent, Storage, World, WorldError,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

const GRAIN: ItemId = ItemId(1);
const BREAD: ItemId = ItemId(2);

fn p(x: i32, y: i32) -> GridPos {
    GridPos::new(x, y)
}

fn open_world(w: u32, h: u32) -> World {
    World::new(GridMap::open(w, h), SimClock::new(100))
}

/// 10×10 map with a full vertical wall at x = 5.
fn walled_map() -> GridMap {
    let mut map = GridMap::open(10, 10);
    for y in 0..10 {
        map.set_blocked(p(5, y), true).unwrap();
    }
    map
}

// ── Arena ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod arena_tests {
    use super::*;
    use crate::Arena;

    #[test]
    fn removed_handle_goes_stale() {
        let mut arena: Arena<u32> = Arena::new("thing");
        let a = arena.insert(7);
        assert_eq!(*arena.get(a).unwrap(), 7);
        assert_eq!(arena.remove(a).unwrap(), 7);
        assert!(matches!(arena.get(a), Err(WorldError::StaleHandle { kind: "thing", .. })));
        assert!(arena.is_empty());
    }

    #[test]
    fn slot_reuse_does_not_revive_old_handle() {
        let mut arena: Arena<&str> = Arena::new("thing");
        let old = arena.insert("old");
        arena.remove(old).unwrap();
        let new = arena.insert("new");
        assert_eq!(old.index(), new.index());
        assert_ne!(old, new);
        assert!(!arena.contains(old));
        assert_eq!(*arena.get(new).unwrap(), "new");
    }

    #[test]
    fn double_remove_is_an_error() {
        let mut arena: Arena<u8> = Arena::new("thing");
        let a = arena.insert(1);
        arena.remove(a).unwrap();
        assert!(arena.remove(a).is_err());
        assert_eq!(arena.len(), 0);
    }

    #[test]
    fn iter_skips_free_slots() {
        let mut arena: Arena<u8> = Arena::new("thing");
        let a = arena.insert(1);
        let _b = arena.insert(2);
        arena.remove(a).unwrap();
        let live: Vec<u8> = arena.iter().map(|(_, v)| *v).collect();
        assert_eq!(live, vec![2]);
    }
}

// ── Inventory ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod inventory_tests {
    use super::*;

    #[test]
    fn add_respects_capacity() {
        let mut inv = Inventory::new(5);
        inv.add(GRAIN, 3).unwrap();
        assert!(matches!(
            inv.add(BREAD, 3),
            Err(WorldError::ContainerFull { free: 2, wanted: 3 })
        ));
        // All-or-nothing: nothing was added.
        assert_eq!(inv.count(BREAD), 0);
        assert_eq!(inv.free_space(), 2);
    }

    #[test]
    fn take_is_all_or_nothing() {
        let mut inv = Inventory::new(10).with(GRAIN, 4);
        assert!(matches!(
            inv.take(GRAIN, 5),
            Err(WorldError::InsufficientItems { have: 4, wanted: 5, .. })
        ));
        assert_eq!(inv.count(GRAIN), 4);
        inv.take(GRAIN, 4).unwrap();
        assert!(inv.is_empty());
    }

    #[test]
    fn has_all() {
        let inv = Inventory::new(10).with(GRAIN, 2).with(BREAD, 1);
        assert!(inv.has_all(&[(GRAIN, 2), (BREAD, 1)]));
        assert!(!inv.has_all(&[(GRAIN, 3)]));
        assert!(inv.has_all(&[]));
    }
}

// ── Map + A* ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod path_tests {
    use super::*;

    #[test]
    fn straight_line_path_excludes_start() {
        let map = GridMap::open(10, 10);
        match AStar.find_path(&map, p(0, 0), &Goal::Exact(p(3, 0)), 1_000) {
            PathOutcome::Found(path) => {
                assert_eq!(path.len(), 3);
                assert_eq!(path.back().copied(), Some(p(3, 0)));
                assert!(!path.contains(&p(0, 0)));
            }
            other => panic!("expected Found, got {other:?}"),
        }
    }

    #[test]
    fn already_at_goal_is_empty_path() {
        let map = GridMap::open(4, 4);
        assert_eq!(
            AStar.find_path(&map, p(1, 1), &Goal::Adjacent(p(2, 2)), 10),
            PathOutcome::Found(Default::default())
        );
    }

    #[test]
    fn wall_makes_goal_unreachable() {
        let map = walled_map();
        assert_eq!(
            AStar.find_path(&map, p(0, 0), &Goal::Exact(p(9, 9)), 10_000),
            PathOutcome::Unreachable
        );
    }

    #[test]
    fn tiny_budget_is_incomplete() {
        let map = GridMap::open(50, 50);
        assert_eq!(
            AStar.find_path(&map, p(0, 0), &Goal::Exact(p(49, 49)), 3),
            PathOutcome::Incomplete
        );
    }

    #[test]
    fn no_corner_cutting() {
        let mut map = GridMap::open(3, 3);
        map.set_blocked(p(1, 0), true).unwrap();
        let n: Vec<GridPos> = map.walkable_neighbours(p(0, 0)).collect();
        assert!(!n.contains(&p(1, 1)), "diagonal past a wall must be rejected");
        assert!(n.contains(&p(0, 1)));
    }

    #[test]
    fn any_of_goal() {
        let map = GridMap::open(10, 1);
        match AStar.find_path(&map, p(0, 0), &Goal::AnyOf(vec![p(9, 0), p(2, 0)]), 100) {
            PathOutcome::Found(path) => assert_eq!(path.back().copied(), Some(p(2, 0))),
            other => panic!("expected Found, got {other:?}"),
        }
    }
}

// ── Navigator ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod navigator_tests {
    use super::*;

    #[test]
    fn walks_to_goal() {
        let map = GridMap::open(10, 10);
        let mut nav = Navigator::new(Goal::Exact(p(3, 0)), 5, 1_000);
        let mut pos = p(0, 0);
        for _ in 0..10 {
            match nav.advance(pos, &map, &AStar) {
                NavStep::Step(next) => pos = next,
                NavStep::Arrived => break,
                NavStep::Waiting => panic!("unexpected wait"),
            }
        }
        assert_eq!(pos, p(3, 0));
        assert!(nav.is_at_goal(pos));
        assert_eq!(nav.searches(), 1);
    }

    #[test]
    fn unreachable_goal_is_stuck_after_exactly_max_attempts() {
        let map = walled_map();
        let mut nav = Navigator::new(Goal::Exact(p(9, 9)), 3, 10_000);
        for i in 1..=3 {
            assert!(!nav.is_stuck(), "stuck too early at attempt {i}");
            assert_eq!(nav.advance(p(0, 0), &map, &AStar), NavStep::Waiting);
        }
        assert!(nav.is_stuck());
        assert_eq!(nav.stuck_ticks(), 3);
    }

    #[test]
    fn rejected_move_counts_as_stuck_then_recovers() {
        let map = GridMap::open(10, 1);
        let mut nav = Navigator::new(Goal::Exact(p(5, 0)), 10, 1_000);
        assert_eq!(nav.advance(p(0, 0), &map, &AStar), NavStep::Step(p(1, 0)));
        // Move was not applied: retry the same tile.
        assert_eq!(nav.advance(p(0, 0), &map, &AStar), NavStep::Step(p(1, 0)));
        assert_eq!(nav.stuck_ticks(), 1);
        // Now it went through.
        assert_eq!(nav.advance(p(1, 0), &map, &AStar), NavStep::Step(p(2, 0)));
        assert_eq!(nav.stuck_ticks(), 0);
    }

    #[test]
    fn incomplete_search_grows_budget() {
        let map = GridMap::open(40, 40);
        let mut nav = Navigator::new(Goal::Exact(p(39, 39)), 100, 2);
        let mut waits = 0;
        loop {
            match nav.advance(p(0, 0), &map, &AStar) {
                NavStep::Waiting => waits += 1,
                NavStep::Step(_) => break,
                NavStep::Arrived => panic!("cannot have arrived"),
            }
            assert!(waits < 20, "budget never grew enough");
        }
        assert!(waits > 0);
    }

    #[test]
    fn set_goal_resets_stuck() {
        let map = walled_map();
        let mut nav = Navigator::new(Goal::Exact(p(9, 9)), 2, 100);
        nav.advance(p(0, 0), &map, &AStar);
        nav.advance(p(0, 0), &map, &AStar);
        assert!(nav.is_stuck());
        nav.set_goal(Goal::Exact(p(1, 1)));
        assert!(!nav.is_stuck());
    }
}

// ── Needs ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod needs_tests {
    use crate::{Need, NeedKind, Needs};

    #[test]
    fn restore_and_decay_clamp() {
        let mut need = Need::new(1.0);
        need.restore(50.0);
        assert_eq!(need.value, Need::MAX);
        need.decay(200.0);
        assert_eq!(need.value, 0.0);
        assert!(need.is_critical() && need.is_low());
    }

    #[test]
    fn most_critical_picks_lowest() {
        let mut needs = Needs::default();
        needs.get_mut(NeedKind::Hunger).value = 8.0;
        needs.get_mut(NeedKind::Energy).value = 2.0;
        assert_eq!(needs.most_critical(), Some(NeedKind::Energy));
        needs.get_mut(NeedKind::Energy).value = 90.0;
        assert_eq!(needs.most_critical(), Some(NeedKind::Hunger));
    }
}

// ── Memory ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod memory_tests {
    use super::*;
    use crate::StorageMemory;

    #[test]
    fn recall_expires() {
        let mut world = open_world(10, 10);
        let s = world.add_storage(Storage::new("pantry", p(1, 1), 10)).unwrap();
        let mut mem = StorageMemory::new(50);
        mem.observe_storage(s, &Inventory::new(10).with(BREAD, 2), Tick(10));
        assert_eq!(mem.recall_storage_contents(s, Tick(59)).map(|i| i.count(BREAD)), Some(2));
        assert!(mem.recall_storage_contents(s, Tick(60)).is_none());
        mem.forget_expired(Tick(60));
        assert!(mem.is_empty());
    }

    #[test]
    fn known_sources_sorted_and_filtered() {
        let mut world = open_world(10, 10);
        let a = world.add_storage(Storage::new("a", p(1, 1), 10)).unwrap();
        let b = world.add_storage(Storage::new("b", p(3, 3), 10)).unwrap();
        let c = world.add_storage(Storage::new("c", p(5, 5), 10)).unwrap();
        let mut mem = StorageMemory::new(100);
        mem.observe_storage(c, &Inventory::new(10).with(GRAIN, 1), Tick(0));
        mem.observe_storage(b, &Inventory::new(10), Tick(0));
        mem.observe_storage(a, &Inventory::new(10).with(GRAIN, 5), Tick(0));
        assert_eq!(mem.known_sources(GRAIN, Tick(1)), vec![a, c]);
    }
}

// ── Reactions CSV ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod reaction_tests {
    use std::io::Write;

    use act_core::ReactionId;

    use crate::{load_reactions_csv, load_reactions_reader};

    use super::*;

    const CSV: &str = "\
reaction_id,name,facility,inputs,outputs,duration_ticks,energy_multiplier
0,mill flour,mill,1:2,3:1,20,1.2
1,bake bread,oven,3:1;1:1,2:2,40,1.5
";

    #[test]
    fn parses_stacks() {
        let book = load_reactions_reader(CSV.as_bytes()).unwrap();
        assert_eq!(book.len(), 2);
        let bake = book.get(ReactionId(1)).unwrap();
        assert_eq!(bake.facility, FacilityKind::new("oven"));
        assert_eq!(bake.inputs, vec![(ItemId(3), 1), (GRAIN, 1)]);
        assert_eq!(bake.outputs, vec![(BREAD, 2)]);
        assert_eq!(bake.output_units(), 2);
        assert_eq!(bake.duration_ticks, 40);
    }

    #[test]
    fn zero_duration_rejected() {
        let csv = "reaction_id,name,facility,inputs,outputs,duration_ticks,energy_multiplier\n\
                   0,x,mill,1:1,2:1,0,1.0\n";
        assert!(matches!(load_reactions_reader(csv.as_bytes()), Err(WorldError::Parse(_))));
    }

    #[test]
    fn sparse_ids_rejected() {
        let csv = "reaction_id,name,facility,inputs,outputs,duration_ticks,energy_multiplier\n\
                   3,x,mill,1:1,2:1,5,1.0\n";
        assert!(load_reactions_reader(csv.as_bytes()).is_err());
    }

    #[test]
    fn bad_stack_rejected() {
        let csv = "reaction_id,name,facility,inputs,outputs,duration_ticks,energy_multiplier\n\
                   0,x,mill,grain,2:1,5,1.0\n";
        assert!(matches!(load_reactions_reader(csv.as_bytes()), Err(WorldError::Parse(_))));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CSV.as_bytes()).unwrap();
        let book = load_reactions_csv(file.path()).unwrap();
        assert_eq!(book.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(), ["mill flour", "bake bread"]);
    }
}

// ── Agents ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod agents_tests {
    use super::*;
    use crate::{AgentStates, Skill};

    #[test]
    fn spawn_rejects_occupied_tile() {
        let mut agents = AgentStates::new();
        let a = agents.spawn(p(1, 1), 5).unwrap();
        assert!(matches!(agents.spawn(p(1, 1), 5), Err(WorldError::Occupied { by, .. }) if by == a));
    }

    #[test]
    fn move_updates_occupancy() {
        let mut agents = AgentStates::new();
        let a = agents.spawn(p(0, 0), 5).unwrap();
        let b = agents.spawn(p(2, 0), 5).unwrap();
        agents.move_agent(a, p(1, 0)).unwrap();
        assert_eq!(agents.occupant(p(0, 0)), None);
        assert_eq!(agents.occupant(p(1, 0)), Some(a));
        assert!(agents.move_agent(a, p(2, 0)).is_err());
        assert_eq!(agents.position(b), p(2, 0));
    }

    #[test]
    fn swap_exchanges_tiles() {
        let mut agents = AgentStates::new();
        let a = agents.spawn(p(0, 0), 5).unwrap();
        let b = agents.spawn(p(1, 0), 5).unwrap();
        agents.swap(a, b).unwrap();
        assert_eq!(agents.position(a), p(1, 0));
        assert_eq!(agents.occupant(p(0, 0)), Some(b));
        assert!(agents.swap(a, AgentId(9)).is_err());
    }

    #[test]
    fn xp_accumulates_per_skill() {
        let mut agents = AgentStates::new();
        let a = agents.spawn(p(0, 0), 5).unwrap();
        agents.grant_xp(a, Skill::Farming, 1.5);
        agents.grant_xp(a, Skill::Farming, 1.0);
        assert_eq!(agents.xp(a, Skill::Farming), 2.5);
        assert_eq!(agents.xp(a, Skill::Crafting), 0.0);
    }
}

// ── World ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod world_tests {
    use super::*;
    use crate::{Claims, Room};

    #[test]
    fn storage_blocks_its_tile_until_removed() {
        let mut world = open_world(5, 5);
        let s = world.add_storage(Storage::new("bin", p(2, 2), 10)).unwrap();
        assert!(!world.map.is_walkable(p(2, 2)));
        world.remove_storage(s).unwrap();
        assert!(world.map.is_walkable(p(2, 2)));
        assert!(world.storage(s).is_err());
    }

    #[test]
    fn facility_on_blocked_tile_rejected() {
        let mut world = open_world(5, 5);
        world.map.set_blocked(p(1, 1), true).unwrap();
        let err = world.add_facility(Facility::new(FacilityKind::new("oven"), p(1, 1), 4));
        assert!(matches!(err, Err(WorldError::NotWalkable(_))));
    }

    #[test]
    fn container_access_and_reach() {
        let mut world = open_world(5, 5);
        let s = world
            .add_storage(Storage { contents: Inventory::new(10).with(GRAIN, 3), ..Storage::new("bin", p(2, 2), 10) })
            .unwrap();
        let f = world.add_facility(Facility::new(FacilityKind::new("field"), p(4, 4), 4)).unwrap();
        world.container_mut(Container::FacilityOutput(f)).unwrap().add(GRAIN, 1).unwrap();

        assert_eq!(world.container(Container::Storage(s)).unwrap().count(GRAIN), 3);
        assert_eq!(world.container(Container::FacilityOutput(f)).unwrap().count(GRAIN), 1);
        assert!(world.can_reach(p(1, 1), Container::Storage(s)));
        assert!(!world.can_reach(p(0, 0), Container::Storage(s)));
        assert!(world.can_reach(p(4, 4), Container::FacilityOutput(f)));

        world.remove_facility(f).unwrap();
        assert!(world.container(Container::FacilityOutput(f)).is_err());
        assert!(!world.can_reach(p(4, 4), Container::FacilityOutput(f)));
    }

    #[test]
    fn room_lookup() {
        let mut world = open_world(10, 10);
        let granary = world.add_room(Room::new("granary", p(0, 0), p(3, 3)));
        assert_eq!(world.room_at(p(3, 3)), Some(granary));
        assert_eq!(world.room_at(p(4, 3)), None);
    }

    #[test]
    fn perception_respects_radius() {
        let mut world = open_world(20, 20);
        let near = world.add_storage(Storage::new("near", p(3, 3), 10)).unwrap();
        let _far = world.add_storage(Storage::new("far", p(15, 15), 10)).unwrap();
        let field = world.add_facility(Facility::new(FacilityKind::new("field"), p(5, 0), 4)).unwrap();
        let me = world.agents.spawn(p(0, 0), 5).unwrap();
        let other = world.agents.spawn(p(4, 4), 5).unwrap();
        let _distant = world.agents.spawn(p(19, 19), 5).unwrap();

        world.claims.claim_facility(field, other);
        let seen = world.perceive(me, 5, vec![PerceptionEvent::Resumed]);

        assert_eq!(seen.storages.iter().map(|s| s.id).collect::<Vec<_>>(), vec![near]);
        assert_eq!(seen.facilities.len(), 1);
        assert_eq!(seen.facilities[0].claimed_by, Some(other));
        assert_eq!(seen.agents, vec![(other, p(4, 4))]);
        assert!(seen.has_resume());
        assert_eq!(seen.agent_at(p(4, 4)), Some(other));
    }

    #[test]
    fn nearest_storage_filter() {
        let mut world = open_world(20, 20);
        let _empty = world.add_storage(Storage::new("empty", p(1, 1), 10)).unwrap();
        let full = world
            .add_storage(Storage { contents: Inventory::new(10).with(BREAD, 1), ..Storage::new("full", p(9, 9), 10) })
            .unwrap();
        assert_eq!(world.nearest_storage(p(0, 0), |s| s.contents.count(BREAD) > 0), Some(full));
        assert_eq!(world.nearest_storage(p(0, 0), |s| s.contents.count(GRAIN) > 0), None);
    }

    #[test]
    fn claims_lowest_agent_wins() {
        let mut world = open_world(5, 5);
        let f = world.add_facility(Facility::new(FacilityKind::new("oven"), p(1, 1), 4)).unwrap();
        let mut claims = Claims::default();
        claims.claim_facility(f, AgentId(4));
        claims.claim_facility(f, AgentId(2));
        claims.claim_facility(f, AgentId(3));
        assert_eq!(claims.facility_holder(f), Some(AgentId(2)));
        claims.clear();
        assert_eq!(claims.facility_holder(f), None);
    }
}

//! `act-world`: the collaborators an activity talks to.
//!
//! Nothing in here decides *what* an agent does.  These are the contracts
//! the activity engine consumes: where things are, how to walk there, what
//! a container holds, how hungry the agent is, what it remembers, and what
//! it can see this tick.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                      |
//! |----------------|---------------------------------------------------------------|
//! | [`arena`]      | `Arena<T>`: generational registry behind `Handle<T>`         |
//! | [`entity`]     | `Room`, `Facility`, `FacilityKind`, `Storage`, `Container`    |
//! | [`inventory`]  | `Inventory`: item counts with capacity                       |
//! | [`map`]        | `GridMap`: walkable tiles                                    |
//! | [`path`]       | `Goal`, `Pathfinder` trait, `AStar`, `PathOutcome`            |
//! | [`navigator`]  | `Navigator`: goal-seeking with a bounded stuck counter      |
//! | [`needs`]      | `NeedKind`, `Need`, `Needs`, `Skill`                          |
//! | [`memory`]     | `StorageMemory`: storage observations with expiry            |
//! | [`perception`] | `Perception` snapshot, `PerceptionEvent`, `InterruptionReason`|
//! | [`reaction`]   | `ReactionDef`, `ReactionBook`, CSV loader                     |
//! | [`agents`]     | `AgentStates`: positions, inventories, needs, skill XP       |
//! | [`spatial`]    | R-tree of facilities and storages for perception queries      |
//! | [`world`]      | `World`, `Claims`                                             |
//! | [`error`]      | `WorldError`, `WorldResult<T>`                                |
//!
//! # Mutation rules
//!
//! `World` is only mutated at the tick's synchronisation point (the apply
//! phase in act-sim).  During the decision phase every agent sees it through
//! a shared `&World`.  `StorageMemory` is the exception: it is owned by one
//! agent and only that agent's decision task writes to it.

pub mod agents;
pub mod arena;
pub mod entity;
pub mod error;
pub mod inventory;
pub mod map;
pub mod memory;
pub mod navigator;
pub mod needs;
pub mod path;
pub mod perception;
pub mod reaction;
pub mod spatial;
pub mod world;

#[cfg(test)]
mod tests;

pub use agents::AgentStates;
pub use arena::Arena;
pub use entity::{Container, Facility, FacilityId, FacilityKind, Room, RoomId, Storage, StorageId};
pub use error::{WorldError, WorldResult};
pub use inventory::Inventory;
pub use map::GridMap;
pub use memory::StorageMemory;
pub use navigator::{NavStep, Navigator};
pub use needs::{Need, NeedKind, Needs, Skill};
pub use path::{AStar, Goal, PathOutcome, Pathfinder};
pub use perception::{InterruptionReason, Perception, PerceptionEvent, SeenFacility, SeenStorage};
pub use reaction::{ReactionBook, ReactionDef, load_reactions_csv, load_reactions_reader};
pub use world::{Claims, World};

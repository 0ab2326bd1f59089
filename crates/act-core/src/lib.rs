//! `act-core`: foundational types for the `act` activity engine.
//!
//! Every other `act-*` crate depends on this one.  It has no `act-*`
//! dependencies and only `rand` and `thiserror` externally (plus optional
//! `serde`).
//!
//! # What lives here
//!
//! | Module        | Contents                                                |
//! |---------------|---------------------------------------------------------|
//! | [`ids`]       | `AgentId`, `ItemId`, `ReactionId`                       |
//! | [`handle`]    | `Handle<T>`: generational reference into an arena      |
//! | [`grid`]      | `GridPos`, neighbourhood and distance helpers           |
//! | [`time`]      | `Tick`, `SimClock`, `SimConfig`                         |
//! | [`rng`]       | `AgentRng`, one stream per agent                        |
//! | [`error`]     | `CoreError`, `CoreResult`                               |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to IDs, positions, config.  |

pub mod error;
pub mod grid;
pub mod handle;
pub mod ids;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{CoreError, CoreResult};
pub use grid::GridPos;
pub use handle::Handle;
pub use ids::{AgentId, ItemId, ReactionId};
pub use rng::AgentRng;
pub use time::{SimClock, SimConfig, Tick};

use act_core::{AgentId, CoreError, GridPos, ItemId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorldError {
    /// A handle whose slot was freed (or never existed).
    #[error("stale {kind} handle {handle}")]
    StaleHandle {
        kind:   &'static str,
        handle: String,
    },

    #[error("position {0} is outside the map")]
    OutOfBounds(GridPos),

    #[error("position {0} is not walkable")]
    NotWalkable(GridPos),

    #[error("position {pos} is occupied by {by}")]
    Occupied {
        pos: GridPos,
        by:  AgentId,
    },

    #[error("agent {0} does not exist")]
    UnknownAgent(AgentId),

    #[error("not enough {item}: wanted {wanted}, have {have}")]
    InsufficientItems {
        item:   ItemId,
        wanted: u32,
        have:   u32,
    },

    #[error("container full: {free} free, {wanted} wanted")]
    ContainerFull {
        free:   u32,
        wanted: u32,
    },

    #[error("reaction parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type WorldResult<T> = Result<T, WorldError>;

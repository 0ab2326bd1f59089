use act_core::{AgentId, CoreError};
use act_world::WorldError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(String),

    #[error("unknown agent {0}")]
    UnknownAgent(AgentId),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("world error: {0}")]
    World(#[from] WorldError),
}

pub type SimResult<T> = Result<T, SimError>;

use act_core::ReactionId;
use act_engine::EngineError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BehaviorError {
    #[error("invalid behavior config: {0}")]
    Config(String),

    #[error("unknown reaction {0}")]
    UnknownReaction(ReactionId),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

pub type BehaviorResult<T> = Result<T, BehaviorError>;

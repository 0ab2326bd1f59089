//! Core error type.
//!
//! Higher crates keep their own enums and wrap `CoreError` as one variant.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Config(String),
}

/// Shorthand result type for `act-core`.
pub type CoreResult<T> = Result<T, CoreError>;

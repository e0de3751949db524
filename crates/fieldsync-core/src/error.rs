//! Configuration errors shared by the route and job layers.
//!
//! These are never retried: a bad chunk limit or a missing job input will not
//! fix itself on the next attempt.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigurationError {
    /// Chunk limit must allow at least one new stop per chunk.
    #[error("chunk limit must be at least 2, got {0}")]
    InvalidChunkLimit(usize),
    /// A required job input key was not supplied.
    #[error("missing required input `{0}`")]
    MissingInput(String),
    /// A job input key was present but unusable.
    #[error("invalid input `{key}`: {reason}")]
    InvalidInput { key: String, reason: String },
    /// The job needs a signed-in session and none was passed in the context.
    #[error("no active session for job `{0}`")]
    MissingSession(String),
}

//! Cross-cutting error types for Tally.
//!
//! Domain-specific errors (`DatabaseError`, `ConfigError`) live in their
//! respective crates. `ApiError` in `tally-server` is where all of them
//! converge into HTTP responses.

use thiserror::Error;

/// Errors that can be raised by any Tally crate.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// Entity lookup returned no result.
    #[error("Entity not found: {entity_type} {id}")]
    NotFound { entity_type: String, id: String },

    /// Caller input failed validation. Raised before any statement runs.
    #[error("Validation error: {0}")]
    Validation(String),
}

impl CoreError {
    #[must_use]
    pub fn task_not_found(id: i64) -> Self {
        Self::NotFound {
            entity_type: "task".to_string(),
            id: id.to_string(),
        }
    }
}

//! Error types for task operations.

use thiserror::Error;

/// Errors surfaced by `TaskService` operations.
///
/// Load failures never appear here: an unreadable or unparseable data file
/// is downgraded to an empty collection by the store. Save failures do
/// propagate, so no mutation can silently vanish.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("task {0} not found")]
    NotFound(String),
    #[error("invalid status '{0}': must be one of todo, in-progress, review, done")]
    InvalidStatus(String),
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),
}

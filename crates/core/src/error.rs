use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    /// The record exists but its backing file is gone from storage.
    #[error("File for video {id} is missing from storage")]
    FileMissing { id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Delete blocked because other records still reference the target.
    #[error("Has dependents: {0}")]
    HasDependents(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

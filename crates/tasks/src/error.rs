use taskdeck_auth::FetchError;
use thiserror::Error;

use crate::validation::ValidationError;

/// Errors from task operations
#[derive(Error, Debug)]
pub enum TaskError {
    /// Rejected locally; nothing was sent
    #[error("Invalid task: {0}")]
    Validation(#[from] ValidationError),

    /// The server call failed; the local mirror is unchanged
    #[error("Task request failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Task {0} is not loaded")]
    NotFound(i64),
}

impl TaskError {
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

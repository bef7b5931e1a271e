//! Application-level errors (wraps domain errors)

use thiserror::Error;

use crate::domain::{DomainError, QuestionId};

/// Application errors wrap domain errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("edits under {parent} are blocked until its order chain is repaired")]
    SubtreeBlocked { parent: QuestionId },

    #[error("invalid form record: {0}")]
    Record(#[from] serde_json::Error),

    #[error("config error: {message}")]
    Config { message: String },
}

impl ApplicationError {
    /// The domain error behind this failure, if any.
    pub fn as_domain(&self) -> Option<&DomainError> {
        match self {
            ApplicationError::Domain(err) => Some(err),
            _ => None,
        }
    }
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;

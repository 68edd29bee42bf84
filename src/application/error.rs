//! Application-level errors (wraps domain errors)

use thiserror::Error;

use crate::domain::{DomainError, ValidationReport};

/// Application errors wrap domain errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("edit rejected: {0}")]
    Rejected(ValidationReport),

    #[error("unknown field: {0}")]
    UnknownField(String),

    #[error("field has no operators: {0}")]
    NoOperators(String),

    #[error("unknown group: {0}")]
    UnknownGroup(String),

    #[error("config error: {message}")]
    Config { message: String },
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;

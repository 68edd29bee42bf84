//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::entities::NodeKey;
use crate::domain::validate::ValidationReport;

/// Domain errors represent filter tree violations.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("node not found: {0}")]
    NodeNotFound(NodeKey),

    #[error("node is not a group: {0}")]
    NotAGroup(NodeKey),

    #[error("node is not a condition: {0}")]
    NotACondition(NodeKey),

    #[error("duplicate node key: {0}")]
    DuplicateKey(NodeKey),

    #[error("invalid filter: {0}")]
    InvalidFilter(ValidationReport),

    #[error("invalid catalog: {0}")]
    InvalidCatalog(ValidationReport),
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;

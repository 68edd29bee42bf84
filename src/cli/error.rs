//! CLI-level errors (wraps infrastructure errors)

use std::io;

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::{DomainError, ValidationReport};
use crate::infrastructure::InfraError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Infra(#[from] InfraError),

    #[error("invalid filter: {0}")]
    Validation(ValidationReport),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("{0}")]
    Usage(String),
}

impl From<ApplicationError> for CliError {
    fn from(e: ApplicationError) -> Self {
        CliError::Infra(InfraError::Application(e))
    }
}

impl From<DomainError> for CliError {
    fn from(e: DomainError) -> Self {
        CliError::Infra(InfraError::from(e))
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidArgs(_) | CliError::Usage(_) => crate::exitcode::USAGE,
            CliError::Validation(_) => crate::exitcode::DATAERR,
            CliError::Infra(e) => match e {
                InfraError::Io { source, .. } if source.kind() == io::ErrorKind::NotFound => {
                    crate::exitcode::NOINPUT
                }
                InfraError::Io { .. } => crate::exitcode::IOERR,
                InfraError::Parse { .. } | InfraError::UnsupportedFormat(_) => {
                    crate::exitcode::DATAERR
                }
                InfraError::Serialize { .. } => crate::exitcode::SOFTWARE,
                InfraError::Application(ApplicationError::Config { .. }) => {
                    crate::exitcode::CONFIG
                }
                InfraError::Application(_) => crate::exitcode::DATAERR,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NodeKey;

    #[test]
    fn test_exit_codes() {
        let missing = CliError::from(InfraError::io(
            "read filter: x.json",
            io::Error::new(io::ErrorKind::NotFound, "gone"),
        ));
        assert_eq!(missing.exit_code(), crate::exitcode::NOINPUT);

        let rejected = CliError::from(DomainError::NodeNotFound(NodeKey::from(1)));
        assert_eq!(rejected.exit_code(), crate::exitcode::DATAERR);

        let config = CliError::from(ApplicationError::Config {
            message: "bad".into(),
        });
        assert_eq!(config.exit_code(), crate::exitcode::CONFIG);

        assert_eq!(
            CliError::Usage("x".into()).exit_code(),
            crate::exitcode::USAGE
        );

        let serialize = CliError::from(InfraError::Serialize {
            what: "filter".into(),
            message: "bad".into(),
        });
        assert_eq!(serialize.exit_code(), crate::exitcode::SOFTWARE);
    }
}

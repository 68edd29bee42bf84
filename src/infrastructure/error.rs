//! Infrastructure-level errors (wraps application errors)

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::DomainError;

/// Infrastructure errors wrap application errors and add I/O-level concerns.
#[derive(Error, Debug)]
pub enum InfraError {
    #[error("{0}")]
    Application(#[from] ApplicationError),

    #[error("I/O error: {context}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("cannot parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("cannot serialize {what}: {message}")]
    Serialize { what: String, message: String },

    #[error("unsupported document format: {0}")]
    UnsupportedFormat(PathBuf),
}

impl InfraError {
    /// Create an I/O error with context.
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

impl From<DomainError> for InfraError {
    fn from(e: DomainError) -> Self {
        InfraError::Application(ApplicationError::Domain(e))
    }
}

/// Result type for infrastructure layer operations.
pub type InfraResult<T> = Result<T, InfraError>;

/// Extension trait for converting `io::Result` to `InfraResult` with path context.
pub trait IoResultExt<T> {
    /// Add path context to an I/O error.
    ///
    /// # Example
    /// ```ignore
    /// fs.read_to_string(&path)
    ///     .with_path_context("read filter", &path)?;
    /// ```
    fn with_path_context(self, action: &str, path: &Path) -> InfraResult<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn with_path_context(self, action: &str, path: &Path) -> InfraResult<T> {
        self.map_err(|e| InfraError::io(format!("{}: {}", action, path.display()), e))
    }
}

//! Infrastructure layer: filesystem access and document formats
//!
//! This layer implements the I/O boundary trait and the document store.

pub mod error;
pub mod store;
pub mod traits;

pub use error::{InfraError, InfraResult, IoResultExt};
pub use store::{filter_from_json, filter_to_json, DocumentFormat, DocumentStore};
pub use traits::{FileSystem, RealFileSystem};

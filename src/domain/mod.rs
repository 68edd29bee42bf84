//! Domain layer: filter tree model and business rules
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod builder;
pub mod display;
pub mod edit;
pub mod entities;
pub mod error;
pub mod tree;
pub mod validate;

pub use builder::FilterBuilder;
pub use display::{render, TreeDisplay};
pub use edit::{Edit, Target};
pub use entities::*;
pub use error::{DomainError, DomainResult};
pub use tree::{NodePath, NodeRef, TreeIterator};
pub use validate::{validate, Limits, ValidationReport, Violation};

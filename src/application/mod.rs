//! Application layer: the filter control contract
//!
//! This layer turns user edits into replacement trees and notifies the host.

pub mod control;
pub mod error;

pub use control::{
    ChangeListener, FilterControl, FilterControlProps, KeyStyle, LatestValue, ValidationPolicy,
};
pub use error::{ApplicationError, ApplicationResult};

//! Filter condition trees.
//!
//! A filter is a tree of groups (and/or combinators) and leaf conditions
//! (`field operator value`), checked against a catalog of fields, operators
//! and groups supplied by the host.
//!
//! - [`domain`]: the tree model, pure edits, traversal and validation
//! - [`application`]: [`application::FilterControl`], which turns edits into
//!   whole replacement trees and notifies a change listener
//! - [`infrastructure`]: JSON/TOML documents on disk
//! - [`config`]: layered settings
//! - [`cli`]: the `filterctl` command line host

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;

//! CLI argument definitions using clap

use std::path::PathBuf;
use std::str::FromStr;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

use crate::domain::{NodeKey, Value};

/// Filter condition trees: inspect, validate and edit filter documents
#[derive(Parser, Debug)]
#[command(name = "filterctl")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Catalog file, JSON or TOML (default: from config)
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub catalog: Option<PathBuf>,

    /// Print the resulting document instead of writing it
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create an empty filter document
    New {
        /// Filter document (JSON)
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Root group
        #[arg(short, long, default_value = "and")]
        group: String,
        /// Overwrite an existing document
        #[arg(long)]
        force: bool,
    },

    /// Print a filter as a tree
    Show {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Use catalog captions instead of names
        #[arg(long)]
        captions: bool,
    },

    /// List leaf conditions with their paths
    Conditions {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Validate a filter against the catalog
    Validate {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Inspect the catalog
    Catalog {
        #[command(subcommand)]
        command: CatalogCommands,
    },

    /// Apply one edit and write the replacement tree
    Edit {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        #[command(subcommand)]
        command: EditCommands,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum CatalogCommands {
    /// Check for duplicate field, operator and group names
    Check,
    /// List fields with their operators, and groups
    Show,
}

#[derive(Subcommand, Debug)]
pub enum EditCommands {
    /// Add a condition
    AddCondition {
        /// Parent group key (default: root)
        #[arg(long, allow_negative_numbers = true, value_parser = NodeKey::from_str)]
        parent: Option<NodeKey>,
        #[arg(long)]
        field: String,
        /// Operator (default: the field's first operator)
        #[arg(long)]
        operator: Option<String>,
        /// Value as JSON literal; anything else is taken as text
        #[arg(long, allow_hyphen_values = true, value_parser = Value::from_str)]
        value: Option<Value>,
    },

    /// Add an empty group
    AddGroup {
        /// Parent group key (default: root)
        #[arg(long, allow_negative_numbers = true, value_parser = NodeKey::from_str)]
        parent: Option<NodeKey>,
        /// Group name (default: the catalog's first group)
        #[arg(long)]
        group: Option<String>,
    },

    /// Remove a condition or group (with its subtree)
    Remove {
        #[arg(allow_negative_numbers = true, value_parser = NodeKey::from_str)]
        key: NodeKey,
    },

    /// Change the field of a condition
    SetField {
        #[arg(allow_negative_numbers = true, value_parser = NodeKey::from_str)]
        key: NodeKey,
        field: String,
    },

    /// Change the operator of a condition
    SetOperator {
        #[arg(allow_negative_numbers = true, value_parser = NodeKey::from_str)]
        key: NodeKey,
        operator: String,
    },

    /// Change the value of a condition
    SetValue {
        #[arg(allow_negative_numbers = true, value_parser = NodeKey::from_str)]
        key: NodeKey,
        #[arg(allow_negative_numbers = true, value_parser = Value::from_str)]
        value: Value,
    },

    /// Change the group of a branch
    SetGroup {
        /// Group key (default: root)
        #[arg(long, allow_negative_numbers = true, value_parser = NodeKey::from_str)]
        key: Option<NodeKey>,
        group: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective configuration
    Show,
    /// Print a commented configuration template
    Template,
    /// Show config file locations
    Path,
}

//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/filterctl/filterctl.toml`
//! 3. Local config: `<dir>/.filterctl.toml` (usually the working directory)
//! 4. Environment variables: `FILTERCTL_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::de::{DeserializeOwned, IntoDeserializer};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::{ApplicationError, KeyStyle, ValidationPolicy};
use crate::domain::Limits;

/// Unified configuration for filterctl.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Default catalog file (JSON or TOML)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog: Option<PathBuf>,
    /// Key generation for new nodes
    pub key_style: KeyStyle,
    /// Handling of edits that produce an invalid tree
    pub validation: ValidationPolicy,
    /// Maximum tree depth (unlimited when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,
    /// Pretty-print written filter documents
    pub pretty: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            catalog: None,
            key_style: KeyStyle::Sequential,
            validation: ValidationPolicy::Strict,
            max_depth: None,
            pretty: true,
        }
    }
}

/// Raw settings for intermediate parsing (`None` → not specified, inherit).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub catalog: Option<PathBuf>,
    pub key_style: Option<KeyStyle>,
    pub validation: Option<ValidationPolicy>,
    pub max_depth: Option<usize>,
    pub pretty: Option<bool>,
}

/// Expand `~`, `$VAR` and `${VAR}` in a path string.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}

/// Get the XDG config directory for filterctl.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "filterctl").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("filterctl.toml"))
}

/// Get the path to the local config file in a directory.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(".filterctl.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Validation limits derived from these settings.
    pub fn limits(&self) -> Limits {
        Limits {
            max_depth: self.max_depth,
        }
    }

    /// Expand shell variables and tilde in path-like fields.
    fn expand_paths(&mut self) {
        if let Some(catalog) = &self.catalog {
            let expanded = expand_env_vars(catalog.to_string_lossy().as_ref());
            self.catalog = Some(PathBuf::from(expanded));
        }
    }

    /// Overlay wins where it specifies a value.
    ///
    /// A relative catalog path is resolved against `base_dir`, the directory
    /// of the config file that declared it.
    fn merge_with(&self, overlay: &RawSettings, base_dir: Option<&Path>) -> Self {
        let catalog = overlay
            .catalog
            .as_ref()
            .map(|p| resolve_relative(p, base_dir))
            .or_else(|| self.catalog.clone());
        Self {
            catalog,
            key_style: overlay.key_style.unwrap_or(self.key_style),
            validation: overlay.validation.unwrap_or(self.validation),
            max_depth: overlay.max_depth.or(self.max_depth),
            pretty: overlay.pretty.unwrap_or(self.pretty),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_dir` - Optional directory holding a `.filterctl.toml`
    ///
    /// # Precedence (lowest to highest)
    /// 1. Compiled defaults
    /// 2. Global config: `$XDG_CONFIG_HOME/filterctl/filterctl.toml`
    /// 3. Local config: `<local_dir>/.filterctl.toml`
    /// 4. Environment variables: `FILTERCTL_*` prefix
    pub fn load(local_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                debug!("loading global config: {}", global_path.display());
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw, global_path.parent());
            }
        }

        if let Some(dir) = local_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                debug!("loading local config: {}", local_path.display());
                let raw = load_raw_settings(&local_path)?;
                current = current.merge_with(&raw, Some(dir));
            }
        }

        current = Self::apply_env_overrides(current)?;

        current.expand_paths();

        Ok(current)
    }

    /// Apply FILTERCTL_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        // Use config crate just for env var parsing
        let config = Config::builder()
            .add_source(Environment::with_prefix("FILTERCTL").try_parsing(true))
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("catalog") {
            settings.catalog = Some(PathBuf::from(val));
        }
        if let Ok(val) = config.get_string("key_style") {
            settings.key_style = parse_enum("key_style", &val)?;
        }
        if let Ok(val) = config.get_string("validation") {
            settings.validation = parse_enum("validation", &val)?;
        }
        if let Ok(val) = config.get::<usize>("max_depth") {
            settings.max_depth = Some(val);
        }
        if let Ok(val) = config.get_bool("pretty") {
            settings.pretty = val;
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# filterctl configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/filterctl/filterctl.toml
#   Local:  ./.filterctl.toml
#   Env:    FILTERCTL_* environment variables (explicit overrides)

# Catalog of fields, operators and groups (JSON or TOML).
# Relative paths resolve against the directory of this file.
# catalog = "catalog.toml"

# Keys for new nodes: "sequential" (max numeric key + 1) or "uuid"
# key_style = "sequential"

# Edits producing an invalid tree: "strict" rejects them, "report" keeps them
# validation = "strict"

# Maximum tree depth (a bare root has depth 1)
# max_depth = 8

# Pretty-print written filter documents
# pretty = true
"#
        .to_string()
    }
}

fn resolve_relative(path: &Path, base_dir: Option<&Path>) -> PathBuf {
    let expanded = PathBuf::from(expand_env_vars(path.to_string_lossy().as_ref()));
    match base_dir {
        Some(dir) if expanded.is_relative() => dir.join(expanded),
        _ => expanded,
    }
}

fn parse_enum<T: DeserializeOwned>(key: &str, raw: &str) -> Result<T, ApplicationError> {
    let lowered = raw.trim().to_ascii_lowercase();
    let de: serde::de::value::StrDeserializer<'_, serde::de::value::Error> =
        lowered.as_str().into_deserializer();
    T::deserialize(de).map_err(|e| ApplicationError::Config {
        message: format!("{key}: {e}"),
    })
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

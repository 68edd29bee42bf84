//! Catalog and filter documents on disk.
//!
//! Filter trees are JSON. Catalogs are JSON or TOML, chosen by file extension.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::domain::{Catalog, FilterValue};
use crate::infrastructure::error::{InfraError, InfraResult, IoResultExt};
use crate::infrastructure::traits::{FileSystem, RealFileSystem};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Toml,
}

impl DocumentFormat {
    pub fn from_path(path: &Path) -> InfraResult<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(DocumentFormat::Json),
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Ok(DocumentFormat::Toml),
            _ => Err(InfraError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    fn parse<T: DeserializeOwned>(&self, content: &str, path: &Path) -> InfraResult<T> {
        let parsed = match self {
            DocumentFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
            DocumentFormat::Toml => toml::from_str(content).map_err(|e| e.to_string()),
        };
        parsed.map_err(|message| InfraError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }

    fn render<T: Serialize>(&self, value: &T, pretty: bool, what: &str) -> InfraResult<String> {
        let rendered = match (self, pretty) {
            (DocumentFormat::Json, true) => serde_json::to_string_pretty(value).map_err(|e| e.to_string()),
            (DocumentFormat::Json, false) => serde_json::to_string(value).map_err(|e| e.to_string()),
            (DocumentFormat::Toml, true) => toml::to_string_pretty(value).map_err(|e| e.to_string()),
            (DocumentFormat::Toml, false) => toml::to_string(value).map_err(|e| e.to_string()),
        };
        rendered.map_err(|message| InfraError::Serialize {
            what: what.to_string(),
            message,
        })
    }
}

/// Serialize a filter tree to its JSON wire shape.
pub fn filter_to_json(tree: &FilterValue, pretty: bool) -> InfraResult<String> {
    DocumentFormat::Json.render(tree, pretty, "filter")
}

/// Parse a filter tree from its JSON wire shape.
pub fn filter_from_json(content: &str) -> InfraResult<FilterValue> {
    DocumentFormat::Json.parse(content, Path::new("<input>"))
}

/// Reads and writes catalogs and filter trees through a [`FileSystem`].
pub struct DocumentStore<F: FileSystem = RealFileSystem> {
    fs: F,
    pretty: bool,
}

impl Default for DocumentStore<RealFileSystem> {
    fn default() -> Self {
        Self::new(RealFileSystem)
    }
}

impl<F: FileSystem> DocumentStore<F> {
    pub fn new(fs: F) -> Self {
        Self { fs, pretty: true }
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn exists(&self, path: &Path) -> bool {
        self.fs.exists(path)
    }

    /// Load a catalog and check it for duplicate names.
    #[instrument(level = "debug", skip(self))]
    pub fn load_catalog(&self, path: &Path) -> InfraResult<Catalog> {
        let format = DocumentFormat::from_path(path)?;
        let content = self
            .fs
            .read_to_string(path)
            .with_path_context("read catalog", path)?;
        let catalog: Catalog = format.parse(&content, path)?;
        catalog.ensure_consistent()?;
        debug!("loaded catalog with {} field(s)", catalog.fields.len());
        Ok(catalog)
    }

    #[instrument(level = "debug", skip(self, catalog))]
    pub fn save_catalog(&self, path: &Path, catalog: &Catalog) -> InfraResult<()> {
        let format = DocumentFormat::from_path(path)?;
        let content = format.render(catalog, self.pretty, "catalog")?;
        self.write(path, &content)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn load_filter(&self, path: &Path) -> InfraResult<FilterValue> {
        let content = self
            .fs
            .read_to_string(path)
            .with_path_context("read filter", path)?;
        let tree: FilterValue = DocumentFormat::Json.parse(&content, path)?;
        debug!("loaded filter with {} node(s)", tree.len());
        Ok(tree)
    }

    #[instrument(level = "debug", skip(self, tree))]
    pub fn save_filter(&self, path: &Path, tree: &FilterValue) -> InfraResult<()> {
        let mut content = filter_to_json(tree, self.pretty)?;
        content.push('\n');
        self.write(path, &content)
    }

    fn write(&self, path: &Path, content: &str) -> InfraResult<()> {
        self.fs
            .ensure_parent(path)
            .with_path_context("create directory for", path)?;
        self.fs
            .write(path, content)
            .with_path_context("write", path)
    }
}

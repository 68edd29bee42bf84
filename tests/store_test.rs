//! Tests for reading and writing catalog and filter documents

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tempfile::TempDir;

use filterctl::application::ApplicationError;
use filterctl::domain::{
    Catalog, DomainError, Field, FilterBuilder, FilterValue, Group, Operator, ValueKind,
};
use filterctl::infrastructure::{DocumentStore, FileSystem, InfraError};
use filterctl::util::testing;

#[derive(Default)]
struct MemoryFileSystem {
    files: Mutex<HashMap<PathBuf, String>>,
}

impl FileSystem for MemoryFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such file"))
    }

    fn write(&self, path: &Path, content: &str) -> io::Result<()> {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), content.to_string());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.lock().unwrap().contains_key(path)
    }

    fn ensure_parent(&self, _path: &Path) -> io::Result<()> {
        Ok(())
    }
}

fn sample_tree() -> FilterValue {
    FilterBuilder::new("and")
        .condition("age", "gt", 18)
        .group("or", |g| {
            g.condition("name", "contains", "smith")
                .condition("active", "equal", true)
        })
        .build()
}

fn sample_catalog() -> Catalog {
    Catalog::new(vec![
        Field::new("age", "Age")
            .with_operator(Operator::new("gt", "Greater than").with_value(ValueKind::Number)),
        Field::new("name", "Name").with_operator(Operator::new("equal", "Equals")),
    ])
}

#[test]
fn given_temp_dir_when_saving_filter_then_loads_identical_tree() {
    testing::init_test_setup();

    // Arrange
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested/dir/filter.json");
    let store = DocumentStore::default();
    let tree = sample_tree();

    // Act
    store.save_filter(&path, &tree).unwrap();
    let loaded = store.load_filter(&path).unwrap();

    // Assert
    assert_eq!(loaded, tree);
    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.ends_with('\n'));
    assert!(content.contains("\"groupName\": \"and\""), "{content}");
}

#[test]
fn given_compact_store_when_saving_filter_then_single_line() {
    let fs = MemoryFileSystem::default();
    let store = DocumentStore::new(fs).with_pretty(false);
    let path = Path::new("filter.json");
    let tree = FilterBuilder::new("AND").condition("age", "gt", 18).build();

    store.save_filter(path, &tree).unwrap();

    assert!(store.exists(path));
    let loaded = store.load_filter(path).unwrap();
    assert_eq!(loaded, tree);
}

#[test]
fn given_missing_file_when_loading_filter_then_io_not_found() {
    let store = DocumentStore::new(MemoryFileSystem::default());

    let result = store.load_filter(Path::new("missing.json"));

    match result {
        Err(InfraError::Io { source, .. }) => assert_eq!(source.kind(), io::ErrorKind::NotFound),
        other => panic!("expected I/O error, got {other:?}"),
    }
}

#[test]
fn given_malformed_json_when_loading_filter_then_parse_error() {
    let fs = MemoryFileSystem::default();
    fs.write(Path::new("bad.json"), "{\"groupName\": ").unwrap();
    let store = DocumentStore::new(fs);

    let result = store.load_filter(Path::new("bad.json"));

    assert!(matches!(result, Err(InfraError::Parse { .. })));
}

#[test]
fn given_yaml_extension_when_loading_catalog_then_unsupported_format() {
    let store = DocumentStore::new(MemoryFileSystem::default());

    let result = store.load_catalog(Path::new("catalog.yaml"));

    assert!(matches!(result, Err(InfraError::UnsupportedFormat(_))));
}

#[test]
fn given_catalog_when_saving_as_toml_and_json_then_both_load_back() {
    let temp_dir = TempDir::new().unwrap();
    let store = DocumentStore::default();
    let catalog = sample_catalog().with_groups(vec![Group::new("and", "All of")]);

    for name in ["catalog.toml", "catalog.JSON"] {
        let path = temp_dir.path().join(name);
        store.save_catalog(&path, &catalog).unwrap();
        let loaded = store.load_catalog(&path).unwrap();
        assert_eq!(loaded, catalog, "{name}");
    }
}

#[test]
fn given_duplicate_field_names_when_loading_catalog_then_invalid_catalog() {
    let fs = MemoryFileSystem::default();
    let content = r#"{"fields":[{"name":"age","caption":"Age"},{"name":"age","caption":"Age again"}]}"#;
    fs.write(Path::new("catalog.json"), content).unwrap();
    let store = DocumentStore::new(fs);

    let result = store.load_catalog(Path::new("catalog.json"));

    assert!(matches!(
        result,
        Err(InfraError::Application(ApplicationError::Domain(
            DomainError::InvalidCatalog(_)
        )))
    ));
}

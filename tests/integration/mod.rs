// Integration test utilities and common code
// WHY: Centralized utilities avoid duplication across integration tests

#![allow(dead_code)]

pub mod fixtures;

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use cuelist::{CharacterDetector, CharacterRecord, CharacterRegistry};

/// Test fixture helper for creating temporary directories with screenplay files
pub struct TestFixture {
    pub temp_dir: TempDir,
    pub root_path: PathBuf,
}

impl TestFixture {
    /// Create a new test fixture with temporary directory
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root_path = temp_dir.path().to_path_buf();

        Self { temp_dir, root_path }
    }

    /// Create a screenplay file with given content
    pub fn create_script<P: AsRef<Path>>(&self, relative_path: P, content: &str) -> PathBuf {
        let file_path = self.root_path.join(relative_path);

        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }

        fs::write(&file_path, content).expect("Failed to write test file");
        file_path
    }

    /// Path inside the fixture root that does not exist yet
    pub fn path<P: AsRef<Path>>(&self, relative_path: P) -> PathBuf {
        self.root_path.join(relative_path)
    }
}

/// Run detection over a whole screenplay with default settings
pub fn detect(text: &str) -> CharacterDetector {
    let mut detector = CharacterDetector::with_default_config().expect("Failed to build detector");
    detector.ingest_text(text);
    detector
}

/// Record by case-insensitive alias, panicking with the registry contents if absent
pub fn record<'a>(registry: &'a CharacterRegistry, name: &str) -> &'a CharacterRecord {
    registry.lookup(name).unwrap_or_else(|| {
        let names: Vec<&str> = registry.iter().map(|r| r.primary_name.as_str()).collect();
        panic!("No identity for {name:?}; registry holds {names:?}")
    })
}

/// Primary names in registry (insertion) order
pub fn primary_names(registry: &CharacterRegistry) -> Vec<String> {
    registry.iter().map(|r| r.primary_name.clone()).collect()
}

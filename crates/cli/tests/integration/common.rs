//! Shared test helpers for CLI integration tests.

use std::path::PathBuf;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::Value;
use tempfile::TempDir;

/// Get path to a fixture file.
pub fn fixture_path(name: &str) -> PathBuf {
  PathBuf::from(env!("CARGO_MANIFEST_DIR"))
    .join("tests")
    .join("fixtures")
    .join(name)
}

/// Read fixture content.
pub fn fixture_content(name: &str) -> String {
  std::fs::read_to_string(fixture_path(name)).unwrap_or_else(|e| panic!("Failed to load fixture {}: {}", name, e))
}

/// Isolated test environment.
///
/// Each test gets its own temporary directory holding a document, a batch
/// file, and whatever the run exports.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  /// Create an empty test environment.
  pub fn empty() -> Self {
    Self {
      temp: TempDir::new().unwrap(),
    }
  }

  /// Create from fixture files, copied into the temp directory under their
  /// own names.
  pub fn from_fixtures(names: &[&str]) -> Self {
    let env = Self::empty();
    for name in names {
      env.write_file(name, &fixture_content(name));
    }
    env
  }

  /// The promo document plus its two-task batch file.
  pub fn promo() -> Self {
    Self::from_fixtures(&["promo.json", "promo_batch.json"])
  }

  /// Write a file relative to the temp directory.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.temp.path().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }

  /// Absolute path of a file inside the temp directory.
  pub fn path(&self, relative_path: &str) -> PathBuf {
    self.temp.path().join(relative_path)
  }

  /// Parse a JSON file (usually an exported render) relative to the temp
  /// directory.
  pub fn read_json(&self, relative_path: &str) -> Value {
    let path = self.path(relative_path);
    let content = std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e));
    serde_json::from_str(&content).unwrap_or_else(|e| panic!("Invalid JSON in {}: {}", path.display(), e))
  }

  /// Get a pre-configured Command for the layersync binary.
  ///
  /// Runs in the temp directory so relative paths in batch files resolve
  /// there.
  pub fn layersync_cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("layersync");
    cmd.current_dir(self.temp.path());
    cmd
  }
}

/// Walk a render's document tree by element names and return the node.
pub fn element<'a>(render: &'a Value, route: &[&str]) -> &'a Value {
  let mut node = &render["document"];
  for name in route {
    let pool = node.get("layers").unwrap_or(&node["children"]);
    node = pool
      .as_array()
      .and_then(|nodes| nodes.iter().find(|n| n["name"] == *name))
      .unwrap_or_else(|| panic!("no element named {} in render", name));
  }
  node
}

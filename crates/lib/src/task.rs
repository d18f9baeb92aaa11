//! Export tasks and batch file loading.
//!
//! A batch file is one JSON document: an optional `settings` block (document
//! path, export directory, format, filename suffix, shadow suffix) and an
//! ordered `tasks` array. Task names may be JSON strings or numbers; numbers
//! are de-fractionalized (`3.0` → `"3"`), since they usually come from
//! price-list exports where every cell is numeric.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::path::LayerPath;
use crate::props::PropertySet;

#[derive(Debug, Error)]
pub enum TaskError {
  #[error("failed to read batch file '{path}': {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse batch file '{path}': {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },
}

/// One export task: the output name and the desired state per path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
  #[serde(deserialize_with = "de_task_name")]
  pub name: String,

  #[serde(default)]
  pub targets: BTreeMap<LayerPath, PropertySet>,
}

fn de_task_name<'de, D>(deserializer: D) -> Result<String, D::Error>
where
  D: Deserializer<'de>,
{
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum Raw {
    Text(String),
    Number(f64),
  }
  Ok(match Raw::deserialize(deserializer)? {
    Raw::Text(name) => name,
    Raw::Number(n) => (n.trunc() as i64).to_string(),
  })
}

fn default_export_dir() -> PathBuf {
  PathBuf::from("exports")
}

fn default_format() -> String {
  "png".to_string()
}

fn default_shadow_suffix() -> String {
  crate::resolve::DEFAULT_SHADOW_SUFFIX.to_string()
}

/// Batch-wide settings; every field optional in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSettings {
  /// Document file the batch runs against. Optional here because the CLI
  /// can supply it as a flag instead.
  pub document: Option<PathBuf>,

  pub export_dir: PathBuf,

  /// File extension as written into export names; `jpg`/`jpeg` select JPEG
  /// output, anything else PNG.
  pub format: String,

  /// Appended to every export name, before the extension.
  pub suffix: String,

  /// Duplicate-name suffix used for shadow resolution.
  pub shadow_suffix: String,
}

impl Default for BatchSettings {
  fn default() -> Self {
    Self {
      document: None,
      export_dir: default_export_dir(),
      format: default_format(),
      suffix: String::new(),
      shadow_suffix: default_shadow_suffix(),
    }
  }
}

/// A parsed batch file: settings plus the ordered task list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchFile {
  #[serde(default)]
  pub settings: BatchSettings,

  #[serde(default)]
  pub tasks: Vec<Task>,
}

impl BatchFile {
  pub fn load(path: &Path) -> Result<Self, TaskError> {
    let raw = fs::read_to_string(path).map_err(|source| TaskError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    serde_json::from_str(&raw).map_err(|source| TaskError::Parse {
      path: path.to_path_buf(),
      source,
    })
  }
}

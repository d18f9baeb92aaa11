//! Document host abstraction.
//!
//! The engine never owns the document: it drives an externally-owned one
//! through [`DocumentHost`], an injected capability. Anything that can look
//! up named children, read and write the supported properties, and save to a
//! file can sit behind the engine — the in-memory JSON host in
//! [`memory`], or a bridge to a real editing application.
//!
//! Handles returned by the lookup methods are assumed to stay valid for the
//! whole session; the document's structure must not change under a running
//! batch.

pub mod memory;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::props::Rgb;

#[derive(Debug, Error)]
pub enum HostError {
  #[error("failed to read document: {0}")]
  Read(#[source] std::io::Error),

  #[error("failed to parse document: {0}")]
  Parse(#[source] serde_json::Error),

  #[error("failed to serialize export render: {0}")]
  Serialize(#[source] serde_json::Error),

  #[error("failed to write export file '{path}': {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("stale element handle: {0}")]
  StaleHandle(String),

  #[error("element '{0}' is not a text layer")]
  NotText(String),

  #[error("element '{name}' does not support {operation}")]
  Unsupported { name: String, operation: &'static str },
}

/// Raster format of an exported file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveFormat {
  #[default]
  Png,
  Jpeg,
}

impl SaveFormat {
  /// Maps a configured format string: `jpg`/`jpeg` in any case mean JPEG,
  /// everything else falls back to PNG.
  pub fn from_extension(ext: &str) -> Self {
    match ext.to_ascii_lowercase().as_str() {
      "jpg" | "jpeg" => SaveFormat::Jpeg,
      _ => SaveFormat::Png,
    }
  }
}

/// Element bounding box in document coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
  pub left: f64,
  pub top: f64,
  pub right: f64,
  pub bottom: f64,
}

impl Bounds {
  pub fn origin(&self) -> (f64, f64) {
    (self.left, self.top)
  }
}

/// One open document, addressed through opaque element handles.
///
/// Lookup is split by element kind so the resolver can walk groups strictly
/// and prefer a group over a leaf of the same name. Read methods cover
/// exactly the capturable properties; write methods cover everything a task
/// may set.
pub trait DocumentHost {
  type Handle: Clone + PartialEq + std::fmt::Debug;

  /// Handle of the document root; its children are the top-level elements.
  fn root(&self) -> Self::Handle;

  /// Looks up a direct child group of `parent` by exact name.
  fn child_group(&self, parent: &Self::Handle, name: &str) -> Option<Self::Handle>;

  /// Looks up a direct child leaf element of `parent` by exact name.
  fn child_leaf(&self, parent: &Self::Handle, name: &str) -> Option<Self::Handle>;

  /// Display name of the element, for logs and error messages.
  fn name(&self, handle: &Self::Handle) -> String;

  fn visible(&self, handle: &Self::Handle) -> Result<bool, HostError>;

  fn set_visible(&mut self, handle: &Self::Handle, visible: bool) -> Result<(), HostError>;

  fn bounds(&self, handle: &Self::Handle) -> Result<Bounds, HostError>;

  /// Moves the element by a relative offset.
  fn translate(&mut self, handle: &Self::Handle, dx: f64, dy: f64) -> Result<(), HostError>;

  /// Rotates the element by a relative angle in degrees.
  fn rotate(&mut self, handle: &Self::Handle, degrees: f64) -> Result<(), HostError>;

  fn text_size(&self, handle: &Self::Handle) -> Result<f64, HostError>;

  fn text_color(&self, handle: &Self::Handle) -> Result<Rgb, HostError>;

  fn set_text_contents(&mut self, handle: &Self::Handle, contents: &str) -> Result<(), HostError>;

  fn set_text_size(&mut self, handle: &Self::Handle, size: f64) -> Result<(), HostError>;

  fn set_text_color(&mut self, handle: &Self::Handle, color: Rgb) -> Result<(), HostError>;

  fn set_text_font(&mut self, handle: &Self::Handle, font: &str) -> Result<(), HostError>;

  /// Exports the document's current state to `path`.
  fn save_as(&mut self, path: &Path, format: SaveFormat) -> Result<(), HostError>;
}

//! Logical element paths.
//!
//! A [`LayerPath`] names one element inside the document tree: `/`-separated
//! segments where every segment but the last must be a group. Paths key the
//! task target maps, the snapshot store, and the resolver cache, and their
//! canonical form is the joined string.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Separator between path segments.
pub const PATH_SEPARATOR: char = '/';

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
  #[error("layer path is empty")]
  Empty,

  #[error("layer path '{0}' contains an empty segment")]
  EmptySegment(String),

  #[error("path segment '{0}' contains the separator character")]
  SeparatorInSegment(String),
}

/// A logical path to one element in the document tree.
///
/// Serialized as its canonical string, so JSON objects can key off paths
/// directly (`"图片/图片1": { ... }`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LayerPath {
  segments: Vec<String>,
}

impl LayerPath {
  /// Builds a path from pre-split segments.
  pub fn from_segments<I, S>(segments: I) -> Result<Self, PathError>
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
    if segments.is_empty() {
      return Err(PathError::Empty);
    }
    for segment in &segments {
      if segment.is_empty() {
        return Err(PathError::EmptySegment(segments.join("/")));
      }
      if segment.contains(PATH_SEPARATOR) {
        return Err(PathError::SeparatorInSegment(segment.clone()));
      }
    }
    Ok(Self { segments })
  }

  pub fn segments(&self) -> &[String] {
    &self.segments
  }

  /// The final segment: the element this path addresses.
  pub fn leaf(&self) -> &str {
    &self.segments[self.segments.len() - 1]
  }

  /// Every segment before the leaf; each must resolve to a group.
  pub fn groups(&self) -> &[String] {
    &self.segments[..self.segments.len() - 1]
  }
}

impl FromStr for LayerPath {
  type Err = PathError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    if s.is_empty() {
      return Err(PathError::Empty);
    }
    if s.split(PATH_SEPARATOR).any(str::is_empty) {
      return Err(PathError::EmptySegment(s.to_string()));
    }
    Ok(Self {
      segments: s.split(PATH_SEPARATOR).map(str::to_string).collect(),
    })
  }
}

impl TryFrom<String> for LayerPath {
  type Error = PathError;

  fn try_from(s: String) -> Result<Self, Self::Error> {
    s.parse()
  }
}

impl From<LayerPath> for String {
  fn from(path: LayerPath) -> Self {
    path.segments.join("/")
  }
}

impl fmt::Display for LayerPath {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.segments.join("/"))
  }
}

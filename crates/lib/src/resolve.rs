//! Logical path resolution.
//!
//! Walks a [`LayerPath`]'s non-leaf segments strictly through groups, then
//! matches the leaf segment group-first (a group beats a leaf of the same
//! name). A successful match also probes for a same-kind sibling named
//! `leaf + shadow_suffix` — the host application's duplicate-naming
//! convention — and returns it alongside the primary so mutations hit both.
//!
//! Successful resolutions are cached by canonical path string for the life
//! of the resolver; failures never are, so a path that appears mid-session
//! is retried from scratch.

use std::collections::HashMap;

use thiserror::Error;
use tracing::debug;

use crate::host::DocumentHost;
use crate::path::LayerPath;

/// Suffix the originating host application appends to duplicated elements.
pub const DEFAULT_SHADOW_SUFFIX: &str = " 拷贝";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
  #[error("path '{path}': group '{segment}' not found")]
  GroupNotFound { path: LayerPath, segment: String },

  #[error("path '{path}': no group or layer named '{segment}'")]
  LeafNotFound { path: LayerPath, segment: String },
}

/// Successful resolutions, keyed by canonical path string.
#[derive(Debug)]
pub struct HandleCache<H> {
  entries: HashMap<String, Vec<H>>,
}

impl<H> Default for HandleCache<H> {
  fn default() -> Self {
    Self {
      entries: HashMap::new(),
    }
  }
}

impl<H> HandleCache<H> {
  fn get(&self, key: &str) -> Option<&[H]> {
    self.entries.get(key).map(Vec::as_slice)
  }

  fn insert(&mut self, key: String, handles: Vec<H>) {
    self.entries.insert(key, handles);
  }

  pub fn contains(&self, path: &LayerPath) -> bool {
    self.entries.contains_key(&path.to_string())
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

/// Resolves logical paths against a live document.
///
/// Owns the handle cache; nothing else writes it.
#[derive(Debug)]
pub struct Resolver<H> {
  shadow_suffix: String,
  cache: HandleCache<H>,
}

impl<H: Clone> Default for Resolver<H> {
  fn default() -> Self {
    Self::new()
  }
}

impl<H: Clone> Resolver<H> {
  pub fn new() -> Self {
    Self::with_shadow_suffix(DEFAULT_SHADOW_SUFFIX)
  }

  pub fn with_shadow_suffix(suffix: impl Into<String>) -> Self {
    Self {
      shadow_suffix: suffix.into(),
      cache: HandleCache::default(),
    }
  }

  pub fn shadow_suffix(&self) -> &str {
    &self.shadow_suffix
  }

  pub fn cache(&self) -> &HandleCache<H> {
    &self.cache
  }

  /// Resolves `path` to `[primary]` or `[primary, shadow]`.
  ///
  /// Handles stay valid for the session, so cache hits skip the document
  /// walk entirely.
  pub fn resolve<D>(&mut self, host: &D, path: &LayerPath) -> Result<Vec<H>, ResolveError>
  where
    D: DocumentHost<Handle = H>,
  {
    let key = path.to_string();
    if let Some(hit) = self.cache.get(&key) {
      return Ok(hit.to_vec());
    }

    let mut parent = host.root();
    for segment in path.groups() {
      parent = host
        .child_group(&parent, segment)
        .ok_or_else(|| ResolveError::GroupNotFound {
          path: path.clone(),
          segment: segment.clone(),
        })?;
    }

    let leaf = path.leaf();
    let shadow_name = format!("{leaf}{}", self.shadow_suffix);
    let mut handles = Vec::with_capacity(2);
    if let Some(primary) = host.child_group(&parent, leaf) {
      handles.push(primary);
      if let Some(shadow) = host.child_group(&parent, &shadow_name) {
        handles.push(shadow);
      }
    } else if let Some(primary) = host.child_leaf(&parent, leaf) {
      handles.push(primary);
      if let Some(shadow) = host.child_leaf(&parent, &shadow_name) {
        handles.push(shadow);
      }
    } else {
      return Err(ResolveError::LeafNotFound {
        path: path.clone(),
        segment: leaf.to_string(),
      });
    }

    debug!(path = %path, handles = handles.len(), "resolved path");
    self.cache.insert(key, handles.clone());
    Ok(handles)
  }
}

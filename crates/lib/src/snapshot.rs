//! Baseline and last-applied state for one session.
//!
//! Two owned maps keyed by path: `initial` is the baseline captured the
//! first time a task touches a path with capturable properties, `current` is
//! the last property set the engine applied there. Restores replay `initial`;
//! the equality gate compares against `current`.
//!
//! Only the reconciler writes this store.

use std::collections::BTreeMap;

use tracing::debug;

use crate::host::{DocumentHost, HostError};
use crate::path::LayerPath;
use crate::props::{PropertySet, TextProps};

#[derive(Debug, Default)]
pub struct SnapshotStore {
  initial: BTreeMap<LayerPath, PropertySet>,
  current: BTreeMap<LayerPath, PropertySet>,
}

impl SnapshotStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn initial(&self, path: &LayerPath) -> Option<&PropertySet> {
    self.initial.get(path)
  }

  pub fn current(&self, path: &LayerPath) -> Option<&PropertySet> {
    self.current.get(path)
  }

  pub fn has_baseline(&self, path: &LayerPath) -> bool {
    self.initial.contains_key(path)
  }

  /// Number of paths under management (tracked in `current`).
  pub fn tracked(&self) -> usize {
    self.current.len()
  }

  pub fn is_empty(&self) -> bool {
    self.current.is_empty() && self.initial.is_empty()
  }

  /// Records `props` as the last-applied state for `path`.
  pub fn set_current(&mut self, path: &LayerPath, props: PropertySet) {
    self.current.insert(path.clone(), props);
  }

  /// Drops `path` from both maps.
  pub fn remove(&mut self, path: &LayerPath) {
    self.initial.remove(path);
    self.current.remove(path);
  }

  /// Paths under management that `targets` no longer references, in map
  /// order.
  pub fn stale_paths(&self, targets: &BTreeMap<LayerPath, PropertySet>) -> Vec<LayerPath> {
    self
      .current
      .keys()
      .filter(|path| !targets.contains_key(*path))
      .cloned()
      .collect()
  }

  /// Every captured baseline, cloned out for teardown replay.
  pub fn initial_entries(&self) -> Vec<(LayerPath, PropertySet)> {
    self.initial.iter().map(|(p, s)| (p.clone(), s.clone())).collect()
  }

  pub fn clear(&mut self) {
    self.initial.clear();
    self.current.clear();
  }

  /// Captures the baseline for `path`: reads the capturable keys that
  /// `target` names (`visible`, `move`, `textItem.size`, `textItem.color`)
  /// from `handle` — the primary handle only — and stores identical copies
  /// in `initial` and `current`.
  ///
  /// No-op when a baseline already exists: one capture per path per session.
  /// A read failure leaves both maps untouched.
  pub fn capture<D: DocumentHost>(
    &mut self,
    host: &D,
    handle: &D::Handle,
    path: &LayerPath,
    target: &PropertySet,
  ) -> Result<(), HostError> {
    if self.initial.contains_key(path) {
      return Ok(());
    }

    let mut captured = PropertySet::default();
    if target.visible.is_some() {
      captured.visible = Some(host.visible(handle)?);
    }
    if target.move_to.is_some() {
      captured.move_to = Some(host.bounds(handle)?.origin());
    }
    if let Some(text) = &target.text {
      let mut baseline = TextProps::default();
      if text.size.is_some() {
        baseline.size = Some(host.text_size(handle)?);
      }
      if text.color.is_some() {
        baseline.color = Some(host.text_color(handle)?.to_hex());
      }
      if !baseline.is_empty() {
        captured.text = Some(baseline);
      }
    }

    debug!(path = %path, baseline = ?captured, "captured baseline");
    self.current.insert(path.clone(), captured.clone());
    self.initial.insert(path.clone(), captured);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::host::memory::MemoryHost;
  use crate::props::TextValue;

  const DOC: &str = r##"{
    "name": "快照测试",
    "layers": [
      { "kind": "layer", "name": "标题1", "x": 40, "y": 32,
        "text": { "contents": "主标题", "size": 35, "color": "#1A1A1A", "font": "DingTalk-JinBuTi" } },
      { "kind": "layer", "name": "背景", "x": 0, "y": 0 }
    ]
  }"##;

  fn host() -> MemoryHost {
    MemoryHost::from_json(DOC).unwrap()
  }

  fn path(s: &str) -> LayerPath {
    s.parse().unwrap()
  }

  fn title_handle(host: &MemoryHost) -> <MemoryHost as DocumentHost>::Handle {
    host.child_leaf(&host.root(), "标题1").unwrap()
  }

  #[test]
  fn capture_reads_only_requested_keys() {
    let host = host();
    let mut store = SnapshotStore::new();
    let target = PropertySet {
      visible: Some(false),
      text: Some(TextProps {
        size: Some(50.0),
        contents: Some(TextValue::Text("新文案".to_string())),
        ..Default::default()
      }),
      ..Default::default()
    };
    store
      .capture(&host, &title_handle(&host), &path("标题1"), &target)
      .unwrap();

    let baseline = store.initial(&path("标题1")).unwrap();
    assert_eq!(baseline.visible, Some(true));
    assert_eq!(baseline.move_to, None, "move not requested");
    let text = baseline.text.as_ref().unwrap();
    assert_eq!(text.size, Some(35.0));
    assert_eq!(text.color, None, "color not requested");
    assert_eq!(text.contents, None, "contents are never captured");
    assert_eq!(store.current(&path("标题1")), Some(baseline));
  }

  #[test]
  fn capture_includes_move_and_lowercase_color_when_requested() {
    let host = host();
    let mut store = SnapshotStore::new();
    let target = PropertySet {
      visible: Some(false),
      move_to: Some((350.0, 350.0)),
      text: Some(TextProps {
        color: Some("#A00000".to_string()),
        ..Default::default()
      }),
      ..Default::default()
    };
    store
      .capture(&host, &title_handle(&host), &path("标题1"), &target)
      .unwrap();

    let baseline = store.initial(&path("标题1")).unwrap();
    assert_eq!(baseline.move_to, Some((40.0, 32.0)));
    assert_eq!(baseline.text.as_ref().unwrap().color.as_deref(), Some("#1a1a1a"));
  }

  #[test]
  fn capture_is_first_touch_only() {
    let mut host = host();
    let mut store = SnapshotStore::new();
    let handle = title_handle(&host);
    let target = PropertySet {
      visible: Some(false),
      ..Default::default()
    };
    store.capture(&host, &handle, &path("标题1"), &target).unwrap();

    host.set_visible(&handle, false).unwrap();
    let richer_target = PropertySet {
      visible: Some(true),
      text: Some(TextProps {
        size: Some(60.0),
        ..Default::default()
      }),
      ..Default::default()
    };
    store.capture(&host, &handle, &path("标题1"), &richer_target).unwrap();

    let baseline = store.initial(&path("标题1")).unwrap();
    assert_eq!(baseline.visible, Some(true), "baseline must keep the first capture");
    assert!(baseline.text.is_none(), "later targets never augment a baseline");
  }

  #[test]
  fn failed_capture_leaves_store_untouched() {
    let host = host();
    let mut store = SnapshotStore::new();
    let background = host.child_leaf(&host.root(), "背景").unwrap();
    let target = PropertySet {
      visible: Some(false),
      text: Some(TextProps {
        size: Some(50.0),
        ..Default::default()
      }),
      ..Default::default()
    };
    assert!(store.capture(&host, &background, &path("背景"), &target).is_err());
    assert!(store.initial(&path("背景")).is_none());
    assert!(store.current(&path("背景")).is_none());
    assert!(store.is_empty());
  }

  #[test]
  fn remove_drops_both_maps() {
    let host = host();
    let mut store = SnapshotStore::new();
    let target = PropertySet {
      visible: Some(false),
      ..Default::default()
    };
    store
      .capture(&host, &title_handle(&host), &path("标题1"), &target)
      .unwrap();
    store.remove(&path("标题1"));
    assert!(!store.has_baseline(&path("标题1")));
    assert!(store.current(&path("标题1")).is_none());
  }

  #[test]
  fn stale_paths_lists_unreferenced_current_entries() {
    let mut store = SnapshotStore::new();
    store.set_current(&path("a/b"), PropertySet::default());
    store.set_current(&path("c/d"), PropertySet::default());

    let mut targets = BTreeMap::new();
    targets.insert(path("c/d"), PropertySet::default());

    assert_eq!(store.stale_paths(&targets), [path("a/b")]);
    assert!(store.stale_paths(&store.current.clone()).is_empty());
  }

  #[test]
  fn clear_empties_everything() {
    let host = host();
    let mut store = SnapshotStore::new();
    let target = PropertySet {
      visible: Some(true),
      ..Default::default()
    };
    store
      .capture(&host, &title_handle(&host), &path("标题1"), &target)
      .unwrap();
    assert_eq!(store.initial_entries().len(), 1);
    store.clear();
    assert!(store.is_empty());
    assert!(store.initial_entries().is_empty());
  }
}

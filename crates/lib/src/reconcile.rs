//! Per-task reconciliation of desired state against the live document.
//!
//! [`SyncEngine::reconcile`] runs a fixed sequence for every task:
//!
//! 1. restore paths managed by earlier tasks that this task no longer names,
//!    then drop them from tracking;
//! 2. capture a baseline for first-touched paths whose target carries
//!    capturable properties;
//! 3. put dropped-but-managed properties back (a managed position is reset
//!    with the full baseline, managed text size/color with the baseline's
//!    text item);
//! 4. gate on structural equality with the last-applied state and mutate
//!    only paths whose target actually changed.
//!
//! [`SyncEngine::restore_all`] is the session teardown: it replays every
//! captured baseline and clears the store.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::apply::{self, MutationError};
use crate::host::{DocumentHost, HostError};
use crate::path::LayerPath;
use crate::props::PropertySet;
use crate::resolve::{ResolveError, Resolver};
use crate::snapshot::SnapshotStore;
use crate::task::Task;

/// A recoverable problem hit while reconciling one task.
#[derive(Debug, Error)]
pub enum TaskIssue {
  #[error(transparent)]
  Resolve(#[from] ResolveError),

  #[error("'{path}': {source}")]
  Mutation {
    path: LayerPath,
    #[source]
    source: MutationError,
  },

  #[error("baseline capture failed for '{path}': {source}")]
  Capture {
    path: LayerPath,
    #[source]
    source: HostError,
  },
}

/// Counters and issues from one task's reconciliation.
#[derive(Debug, Default)]
pub struct TaskOutcome {
  /// Paths whose target was applied.
  pub applied: usize,
  /// Paths skipped because the target equals the last-applied state.
  pub skipped: usize,
  /// Stale paths restored to baseline and dropped from tracking.
  pub restored: usize,
  pub issues: Vec<TaskIssue>,
}

impl TaskOutcome {
  pub fn is_clean(&self) -> bool {
    self.issues.is_empty()
  }
}

/// Counters and issues from the session-end restore.
#[derive(Debug, Default)]
pub struct RestoreOutcome {
  /// Baselines replayed.
  pub restored: usize,
  pub issues: Vec<TaskIssue>,
}

/// The reconciler. Owns the resolver and the snapshot store; drives a host
/// it never owns.
#[derive(Debug)]
pub struct SyncEngine<D: DocumentHost> {
  resolver: Resolver<D::Handle>,
  snapshots: SnapshotStore,
}

impl<D: DocumentHost> Default for SyncEngine<D> {
  fn default() -> Self {
    Self::new()
  }
}

impl<D: DocumentHost> SyncEngine<D> {
  pub fn new() -> Self {
    Self {
      resolver: Resolver::new(),
      snapshots: SnapshotStore::new(),
    }
  }

  pub fn with_shadow_suffix(suffix: impl Into<String>) -> Self {
    Self {
      resolver: Resolver::with_shadow_suffix(suffix),
      snapshots: SnapshotStore::new(),
    }
  }

  /// Read access for reports and tests. All writes go through
  /// [`SyncEngine::reconcile`] and [`SyncEngine::restore_all`].
  pub fn snapshots(&self) -> &SnapshotStore {
    &self.snapshots
  }

  /// Brings the document to `task`'s desired state, mutating as little as
  /// possible. Never fails as a whole; per-path problems are reported in
  /// the outcome.
  pub fn reconcile(&mut self, host: &mut D, task: &Task) -> TaskOutcome {
    let mut outcome = TaskOutcome::default();
    self.restore_stale(host, &task.targets, &mut outcome);
    for (path, target) in &task.targets {
      self.reconcile_path(host, path, target, &mut outcome);
    }
    debug!(
      task = %task.name,
      applied = outcome.applied,
      skipped = outcome.skipped,
      restored = outcome.restored,
      issues = outcome.issues.len(),
      "task reconciled"
    );
    outcome
  }

  fn restore_stale(&mut self, host: &mut D, targets: &BTreeMap<LayerPath, PropertySet>, outcome: &mut TaskOutcome) {
    for path in self.snapshots.stale_paths(targets) {
      let Some(baseline) = self.snapshots.initial(&path).cloned() else {
        // Managed but never captured (fire-and-forget properties only);
        // nothing restorable.
        debug!(path = %path, "dropping untracked stale path");
        self.snapshots.remove(&path);
        continue;
      };
      match apply::apply(host, &mut self.resolver, &path, &baseline) {
        Ok(failures) => {
          outcome.restored += 1;
          for failure in failures {
            outcome.issues.push(TaskIssue::Mutation {
              path: path.clone(),
              source: failure,
            });
          }
          self.snapshots.remove(&path);
          debug!(path = %path, "restored stale path");
        }
        Err(err) => {
          // Keep the entry: lookups are never cached on failure, so a later
          // task retries from scratch.
          warn!(path = %path, error = %err, "stale path did not resolve, keeping for retry");
          outcome.issues.push(TaskIssue::Resolve(err));
        }
      }
    }
  }

  fn reconcile_path(&mut self, host: &mut D, path: &LayerPath, target: &PropertySet, outcome: &mut TaskOutcome) {
    let handles = match self.resolver.resolve(host, path) {
      Ok(handles) => handles,
      Err(err) => {
        warn!(path = %path, error = %err, "skipping unresolvable path");
        outcome.issues.push(TaskIssue::Resolve(err));
        return;
      }
    };

    // First touch: snapshot what the target manages before changing it.
    if !self.snapshots.has_baseline(path)
      && target.wants_capture()
      && let Err(source) = self.snapshots.capture(host, &handles[0], path, target)
    {
      warn!(path = %path, error = %source, "baseline capture failed, skipping path");
      outcome.issues.push(TaskIssue::Capture {
        path: path.clone(),
        source,
      });
      return;
    }

    self.pre_restore(host, &handles, path, target, outcome);

    let last_applied = self.snapshots.current(path).cloned().unwrap_or_default();
    if last_applied == *target {
      debug!(path = %path, "target equals last-applied state, skipping");
      outcome.skipped += 1;
      return;
    }

    for failure in apply::apply_to_handles(host, &handles, target) {
      outcome.issues.push(TaskIssue::Mutation {
        path: path.clone(),
        source: failure,
      });
    }
    // The full target, even after property failures: later tasks reconcile
    // partially-applied state, they do not roll it back.
    self.snapshots.set_current(path, target.clone());
    outcome.applied += 1;
  }

  /// Re-applies baseline values for properties this target stops managing.
  /// A dropped position resets the whole baseline; dropped text size/color
  /// reset the baseline text item. Contents and font are never restored
  /// mid-session.
  fn pre_restore(
    &self,
    host: &mut D,
    handles: &[D::Handle],
    path: &LayerPath,
    target: &PropertySet,
    outcome: &mut TaskOutcome,
  ) {
    let (Some(current), Some(baseline)) = (self.snapshots.current(path), self.snapshots.initial(path)) else {
      return;
    };

    let move_dropped = current.move_to.is_some() && target.move_to.is_none();
    let managed = current.text.as_ref();
    let wanted = target.text.as_ref();
    let size_dropped =
      managed.is_some_and(|t| t.size.is_some()) && !wanted.is_some_and(|t| t.size.is_some());
    let color_dropped =
      managed.is_some_and(|t| t.color.is_some()) && !wanted.is_some_and(|t| t.color.is_some());

    let restore_set = if move_dropped {
      baseline.clone()
    } else if size_dropped || color_dropped {
      PropertySet {
        text: baseline.text.clone(),
        ..Default::default()
      }
    } else {
      return;
    };
    if restore_set.is_empty() {
      return;
    }

    debug!(path = %path, full = move_dropped, "pre-restoring dropped properties");
    for failure in apply::apply_to_handles(host, handles, &restore_set) {
      outcome.issues.push(TaskIssue::Mutation {
        path: path.clone(),
        source: failure,
      });
    }
  }

  /// Session teardown: replays every captured baseline, then clears the
  /// store. Failures are reported, never fatal.
  pub fn restore_all(&mut self, host: &mut D) -> RestoreOutcome {
    let mut outcome = RestoreOutcome::default();
    for (path, baseline) in self.snapshots.initial_entries() {
      match apply::apply(host, &mut self.resolver, &path, &baseline) {
        Ok(failures) => {
          outcome.restored += 1;
          for failure in failures {
            outcome.issues.push(TaskIssue::Mutation {
              path: path.clone(),
              source: failure,
            });
          }
        }
        Err(err) => {
          warn!(path = %path, error = %err, "path did not resolve during final restore");
          outcome.issues.push(TaskIssue::Resolve(err));
        }
      }
    }
    self.snapshots.clear();
    info!(
      restored = outcome.restored,
      issues = outcome.issues.len(),
      "session restored to baseline"
    );
    outcome
  }
}

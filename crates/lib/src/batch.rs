//! Batch export driver.
//!
//! [`run_batch`] consumes an ordered task list against one open document:
//! reconcile the task, export the document render, time the whole step, and
//! move on. However the loop exits — tasks exhausted, a failed export, a
//! poisoned task — teardown replays every captured baseline so the document
//! leaves the session exactly as it entered it.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{error, info};

use crate::host::memory::MemoryHost;
use crate::host::{DocumentHost, HostError, SaveFormat};
use crate::reconcile::{SyncEngine, TaskIssue};
use crate::task::{BatchFile, BatchSettings, Task};

#[derive(Debug, Error)]
pub enum BatchError {
  #[error("could not open document '{path}': {source}")]
  Session {
    path: PathBuf,
    #[source]
    source: HostError,
  },

  #[error("could not create export directory '{path}': {source}")]
  ExportDir {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("export '{task}' failed at '{path}': {source}")]
  Export {
    task: String,
    path: PathBuf,
    #[source]
    source: HostError,
  },
}

/// Driver configuration, usually derived from [`BatchSettings`].
#[derive(Debug, Clone)]
pub struct BatchConfig {
  pub export_dir: PathBuf,

  /// Extension written into export names; `jpg`/`jpeg` select JPEG output,
  /// anything else PNG.
  pub format: String,

  /// Appended to every export name, before the extension.
  pub suffix: String,

  pub shadow_suffix: String,

  /// Continue with the remaining tasks when an export fails, instead of
  /// aborting the batch.
  pub keep_going: bool,
}

impl Default for BatchConfig {
  fn default() -> Self {
    Self::from(&BatchSettings::default())
  }
}

impl From<&BatchSettings> for BatchConfig {
  fn from(settings: &BatchSettings) -> Self {
    Self {
      export_dir: settings.export_dir.clone(),
      format: settings.format.clone(),
      suffix: settings.suffix.clone(),
      shadow_suffix: settings.shadow_suffix.clone(),
      keep_going: false,
    }
  }
}

impl BatchConfig {
  /// Full path the named task exports to:
  /// `{export_dir}/{name}{suffix}.{format}`.
  pub fn export_path(&self, task_name: &str) -> PathBuf {
    self
      .export_dir
      .join(format!("{}{}.{}", task_name, self.suffix, self.format))
  }
}

/// Per-task slice of the final report.
#[derive(Debug)]
pub struct TaskReport {
  pub name: String,

  /// Where the export landed; `None` when it failed.
  pub export_path: Option<PathBuf>,

  /// Wall-clock time for reconcile plus export.
  pub duration: Duration,

  pub applied: usize,
  pub skipped: usize,
  pub restored: usize,
  pub issues: Vec<TaskIssue>,

  /// The export failure, when `keep_going` swallowed it.
  pub export_error: Option<BatchError>,
}

impl TaskReport {
  pub fn succeeded(&self) -> bool {
    self.export_path.is_some()
  }
}

/// Everything one batch run did.
#[derive(Debug, Default)]
pub struct BatchReport {
  pub tasks: Vec<TaskReport>,

  /// Baselines replayed during teardown.
  pub restored: usize,
  pub restore_issues: Vec<TaskIssue>,

  /// Wall-clock time for the whole run, teardown included.
  pub total: Duration,
}

impl BatchReport {
  pub fn exported(&self) -> usize {
    self.tasks.iter().filter(|t| t.succeeded()).count()
  }

  pub fn failed(&self) -> usize {
    self.tasks.len() - self.exported()
  }

  pub fn issue_count(&self) -> usize {
    self.tasks.iter().map(|t| t.issues.len()).sum::<usize>() + self.restore_issues.len()
  }
}

/// Runs `tasks` against an already-open host, strictly in order.
///
/// Teardown always runs: whatever ends the loop, every captured baseline is
/// replayed before this returns. On abort the error is returned and the
/// partial report dropped; with `keep_going` set, failed exports are
/// recorded per task instead.
pub fn run_batch<D, I>(host: &mut D, tasks: I, config: &BatchConfig) -> Result<BatchReport, BatchError>
where
  D: DocumentHost,
  I: IntoIterator<Item = Task>,
{
  fs::create_dir_all(&config.export_dir).map_err(|source| BatchError::ExportDir {
    path: config.export_dir.clone(),
    source,
  })?;

  let format = SaveFormat::from_extension(&config.format);
  let started = Instant::now();
  let mut engine: SyncEngine<D> = SyncEngine::with_shadow_suffix(config.shadow_suffix.as_str());
  let mut report = BatchReport::default();
  let mut fatal: Option<BatchError> = None;

  info!(export_dir = %config.export_dir.display(), "batch started");
  for task in tasks {
    let task_started = Instant::now();
    info!(task = %task.name, targets = task.targets.len(), "processing task");
    let outcome = engine.reconcile(host, &task);

    let path = config.export_path(&task.name);
    let mut entry = TaskReport {
      name: task.name.clone(),
      export_path: None,
      duration: Duration::ZERO,
      applied: outcome.applied,
      skipped: outcome.skipped,
      restored: outcome.restored,
      issues: outcome.issues,
      export_error: None,
    };
    match host.save_as(&path, format) {
      Ok(()) => entry.export_path = Some(path),
      Err(source) => {
        let err = BatchError::Export {
          task: task.name.clone(),
          path,
          source,
        };
        error!(error = %err, "export failed");
        if config.keep_going {
          entry.export_error = Some(err);
        } else {
          fatal = Some(err);
        }
      }
    }
    entry.duration = task_started.elapsed();
    info!(
      task = %entry.name,
      ok = entry.succeeded(),
      elapsed_ms = entry.duration.as_millis() as u64,
      "task finished"
    );
    report.tasks.push(entry);
    if fatal.is_some() {
      break;
    }
  }

  // Teardown runs on every exit path.
  let restore = engine.restore_all(host);
  report.restored = restore.restored;
  report.restore_issues = restore.issues;
  report.total = started.elapsed();

  match fatal {
    Some(err) => Err(err),
    None => Ok(report),
  }
}

/// Opens the document at `document` and runs the batch file's tasks with its
/// settings.
pub fn run_file_batch(document: &Path, batch: &BatchFile, keep_going: bool) -> Result<BatchReport, BatchError> {
  let mut host = MemoryHost::open(document).map_err(|source| BatchError::Session {
    path: document.to_path_buf(),
    source,
  })?;
  let mut config = BatchConfig::from(&batch.settings);
  config.keep_going = keep_going;
  run_batch(&mut host, batch.tasks.iter().cloned(), &config)
}

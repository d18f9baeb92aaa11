//! Implementation of the `layersync run` command.
//!
//! Loads a batch file, opens its document, reconciles and exports every task
//! in order, and puts the document back on its baseline before returning.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tracing::info;

use layersync_lib::batch::{BatchConfig, BatchReport, run_batch};
use layersync_lib::host::memory::MemoryHost;
use layersync_lib::task::BatchFile;

use crate::output::{print_error, print_stat, print_success, print_warning, symbols};

/// Command-line overrides for the batch file's settings.
#[derive(Debug, Default)]
pub struct RunOverrides {
  pub document: Option<PathBuf>,
  pub export_dir: Option<PathBuf>,
  pub format: Option<String>,
  pub suffix: Option<String>,
  pub keep_going: bool,
}

pub fn cmd_run(batch_path: &Path, overrides: RunOverrides) -> Result<()> {
  let batch =
    BatchFile::load(batch_path).with_context(|| format!("Failed to load batch file: {}", batch_path.display()))?;

  let Some(document) = overrides.document.or_else(|| batch.settings.document.clone()) else {
    bail!("no document given; pass --document or set settings.document in the batch file");
  };

  if batch.tasks.is_empty() {
    print_warning("Batch file has no tasks");
    return Ok(());
  }

  let mut config = BatchConfig::from(&batch.settings);
  if let Some(dir) = overrides.export_dir {
    config.export_dir = dir;
  }
  if let Some(format) = overrides.format {
    config.format = format;
  }
  if let Some(suffix) = overrides.suffix {
    config.suffix = suffix;
  }
  config.keep_going = overrides.keep_going;

  let mut host =
    MemoryHost::open(&document).with_context(|| format!("Failed to open document: {}", document.display()))?;
  info!(document = %document.display(), tasks = batch.tasks.len(), "starting batch");

  let report = run_batch(&mut host, batch.tasks, &config).context("Batch run failed")?;

  print_report(&report);

  if report.failed() > 0 {
    bail!("{} of {} exports failed", report.failed(), report.tasks.len());
  }
  Ok(())
}

fn print_report(report: &BatchReport) {
  for task in &report.tasks {
    if let Some(path) = &task.export_path {
      print_success(&format!(
        "{} {} {} ({})",
        task.name,
        symbols::ARROW,
        path.display(),
        crate::output::format_duration(task.duration)
      ));
    } else if let Some(err) = &task.export_error {
      print_error(&format!("{}: {}", task.name, err));
    }
    for issue in &task.issues {
      print_warning(&format!("{}: {}", task.name, issue));
    }
  }
  for issue in &report.restore_issues {
    print_warning(&format!("restore: {}", issue));
  }

  let applied: usize = report.tasks.iter().map(|t| t.applied).sum();
  let skipped: usize = report.tasks.iter().map(|t| t.skipped).sum();
  let total = Duration::from_millis(report.total.as_millis() as u64);

  println!();
  println!("Batch complete!");
  print_stat("Exported", &report.exported().to_string());
  print_stat("Failed", &report.failed().to_string());
  print_stat("Paths applied", &applied.to_string());
  print_stat("Paths skipped", &skipped.to_string());
  print_stat("Baselines restored", &report.restored.to_string());
  print_stat("Issues", &report.issue_count().to_string());
  print_stat("Total time", &humantime::format_duration(total).to_string());
}

//! Implementation of the `layersync plan` command.
//!
//! Resolves every task path against the document without mutating anything,
//! so a batch file can be checked before committing to a run.

use std::path::Path;

use anyhow::{Context, Result, bail};

use layersync_lib::batch::BatchConfig;
use layersync_lib::host::memory::MemoryHost;
use layersync_lib::resolve::Resolver;
use layersync_lib::task::BatchFile;

pub fn cmd_plan(batch_path: &Path, document: Option<&Path>) -> Result<()> {
  let batch =
    BatchFile::load(batch_path).with_context(|| format!("Failed to load batch file: {}", batch_path.display()))?;

  let Some(document) = document.map(Path::to_path_buf).or_else(|| batch.settings.document.clone()) else {
    bail!("no document given; pass --document or set settings.document in the batch file");
  };

  let host =
    MemoryHost::open(&document).with_context(|| format!("Failed to open document: {}", document.display()))?;

  let config = BatchConfig::from(&batch.settings);
  let mut resolver = Resolver::with_shadow_suffix(config.shadow_suffix.as_str());

  println!("Plan: {}", batch_path.display());
  println!("Document: {} ({})", host.document().name, document.display());
  println!("Tasks: {}", batch.tasks.len());

  let mut resolved = 0usize;
  let mut missing = 0usize;
  for task in &batch.tasks {
    println!();
    println!("Task: {}", task.name);
    for (path, props) in &task.targets {
      match resolver.resolve(&host, path) {
        Ok(handles) => {
          resolved += 1;
          let elements = if handles.len() == 1 { "element" } else { "elements" };
          let count = props.property_count();
          let properties = if count == 1 { "property" } else { "properties" };
          println!("  + {} ({} {}, {} {})", path, handles.len(), elements, count, properties);
        }
        Err(err) => {
          missing += 1;
          println!("  ! {}: {}", path, err);
        }
      }
    }
    println!("  Export: {}", config.export_path(&task.name).display());
  }

  println!();
  println!("Paths: {} resolved, {} missing", resolved, missing);

  Ok(())
}

//! Shared-library build orchestration.
//!
//! This module turns a [`BuildRecipe`] into a shared library on disk:
//! - Probes the toolchain before any work is scheduled
//! - Compiles sources across parallel shell workers
//! - Joins every worker, then links the objects with one more worker
//! - Leaves logs and retcode files behind on failure for diagnosis

pub mod collect;
pub mod partition;
pub mod types;
pub mod worker;

use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::recipe::BuildRecipe;
use crate::toolchain::Toolchain;

use collect::collect;
use partition::{WorkItem, partition, retcode_file_name};
use worker::launch;

pub use types::{BuildConfig, BuildError, ProcessResult};

/// Build `recipe` inside `dir` and return the absolute path of the library.
///
/// The pipeline is:
/// 1. Probe `toolchain`
/// 2. Compile every source, dealt round-robin across `config.worker_count()` sessions
/// 3. Join all sessions; any failing command aborts before linking
/// 4. Link all objects plus `recipe.extra` in a single session
/// 5. Remove the retcode files
///
/// # Errors
///
/// - [`BuildError::ToolchainNotFound`] if the probe fails
/// - [`BuildError::CompileFailed`] naming the first failing worker; its output
///   is also written to `log_cpu<id>.txt`
/// - [`BuildError::LinkFailed`]; the output is also written to `log_cpu0.txt`
pub async fn build(
  dir: &Path,
  recipe: &BuildRecipe,
  toolchain: &Toolchain,
  config: &BuildConfig,
) -> Result<PathBuf, BuildError> {
  toolchain.probe(&config.platform).await?;
  recipe.validate()?;

  let dir = dunce::canonicalize(dir)?;
  let workers = config.worker_count();
  let platform = &config.platform;

  info!(
    dir = %dir.display(),
    sources = recipe.sources.len(),
    workers,
    platform = %platform,
    object_ext = %recipe.object_ext,
    "compiling sources into object files"
  );

  let items = partition(&recipe.object_cmds(), workers, &dir, &recipe.init_cmd, platform);
  let results = run_sessions(&items).await?;

  for (item, result) in items.iter().zip(&results) {
    if !result.succeeded(item.commands.len()) {
      error!(worker = item.id, "compile step failed");
      write_log(&dir, item, &result.stdout).await;
      return Err(BuildError::CompileFailed {
        worker: item.id,
        output: result.stdout.clone(),
      });
    }
  }

  let library = dir.join(recipe.library_file_name());
  info!(library = %library.display(), "generating dynamic shared library");

  let link_cmd = recipe.library_cmd(&recipe.link_inputs(), &recipe.target);
  let link_item = WorkItem::new(0, vec![link_cmd], &dir, &recipe.init_cmd, platform);
  let link_results = run_sessions(std::slice::from_ref(&link_item)).await?;
  let link_result = &link_results[0];

  if !link_result.succeeded(1) {
    error!("link step failed");
    write_log(&dir, &link_item, &link_result.stdout).await;
    return Err(BuildError::LinkFailed {
      output: link_result.stdout.clone(),
    });
  }

  cleanup(&dir, workers).await;

  info!(library = %library.display(), "build complete");
  Ok(library)
}

/// Launch a session per item, then join them all.
///
/// Every session that was started is joined even if another one failed to
/// launch or to be collected; the first error is returned afterwards.
async fn run_sessions(items: &[WorkItem<'_>]) -> Result<Vec<ProcessResult>, BuildError> {
  let mut launched = Vec::with_capacity(items.len());
  for item in items {
    launched.push(launch(item));
  }

  let mut results = Vec::with_capacity(items.len());
  let mut first_err = None;
  for (item, worker) in items.iter().zip(launched) {
    let joined = match worker {
      Ok(worker) => collect(worker, item).await,
      Err(e) => Err(e),
    };
    match joined {
      Ok(result) => {
        debug!(worker = item.id, retcodes = ?result.retcodes, "worker joined");
        results.push(result);
      }
      Err(e) => {
        error!(worker = item.id, error = %e, "worker could not be joined");
        first_err.get_or_insert(e);
      }
    }
  }

  match first_err {
    Some(e) => Err(e),
    None => Ok(results),
  }
}

/// Save a failed session's output to its log file.
///
/// A write failure is only logged; the caller still reports the build error
/// carrying the same output.
async fn write_log(dir: &Path, item: &WorkItem<'_>, output: &str) {
  let path = dir.join(item.log_file());
  match tokio::fs::write(&path, format!("{}\n", output)).await {
    Ok(()) => info!(log = %path.display(), "wrote worker log"),
    Err(e) => warn!(log = %path.display(), error = %e, "failed to write worker log"),
  }
}

/// Remove retcode files. Failures are logged and otherwise ignored.
async fn cleanup(dir: &Path, workers: usize) {
  for id in 0..workers {
    let path = dir.join(retcode_file_name(id));
    if let Err(e) = tokio::fs::remove_file(&path).await {
      warn!(path = %path.display(), error = %e, "failed to remove retcode file");
    }
  }
}

//! Joining worker sessions and reading back their exit codes.

use std::io;
use std::path::Path;

use tracing::{debug, warn};

use crate::build::partition::WorkItem;
use crate::build::types::{BuildError, ProcessResult};
use crate::build::worker::RunningWorker;

/// Wait for `worker` to finish and gather its output and per-command exit codes.
///
/// Blocks until the combined output pipe closes, which happens only once the
/// shell and everything it started have exited.
pub async fn collect(worker: RunningWorker, item: &WorkItem<'_>) -> Result<ProcessResult, BuildError> {
  let RunningWorker {
    id,
    mut child,
    input,
    output,
  } = worker;

  if let Some(input) = input
    && let Err(e) = input.await
  {
    warn!(worker = id, error = %e, "input task for worker session failed");
  }

  // Reap the session before surfacing any failure of the output task.
  let drained = output.await;
  let status = child.wait().await?;
  debug!(worker = id, status = %status, "worker session exited");
  let bytes = drained.map_err(io::Error::other)??;

  let stdout = String::from_utf8_lossy(&bytes).into_owned();
  let retcodes = read_retcodes(&item.dir.join(item.retcode_file())).await?;

  Ok(ProcessResult { stdout, retcodes })
}

/// Read one exit code per line from a retcode file.
///
/// A missing file yields no codes: the session died before it could create it.
pub async fn read_retcodes(path: &Path) -> Result<Vec<i32>, BuildError> {
  let content = match tokio::fs::read_to_string(path).await {
    Ok(content) => content,
    Err(e) if e.kind() == io::ErrorKind::NotFound => {
      warn!(path = %path.display(), "retcode file was never created");
      return Ok(Vec::new());
    }
    Err(source) => {
      return Err(BuildError::RetcodeRead {
        path: path.to_path_buf(),
        source,
      });
    }
  };

  parse_retcodes(&content).map_err(|line| BuildError::RetcodeParse {
    path: path.to_path_buf(),
    line,
  })
}

/// Parse newline-separated decimal codes, ignoring blank lines and the
/// trailing whitespace `cmd.exe` leaves behind.
fn parse_retcodes(content: &str) -> Result<Vec<i32>, String> {
  content
    .lines()
    .map(str::trim)
    .filter(|line| !line.is_empty())
    .map(|line| line.parse::<i32>().map_err(|_| line.to_string()))
    .collect()
}

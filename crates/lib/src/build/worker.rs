//! Worker sessions.
//!
//! Each worker is one interactive shell fed its whole command queue on
//! standard input. Standard error shares the standard output pipe so
//! diagnostics end up in the same captured text.

use std::io::{self, PipeWriter, Read};
use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, Command};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::build::partition::WorkItem;
use crate::build::types::BuildError;

/// A launched worker session that has not been joined yet.
#[derive(Debug)]
pub struct RunningWorker {
  pub id: usize,
  pub(crate) child: Child,
  /// Writes the session script; finishes once the shell has read it all.
  pub(crate) input: Option<JoinHandle<()>>,
  /// Drains the combined output pipe until every writer has exited.
  pub(crate) output: JoinHandle<io::Result<Vec<u8>>>,
}

/// Start a shell session for `item` and queue its commands.
///
/// Returns once the shell is spawned. The script is written by a background
/// task, so a queue larger than the pipe buffer never holds up the launch of
/// the next session.
pub fn launch(item: &WorkItem<'_>) -> Result<RunningWorker, BuildError> {
  let (mut reader, writer) = io::pipe()?;
  let mut child = spawn_shell(item.platform.shell(), writer)?;

  debug!(
    worker = item.id,
    shell = %item.platform.shell(),
    commands = item.commands.len(),
    "spawned worker session"
  );

  // Start draining right away so a chatty session never blocks on a full pipe
  // while its input is still being written.
  let output = tokio::task::spawn_blocking(move || -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    Ok(buf)
  });

  let id = item.id;
  let script = item.script();
  let input = child.stdin.take().map(|mut stdin| {
    tokio::spawn(async move {
      // A session that exits early shows up as missing exit codes when joined.
      if let Err(e) = feed(&mut stdin, &script).await {
        warn!(worker = id, error = %e, "worker session stopped reading its input");
      }
    })
  });

  Ok(RunningWorker {
    id,
    child,
    input,
    output,
  })
}

/// Spawn `program` with piped stdin and both output streams on `writer`.
///
/// The `Command` is dropped on return, closing the parent's copies of the
/// write end so the reader sees EOF once the session exits.
fn spawn_shell(program: &str, writer: PipeWriter) -> io::Result<Child> {
  let stderr = writer.try_clone()?;
  Command::new(program)
    .stdin(Stdio::piped())
    .stdout(writer)
    .stderr(stderr)
    .spawn()
}

async fn feed(stdin: &mut ChildStdin, script: &str) -> io::Result<()> {
  stdin.write_all(script.as_bytes()).await?;
  stdin.flush().await
}

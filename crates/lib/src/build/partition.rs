//! Round-robin assignment of compile commands to workers.

use std::path::{Path, PathBuf};

use crate::platform::PlatformCommands;

/// One worker's assignment.
#[derive(Debug, Clone)]
pub struct WorkItem<'a> {
  pub id: usize,
  /// Commands to run, in order.
  pub commands: Vec<String>,
  /// Build directory the session changes into.
  pub dir: PathBuf,
  pub init_cmd: String,
  pub platform: &'a PlatformCommands,
}

impl<'a> WorkItem<'a> {
  pub fn new(
    id: usize,
    commands: Vec<String>,
    dir: &Path,
    init_cmd: &str,
    platform: &'a PlatformCommands,
  ) -> Self {
    Self {
      id,
      commands,
      dir: dir.to_path_buf(),
      init_cmd: init_cmd.to_string(),
      platform,
    }
  }

  /// Sidecar file the session appends exit codes to.
  pub fn retcode_file(&self) -> String {
    retcode_file_name(self.id)
  }

  /// File the captured output is written to if the worker fails.
  pub fn log_file(&self) -> String {
    log_file_name(self.id)
  }

  /// Full session input: preamble, then each command followed by a retcode save.
  pub fn script(&self) -> String {
    let retcode_file = self.retcode_file();
    let mut lines = Vec::with_capacity(3 + 2 * self.commands.len());
    lines.push(self.init_cmd.clone());
    lines.push(self.platform.change_dir_cmd(&self.dir));
    lines.push(self.platform.create_log_cmd(&retcode_file));
    for command in &self.commands {
      lines.push(command.clone());
      lines.push(self.platform.save_retcode_cmd(&retcode_file));
    }

    let mut script = lines.join("\n");
    script.push('\n');
    script
  }
}

pub fn retcode_file_name(id: usize) -> String {
  format!("retcode_cpu{}.txt", id)
}

pub fn log_file_name(id: usize) -> String {
  format!("log_cpu{}.txt", id)
}

/// Indices of `len` items dealt round-robin across `workers` buckets.
///
/// Bucket `w` holds exactly the indices congruent to `w` modulo `workers`,
/// ascending. `workers` must be at least 1.
pub fn assign(len: usize, workers: usize) -> Vec<Vec<usize>> {
  let mut buckets = vec![Vec::new(); workers];
  for idx in 0..len {
    buckets[idx % workers].push(idx);
  }
  buckets
}

/// Split `commands` into `workers` work items. Workers with nothing to do
/// still get an (empty) item.
pub fn partition<'a>(
  commands: &[String],
  workers: usize,
  dir: &Path,
  init_cmd: &str,
  platform: &'a PlatformCommands,
) -> Vec<WorkItem<'a>> {
  assign(commands.len(), workers)
    .into_iter()
    .enumerate()
    .map(|(id, indices)| {
      let queue = indices.into_iter().map(|idx| commands[idx].clone()).collect();
      WorkItem::new(id, queue, dir, init_cmd, platform)
    })
    .collect()
}

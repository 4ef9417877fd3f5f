//! Types for build orchestration.
//!
//! This module defines the error type, per-worker results, and the
//! configuration the orchestrator runs with.

use std::path::PathBuf;

use thiserror::Error;

use crate::platform::PlatformCommands;
use crate::recipe::RecipeError;

/// Errors that can occur while building a shared library.
#[derive(Debug, Error)]
pub enum BuildError {
  /// The toolchain did not answer a version query.
  #[error("toolchain {toolchain} not found; ensure that it is installed and that it is a variant of GCC or Clang")]
  ToolchainNotFound { toolchain: String },

  /// At least one compile command exited nonzero. The link step was skipped.
  #[error("error occurred in worker #{worker}: {output}")]
  CompileFailed { worker: usize, output: String },

  /// The link command exited nonzero.
  #[error("error occurred while creating dynamic library: {output}")]
  LinkFailed { output: String },

  /// The recipe is malformed.
  #[error("invalid recipe: {0}")]
  Recipe(#[from] RecipeError),

  /// A worker's retcode file could not be read.
  #[error("failed to read exit codes from {path}: {source}")]
  RetcodeRead {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// A worker's retcode file held something other than an integer.
  #[error("malformed exit code {line:?} in {path}")]
  RetcodeParse { path: PathBuf, line: String },

  /// I/O error while spawning or talking to a worker.
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

/// What one worker session produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessResult {
  /// Combined stdout and stderr of the session.
  pub stdout: String,
  /// Exit code of every command the session ran, in issue order.
  pub retcodes: Vec<i32>,
}

impl ProcessResult {
  /// True if all `expected` commands ran and every one exited zero.
  ///
  /// Fewer codes than commands means the shell died partway through its queue.
  pub fn succeeded(&self, expected: usize) -> bool {
    self.retcodes.len() >= expected && self.retcodes.iter().all(|&code| code == 0)
  }
}

/// Configuration for a build.
#[derive(Debug, Clone)]
pub struct BuildConfig {
  /// Number of processor cores available for compile workers.
  pub parallelism: usize,

  /// Caller-imposed ceiling on the number of compile workers.
  pub max_workers: Option<usize>,

  /// Shell primitives for the host.
  pub platform: PlatformCommands,
}

impl BuildConfig {
  pub fn with_max_workers(mut self, max_workers: Option<usize>) -> Self {
    self.max_workers = max_workers;
    self
  }

  pub fn with_platform(mut self, platform: PlatformCommands) -> Self {
    self.platform = platform;
    self
  }

  /// Number of compile workers to launch; never zero.
  pub fn worker_count(&self) -> usize {
    let workers = match self.max_workers {
      Some(max) => self.parallelism.min(max),
      None => self.parallelism,
    };
    workers.max(1)
  }
}

impl Default for BuildConfig {
  fn default() -> Self {
    Self {
      parallelism: num_cpus(),
      max_workers: None,
      platform: PlatformCommands::detect(),
    }
  }
}

/// Get the number of CPUs for default parallelism.
fn num_cpus() -> usize {
  std::thread::available_parallelism().map(|p| p.get()).unwrap_or(4)
}

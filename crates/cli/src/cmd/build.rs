//! Implementation of the `shbuild build` command.
//!
//! Reads the `recipe.json` a code generator left in a directory, compiles
//! the listed sources in parallel and links them into one shared library.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, anyhow};
use clap::Args;
use serde::Serialize;
use tracing::info;

use shbuild_lib::{BuildConfig, BuildError, RecipeManifest, RecipeOptions, Toolchain, build};

use crate::output::{OutputFormat, format_duration, print_error, print_excerpt, print_json, print_stat, print_success};

#[derive(Debug, Args)]
pub struct BuildArgs {
  /// Directory holding the generated sources and recipe.json
  pub dir: PathBuf,

  /// Compiler toolchain: gcc, clang, msvc, or any GCC-compatible driver
  #[arg(short, long)]
  pub toolchain: Option<String>,

  /// Maximum number of parallel compile workers (default: all cores)
  #[arg(short, long)]
  pub jobs: Option<usize>,

  /// Extra option passed to every compile and link command
  #[arg(short = 'O', long = "option", allow_hyphen_values = true)]
  pub options: Vec<String>,

  /// Prebuilt object or archive to link in
  #[arg(long)]
  pub extra: Vec<String>,

  /// Build without OpenMP
  #[arg(long)]
  pub no_openmp: bool,

  /// Shell each worker runs (POSIX only; default: $SHELL or /bin/sh)
  #[arg(long)]
  pub shell: Option<String>,

  /// vcvarsall.bat to call before compiling with MSVC
  #[arg(long)]
  pub vcvarsall: Option<PathBuf>,

  /// Target architecture passed to vcvarsall.bat
  #[arg(long)]
  pub arch: Option<String>,
}

#[derive(Debug, Serialize)]
struct BuildSummary {
  library: PathBuf,
  toolchain: String,
  sources: usize,
  workers: usize,
  elapsed_ms: u128,
}

/// Execute the build command.
pub fn cmd_build(args: BuildArgs, output: OutputFormat) -> Result<()> {
  let start = Instant::now();

  let platform = super::resolve_platform(args.shell);
  let toolchain = match args.toolchain.as_deref() {
    Some(name) => Toolchain::from(name),
    None => Toolchain::default_for(platform.os()),
  };

  let manifest = RecipeManifest::load(&args.dir).context("Failed to load build recipe")?;
  let options = RecipeOptions {
    options: args.options,
    openmp: !args.no_openmp,
    extra: args.extra,
    vcvarsall: args.vcvarsall,
    arch: args.arch,
  };
  let recipe = toolchain.recipe(manifest, &options, &platform);

  let config = BuildConfig::default().with_max_workers(args.jobs).with_platform(platform);
  let workers = config.worker_count();
  info!(toolchain = %toolchain, workers, dir = %args.dir.display(), "starting build");

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let library = match rt.block_on(build(&args.dir, &recipe, &toolchain, &config)) {
    Ok(library) => library,
    Err(e) => return Err(report_failure(e, &args.dir)),
  };

  let elapsed = start.elapsed();
  if output.is_json() {
    print_json(&BuildSummary {
      library,
      toolchain: toolchain.to_string(),
      sources: recipe.sources.len(),
      workers,
      elapsed_ms: elapsed.as_millis(),
    })?;
  } else {
    print_success(&format!("Built {}", library.display()));
    print_stat("Toolchain", toolchain.name());
    print_stat("Sources", &recipe.sources.len().to_string());
    print_stat("Workers", &workers.to_string());
    print_stat("Duration", &format_duration(elapsed));
  }

  Ok(())
}

/// Show the tail of captured toolchain output for compile and link failures.
///
/// The full output is already in the worker log, so the returned error
/// names the log instead of repeating it.
fn report_failure(err: BuildError, dir: &Path) -> anyhow::Error {
  let (summary, log, captured) = match &err {
    BuildError::CompileFailed { worker, output } => (
      format!("Compile step failed in worker #{}", worker),
      format!("log_cpu{}.txt", worker),
      output,
    ),
    BuildError::LinkFailed { output } => ("Link step failed".to_string(), "log_cpu0.txt".to_string(), output),
    _ => return anyhow::Error::new(err).context("Build failed"),
  };

  print_error("Toolchain output:");
  print_excerpt(captured);
  anyhow!("{} (full log: {})", summary, dir.join(log).display())
}

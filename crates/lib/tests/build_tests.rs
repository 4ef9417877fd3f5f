//! End-to-end tests for the build pipeline.
//!
//! These drive real `/bin/sh` sessions. "Compiling" a unit writes
//! `<name>.o` with a shell builtin and "linking" concatenates the objects,
//! so no C toolchain is needed; `true` stands in for the compiler probe.
#![cfg(unix)]

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use shbuild_lib::platform::PlatformCommands;
use shbuild_lib::platform::os::Os;
use shbuild_lib::{BuildConfig, BuildError, BuildRecipe, SourceUnit, Toolchain, build};
use tempfile::TempDir;

const LINK_MARKER: &str = "link-ran.marker";

fn sh_config(max_workers: usize) -> BuildConfig {
  BuildConfig {
    parallelism: 8,
    max_workers: Some(max_workers),
    platform: PlatformCommands::new(Os::current(), Some("/bin/sh".to_string())),
  }
}

fn toolchain() -> Toolchain {
  Toolchain::Custom("true".to_string())
}

fn units(count: usize) -> Vec<SourceUnit> {
  (0..count).map(|i| SourceUnit::new(format!("tu{}", i))).collect()
}

/// Recipe whose compile step fails for `failing` (if any) and whose link
/// step runs `link_tail` after touching a marker file.
fn recipe(count: usize, failing: Option<&'static str>, link_tail: &'static str) -> BuildRecipe {
  BuildRecipe::new(
    "predictor",
    units(count),
    ".so",
    move |name| {
      if Some(name) == failing {
        format!("echo {} failed to compile >&2; false", name)
      } else {
        format!("echo {0} > {0}.o", name)
      }
    },
    move |objects, target| format!(": > {}; cat {} > {}.so; {}", LINK_MARKER, objects.join(" "), target, link_tail),
  )
}

fn files_matching(dir: &Path, prefix: &str) -> Vec<PathBuf> {
  let mut found: Vec<PathBuf> = std::fs::read_dir(dir)
    .unwrap()
    .map(|entry| entry.unwrap().path())
    .filter(|path| {
      path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with(prefix))
    })
    .collect();
  found.sort();
  found
}

fn canonical(temp: &TempDir) -> PathBuf {
  std::fs::canonicalize(temp.path()).unwrap()
}

#[tokio::test]
async fn successful_build_returns_library_path() {
  let temp = TempDir::new().unwrap();
  let recipe = recipe(7, None, "true");

  let library = build(temp.path(), &recipe, &toolchain(), &sh_config(3)).await.unwrap();

  assert_eq!(library, canonical(&temp).join("predictor.so"));
  assert!(library.is_absolute());
  assert!(library.exists());
  for i in 0..7 {
    assert!(temp.path().join(format!("tu{}.o", i)).exists());
  }

  // Objects are concatenated in source order.
  let content = std::fs::read_to_string(&library).unwrap();
  let expected: String = (0..7).map(|i| format!("tu{}\n", i)).collect();
  assert_eq!(content, expected);
}

#[tokio::test]
async fn successful_build_removes_retcode_files() {
  let temp = TempDir::new().unwrap();
  let recipe = recipe(5, None, "true");

  build(temp.path(), &recipe, &toolchain(), &sh_config(4)).await.unwrap();

  assert!(files_matching(temp.path(), "retcode_cpu").is_empty());
  assert!(files_matching(temp.path(), "log_cpu").is_empty());
}

#[tokio::test]
async fn more_workers_than_sources() {
  let temp = TempDir::new().unwrap();
  let recipe = recipe(2, None, "true");

  let library = build(temp.path(), &recipe, &toolchain(), &sh_config(6)).await.unwrap();

  assert!(library.exists());
  assert!(files_matching(temp.path(), "retcode_cpu").is_empty());
}

#[tokio::test]
async fn empty_source_list_links_extras_only() {
  let temp = TempDir::new().unwrap();
  std::fs::write(temp.path().join("runtime.a"), "runtime\n").unwrap();
  let recipe = recipe(0, None, "true").with_extra(vec!["runtime.a".to_string()]);

  let library = build(temp.path(), &recipe, &toolchain(), &sh_config(2)).await.unwrap();

  assert_eq!(std::fs::read_to_string(library).unwrap(), "runtime\n");
}

#[tokio::test]
async fn compile_failure_names_owning_worker_and_skips_link() {
  let temp = TempDir::new().unwrap();
  // Index 3 with 2 workers belongs to worker 1.
  let recipe = recipe(6, Some("tu3"), "true");

  let err = build(temp.path(), &recipe, &toolchain(), &sh_config(2)).await.unwrap_err();

  match err {
    BuildError::CompileFailed { worker, output } => {
      assert_eq!(worker, 1);
      assert!(output.contains("tu3 failed to compile"), "output: {}", output);
    }
    other => panic!("expected CompileFailed, got {:?}", other),
  }

  assert!(!temp.path().join(LINK_MARKER).exists(), "link command must not run");
  assert!(!temp.path().join("predictor.so").exists());

  let log = std::fs::read_to_string(temp.path().join("log_cpu1.txt")).unwrap();
  assert!(log.contains("tu3 failed to compile"));
  assert!(!temp.path().join("log_cpu0.txt").exists());

  // Diagnostics stay behind, and every worker still ran to completion.
  assert_eq!(files_matching(temp.path(), "retcode_cpu").len(), 2);
  for i in [0, 1, 2, 4, 5] {
    assert!(temp.path().join(format!("tu{}.o", i)).exists());
  }
}

#[tokio::test]
async fn link_failure_writes_log() {
  let temp = TempDir::new().unwrap();
  let recipe = recipe(4, None, "echo unresolved symbol; false");

  let err = build(temp.path(), &recipe, &toolchain(), &sh_config(2)).await.unwrap_err();

  match err {
    BuildError::LinkFailed { output } => assert!(output.contains("unresolved symbol")),
    other => panic!("expected LinkFailed, got {:?}", other),
  }

  let log = std::fs::read_to_string(temp.path().join("log_cpu0.txt")).unwrap();
  assert!(log.contains("unresolved symbol"));
  assert!(temp.path().join(LINK_MARKER).exists());
  assert!(!files_matching(temp.path(), "retcode_cpu").is_empty());
}

#[tokio::test]
async fn missing_toolchain_fails_before_any_work() {
  let temp = TempDir::new().unwrap();
  let recipe = recipe(3, None, "true");
  let toolchain = Toolchain::Custom("definitely-not-a-compiler-4a1f".to_string());

  let err = build(temp.path(), &recipe, &toolchain, &sh_config(2)).await.unwrap_err();

  assert!(matches!(err, BuildError::ToolchainNotFound { .. }));
  assert!(std::fs::read_dir(temp.path()).unwrap().next().is_none());
}

#[tokio::test]
async fn duplicate_sources_are_rejected() {
  let temp = TempDir::new().unwrap();
  let mut recipe = recipe(2, None, "true");
  recipe.sources.push(SourceUnit::new("tu0"));

  let err = build(temp.path(), &recipe, &toolchain(), &sh_config(2)).await.unwrap_err();

  assert!(matches!(err, BuildError::Recipe(_)));
}

#[tokio::test]
async fn init_command_runs_in_every_session() {
  let temp = TempDir::new().unwrap();
  let recipe = BuildRecipe::new(
    "predictor",
    units(3),
    ".so",
    |name| format!("echo $GREETING > {}.o", name),
    |objects, target| format!("cat {} > {}.so", objects.join(" "), target),
  )
  .with_init_cmd("GREETING=hello");

  let library = build(temp.path(), &recipe, &toolchain(), &sh_config(3)).await.unwrap();

  assert_eq!(std::fs::read_to_string(library).unwrap(), "hello\nhello\nhello\n");
}

#[tokio::test]
async fn repeated_builds_are_reproducible() {
  let temp = TempDir::new().unwrap();
  let recipe = recipe(5, None, "true");
  let config = sh_config(2);

  let first = build(temp.path(), &recipe, &toolchain(), &config).await.unwrap();
  let first_objects = files_matching(temp.path(), "tu");
  let second = build(temp.path(), &recipe, &toolchain(), &config).await.unwrap();
  let second_objects = files_matching(temp.path(), "tu");

  assert_eq!(first, second);
  assert_eq!(first_objects, second_objects);
  assert_eq!(first_objects.len(), 5);
}

#[tokio::test]
async fn missing_build_directory_is_an_io_error() {
  let temp = TempDir::new().unwrap();
  let recipe = recipe(1, None, "true");

  let err = build(&temp.path().join("absent"), &recipe, &toolchain(), &sh_config(1))
    .await
    .unwrap_err();

  assert!(matches!(err, BuildError::Io(_)));
}

#[tokio::test]
async fn unwritable_log_still_reports_compile_failure() {
  let temp = TempDir::new().unwrap();
  std::fs::create_dir(temp.path().join("log_cpu0.txt")).unwrap();
  let recipe = recipe(2, Some("tu0"), "true");

  let err = build(temp.path(), &recipe, &toolchain(), &sh_config(2)).await.unwrap_err();

  match err {
    BuildError::CompileFailed { worker, output } => {
      assert_eq!(worker, 0);
      assert!(output.contains("tu0 failed to compile"));
    }
    other => panic!("expected CompileFailed, got {:?}", other),
  }
}

#[tokio::test]
async fn sessions_with_large_queues_compile_concurrently() {
  // Each worker sleeps first and then has far more queued input than a pipe
  // buffer holds, so feeding one session must not wait on the other.
  let padding = format!(": {}", "x".repeat(2000));
  let recipe = BuildRecipe::new(
    "predictor",
    units(120),
    ".so",
    move |name| {
      if name == "tu0" || name == "tu1" {
        "sleep 2".to_string()
      } else {
        padding.clone()
      }
    },
    |_, target| format!(": > {}.so", target),
  );
  let temp = TempDir::new().unwrap();

  let start = Instant::now();
  build(temp.path(), &recipe, &toolchain(), &sh_config(2)).await.unwrap();
  let elapsed = start.elapsed();

  assert!(elapsed < Duration::from_millis(3500), "workers ran one after another: {:?}", elapsed);
}

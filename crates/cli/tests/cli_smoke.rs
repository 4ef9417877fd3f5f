//! CLI smoke tests for shbuild.
//!
//! These tests verify that all CLI commands run without panicking and
//! return appropriate exit codes.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a Command for the shbuild binary.
fn shbuild_cmd() -> Command {
  cargo_bin_cmd!("shbuild")
}

/// Create a temp directory with a recipe.json file.
fn temp_recipe(content: &str) -> TempDir {
  let temp = TempDir::new().unwrap();
  std::fs::write(temp.path().join("recipe.json"), content).unwrap();
  temp
}

const RECIPE: &str = r#"{
  "target": "predictor",
  "sources": [{"name": "main", "length": 4}, {"name": "tu0"}, {"name": "tu1"}]
}"#;

// =============================================================================
// Help & Version
// =============================================================================

#[test]
fn help_flag_works() {
  shbuild_cmd()
    .arg("--help")
    .assert()
    .success()
    .stdout(predicate::str::contains("Usage"));
}

#[test]
fn version_flag_works() {
  shbuild_cmd()
    .arg("--version")
    .assert()
    .success()
    .stdout(predicate::str::contains("shbuild"));
}

#[test]
fn subcommand_help_works() {
  for cmd in &["build", "probe", "info"] {
    shbuild_cmd()
      .arg(cmd)
      .arg("--help")
      .assert()
      .success()
      .stdout(predicate::str::contains("Usage"));
  }
}

// =============================================================================
// info
// =============================================================================

#[test]
fn info_prints_platform() {
  shbuild_cmd()
    .arg("info")
    .assert()
    .success()
    .stdout(predicate::str::contains("Library extension"));
}

#[test]
#[cfg(unix)]
fn info_json_reports_fish_dialect() {
  shbuild_cmd()
    .args(["info", "--shell", "/usr/bin/fish", "--output", "json"])
    .assert()
    .success()
    .stdout(predicate::str::contains("\"dialect\": \"fish\""));
}

// =============================================================================
// probe
// =============================================================================

#[test]
fn probe_msvc_is_always_found() {
  shbuild_cmd()
    .args(["probe", "msvc"])
    .assert()
    .success()
    .stdout(predicate::str::contains("native toolchain"));
}

#[test]
#[cfg(unix)]
fn probe_missing_toolchain_fails() {
  shbuild_cmd()
    .args(["probe", "definitely-not-a-compiler-4a1f", "--shell", "/bin/sh"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("definitely-not-a-compiler-4a1f not found"));
}

// =============================================================================
// build
// =============================================================================

#[test]
fn build_without_recipe_fails() {
  let temp = TempDir::new().unwrap();

  shbuild_cmd()
    .arg("build")
    .arg(temp.path())
    .assert()
    .failure()
    .stderr(predicate::str::contains("Failed to load build recipe"));
}

#[test]
#[cfg(unix)]
fn build_with_stand_in_toolchain_succeeds() {
  // `true` accepts any arguments, so every compile and link command "succeeds".
  let temp = temp_recipe(RECIPE);

  shbuild_cmd()
    .arg("build")
    .arg(temp.path())
    .args(["--toolchain", "true", "--shell", "/bin/sh", "-j", "1", "--output", "json"])
    .assert()
    .success()
    .stdout(predicate::str::contains("\"sources\": 3"))
    .stdout(predicate::str::contains("\"workers\": 1"))
    .stdout(predicate::str::contains("predictor"));

  assert!(!temp.path().join("retcode_cpu0.txt").exists());
}

#[test]
#[cfg(unix)]
fn build_with_missing_toolchain_fails() {
  let temp = temp_recipe(RECIPE);

  shbuild_cmd()
    .arg("build")
    .arg(temp.path())
    .args(["--toolchain", "definitely-not-a-compiler-4a1f", "--shell", "/bin/sh"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("not found"));
}

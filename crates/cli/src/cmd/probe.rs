//! Implementation of the `shbuild probe` command.

use anyhow::{Context, Result};

use shbuild_lib::Toolchain;

use crate::output::{OutputFormat, print_json, print_success};

/// Check that `toolchain` is invocable, exiting nonzero if it is not.
pub fn cmd_probe(toolchain: &str, shell: Option<String>, output: OutputFormat) -> Result<()> {
  let platform = super::resolve_platform(shell);
  let toolchain = Toolchain::from(toolchain);

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  rt.block_on(toolchain.probe(&platform))?;

  if output.is_json() {
    print_json(&serde_json::json!({
      "toolchain": toolchain.name(),
      "native": toolchain.is_native(),
      "found": true,
    }))?;
  } else if toolchain.is_native() {
    print_success(&format!("{} is the native toolchain; assumed present", toolchain));
  } else {
    print_success(&format!("Toolchain {} found", toolchain));
  }

  Ok(())
}

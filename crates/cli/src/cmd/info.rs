//! Implementation of the `shbuild info` command.

use anyhow::Result;

use shbuild_lib::{BuildConfig, Toolchain};

use crate::output::{OutputFormat, print_info, print_json, print_stat};

pub fn cmd_info(shell: Option<String>, output: OutputFormat) -> Result<()> {
  let platform = super::resolve_platform(shell);
  let config = BuildConfig::default().with_platform(platform);
  let platform = &config.platform;
  let toolchain = Toolchain::default_for(platform.os());

  if output.is_json() {
    let json = serde_json::json!({
      "os": platform.os().as_str(),
      "shell": platform.shell(),
      "dialect": platform.dialect().as_str(),
      "library_ext": platform.library_ext(),
      "cores": config.parallelism,
      "default_toolchain": toolchain.name(),
    });
    print_json(&json)?;
  } else {
    print_info(&format!("shbuild v{}", env!("CARGO_PKG_VERSION")));
    print_stat("OS", platform.os().as_str());
    print_stat("Shell", platform.shell());
    print_stat("Dialect", platform.dialect().as_str());
    print_stat("Library extension", platform.library_ext());
    print_stat("Cores", &config.parallelism.to_string());
    print_stat("Default toolchain", toolchain.name());
  }

  Ok(())
}

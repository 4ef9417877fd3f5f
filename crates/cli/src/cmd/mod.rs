mod build;
mod info;
mod probe;

pub use build::{BuildArgs, cmd_build};
pub use info::cmd_info;
pub use probe::cmd_probe;

use shbuild_lib::PlatformCommands;
use shbuild_lib::platform::os::Os;

/// Host platform, with an explicit `--shell` taking precedence over `SHELL`.
fn resolve_platform(shell: Option<String>) -> PlatformCommands {
  match shell {
    Some(shell) => PlatformCommands::new(Os::current(), Some(shell)),
    None => PlatformCommands::detect(),
  }
}

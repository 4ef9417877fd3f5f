//! Host-dependent shell primitives.
//!
//! Everything that differs between POSIX and Windows hosts is resolved once
//! into a [`PlatformCommands`] value and handed down to the workers.

pub mod os;
pub mod shell;

use std::fmt;
use std::path::Path;

use os::{Family, Os};
use shell::Dialect;

/// Shell program used on POSIX hosts when `SHELL` is unset.
pub const DEFAULT_POSIX_SHELL: &str = "/bin/sh";

/// Shell program used on Windows hosts.
pub const DEFAULT_WINDOWS_SHELL: &str = "cmd.exe";

/// Platform-dependent commands for one build, resolved up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformCommands {
  os: Os,
  shell: String,
  dialect: Dialect,
}

impl PlatformCommands {
  /// Resolve commands for `os`, launching `shell` if given.
  ///
  /// Windows hosts always use `cmd.exe`; a shell override only applies to
  /// POSIX hosts.
  pub fn new(os: Os, shell: Option<String>) -> Self {
    let shell = match os.family() {
      Family::Windows => DEFAULT_WINDOWS_SHELL.to_string(),
      Family::Posix => shell
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_POSIX_SHELL.to_string()),
    };
    let dialect = Dialect::from_program(&shell);
    Self { os, shell, dialect }
  }

  /// Detect the host OS and, on POSIX, honor the `SHELL` environment variable.
  pub fn detect() -> Self {
    let os = Os::current();
    let shell = match os.family() {
      Family::Posix => std::env::var("SHELL").ok(),
      Family::Windows => None,
    };
    Self::new(os, shell)
  }

  pub fn os(&self) -> Os {
    self.os
  }

  /// Interactive shell program each worker launches.
  pub fn shell(&self) -> &str {
    &self.shell
  }

  pub fn dialect(&self) -> Dialect {
    self.dialect
  }

  /// Shared-library extension for the host, with leading dot.
  pub fn library_ext(&self) -> &'static str {
    self.os.library_ext()
  }

  /// Creates or empties `file`.
  pub fn create_log_cmd(&self, file: &str) -> String {
    self.dialect.truncate_cmd(file)
  }

  /// Appends the previous command's exit status to `file`.
  pub fn save_retcode_cmd(&self, file: &str) -> String {
    self.dialect.save_retcode_cmd(file)
  }

  pub fn change_dir_cmd(&self, dir: &Path) -> String {
    self.dialect.change_dir_cmd(dir)
  }
}

impl Default for PlatformCommands {
  fn default() -> Self {
    Self::detect()
  }
}

impl fmt::Display for PlatformCommands {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} ({} via {})", self.os, self.dialect.as_str(), self.shell)
  }
}

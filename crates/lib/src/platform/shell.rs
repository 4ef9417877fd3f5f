//! Shell dialect detection and command generation.
//!
//! Workers drive a long-lived interactive shell, so exit statuses have to be
//! echoed into a sidecar file with whatever syntax that shell understands.

use std::path::Path;

/// Command-language dialect of the shell a worker session runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
  /// Bourne-compatible shells: sh, bash, zsh, dash, ksh.
  Posix,
  /// fish, whose last exit status lives in `$status`.
  Fish,
  /// Windows `cmd.exe`.
  Cmd,
}

impl Dialect {
  /// Infer the dialect from the shell program that will be launched.
  ///
  /// Unknown programs are assumed to be Bourne-compatible.
  pub fn from_program(program: &str) -> Self {
    // Split on both separators so Windows paths resolve on any host.
    let name = program.rsplit(['/', '\\']).next().unwrap_or(program).to_lowercase();
    let name = name.strip_suffix(".exe").unwrap_or(&name);

    match name {
      "fish" => Dialect::Fish,
      "cmd" => Dialect::Cmd,
      _ if name.contains("fish") => Dialect::Fish,
      _ => Dialect::Posix,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Dialect::Posix => "posix",
      Dialect::Fish => "fish",
      Dialect::Cmd => "cmd",
    }
  }

  /// Variable holding the exit status of the previous command.
  pub fn exit_status_var(&self) -> &'static str {
    match self {
      Dialect::Posix => "$?",
      Dialect::Fish => "$status",
      Dialect::Cmd => "%errorlevel%",
    }
  }

  /// Flag that makes the shell run a single command string and exit.
  pub fn oneshot_flag(&self) -> &'static str {
    match self {
      Dialect::Posix | Dialect::Fish => "-c",
      Dialect::Cmd => "/C",
    }
  }

  /// Command that creates `file` or empties it if it exists.
  pub fn truncate_cmd(&self, file: &str) -> String {
    match self {
      Dialect::Posix | Dialect::Fish => format!("true > {}", file),
      Dialect::Cmd => format!("type NUL > {}", file),
    }
  }

  /// Command that appends the previous exit status to `file` as a decimal line.
  pub fn save_retcode_cmd(&self, file: &str) -> String {
    format!("echo {} >> {}", self.exit_status_var(), file)
  }

  /// Command that switches the session into `dir`.
  pub fn change_dir_cmd(&self, dir: &Path) -> String {
    let dir = dir.to_string_lossy();
    match self {
      Dialect::Posix | Dialect::Fish => format!("cd {}", self.quote(&dir)),
      Dialect::Cmd => format!("cd /d {}", self.quote(&dir)),
    }
  }

  /// Quote a single argument so the dialect passes it through literally.
  pub fn quote(&self, arg: &str) -> String {
    match self {
      Dialect::Posix => format!("'{}'", arg.replace('\'', r"'\''")),
      Dialect::Fish => format!("'{}'", arg.replace('\\', r"\\").replace('\'', r"\'")),
      Dialect::Cmd => format!("\"{}\"", arg),
    }
  }
}

use std::fmt;

/// Host operating system, as far as the build pipeline cares about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
  Linux,
  MacOs,
  Windows,
  /// Any other POSIX host (BSDs, illumos, ...).
  Unix,
}

/// Command-language family of the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
  Posix,
  Windows,
}

impl Os {
  /// Detect the current operating system at runtime
  pub fn current() -> Self {
    Self::from_name(std::env::consts::OS)
  }

  /// Map a `std::env::consts::OS` style name onto a variant.
  pub fn from_name(name: &str) -> Self {
    match name {
      "linux" => Self::Linux,
      "macos" => Self::MacOs,
      "windows" => Self::Windows,
      _ => Self::Unix,
    }
  }

  /// Returns the lowercase string identifier for this OS
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Linux => "linux",
      Self::MacOs => "darwin",
      Self::Windows => "windows",
      Self::Unix => "unix",
    }
  }

  pub fn family(&self) -> Family {
    match self {
      Self::Windows => Family::Windows,
      Self::Linux | Self::MacOs | Self::Unix => Family::Posix,
    }
  }

  /// File extension (with leading dot) of a dynamic shared library.
  pub fn library_ext(&self) -> &'static str {
    match self {
      Self::MacOs => ".dylib",
      Self::Windows => ".dll",
      Self::Linux | Self::Unix => ".so",
    }
  }
}

impl fmt::Display for Os {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

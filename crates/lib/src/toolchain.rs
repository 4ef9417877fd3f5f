//! C compiler toolchains.
//!
//! Selects compile/link command lines per toolchain family and checks that
//! a toolchain is actually invocable before any build work starts.

use std::convert::Infallible;
use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;
use std::str::FromStr;

use tokio::process::Command;
use tracing::{debug, info};

use crate::build::BuildError;
use crate::platform::PlatformCommands;
use crate::platform::os::Os;
use crate::recipe::{BuildRecipe, RecipeManifest};

/// Architecture passed to `vcvarsall.bat` when none is configured.
pub const DEFAULT_MSVC_ARCH: &str = "amd64";

/// Compiler family used to build a recipe.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Toolchain {
  Gcc,
  Clang,
  /// Microsoft `cl.exe`; assumed present and never probed.
  Msvc,
  /// Any other GCC/Clang-compatible driver, e.g. `gcc-13` or `aarch64-linux-gnu-gcc`.
  Custom(String),
}

impl Toolchain {
  /// Default toolchain for a host OS
  pub fn default_for(os: Os) -> Self {
    match os {
      Os::MacOs => Toolchain::Clang,
      Os::Windows => Toolchain::Msvc,
      Os::Linux | Os::Unix => Toolchain::Gcc,
    }
  }

  /// Identifier as given on the command line
  pub fn name(&self) -> &str {
    match self {
      Toolchain::Gcc => "gcc",
      Toolchain::Clang => "clang",
      Toolchain::Msvc => "msvc",
      Toolchain::Custom(name) => name,
    }
  }

  /// Program invoked for compiling and linking
  pub fn executable(&self) -> &str {
    match self {
      Toolchain::Msvc => "cl.exe",
      other => other.name(),
    }
  }

  /// Platform-native toolchain that is exempt from probing.
  pub fn is_native(&self) -> bool {
    matches!(self, Toolchain::Msvc)
  }

  /// Check that the toolchain answers `--version` with exit status zero.
  ///
  /// The query runs through the session shell with all output discarded.
  pub async fn probe(&self, platform: &PlatformCommands) -> Result<(), BuildError> {
    if self.is_native() {
      debug!(toolchain = %self, "skipping probe for native toolchain");
      return Ok(());
    }

    let query = format!("{} --version", self.executable());
    let status = Command::new(platform.shell())
      .arg(platform.dialect().oneshot_flag())
      .arg(&query)
      .stdin(Stdio::null())
      .stdout(Stdio::null())
      .stderr(Stdio::null())
      .status()
      .await?;

    if !status.success() {
      return Err(BuildError::ToolchainNotFound {
        toolchain: self.name().to_string(),
      });
    }

    info!(toolchain = %self, "toolchain found");
    Ok(())
  }

  /// Build recipe for the sources listed in `manifest`.
  pub fn recipe(&self, manifest: RecipeManifest, options: &RecipeOptions, platform: &PlatformCommands) -> BuildRecipe {
    let library_ext = platform.library_ext();
    let flags = join_options(&options.options);

    let recipe = match self {
      Toolchain::Msvc => {
        let openmp = if options.openmp { " /openmp" } else { "" };
        let compile_flags = flags.clone();
        let init_cmd = match &options.vcvarsall {
          Some(path) => format!(
            "call \"{}\" {}",
            path.display(),
            options.arch.as_deref().unwrap_or(DEFAULT_MSVC_ARCH)
          ),
          None => String::new(),
        };

        BuildRecipe::new(
          manifest.target,
          manifest.sources,
          library_ext,
          move |name| format!("cl.exe /c{} /Ox {}.c{}", openmp, name, compile_flags),
          move |objects, target| {
            format!("cl.exe /LD /Fe{}{} {}{}", target, openmp, objects.join(" "), flags)
          },
        )
        .with_object_ext(".obj")
        .with_init_cmd(init_cmd)
      }
      gnu_like => {
        let cc = gnu_like.executable().to_string();
        let link_cc = cc.clone();
        let openmp = if options.openmp { " -fopenmp" } else { "" };
        let compile_flags = flags.clone();

        BuildRecipe::new(
          manifest.target,
          manifest.sources,
          library_ext,
          move |name| {
            format!(
              "{0} -c -O3 -o {1}.o {1}.c -fPIC -std=c99 -flto{2}{3}",
              cc, name, openmp, compile_flags
            )
          },
          move |objects, target| {
            format!(
              "{} -shared -O3 -o {}{} {} -std=c99 -flto{}{}",
              link_cc,
              target,
              library_ext,
              objects.join(" "),
              openmp,
              flags
            )
          },
        )
      }
    };

    recipe.with_extra(options.extra.clone())
  }
}

impl From<&str> for Toolchain {
  fn from(s: &str) -> Self {
    match s.trim() {
      "gcc" => Toolchain::Gcc,
      "clang" => Toolchain::Clang,
      "msvc" => Toolchain::Msvc,
      other => Toolchain::Custom(other.to_string()),
    }
  }
}

impl FromStr for Toolchain {
  type Err = Infallible;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Ok(Toolchain::from(s))
  }
}

impl fmt::Display for Toolchain {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.name())
  }
}

/// Knobs for the command lines a toolchain generates.
#[derive(Debug, Clone)]
pub struct RecipeOptions {
  /// Extra flags appended to both compile and link commands.
  pub options: Vec<String>,
  /// Compile and link with OpenMP.
  pub openmp: bool,
  /// Prebuilt objects or archives to link in.
  pub extra: Vec<String>,
  /// `vcvarsall.bat` to call at the start of each MSVC session.
  pub vcvarsall: Option<PathBuf>,
  /// Target architecture for `vcvarsall.bat`.
  pub arch: Option<String>,
}

impl Default for RecipeOptions {
  fn default() -> Self {
    Self {
      options: Vec::new(),
      openmp: true,
      extra: Vec::new(),
      vcvarsall: None,
      arch: None,
    }
  }
}

fn join_options(options: &[String]) -> String {
  options.iter().map(|opt| format!(" {}", opt)).collect()
}

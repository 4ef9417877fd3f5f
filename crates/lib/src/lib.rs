//! shbuild-lib: parallel native builds of generated C sources
//!
//! This crate turns a directory of generated sources into a single shared
//! library using only local processes and a command-line toolchain:
//! - `BuildRecipe`: how to compile each source and link the results
//! - `Toolchain`: compiler family, existence probe and recipe generation
//! - `PlatformCommands`: host-specific shell primitives, resolved once
//! - `build`: the parallel compile / barrier / link pipeline

pub mod build;
pub mod platform;
pub mod recipe;
pub mod toolchain;

pub use build::{BuildConfig, BuildError, ProcessResult, build};
pub use platform::PlatformCommands;
pub use recipe::{BuildRecipe, RecipeError, RecipeManifest, SourceUnit};
pub use toolchain::{RecipeOptions, Toolchain};

//! Build recipes.
//!
//! A [`BuildRecipe`] is everything the orchestrator needs to turn a directory
//! of generated sources into one shared library: the compile units, how to
//! compile one of them, how to link the results, and the naming conventions
//! for the files involved.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the recipe file a code generator leaves in the build directory.
pub const RECIPE_FILE: &str = "recipe.json";

/// Errors raised while loading or validating a recipe.
#[derive(Debug, Error)]
pub enum RecipeError {
  #[error("failed to read recipe {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse recipe {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("recipe target name is empty")]
  EmptyTarget,

  #[error("source name is empty at index {0}")]
  EmptySourceName(usize),

  #[error("duplicate source name: {0}")]
  DuplicateSource(String),
}

/// One compile unit: a generated source file that becomes one object file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceUnit {
  /// Logical name, without extension. Unique within a recipe.
  pub name: String,
  /// Size hint left by the code generator (number of statements).
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub length: Option<usize>,
}

impl SourceUnit {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      length: None,
    }
  }
}

/// Contents of `recipe.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeManifest {
  pub target: String,
  pub sources: Vec<SourceUnit>,
}

impl RecipeManifest {
  /// Load `recipe.json` from `dir`.
  pub fn load(dir: &Path) -> Result<Self, RecipeError> {
    let path = dir.join(RECIPE_FILE);
    let content = std::fs::read_to_string(&path).map_err(|source| RecipeError::Read {
      path: path.clone(),
      source,
    })?;
    serde_json::from_str(&content).map_err(|source| RecipeError::Parse { path, source })
  }
}

type ObjectCmdFn = dyn Fn(&str) -> String + Send + Sync;
type LibraryCmdFn = dyn Fn(&[String], &str) -> String + Send + Sync;

/// Immutable description of one build.
pub struct BuildRecipe {
  /// Compile units, in the order they were generated.
  pub sources: Vec<SourceUnit>,
  /// Preamble run once at the start of every worker session.
  pub init_cmd: String,
  /// Object file extension, with leading dot.
  pub object_ext: String,
  /// Shared-library extension, with leading dot.
  pub library_ext: String,
  /// Base name of the output library.
  pub target: String,
  /// Additional link inputs that are not compiled here.
  pub extra: Vec<String>,
  object_cmd: Box<ObjectCmdFn>,
  library_cmd: Box<LibraryCmdFn>,
}

impl BuildRecipe {
  /// Create a recipe with `.o` objects and no init command or extra inputs.
  pub fn new<O, L>(
    target: impl Into<String>,
    sources: Vec<SourceUnit>,
    library_ext: impl Into<String>,
    object_cmd: O,
    library_cmd: L,
  ) -> Self
  where
    O: Fn(&str) -> String + Send + Sync + 'static,
    L: Fn(&[String], &str) -> String + Send + Sync + 'static,
  {
    Self {
      sources,
      init_cmd: String::new(),
      object_ext: ".o".to_string(),
      library_ext: library_ext.into(),
      target: target.into(),
      extra: Vec::new(),
      object_cmd: Box::new(object_cmd),
      library_cmd: Box::new(library_cmd),
    }
  }

  pub fn with_init_cmd(mut self, init_cmd: impl Into<String>) -> Self {
    self.init_cmd = init_cmd.into();
    self
  }

  pub fn with_object_ext(mut self, object_ext: impl Into<String>) -> Self {
    self.object_ext = object_ext.into();
    self
  }

  pub fn with_extra(mut self, extra: Vec<String>) -> Self {
    self.extra = extra;
    self
  }

  /// Compile command for the source named `name`.
  pub fn object_cmd(&self, name: &str) -> String {
    (self.object_cmd)(name)
  }

  /// Link command producing `target` from `objects`.
  pub fn library_cmd(&self, objects: &[String], target: &str) -> String {
    (self.library_cmd)(objects, target)
  }

  /// Compile commands for every source, in source order.
  pub fn object_cmds(&self) -> Vec<String> {
    self.sources.iter().map(|s| self.object_cmd(&s.name)).collect()
  }

  /// Link inputs: one object per source, in source order, then `extra`.
  pub fn link_inputs(&self) -> Vec<String> {
    self
      .sources
      .iter()
      .map(|s| format!("{}{}", s.name, self.object_ext))
      .chain(self.extra.iter().cloned())
      .collect()
  }

  /// File name of the library the link step produces.
  pub fn library_file_name(&self) -> String {
    format!("{}{}", self.target, self.library_ext)
  }

  /// Check the naming invariants the orchestrator relies on.
  pub fn validate(&self) -> Result<(), RecipeError> {
    if self.target.trim().is_empty() {
      return Err(RecipeError::EmptyTarget);
    }
    let mut seen = HashSet::new();
    for (idx, source) in self.sources.iter().enumerate() {
      if source.name.is_empty() {
        return Err(RecipeError::EmptySourceName(idx));
      }
      if !seen.insert(source.name.as_str()) {
        return Err(RecipeError::DuplicateSource(source.name.clone()));
      }
    }
    Ok(())
  }
}

impl fmt::Debug for BuildRecipe {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("BuildRecipe")
      .field("target", &self.target)
      .field("sources", &self.sources)
      .field("init_cmd", &self.init_cmd)
      .field("object_ext", &self.object_ext)
      .field("library_ext", &self.library_ext)
      .field("extra", &self.extra)
      .finish_non_exhaustive()
  }
}

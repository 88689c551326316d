//! Build configuration.
//!
//! A build invocation is exactly one [`BuildConfig`]. It is either built in
//! code or loaded from a project file with [`load_project`].
//!
//! # Submodules
//!
//! - [`project`] - `smk.toml` loading
//! - `types` - `BuildConfig` and `BuildType`

pub mod project;
mod types;

use std::path::PathBuf;

use thiserror::Error;

use crate::library::LibraryError;

pub use crate::library::Library;
pub use project::load_project;
pub use types::*;

/// Errors in the project description. All of them are raised before any
/// compilation starts.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("project file not found: {}", .0.display())]
  NotFound(PathBuf),

  #[error("failed to read project file {}: {message}", .path.display())]
  Read { path: PathBuf, message: String },

  #[error("failed to parse project file {}: {message}", .path.display())]
  Parse { path: PathBuf, message: String },

  #[error("target name must not be empty")]
  EmptyName,

  #[error("target '{0}' declares no sources")]
  NoSources(String),

  #[error("source listed more than once: {}", .0.display())]
  DuplicateSource(PathBuf),

  /// Two sources would write the same object and dependency file.
  #[error("sources {} and {} both map to object {}", .first.display(), .second.display(), .object.display())]
  ConflictingObject {
    first: PathBuf,
    second: PathBuf,
    object: PathBuf,
  },

  #[error("unknown build type '{0}' (expected 'debug' or 'release')")]
  UnknownBuildType(String),

  #[error("library error: {0}")]
  Library(#[from] LibraryError),
}

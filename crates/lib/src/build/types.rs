//! Types for build orchestration.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::compile::BuildAborted;
use crate::config::{BuildType, ConfigError};
use crate::consts::MAX_JOBS;
use crate::link::LinkError;

/// Per-invocation choices that are not part of the project description.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildOptions {
  pub build_type: BuildType,
  /// Write `compile_commands.json` after a successful build.
  pub generate_db: bool,
  /// Concurrent compiler processes. `None` picks a default from the CPU count.
  pub jobs: Option<usize>,
}

impl BuildOptions {
  pub fn new(build_type: BuildType) -> Self {
    Self {
      build_type,
      ..Default::default()
    }
  }

  /// Effective worker bound, never zero.
  pub fn jobs(&self) -> usize {
    match self.jobs {
      Some(jobs) => jobs.max(1),
      None => default_jobs(),
    }
  }
}

fn default_jobs() -> usize {
  let cpus = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
  (cpus + 4).min(MAX_JOBS)
}

/// Phases of a single `build` invocation, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildPhase {
  Configuring,
  Compiling,
  Linking,
  EmittingDatabase,
  Done,
}

impl fmt::Display for BuildPhase {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      BuildPhase::Configuring => "configuring",
      BuildPhase::Compiling => "compiling",
      BuildPhase::Linking => "linking",
      BuildPhase::EmittingDatabase => "emitting compile database",
      BuildPhase::Done => "done",
    };
    f.write_str(name)
  }
}

/// Summary of a successful build.
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
  pub build_type: BuildType,
  pub executable: PathBuf,
  /// Sources the compiler ran for, in configured order.
  pub compiled: Vec<PathBuf>,
  /// Sources whose objects were reused, in configured order.
  pub up_to_date: Vec<PathBuf>,
  /// Whether the linker ran.
  pub linked: bool,
  /// Path of the written compile database, if one was requested.
  pub compile_db: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanOutcome {
  Removed(PathBuf),
  NothingToClean(PathBuf),
}

#[derive(Debug, Error)]
pub enum BuildError {
  #[error(transparent)]
  Config(#[from] ConfigError),

  /// At least one source failed to compile. Carries every gathered outcome.
  #[error(transparent)]
  CompilationFailed(#[from] BuildAborted),

  #[error("linking failed (exit code {code:?})")]
  LinkFailed { code: Option<i32>, output: String },

  #[error(transparent)]
  Link(LinkError),

  #[error("executable not found: {0} (build it first)")]
  MissingExecutable(PathBuf),

  #[error("failed to write compile database {path}: {message}")]
  CompileDb { path: PathBuf, message: String },

  #[error("failed to {action} {path}: {source}")]
  Io {
    action: &'static str,
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

impl From<LinkError> for BuildError {
  fn from(err: LinkError) -> Self {
    match err {
      LinkError::Failed { code, output } => BuildError::LinkFailed { code, output },
      other => BuildError::Link(other),
    }
  }
}

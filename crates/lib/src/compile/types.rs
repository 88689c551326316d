//! Types for compilation.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One entry of `compile_commands.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileDbEntry {
  pub directory: String,
  pub arguments: Vec<String>,
  pub file: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompileStatus {
  /// The compiler ran and exited successfully.
  Compiled,
  /// The object was already up to date; the compiler was not invoked.
  UpToDate,
  /// The compiler exited non-zero or could not be started.
  Failed,
}

/// Terminal result of compiling one source.
#[derive(Debug, Clone, Serialize)]
pub struct CompilationOutcome {
  pub source: PathBuf,
  pub object_path: PathBuf,
  pub db_entry: CompileDbEntry,
  pub status: CompileStatus,
  /// Captured compiler output (stdout followed by stderr). Empty when skipped.
  pub output: String,
}

impl CompilationOutcome {
  pub fn succeeded(&self) -> bool {
    self.status != CompileStatus::Failed
  }
}

/// A source that failed to compile, with the compiler's diagnostics.
#[derive(Debug, Clone)]
pub struct CompileFailure {
  pub file: PathBuf,
  pub output: String,
}

/// At least one source failed to compile.
///
/// Carries every outcome gathered before the executor stopped, including
/// those of sources that were already in flight when the first failure was
/// observed.
#[derive(Debug, Error)]
#[error("build aborted: {} source(s) failed to compile", .failures.len())]
pub struct BuildAborted {
  pub failures: Vec<CompileFailure>,
  pub outcomes: Vec<CompilationOutcome>,
}

//! Build orchestration.
//!
//! A [`Builder`] owns exactly one [`BuildConfig`] and sequences one build:
//!
//! 1. **Configuring**: append the build type's flags to a per-invocation copy
//!    of the compile flags and select the build-type directory
//! 2. **Compiling**: realize every object, fail-fast ([`crate::compile`])
//! 3. **Linking**: relink only if the executable is stale ([`crate::link`])
//! 4. **Emitting database**: optionally write `compile_commands.json`
//!
//! Nothing is carried between invocations except the artifacts on disk.

mod types;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::sync::Arc;

use tokio::process::Command;
use tracing::{debug, info};

use crate::compile::{CompilationOutcome, CompileContext, CompileDbEntry, CompileStatus, compile_all};
use crate::config::BuildConfig;
use crate::layout::ArtifactLayout;
use crate::link::{LinkStatus, realize_executable};

pub use types::*;

pub struct Builder {
  config: BuildConfig,
  options: BuildOptions,
}

impl Builder {
  pub fn new(config: BuildConfig, options: BuildOptions) -> Self {
    Self { config, options }
  }

  pub fn config(&self) -> &BuildConfig {
    &self.config
  }

  pub fn options(&self) -> &BuildOptions {
    &self.options
  }

  pub fn layout(&self) -> ArtifactLayout {
    ArtifactLayout::new(&self.config, self.options.build_type)
  }

  /// Run one build.
  ///
  /// A compile failure stops the build before linking; a link failure leaves
  /// the previous executable in place. In both cases no compile database is
  /// written.
  pub async fn build(&self) -> Result<BuildReport, BuildError> {
    let build_type = self.options.build_type;
    enter(BuildPhase::Configuring);
    self.config.validate()?;

    let layout = self.layout();
    layout.check_distinct_objects(&self.config.sources)?;
    let mut flags = self.config.cflags.clone();
    flags.extend(build_type.flags().iter().map(|f| f.to_string()));
    info!(
      app = %self.config.app_name,
      build_type = %build_type,
      dir = ?layout.type_dir(),
      "build configured"
    );

    let ctx = Arc::new(CompileContext {
      compiler: self.config.compiler.clone(),
      flags,
      layout: layout.clone(),
      verbose: self.config.verbose,
    });

    enter(BuildPhase::Compiling);
    let outcomes = compile_all(ctx, &self.config.sources, self.options.jobs()).await?;
    let outcomes = in_source_order(&self.config.sources, outcomes);

    enter(BuildPhase::Linking);
    let objects: Vec<PathBuf> = outcomes.iter().map(|o| o.object_path.clone()).collect();
    let link_status = realize_executable(
      &layout,
      &self.config.compiler,
      &objects,
      &self.config.libs,
      self.config.verbose,
    )
    .await?;

    let compile_db = if self.options.generate_db {
      enter(BuildPhase::EmittingDatabase);
      let path = layout.compile_db_path();
      let entries: Vec<&CompileDbEntry> = outcomes.iter().map(|o| &o.db_entry).collect();
      write_compile_db(&path, &entries)?;
      Some(path)
    } else {
      None
    };

    enter(BuildPhase::Done);
    let sources_with = |status: CompileStatus| -> Vec<PathBuf> {
      outcomes
        .iter()
        .filter(|o| o.status == status)
        .map(|o| o.source.clone())
        .collect()
    };

    Ok(BuildReport {
      build_type,
      executable: layout.executable_path(),
      compiled: sources_with(CompileStatus::Compiled),
      up_to_date: sources_with(CompileStatus::UpToDate),
      linked: link_status == LinkStatus::Linked,
      compile_db,
    })
  }

  /// Run the existing executable with inherited stdio from the project root.
  pub async fn run(&self) -> Result<ExitStatus, BuildError> {
    let executable = self.layout().executable_path();
    if !executable.is_file() {
      return Err(BuildError::MissingExecutable(executable));
    }

    info!(executable = ?executable, "running");
    Command::new(&executable)
      .current_dir(&self.config.root_dir)
      .status()
      .await
      .map_err(|source| BuildError::Io {
        action: "run",
        path: executable,
        source,
      })
  }

  /// Remove the build-type directory.
  pub fn clean(&self) -> Result<CleanOutcome, BuildError> {
    let layout = self.layout();
    let dir = layout.type_dir();

    if !dir.is_dir() {
      info!(dir = ?dir, "build directory does not exist, nothing to clean");
      return Ok(CleanOutcome::NothingToClean(dir.to_path_buf()));
    }

    fs::remove_dir_all(dir).map_err(|source| BuildError::Io {
      action: "remove",
      path: dir.to_path_buf(),
      source,
    })?;
    info!(dir = ?dir, "build directory removed");
    Ok(CleanOutcome::Removed(dir.to_path_buf()))
  }
}

fn enter(phase: BuildPhase) {
  debug!(phase = %phase, "build phase");
}

/// Reorder completion-ordered outcomes to match the configured sources.
fn in_source_order(sources: &[PathBuf], outcomes: Vec<CompilationOutcome>) -> Vec<CompilationOutcome> {
  let mut by_source: HashMap<PathBuf, CompilationOutcome> =
    outcomes.into_iter().map(|o| (o.source.clone(), o)).collect();
  sources.iter().filter_map(|s| by_source.remove(s)).collect()
}

/// Overwrite `path` with the entries as pretty-printed JSON.
pub fn write_compile_db(path: &Path, entries: &[&CompileDbEntry]) -> Result<(), BuildError> {
  let content = serde_json::to_string_pretty(entries).map_err(|e| BuildError::CompileDb {
    path: path.to_path_buf(),
    message: e.to_string(),
  })?;
  fs::write(path, content).map_err(|e| BuildError::CompileDb {
    path: path.to_path_buf(),
    message: e.to_string(),
  })?;
  info!(path = ?path, entries = entries.len(), "compile database updated");
  Ok(())
}

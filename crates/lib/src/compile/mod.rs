//! Source compilation.
//!
//! This module turns sources into object artifacts:
//! - Per-file staleness checks against compiler dependency files ([`oracle`])
//! - One compiler process per stale source, bounded by a semaphore
//! - Fail-fast: once a compile fails no further sources are started, but
//!   compilers already running are waited for
//!
//! Workers share nothing but a read-only [`CompileContext`] and an abort
//! flag. Each writes only the object and dependency file derived from its
//! own source.

pub mod oracle;
mod types;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::layout::ArtifactLayout;
use crate::util::process::run_captured;

pub use oracle::{StaleReason, check_object, needs_recompile};
pub use types::{BuildAborted, CompilationOutcome, CompileDbEntry, CompileFailure, CompileStatus};

/// Read-only state shared by every compile worker.
#[derive(Debug, Clone)]
pub struct CompileContext {
  pub compiler: String,
  /// Configured flags plus the build type's flags.
  pub flags: Vec<String>,
  pub layout: ArtifactLayout,
  pub verbose: bool,
}

impl CompileContext {
  /// Full compiler invocation for `source`, program first.
  ///
  /// `compiler <flags...> -MMD -MF <depfile> -c <source> -o <object>`
  pub fn command(&self, source: &Path) -> Vec<String> {
    let object = self.layout.object_path(source);
    let depfile = self.layout.depfile_path(source);

    let mut cmd = Vec::with_capacity(self.flags.len() + 8);
    cmd.push(self.compiler.clone());
    cmd.extend(self.flags.iter().cloned());
    cmd.extend([
      "-MMD".to_string(),
      "-MF".to_string(),
      depfile.to_string_lossy().to_string(),
      "-c".to_string(),
      source.to_string_lossy().to_string(),
      "-o".to_string(),
      object.to_string_lossy().to_string(),
    ]);
    cmd
  }

  pub fn db_entry(&self, source: &Path, command: Vec<String>) -> CompileDbEntry {
    CompileDbEntry {
      directory: self.layout.root_dir().to_string_lossy().to_string(),
      arguments: command,
      file: source.to_string_lossy().to_string(),
    }
  }
}

/// Compile a single source if its object is stale.
///
/// Never returns an error: a compiler that exits non-zero, or cannot be
/// started at all, produces an outcome with [`CompileStatus::Failed`] and the
/// diagnostics in [`CompilationOutcome::output`]. Skipped sources still carry
/// a full compile-database entry.
pub async fn compile_one(ctx: &CompileContext, source: &Path) -> CompilationOutcome {
  let object_path = ctx.layout.object_path(source);
  let depfile = ctx.layout.depfile_path(source);
  let command = ctx.command(source);
  let db_entry = ctx.db_entry(source, command.clone());

  let outcome = |status: CompileStatus, output: String| CompilationOutcome {
    source: source.to_path_buf(),
    object_path: object_path.clone(),
    db_entry: db_entry.clone(),
    status,
    output,
  };

  if let Some(parent) = object_path.parent() {
    if let Err(e) = tokio::fs::create_dir_all(parent).await {
      error!(dir = ?parent, error = %e, "failed to create object directory");
      return outcome(
        CompileStatus::Failed,
        format!("failed to create {}: {}", parent.display(), e),
      );
    }
  }

  match oracle::check_object(&object_path, &depfile, ctx.layout.root_dir()) {
    None => {
      info!(object = ?object_path, "up to date, skipping");
      return outcome(CompileStatus::UpToDate, String::new());
    }
    Some(reason) => debug!(source = ?source, reason = %reason, "recompiling"),
  }

  info!(source = ?source, "compiling");
  if ctx.verbose {
    info!(cmd = %command.join(" "), "compile command");
  } else {
    debug!(cmd = %command.join(" "), "compile command");
  }

  match run_captured(&command[0], &command[1..], ctx.layout.root_dir()).await {
    Ok(result) if result.success => outcome(CompileStatus::Compiled, result.output),
    Ok(result) => {
      error!(source = ?source, code = ?result.code, "compiler failed");
      outcome(CompileStatus::Failed, result.output)
    }
    Err(e) => {
      error!(source = ?source, error = %e, "failed to start compiler");
      outcome(
        CompileStatus::Failed,
        format!("failed to run {}: {}", ctx.compiler, e),
      )
    }
  }
}

/// Compile every source, at most `jobs` at a time.
///
/// Outcomes are returned in completion order. If any source fails, the
/// remaining not-yet-started sources are never dispatched, all running
/// compilers are drained, and [`BuildAborted`] carries what was gathered.
pub async fn compile_all(
  ctx: Arc<CompileContext>,
  sources: &[PathBuf],
  jobs: usize,
) -> Result<Vec<CompilationOutcome>, BuildAborted> {
  info!(sources = sources.len(), jobs, "compilation started");

  let semaphore = Arc::new(Semaphore::new(jobs.max(1)));
  let aborted = Arc::new(AtomicBool::new(false));
  let mut join_set = JoinSet::new();

  for source in sources {
    let source = source.clone();
    let ctx = ctx.clone();
    let semaphore = semaphore.clone();
    let aborted = aborted.clone();

    join_set.spawn(async move {
      let Ok(_permit) = semaphore.acquire().await else {
        return None;
      };

      if aborted.load(Ordering::SeqCst) {
        debug!(source = ?source, "not dispatched after earlier failure");
        return None;
      }

      let outcome = compile_one(&ctx, &source).await;
      // Raise the flag before the permit is released so the next waiter sees it.
      if !outcome.succeeded() {
        aborted.store(true, Ordering::SeqCst);
      }
      Some(outcome)
    });
  }

  let mut outcomes = Vec::with_capacity(sources.len());
  let mut failures = Vec::new();
  let mut not_dispatched = 0usize;

  while let Some(join_result) = join_set.join_next().await {
    match join_result {
      Ok(Some(outcome)) => {
        if !outcome.succeeded() {
          if failures.is_empty() {
            warn!(source = ?outcome.source, "compilation failed, draining running compilers");
          }
          failures.push(CompileFailure {
            file: outcome.source.clone(),
            output: outcome.output.clone(),
          });
        }
        outcomes.push(outcome);
      }
      Ok(None) => not_dispatched += 1,
      Err(e) => {
        error!(error = %e, "compile task panicked");
        aborted.store(true, Ordering::SeqCst);
        failures.push(CompileFailure {
          file: PathBuf::from("<worker>"),
          output: e.to_string(),
        });
      }
    }
  }

  if !failures.is_empty() {
    error!(
      failed = failures.len(),
      finished = outcomes.len(),
      not_dispatched,
      "compilation aborted"
    );
    return Err(BuildAborted { failures, outcomes });
  }

  info!(
    compiled = outcomes.iter().filter(|o| o.status == CompileStatus::Compiled).count(),
    up_to_date = outcomes.iter().filter(|o| o.status == CompileStatus::UpToDate).count(),
    "compilation finished"
  );

  Ok(outcomes)
}

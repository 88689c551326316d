//! Executable linking and the relink decision.
//!
//! The executable is stale when it is missing, when the link-hash marker
//! next to it does not match the current link command, or when any object is
//! newer than it. The marker is a SHA-256 digest of the link command's
//! tokens, sorted before hashing, so flag and library changes force a relink
//! even when no object changed.
//!
//! The linker writes to a scratch path that is renamed over the executable
//! only on success. A failed link leaves both the executable and the marker
//! as they were.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::layout::ArtifactLayout;
use crate::util::hash::{ContentHash, hash_bytes};
use crate::util::process::run_captured;

#[derive(Debug, Error)]
pub enum LinkError {
  #[error("linker failed (exit code {code:?})")]
  Failed { code: Option<i32>, output: String },

  #[error("failed to run linker {program}: {source}")]
  Spawn {
    program: String,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to {action} {path}: {source}")]
  Io {
    action: &'static str,
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkStatus {
  Linked,
  UpToDate,
}

/// Why the executable has to be relinked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelinkReason {
  MissingExecutable,
  MissingMarker,
  CommandChanged,
  NewerObject(PathBuf),
}

impl fmt::Display for RelinkReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RelinkReason::MissingExecutable => write!(f, "executable does not exist"),
      RelinkReason::MissingMarker => write!(f, "no link hash recorded"),
      RelinkReason::CommandChanged => write!(f, "link command changed"),
      RelinkReason::NewerObject(path) => write!(f, "object changed: {}", path.display()),
    }
  }
}

/// `compiler <objects...> <libs...> -o <executable>`
pub fn link_command(compiler: &str, objects: &[PathBuf], libs: &[String], executable: &Path) -> Vec<String> {
  let mut cmd = Vec::with_capacity(objects.len() + libs.len() + 3);
  cmd.push(compiler.to_string());
  cmd.extend(objects.iter().map(|o| o.to_string_lossy().to_string()));
  cmd.extend(libs.iter().cloned());
  cmd.push("-o".to_string());
  cmd.push(executable.to_string_lossy().to_string());
  cmd
}

/// Order-insensitive fingerprint of a link command.
///
/// Two commands that are permutations of the same tokens share a hash.
pub fn link_hash(command: &[String]) -> ContentHash {
  let mut tokens: Vec<&str> = command.iter().map(String::as_str).collect();
  tokens.sort_unstable();
  hash_bytes(tokens.join(" ").as_bytes())
}

pub fn read_marker(path: &Path) -> Option<String> {
  fs::read_to_string(path).ok().map(|s| s.trim().to_string())
}

pub fn write_marker(path: &Path, hash: &ContentHash) -> std::io::Result<()> {
  fs::write(path, format!("{}\n", hash))
}

/// Check the executable against its marker and objects.
///
/// Returns `None` when the executable is up to date.
pub fn check_executable(
  executable: &Path,
  marker: &Path,
  objects: &[PathBuf],
  command: &[String],
) -> Option<RelinkReason> {
  let Some(exe_mtime) = mtime(executable) else {
    return Some(RelinkReason::MissingExecutable);
  };

  match read_marker(marker) {
    None => return Some(RelinkReason::MissingMarker),
    Some(recorded) if recorded != link_hash(command).0 => return Some(RelinkReason::CommandChanged),
    Some(_) => {}
  }

  objects
    .iter()
    .find(|object| mtime(object).is_none_or(|m| m > exe_mtime))
    .map(|object| RelinkReason::NewerObject(object.clone()))
}

pub fn needs_relink(executable: &Path, marker: &Path, objects: &[PathBuf], command: &[String]) -> bool {
  check_executable(executable, marker, objects, command).is_some()
}

/// Link `objects` into the layout's executable if it is stale.
pub async fn realize_executable(
  layout: &ArtifactLayout,
  compiler: &str,
  objects: &[PathBuf],
  libs: &[String],
  verbose: bool,
) -> Result<LinkStatus, LinkError> {
  let executable = layout.executable_path();
  let marker = layout.link_hash_path();
  let command = link_command(compiler, objects, libs, &executable);

  match check_executable(&executable, &marker, objects, &command) {
    None => {
      info!(executable = ?executable, "no changes detected, skipping link");
      return Ok(LinkStatus::UpToDate);
    }
    Some(reason) => debug!(reason = %reason, "relinking"),
  }

  let scratch = scratch_path(&executable);
  let mut invocation = command.clone();
  if let Some(out) = invocation.last_mut() {
    *out = scratch.to_string_lossy().to_string();
  }

  info!(objects = objects.len(), executable = ?executable, "linking");
  if verbose {
    info!(cmd = %command.join(" "), "link command");
  } else {
    debug!(cmd = %command.join(" "), "link command");
  }

  fs::create_dir_all(layout.type_dir()).map_err(|source| LinkError::Io {
    action: "create",
    path: layout.type_dir().to_path_buf(),
    source,
  })?;

  let result = run_captured(&invocation[0], &invocation[1..], layout.root_dir())
    .await
    .map_err(|source| LinkError::Spawn {
      program: compiler.to_string(),
      source,
    })?;

  if !result.success {
    error!(code = ?result.code, "linker failed");
    let _ = fs::remove_file(&scratch);
    return Err(LinkError::Failed {
      code: result.code,
      output: result.output,
    });
  }

  fs::rename(&scratch, &executable).map_err(|source| LinkError::Io {
    action: "replace",
    path: executable.clone(),
    source,
  })?;

  write_marker(&marker, &link_hash(&command)).map_err(|source| LinkError::Io {
    action: "write",
    path: marker.clone(),
    source,
  })?;

  info!(executable = ?executable, "linking finished");
  Ok(LinkStatus::Linked)
}

fn scratch_path(executable: &Path) -> PathBuf {
  let name = executable
    .file_name()
    .map(|n| n.to_string_lossy().to_string())
    .unwrap_or_default();
  executable.with_file_name(format!(".{}.partial", name))
}

fn mtime(path: &Path) -> Option<SystemTime> {
  fs::metadata(path).and_then(|m| m.modified()).ok()
}

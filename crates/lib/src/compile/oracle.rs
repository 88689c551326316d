//! Recompilation decisions.
//!
//! An object is up to date only if it exists, its dependency file exists,
//! every dependency listed there exists, and none of them is newer than the
//! object. Anything else means the source must be recompiled; a vanished
//! dependency is a rebuild trigger, never an error.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{debug, warn};

use crate::depfile::DependencyRecord;

/// Why an object has to be rebuilt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaleReason {
  MissingObject,
  MissingDepfile,
  UnreadableDepfile(String),
  MissingDependency(PathBuf),
  NewerDependency(PathBuf),
}

impl fmt::Display for StaleReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      StaleReason::MissingObject => write!(f, "object does not exist"),
      StaleReason::MissingDepfile => write!(f, "dependency file does not exist"),
      StaleReason::UnreadableDepfile(message) => write!(f, "dependency file unreadable: {}", message),
      StaleReason::MissingDependency(path) => write!(f, "dependency removed: {}", path.display()),
      StaleReason::NewerDependency(path) => write!(f, "dependency changed: {}", path.display()),
    }
  }
}

/// Check an object against its dependency file.
///
/// Dependency paths are resolved against `base_dir`, the directory the
/// compiler ran in. Returns `None` when the object is up to date.
pub fn check_object(object: &Path, depfile: &Path, base_dir: &Path) -> Option<StaleReason> {
  let Some(object_mtime) = mtime(object) else {
    return Some(StaleReason::MissingObject);
  };

  if !depfile.exists() {
    return Some(StaleReason::MissingDepfile);
  }

  let record = match DependencyRecord::read(depfile) {
    Ok(record) => record,
    Err(e) => {
      warn!(depfile = ?depfile, error = %e, "failed to read dependency file, will rebuild");
      return Some(StaleReason::UnreadableDepfile(e.to_string()));
    }
  };

  for dep in &record.prerequisites {
    match mtime(&base_dir.join(dep)) {
      None => return Some(StaleReason::MissingDependency(dep.clone())),
      Some(dep_mtime) if dep_mtime > object_mtime => {
        return Some(StaleReason::NewerDependency(dep.clone()));
      }
      Some(_) => {}
    }
  }

  debug!(object = ?object, deps = record.prerequisites.len(), "object up to date");
  None
}

pub fn needs_recompile(object: &Path, depfile: &Path, base_dir: &Path) -> bool {
  check_object(object, depfile, base_dir).is_some()
}

fn mtime(path: &Path) -> Option<SystemTime> {
  fs::metadata(path).and_then(|m| m.modified()).ok()
}

//! Artifact layout on disk.
//!
//! ```text
//! <root>/compile_commands.json
//! <buildRoot>/<buildType>/
//!   <source path>.o          object artifact
//!   <source path>.d          dependency file
//!   .<app>.linkhash          link-hash marker
//!   <app>                    executable
//! ```
//!
//! Every source maps to its own object and dependency path, so parallel
//! compilations never write to the same file.

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

use crate::config::{BuildConfig, BuildType, ConfigError};
use crate::consts::{COMPILE_DB_FILE, LINK_HASH_SUFFIX};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLayout {
  root_dir: PathBuf,
  type_dir: PathBuf,
  app_name: String,
}

impl ArtifactLayout {
  pub fn new(config: &BuildConfig, build_type: BuildType) -> Self {
    Self {
      root_dir: config.root_dir.clone(),
      type_dir: config.build_root().join(build_type.dir_name()),
      app_name: config.app_name.clone(),
    }
  }

  pub fn root_dir(&self) -> &Path {
    &self.root_dir
  }

  /// The build-type subdirectory. `clean` removes exactly this.
  pub fn type_dir(&self) -> &Path {
    &self.type_dir
  }

  pub fn object_path(&self, source: &Path) -> PathBuf {
    self.artifact_path(source, "o")
  }

  pub fn depfile_path(&self, source: &Path) -> PathBuf {
    self.artifact_path(source, "d")
  }

  pub fn executable_path(&self) -> PathBuf {
    self.type_dir.join(&self.app_name)
  }

  pub fn link_hash_path(&self) -> PathBuf {
    self
      .type_dir
      .join(format!(".{}.{}", self.app_name, LINK_HASH_SUFFIX))
  }

  pub fn compile_db_path(&self) -> PathBuf {
    self.root_dir.join(COMPILE_DB_FILE)
  }

  /// Resolve a path as the compiler sees it (relative to the project root).
  pub fn resolve(&self, path: &Path) -> PathBuf {
    self.root_dir.join(path)
  }

  /// Reject source lists where two entries share an object path, such as
  /// `a.c` and `a.cpp`, or `a.c` and `./a.c`.
  pub fn check_distinct_objects(&self, sources: &[PathBuf]) -> Result<(), ConfigError> {
    let mut seen: HashMap<PathBuf, &PathBuf> = HashMap::with_capacity(sources.len());
    for source in sources {
      let object = self.object_path(source);
      if let Some(first) = seen.get(&object) {
        return Err(ConfigError::ConflictingObject {
          first: (*first).clone(),
          second: source.clone(),
          object,
        });
      }
      seen.insert(object, source);
    }
    Ok(())
  }

  fn artifact_path(&self, source: &Path, extension: &str) -> PathBuf {
    self
      .type_dir
      .join(self.relative_source(source))
      .with_extension(extension)
  }

  /// Source path relative to the project root with `..` mapped to `__`,
  /// so artifacts stay inside the build-type directory.
  fn relative_source(&self, source: &Path) -> PathBuf {
    let relative = source.strip_prefix(&self.root_dir).unwrap_or(source);

    relative
      .components()
      .filter_map(|component| match component {
        Component::Normal(part) => Some(part.to_os_string()),
        Component::ParentDir => Some(OsString::from("__")),
        Component::CurDir | Component::RootDir | Component::Prefix(_) => None,
      })
      .collect()
  }
}

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::consts::DEFAULT_BUILD_DIR;
use crate::library::Library;

/// Named preset of optimization and debugging flags.
///
/// Each build type owns its own subdirectory of the build root, so Debug and
/// Release artifacts never collide.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildType {
  #[default]
  Debug,
  Release,
}

impl BuildType {
  /// Name of the build-type subdirectory.
  pub fn dir_name(self) -> &'static str {
    match self {
      BuildType::Debug => "debug",
      BuildType::Release => "release",
    }
  }

  /// Canonical compile flags appended for this build type.
  pub fn flags(self) -> &'static [&'static str] {
    match self {
      BuildType::Debug => &["-O0", "-g", "-D", "DEBUG", "-Wall", "-Wextra"],
      BuildType::Release => &["-O3", "-D", "NDEBUG"],
    }
  }
}

impl fmt::Display for BuildType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.dir_name())
  }
}

impl FromStr for BuildType {
  type Err = ConfigError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "debug" => Ok(BuildType::Debug),
      "release" => Ok(BuildType::Release),
      _ => Err(ConfigError::UnknownBuildType(s.to_string())),
    }
  }
}

/// Everything needed to build one executable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
  pub app_name: String,
  /// Absolute project root. Compilers run here and compile-database entries
  /// report it as their `directory`.
  pub root_dir: PathBuf,
  pub compiler: String,
  /// Source paths, relative to `root_dir` or absolute.
  pub sources: Vec<PathBuf>,
  pub cflags: Vec<String>,
  /// Link flags and libraries.
  pub libs: Vec<String>,
  /// Build-directory root. Relative paths resolve against `root_dir`.
  pub build_dir: PathBuf,
  /// Log full compiler and linker command lines at info level.
  pub verbose: bool,
}

impl BuildConfig {
  pub fn new(app_name: impl Into<String>, root_dir: impl Into<PathBuf>, compiler: impl Into<String>) -> Self {
    Self {
      app_name: app_name.into(),
      root_dir: root_dir.into(),
      compiler: compiler.into(),
      sources: Vec::new(),
      cflags: Vec::new(),
      libs: Vec::new(),
      build_dir: PathBuf::from(DEFAULT_BUILD_DIR),
      verbose: false,
    }
  }

  pub fn with_sources(mut self, sources: impl IntoIterator<Item = PathBuf>) -> Self {
    self.sources.extend(sources);
    self
  }

  pub fn with_cflags(mut self, cflags: impl IntoIterator<Item = String>) -> Self {
    self.cflags.extend(cflags);
    self
  }

  pub fn with_libs(mut self, libs: impl IntoIterator<Item = String>) -> Self {
    self.libs.extend(libs);
    self
  }

  pub fn with_build_dir(mut self, build_dir: impl Into<PathBuf>) -> Self {
    self.build_dir = build_dir.into();
    self
  }

  pub fn with_verbose(mut self, verbose: bool) -> Self {
    self.verbose = verbose;
    self
  }

  /// Prepend `-I <dir>` to the compile flags.
  pub fn add_include(&mut self, dir: impl AsRef<Path>) {
    self.cflags.insert(0, dir.as_ref().to_string_lossy().to_string());
    self.cflags.insert(0, "-I".to_string());
  }

  /// Append a library's compile and link flags.
  pub fn link_library(&mut self, library: &Library) {
    self.cflags.extend(library.cflags.iter().cloned());
    self.libs.extend(library.libs.iter().cloned());
  }

  /// Build-directory root resolved against the project root.
  pub fn build_root(&self) -> PathBuf {
    self.root_dir.join(&self.build_dir)
  }

  /// Check the declarations every build needs.
  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.app_name.trim().is_empty() {
      return Err(ConfigError::EmptyName);
    }
    if self.sources.is_empty() {
      return Err(ConfigError::NoSources(self.app_name.clone()));
    }

    let mut seen = HashSet::new();
    for source in &self.sources {
      if !seen.insert(source) {
        return Err(ConfigError::DuplicateSource(source.clone()));
      }
    }

    Ok(())
  }
}

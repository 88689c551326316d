//! `smk.toml` project file loading.
//!
//! ```toml
//! [target]
//! name = "app"
//! compiler = "cc"
//! sources = ["src/main.c", "src/util.c"]
//! cflags = ["-std=c11"]
//! libs = ["-lm"]
//! includes = ["include"]
//! build_dir = "build"
//!
//! [[library]]
//! name = "foo"
//! kind = "local"
//! path = "vendor/foo"
//! static = true
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

use super::{BuildConfig, ConfigError};
use crate::consts::{DEFAULT_BUILD_DIR, DEFAULT_COMPILER};
use crate::library::{Library, find_local_library, find_system_library};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProjectFile {
  target: TargetSection,
  #[serde(default)]
  library: Vec<LibrarySection>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TargetSection {
  name: String,
  #[serde(default = "default_compiler")]
  compiler: String,
  sources: Vec<PathBuf>,
  #[serde(default)]
  cflags: Vec<String>,
  #[serde(default)]
  libs: Vec<String>,
  #[serde(default)]
  includes: Vec<PathBuf>,
  #[serde(default = "default_build_dir")]
  build_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum LibrarySection {
  Local {
    name: String,
    path: PathBuf,
    #[serde(default, rename = "static")]
    static_link: bool,
  },
  System {
    name: String,
    #[serde(default, rename = "static")]
    static_link: bool,
  },
}

fn default_compiler() -> String {
  DEFAULT_COMPILER.to_string()
}

fn default_build_dir() -> PathBuf {
  PathBuf::from(DEFAULT_BUILD_DIR)
}

/// Load and validate a project file.
///
/// The directory containing the file becomes the project root. Includes and
/// local library paths are resolved against it. Libraries are discovered
/// eagerly, so a missing library is reported here rather than mid-build.
pub fn load_project(path: &Path) -> Result<BuildConfig, ConfigError> {
  if !path.is_file() {
    return Err(ConfigError::NotFound(path.to_path_buf()));
  }

  let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
    path: path.to_path_buf(),
    message: e.to_string(),
  })?;

  let root_dir = project_root(path)?;
  let config = parse_project(&content, &root_dir).map_err(|e| match e {
    ConfigError::Parse { message, .. } => ConfigError::Parse {
      path: path.to_path_buf(),
      message,
    },
    other => other,
  })?;

  info!(app = %config.app_name, sources = config.sources.len(), "loaded project");
  Ok(config)
}

/// Parse project file content with `root_dir` as the project root.
pub fn parse_project(content: &str, root_dir: &Path) -> Result<BuildConfig, ConfigError> {
  let file: ProjectFile = toml::from_str(content).map_err(|e| ConfigError::Parse {
    path: PathBuf::new(),
    message: e.to_string(),
  })?;

  let target = file.target;
  let mut config = BuildConfig::new(target.name, root_dir, target.compiler)
    .with_sources(target.sources)
    .with_cflags(target.cflags)
    .with_libs(target.libs)
    .with_build_dir(target.build_dir);

  // add_include prepends, so walk backwards to keep declaration order
  for include in target.includes.iter().rev() {
    config.add_include(root_dir.join(include));
  }

  config.validate()?;

  for section in &file.library {
    let library = discover(section, root_dir)?;
    debug!(library = %library.name, "linking library");
    config.link_library(&library);
  }

  Ok(config)
}

fn discover(section: &LibrarySection, root_dir: &Path) -> Result<Library, ConfigError> {
  let library = match section {
    LibrarySection::Local {
      name,
      path,
      static_link,
    } => find_local_library(name, &root_dir.join(path), *static_link)?,
    LibrarySection::System { name, static_link } => find_system_library(name, *static_link)?,
  };
  Ok(library)
}

fn project_root(path: &Path) -> Result<PathBuf, ConfigError> {
  let parent = match path.parent() {
    Some(p) if !p.as_os_str().is_empty() => p,
    _ => Path::new("."),
  };
  std::path::absolute(parent).map_err(|e| ConfigError::Read {
    path: path.to_path_buf(),
    message: e.to_string(),
  })
}

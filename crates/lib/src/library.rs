//! Link library discovery.
//!
//! A [`Library`] is an opaque bundle of compile and link flags. The engine
//! only appends these flags to its own lists; it never re-derives them.
//! Two discovery strategies are provided:
//! - [`find_local_library`]: probe a directory holding `<name>.h` and
//!   `lib<name>.a` / `lib<name>.so`
//! - [`find_system_library`]: ask `pkg-config`

use std::path::{Path, PathBuf};
use std::process::Command;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Compile and link flags contributed by one library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Library {
  pub name: String,
  /// Flags appended to every compile command (e.g. `-I <dir>`).
  pub cflags: Vec<String>,
  /// Flags appended to the link command (e.g. `-L<dir> -l<name>`).
  pub libs: Vec<String>,
}

#[derive(Debug, Error)]
pub enum LibraryError {
  #[error("library directory does not exist: {}", .path.display())]
  DirNotFound { path: PathBuf },

  #[error("could not find required header '{header}' in directory '{}'", .dir.display())]
  HeaderNotFound { header: String, dir: PathBuf },

  #[error("could not find library file '{file}' in directory '{}'", .dir.display())]
  LibraryFileNotFound { file: String, dir: PathBuf },

  #[error("pkg-config could not find library '{name}': {message}")]
  PkgConfig { name: String, message: String },
}

/// Describe a library built locally in `dir`.
pub fn find_local_library(name: &str, dir: &Path, static_link: bool) -> Result<Library, LibraryError> {
  if !dir.is_dir() {
    return Err(LibraryError::DirNotFound { path: dir.to_path_buf() });
  }

  let header = format!("{}.h", name);
  if !dir.join(&header).exists() {
    return Err(LibraryError::HeaderNotFound {
      header,
      dir: dir.to_path_buf(),
    });
  }

  let file = if static_link {
    format!("lib{}.a", name)
  } else {
    format!("lib{}.so", name)
  };
  if !dir.join(&file).exists() {
    return Err(LibraryError::LibraryFileNotFound {
      file,
      dir: dir.to_path_buf(),
    });
  }

  info!(name = %name, dir = ?dir, "found local library");

  let dir_str = dir.to_string_lossy();
  Ok(Library {
    name: name.to_string(),
    cflags: vec!["-I".to_string(), dir_str.to_string()],
    libs: vec![format!("-L{}", dir_str), format!("-l{}", name)],
  })
}

/// Describe a system library using `pkg-config`.
pub fn find_system_library(name: &str, static_link: bool) -> Result<Library, LibraryError> {
  let cflags = pkg_config(name, &["--cflags", name])?;

  let mut libs_args = vec!["--libs"];
  if static_link {
    libs_args.push("--static");
  }
  libs_args.push(name);
  let libs = pkg_config(name, &libs_args)?;

  info!(name = %name, static_link, "found system library");

  Ok(Library {
    name: name.to_string(),
    cflags,
    libs,
  })
}

fn pkg_config(name: &str, args: &[&str]) -> Result<Vec<String>, LibraryError> {
  debug!(args = ?args, "querying pkg-config");

  let output = Command::new("pkg-config")
    .args(args)
    .output()
    .map_err(|e| LibraryError::PkgConfig {
      name: name.to_string(),
      message: e.to_string(),
    })?;

  if !output.status.success() {
    return Err(LibraryError::PkgConfig {
      name: name.to_string(),
      message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    });
  }

  Ok(
    String::from_utf8_lossy(&output.stdout)
      .split_whitespace()
      .map(str::to_string)
      .collect(),
  )
}

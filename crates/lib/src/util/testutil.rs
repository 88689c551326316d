//! Test utilities for smk-lib.
//!
//! Engine tests do not depend on a real C toolchain. [`FakeProject`] writes a
//! small POSIX shell script that behaves like a compiler driver for the
//! arguments the engine passes (`-MMD -MF <dep> -c <src> -o <obj>` for
//! compilation, `<objs...> <libs...> -o <exe>` for linking) and appends one
//! line per invocation to a log file.

/// Returns the shell command and args to execute a shell script.
#[cfg(unix)]
pub fn shell_cmd(script: &str) -> (&'static str, Vec<String>) {
  ("/bin/sh", vec!["-c".to_string(), script.to_string()])
}

#[cfg(windows)]
pub fn shell_cmd(script: &str) -> (&'static str, Vec<String>) {
  ("cmd.exe", vec!["/C".to_string(), script.to_string()])
}

#[cfg(unix)]
pub use fake::FakeProject;

#[cfg(unix)]
mod fake {
  use std::fs;
  use std::os::unix::fs::PermissionsExt;
  use std::path::{Path, PathBuf};
  use std::time::{Duration, SystemTime};

  use tempfile::TempDir;

  use crate::config::BuildConfig;

  /// Compiles by copying the source to the object and writing a one-rule
  /// dependency file that lists the source plus every `#include "..."`
  /// relative to the source's directory. Sources containing `#error` fail.
  /// Links by concatenating the objects; `-lmissing` makes the link fail.
  const FAKE_CC: &str = r#"#!/bin/sh
log='@LOG@'
dep=''
src=''
out=''
objs=''
compile=0
fail_link=0
while [ $# -gt 0 ]; do
  case "$1" in
    -MMD) shift ;;
    -MF) dep="$2"; shift 2 ;;
    -c) compile=1; src="$2"; shift 2 ;;
    -o) out="$2"; shift 2 ;;
    -D|-I) shift 2 ;;
    -lmissing) fail_link=1; shift ;;
    *.o) objs="$objs $1"; shift ;;
    *) shift ;;
  esac
done
if [ "$compile" = 1 ]; then
  echo "compile $src" >> "$log"
  if grep -q '#error' "$src"; then
    echo "$src:1:2: error: #error directive" >&2
    exit 1
  fi
  dir=$(dirname "$src")
  deps="$src"
  for h in $(sed -n 's/^#include "\(.*\)"/\1/p' "$src"); do
    deps="$deps $dir/$h"
  done
  printf '%s: %s\n' "$out" "$deps" > "$dep"
  cat "$src" > "$out"
else
  echo "link $out" >> "$log"
  if [ "$fail_link" = 1 ]; then
    echo "ld: cannot find -lmissing" >&2
    exit 1
  fi
  cat $objs > "$out"
fi
"#;

  /// A throwaway project directory plus a fake compiler.
  pub struct FakeProject {
    pub temp: TempDir,
    pub compiler: PathBuf,
    log: PathBuf,
  }

  impl FakeProject {
    pub fn new() -> Self {
      let temp = TempDir::new().unwrap();
      let tools = temp.path().join("tools");
      fs::create_dir_all(&tools).unwrap();
      fs::create_dir_all(temp.path().join("project")).unwrap();

      let log = tools.join("invocations.log");
      let compiler = tools.join("fakecc");
      fs::write(&compiler, FAKE_CC.replace("@LOG@", &log.to_string_lossy())).unwrap();
      fs::set_permissions(&compiler, fs::Permissions::from_mode(0o755)).unwrap();

      Self { temp, compiler, log }
    }

    pub fn root(&self) -> PathBuf {
      self.temp.path().join("project")
    }

    /// Write a file relative to the project root.
    pub fn write_file(&self, relative_path: &str, content: &str) {
      let path = self.root().join(relative_path);
      if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
      }
      fs::write(&path, content).unwrap();
    }

    /// A configuration for `sources` using the fake compiler.
    pub fn config(&self, app_name: &str, sources: &[&str]) -> BuildConfig {
      BuildConfig::new(app_name, self.root(), self.compiler.to_string_lossy())
        .with_sources(sources.iter().map(PathBuf::from))
    }

    /// Every logged invocation, in the order the processes wrote them.
    pub fn invocations(&self) -> Vec<String> {
      fs::read_to_string(&self.log)
        .map(|s| s.lines().map(str::to_string).collect())
        .unwrap_or_default()
    }

    /// Sources passed to compile invocations.
    pub fn compiled(&self) -> Vec<String> {
      let mut compiled: Vec<String> = self
        .invocations()
        .iter()
        .filter_map(|line| line.strip_prefix("compile ").map(str::to_string))
        .collect();
      compiled.sort();
      compiled
    }

    pub fn link_count(&self) -> usize {
      self.invocations().iter().filter(|line| line.starts_with("link ")).count()
    }

    pub fn clear_log(&self) {
      let _ = fs::remove_file(&self.log);
    }

    /// Push a path's modification time `secs` seconds into the future.
    pub fn touch_forward(&self, path: &Path, secs: u64) {
      let file = fs::File::options().write(true).open(path).unwrap();
      file
        .set_modified(SystemTime::now() + Duration::from_secs(secs))
        .unwrap();
    }
  }
}

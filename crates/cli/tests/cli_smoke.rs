//! CLI smoke tests for smk.
//!
//! These tests verify that all CLI commands run without panicking and
//! return appropriate exit codes. Builds use a shell script standing in for
//! the C compiler, so they only run on unix.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a Command for the smk binary.
fn smk_cmd() -> Command {
  cargo_bin_cmd!("smk")
}

/// Compiles by copying the source and writing a one-line dependency file;
/// links by concatenating objects. Sources containing `#error` fail.
#[cfg(unix)]
const FAKE_CC: &str = r#"#!/bin/sh
dep=''; src=''; out=''; objs=''; compile=0
while [ $# -gt 0 ]; do
  case "$1" in
    -MF) dep="$2"; shift 2 ;;
    -c) compile=1; src="$2"; shift 2 ;;
    -o) out="$2"; shift 2 ;;
    -D|-I) shift 2 ;;
    *.o) objs="$objs $1"; shift ;;
    *) shift ;;
  esac
done
if [ "$compile" = 1 ]; then
  if grep -q '#error' "$src"; then
    echo "$src:1:2: error: #error directive" >&2
    exit 1
  fi
  printf '%s: %s\n' "$out" "$src" > "$dep"
  cat "$src" > "$out"
else
  cat $objs > "$out"
fi
"#;

/// Project directory with an `smk.toml` and a fake compiler.
struct TestProject {
  temp: TempDir,
}

impl TestProject {
  fn new(sources: &[(&str, &str)]) -> Self {
    let temp = TempDir::new().unwrap();
    let project = Self { temp };
    let compiler = project.install_compiler();

    let names: Vec<String> = sources.iter().map(|(name, _)| format!("\"{}\"", name)).collect();
    project.write_file(
      "smk.toml",
      &format!(
        "[target]\nname = \"app\"\ncompiler = \"{}\"\nsources = [{}]\n",
        compiler.display(),
        names.join(", ")
      ),
    );
    for (name, content) in sources {
      project.write_file(name, content);
    }
    project
  }

  fn path(&self) -> &Path {
    self.temp.path()
  }

  fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.path().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }

  #[cfg(unix)]
  fn install_compiler(&self) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = self.path().join("tools").join("fakecc");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, FAKE_CC).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
  }

  #[cfg(not(unix))]
  fn install_compiler(&self) -> PathBuf {
    PathBuf::from("cc")
  }

  fn cmd(&self) -> Command {
    let mut cmd = smk_cmd();
    cmd.current_dir(self.path());
    cmd
  }

  fn executable(&self, build_type: &str) -> PathBuf {
    self.path().join("build").join(build_type).join("app")
  }
}

// =============================================================================
// Help & Version
// =============================================================================

#[test]
fn help_flag_works() {
  smk_cmd()
    .arg("--help")
    .assert()
    .success()
    .stdout(predicate::str::contains("Usage"));
}

#[test]
fn version_flag_works() {
  smk_cmd()
    .arg("--version")
    .assert()
    .success()
    .stdout(predicate::str::contains("smk"));
}

#[test]
fn subcommand_help_works() {
  for cmd in &["build", "run", "clean"] {
    smk_cmd()
      .arg(cmd)
      .arg("--help")
      .assert()
      .success()
      .stdout(predicate::str::contains("Usage"));
  }
}

// =============================================================================
// Project loading
// =============================================================================

#[test]
fn build_without_project_file_fails() {
  let temp = TempDir::new().unwrap();

  smk_cmd()
    .current_dir(temp.path())
    .arg("build")
    .assert()
    .failure()
    .stderr(predicate::str::contains("Failed to load project file"));
}

#[test]
fn build_with_invalid_project_fails() {
  let temp = TempDir::new().unwrap();
  std::fs::write(temp.path().join("smk.toml"), "[target]\nname = \"app\"\nsources = []\n").unwrap();

  smk_cmd()
    .current_dir(temp.path())
    .arg("build")
    .assert()
    .failure()
    .stderr(predicate::str::contains("Failed to load project file"));
}

#[test]
fn unknown_build_type_is_rejected() {
  let project = TestProject::new(&[("main.c", "int main;\n")]);

  project
    .cmd()
    .args(["build", "--type", "profile"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("profile"));
}

#[test]
fn sources_sharing_an_object_are_rejected() {
  let project = TestProject::new(&[("a.c", "int from_c;\n"), ("a.cpp", "int from_cpp;\n")]);

  project
    .cmd()
    .arg("build")
    .assert()
    .failure()
    .stderr(predicate::str::contains("both map to object"));
  assert!(!project.executable("debug").exists());
}

// =============================================================================
// Logging
// =============================================================================

#[test]
fn verbose_logs_command_dispatch() {
  let project = TestProject::new(&[("main.c", "int main;\n")]);

  project
    .cmd()
    .env_remove("RUST_LOG")
    .args(["-v", "clean"])
    .assert()
    .success()
    .stderr(predicate::str::contains("clean requested"));
}

#[test]
fn quiet_by_default() {
  let project = TestProject::new(&[("main.c", "int main;\n")]);

  project
    .cmd()
    .env_remove("RUST_LOG")
    .arg("clean")
    .assert()
    .success()
    .stderr(predicate::str::contains("clean requested").not());
}

// =============================================================================
// Clean & Run
// =============================================================================

#[test]
fn clean_without_build_dir_is_noop() {
  let project = TestProject::new(&[("main.c", "int main;\n")]);

  project
    .cmd()
    .arg("clean")
    .assert()
    .success()
    .stdout(predicate::str::contains("Nothing to clean"));
}

#[test]
fn run_without_executable_warns() {
  let project = TestProject::new(&[("main.c", "int main;\n")]);

  project
    .cmd()
    .arg("run")
    .assert()
    .success()
    .stderr(predicate::str::contains("does not exist"));
}

// =============================================================================
// Build
// =============================================================================

#[cfg(unix)]
#[test]
fn build_then_rebuild_skips_link() {
  let project = TestProject::new(&[("main.c", "int main;\n"), ("util.c", "int util;\n")]);

  project
    .cmd()
    .arg("build")
    .assert()
    .success()
    .stdout(predicate::str::contains("Built"));
  assert!(project.executable("debug").is_file());

  project
    .cmd()
    .arg("build")
    .assert()
    .success()
    .stdout(predicate::str::contains("No changes detected"));
}

#[cfg(unix)]
#[test]
fn build_release_uses_its_own_directory() {
  let project = TestProject::new(&[("main.c", "int main;\n")]);

  project.cmd().args(["build", "-t", "release"]).assert().success();

  assert!(project.executable("release").is_file());
  assert!(!project.executable("debug").exists());
}

#[cfg(unix)]
#[test]
fn build_writes_compile_db() {
  let project = TestProject::new(&[("main.c", "int main;\n")]);

  project.cmd().args(["build", "-c"]).assert().success();

  let content = std::fs::read_to_string(project.path().join("compile_commands.json")).unwrap();
  let entries: serde_json::Value = serde_json::from_str(&content).unwrap();
  assert_eq!(entries.as_array().unwrap().len(), 1);
  assert_eq!(entries[0]["file"], "main.c");
}

#[cfg(unix)]
#[test]
fn build_json_output() {
  let project = TestProject::new(&[("main.c", "int main;\n")]);

  let output = project
    .cmd()
    .args(["build", "--output", "json", "-j", "2"])
    .output()
    .unwrap();

  assert!(output.status.success());
  let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(report["build_type"], "debug");
  assert_eq!(report["compiled"][0], "main.c");
  assert_eq!(report["linked"], true);
}

#[cfg(unix)]
#[test]
fn compile_error_reports_failing_file() {
  let project = TestProject::new(&[("ok.c", "int ok;\n"), ("bad.c", "#error broken\n")]);

  project
    .cmd()
    .arg("build")
    .assert()
    .failure()
    .stderr(predicate::str::contains("Compilation failed: bad.c"))
    .stderr(predicate::str::contains("#error directive"));
  assert!(!project.executable("debug").exists());
}

#[cfg(unix)]
#[test]
fn clean_after_build_removes_directory() {
  let project = TestProject::new(&[("main.c", "int main;\n")]);
  project.cmd().arg("build").assert().success();

  project
    .cmd()
    .arg("clean")
    .assert()
    .success()
    .stdout(predicate::str::contains("Removed"));
  assert!(!project.path().join("build").join("debug").exists());
}

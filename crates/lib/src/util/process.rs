//! Child-process invocation for compiler and linker runs.
//!
//! Unlike a shell action, compiler invocations run the program directly with
//! the caller's environment. Standard output and standard error are captured
//! and concatenated so diagnostics can be surfaced after the process exits.

use std::path::Path;

use tokio::process::Command;
use tracing::debug;

/// Terminal state of a captured child process.
#[derive(Debug, Clone)]
pub struct CapturedOutput {
  /// Exit code, `None` if the process was terminated by a signal.
  pub code: Option<i32>,
  pub success: bool,
  /// Standard output followed by standard error.
  pub output: String,
}

/// Run `program` with `args` in `cwd` and wait for it to exit.
///
/// A non-zero exit is not an error here; callers inspect
/// [`CapturedOutput::success`]. Only a failure to spawn or wait on the
/// process is reported as `Err`.
pub async fn run_captured(program: &str, args: &[String], cwd: &Path) -> std::io::Result<CapturedOutput> {
  debug!(program = %program, cwd = ?cwd, "spawning process");

  let output = Command::new(program).args(args).current_dir(cwd).output().await?;

  let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
  combined.push_str(&String::from_utf8_lossy(&output.stderr));

  Ok(CapturedOutput {
    code: output.status.code(),
    success: output.status.success(),
    output: combined,
  })
}

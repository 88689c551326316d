//! Implementation of the `smk run` command.

use std::path::Path;

use anyhow::{Context, Result};
use tokio::runtime::Runtime;
use tracing::info;

use smk_lib::build::{BuildError, BuildOptions, Builder};
use smk_lib::config::BuildType;

use super::load_config;
use crate::output::{print_info, print_warning};

/// Execute the run command.
///
/// Runs the executable from a previous build without rebuilding. A missing
/// executable is reported as a warning, not a failure.
pub fn cmd_run(project: &Path, build_type: BuildType, verbose: bool) -> Result<()> {
  info!(project = %project.display(), build_type = %build_type, "run requested");
  let config = load_config(project, verbose)?;
  let builder = Builder::new(config, BuildOptions::new(build_type));

  let rt = Runtime::new().context("Failed to create async runtime")?;
  run_executable(&rt, &builder)
}

pub(super) fn run_executable(rt: &Runtime, builder: &Builder) -> Result<()> {
  match rt.block_on(builder.run()) {
    Ok(status) if status.success() => Ok(()),
    Ok(status) => {
      info!(status = %status, "program exited unsuccessfully");
      print_info(&format!("Program exited with {}", status));
      Ok(())
    }
    Err(BuildError::MissingExecutable(path)) => {
      print_warning(&format!(
        "Executable {} does not exist. Run 'smk build' first.",
        path.display()
      ));
      Ok(())
    }
    Err(e) => Err(e).context("Run failed"),
  }
}

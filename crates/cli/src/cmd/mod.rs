mod build;
mod clean;
mod run;

use std::path::Path;

use anyhow::{Context, Result};
use smk_lib::config::{BuildConfig, load_project};

pub use build::{BuildArgs, cmd_build};
pub use clean::cmd_clean;
pub use run::cmd_run;

/// Load the project file, applying the global verbosity flag.
fn load_config(project: &Path, verbose: bool) -> Result<BuildConfig> {
  let config =
    load_project(project).with_context(|| format!("Failed to load project file {}", project.display()))?;
  Ok(config.with_verbose(verbose))
}

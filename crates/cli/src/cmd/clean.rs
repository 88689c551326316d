//! Implementation of the `smk clean` command.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use smk_lib::build::{BuildOptions, Builder, CleanOutcome};
use smk_lib::config::BuildType;

use super::load_config;
use crate::output::{print_info, print_success};

pub fn cmd_clean(project: &Path, build_type: BuildType, verbose: bool) -> Result<()> {
  info!(project = %project.display(), build_type = %build_type, "clean requested");
  let config = load_config(project, verbose)?;
  let builder = Builder::new(config, BuildOptions::new(build_type));

  match builder.clean().context("Clean failed")? {
    CleanOutcome::Removed(dir) => print_success(&format!("Removed {}", dir.display())),
    CleanOutcome::NothingToClean(dir) => {
      print_info(&format!("Build directory {} does not exist. Nothing to clean.", dir.display()))
    }
  }

  Ok(())
}

//! Implementation of the `smk build` command.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use tracing::{debug, info};

use smk_lib::build::{BuildError, BuildOptions, BuildReport, Builder};
use smk_lib::config::BuildType;

use super::load_config;
use super::run::run_executable;
use crate::output::{OutputFormat, format_duration, print_error, print_info, print_json, print_stat, print_success};

pub struct BuildArgs {
  pub project: PathBuf,
  pub build_type: BuildType,
  pub compile_db: bool,
  pub run: bool,
  pub jobs: Option<usize>,
  pub output: OutputFormat,
}

/// Execute the build command.
///
/// Loads the project file, compiles stale sources, relinks when needed and
/// optionally writes the compile database and runs the result. Compile
/// failures print each failing file with its compiler output.
pub fn cmd_build(args: BuildArgs, verbose: bool) -> Result<()> {
  info!(project = %args.project.display(), build_type = %args.build_type, "build requested");
  let config = load_config(&args.project, verbose)?;
  let options = BuildOptions {
    build_type: args.build_type,
    generate_db: args.compile_db,
    jobs: args.jobs,
  };
  let builder = Builder::new(config, options);

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let start = Instant::now();

  let report = match rt.block_on(builder.build()) {
    Ok(report) => report,
    Err(BuildError::CompilationFailed(aborted)) => {
      for failure in &aborted.failures {
        print_error(&format!("Compilation failed: {}", failure.file.display()));
        eprintln!("{}", failure.output.trim_end());
      }
      bail!("Build failed: {} source(s) failed to compile", aborted.failures.len());
    }
    Err(BuildError::LinkFailed { code, output }) => {
      print_error("Linking failed");
      eprintln!("{}", output.trim_end());
      bail!("Build failed: linker exited with code {:?}", code);
    }
    Err(e) => return Err(e).context("Build failed"),
  };

  debug!(
    compiled = report.compiled.len(),
    up_to_date = report.up_to_date.len(),
    linked = report.linked,
    "build finished"
  );

  if args.output.is_json() {
    print_json(&report)?;
  } else {
    print_summary(&report);
    print_success(&format!(
      "Built {} in {}",
      report.executable.display(),
      format_duration(start.elapsed())
    ));
  }

  if args.run {
    run_executable(&rt, &builder)?;
  }

  Ok(())
}

fn print_summary(report: &BuildReport) {
  print_info(&format!("Build type: {}", report.build_type));
  print_stat("Compiled", &report.compiled.len().to_string());
  print_stat("Up to date", &report.up_to_date.len().to_string());

  if report.linked {
    print_stat("Linked", &report.executable.display().to_string());
  } else {
    print_info("No changes detected, link skipped");
  }

  if let Some(db) = &report.compile_db {
    print_info(&format!("Updated {}", db.display()));
  }
}

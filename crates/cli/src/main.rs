mod cmd;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use smk_lib::config::BuildType;
use smk_lib::consts::PROJECT_FILE;

use crate::cmd::{BuildArgs, cmd_build, cmd_clean, cmd_run};
use crate::output::OutputFormat;

/// smk - incremental C/C++ build tool
#[derive(Parser)]
#[command(name = "smk")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Show compiler and linker command lines
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Compile and link the project's executable
  Build {
    /// Write compile_commands.json to the project root
    #[arg(short = 'c', long)]
    compile_db: bool,

    /// Run the executable after a successful build
    #[arg(short, long)]
    run: bool,

    /// Build type (debug or release)
    #[arg(short = 't', long = "type", default_value = "debug")]
    build_type: BuildType,

    /// Maximum concurrent compiler processes
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Path to the project file
    #[arg(long, default_value = PROJECT_FILE)]
    project: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value_t)]
    output: OutputFormat,
  },

  /// Run the previously built executable
  Run {
    /// Build type (debug or release)
    #[arg(short = 't', long = "type", default_value = "debug")]
    build_type: BuildType,

    /// Path to the project file
    #[arg(long, default_value = PROJECT_FILE)]
    project: PathBuf,
  },

  /// Remove the build directory for a build type
  Clean {
    /// Build type (debug or release)
    #[arg(short = 't', long = "type", default_value = "debug")]
    build_type: BuildType,

    /// Path to the project file
    #[arg(long, default_value = PROJECT_FILE)]
    project: PathBuf,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "info" } else { "warn" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  match cli.command {
    Commands::Build {
      compile_db,
      run,
      build_type,
      jobs,
      project,
      output,
    } => cmd_build(
      BuildArgs {
        project,
        build_type,
        compile_db,
        run,
        jobs,
        output,
      },
      cli.verbose,
    ),
    Commands::Run { build_type, project } => cmd_run(&project, build_type, cli.verbose),
    Commands::Clean { build_type, project } => cmd_clean(&project, build_type, cli.verbose),
  }
}

//! sitebuild CLI - install, build, verify and preview a front-end project.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use sitebuild_pipeline::CONFIG_FILE_NAME;
use tracing_subscriber::{fmt, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "sitebuild")]
#[command(about = "Install, build, verify and preview a front-end project")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to sitebuild.toml config file
    #[arg(short, long, default_value = CONFIG_FILE_NAME)]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Commands {
    /// Run the full pipeline (default)
    Run,

    /// Print the step plan without executing it
    Plan,

    /// Write a default sitebuild.toml
    Init {
        /// Overwrite an existing config file
        #[arg(short, long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt().with_env_filter(filter).with_target(false).init();

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            commands::run::run(&cli.config).await?;
        }
        Commands::Plan => {
            commands::plan::run(&cli.config)?;
        }
        Commands::Init { yes } => {
            commands::init::run(&cli.config, yes).await?;
        }
    }

    Ok(())
}

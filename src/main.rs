// ABOUTME: Entry point for the stagecoach CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands, ZonesCommand};
use stagecoach::config;
use stagecoach::deploy::DeployOptions;
use stagecoach::error::Result;
use stagecoach::output::{Output, OutputMode};
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mode = if cli.json {
        OutputMode::Json
    } else if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    };
    let output = Output::new(mode);

    if let Err(e) = run(cli.command, output).await {
        Output::new(mode).error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run(command: Commands, output: Output) -> Result<()> {
    match command {
        Commands::Init {
            project,
            domain,
            force,
        } => {
            let cwd = env::current_dir()?;
            config::init_config(&cwd, project.as_deref(), domain.as_deref(), force)?;
            output.success(&format!("Created {}", config::CONFIG_FILENAME));
            Ok(())
        }
        Commands::Deploy {
            stage,
            dry_run,
            maintenance,
            show_diff,
        } => {
            let options = DeployOptions {
                dry_run,
                maintenance,
                show_diff,
            };
            commands::deploy(stage, options, output).await
        }
        Commands::Status { stage } => commands::status(stage, &output).await,
        Commands::Recover { stage, yes } => commands::recover(stage, yes, &output).await,
        Commands::Diff { stage } => commands::diff(stage, &output).await,
        Commands::Audit { cleanup, yes } => commands::audit(cleanup, yes, &output).await,
        Commands::Zones { command } => match command {
            ZonesCommand::Create { domain } => commands::zones_create(&domain, &output).await,
            ZonesCommand::Stale { cleanup, yes } => {
                commands::zones_stale(cleanup, yes, &output).await
            }
        },
    }
}

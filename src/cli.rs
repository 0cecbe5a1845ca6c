// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};
use stagecoach::types::Stage;

#[derive(Parser)]
#[command(name = "stagecoach")]
#[command(about = "Stage-locked CDN deployments with infrastructure drift audits")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print final results (for CI)
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Emit JSON lines instead of human output
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new stagecoach.yml configuration file
    Init {
        /// Project name (defaults to my-site)
        #[arg(long)]
        project: Option<String>,

        /// Production domain (defaults to example.com)
        #[arg(long)]
        domain: Option<String>,

        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },

    /// Deploy a stage
    Deploy {
        /// Stage to deploy (development, staging, production)
        stage: Stage,

        /// Build and preview without locking or changing traffic
        #[arg(long)]
        dry_run: bool,

        /// Serve the maintenance placeholder while deploying
        #[arg(long)]
        maintenance: bool,

        /// Print the infrastructure diff before deploying
        #[arg(long)]
        show_diff: bool,
    },

    /// Show lock status for one stage or all configured stages
    Status { stage: Option<Stage> },

    /// Clear locks left by an interrupted deployment
    Recover {
        stage: Stage,

        /// Answer yes to every prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Compare live CDN, certificate and DNS state with the stage config
    Diff { stage: Stage },

    /// Classify every CDN distribution in the account
    Audit {
        /// Offer deletable distributions for removal
        #[arg(long)]
        cleanup: bool,

        /// Answer yes to every prompt
        #[arg(short, long, requires = "cleanup")]
        yes: bool,
    },

    /// Manage hosted zones created by stagecoach
    Zones {
        #[command(subcommand)]
        command: ZonesCommand,
    },
}

#[derive(Subcommand)]
pub enum ZonesCommand {
    /// Create a hosted zone and track its creation time
    Create { domain: String },

    /// List tracked zones that are old and hold no records
    Stale {
        /// Offer stale zones for deletion
        #[arg(long)]
        cleanup: bool,

        /// Answer yes to every prompt
        #[arg(short, long, requires = "cleanup")]
        yes: bool,
    },
}

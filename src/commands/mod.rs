// ABOUTME: Command module aggregator for the stagecoach CLI.
// ABOUTME: Re-exports command handlers and the shared project loader.

mod audit;
mod deploy;
mod diff;
mod recover;
mod status;
mod zones;

pub use audit::audit;
pub use deploy::deploy;
pub use diff::diff;
pub use recover::recover;
pub use status::status;
pub use zones::{zones_create, zones_stale};

use stagecoach::config::Config;
use stagecoach::error::Result;
use std::env;
use std::path::PathBuf;

/// Load the config discovered from the working directory.
fn load_project() -> Result<(Config, PathBuf)> {
    let cwd = env::current_dir()?;
    let config = Config::discover(&cwd)?;
    Ok((config, cwd))
}

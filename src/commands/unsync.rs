//! Unsync command - Delete a project folder from the remote bucket
//!
//! There is no confirmation prompt: the whole remote prefix is purged.

use anyhow::Result;
use owo_colors::OwoColorize;

use projdock::process::Runner;
use projdock::workspace::{ConfigStore, SyncOrchestrator};

pub fn execute<R: Runner>(store: &ConfigStore, runner: &R, folder: &str) -> Result<()> {
    let orchestrator = SyncOrchestrator::from_store(runner, store, folder)?;
    let target = orchestrator.unsync(folder)?;

    println!("{} {}", "Removed remote:".green(), target.remote);
    Ok(())
}

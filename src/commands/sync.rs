//! Sync command - Mirror a project folder to the remote bucket

use anyhow::Result;
use owo_colors::OwoColorize;

use projdock::process::Runner;
use projdock::workspace::{ConfigStore, SyncOrchestrator};

pub fn execute<R: Runner>(store: &ConfigStore, runner: &R, folder: &str, quiet: bool) -> Result<()> {
    let orchestrator = SyncOrchestrator::from_store(runner, store, folder)?;
    let target = orchestrator.target(folder)?;

    if !quiet {
        println!(
            "Syncing {} -> {}",
            target.local.display(),
            target.remote.cyan()
        );
    }

    orchestrator.mirror(folder, quiet)?;

    println!("{} {}", "Synced:".green(), target.remote);
    Ok(())
}

//! Close command - Unmount the disk image

use anyhow::Result;
use owo_colors::OwoColorize;
use std::path::Path;

use projdock::process::Runner;
use projdock::workspace::{settings, ConfigStore, Detachment, DiskImageController};

/// Detach the configured disk image
pub fn execute<R: Runner>(store: &ConfigStore, runner: &R, mount_root: &Path) -> Result<Detachment> {
    let image = settings::disk_image(store)?;
    let controller = DiskImageController::new(runner, mount_root);
    let outcome = controller.detach(&image)?;

    match outcome {
        Detachment::AlreadyDetached => {
            println!("{} {}", "Not mounted:".yellow(), image.display());
        }
        Detachment::Detached { .. } => {
            println!("{} {}", "Unmounted:".green(), image.display());
        }
    }

    Ok(outcome)
}

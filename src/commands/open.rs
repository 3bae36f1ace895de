//! Open command - Mount the disk image, or open a project in the editor

use anyhow::Result;
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};

use projdock::error::Error;
use projdock::process::{require_command, Invocation, Runner};
use projdock::workspace::{paths, settings, Attachment, ConfigStore, DiskImageController};

/// Attach the configured disk image and report where it is mounted
pub fn mount<R: Runner>(store: &ConfigStore, runner: &R, mount_root: &Path) -> Result<Attachment> {
    let image = settings::disk_image(store)?;
    let controller = DiskImageController::new(runner, mount_root);
    let attachment = controller.attach(&image)?;

    let label = if attachment.newly_attached {
        "Mounted:".green().to_string()
    } else {
        "Already mounted:".yellow().to_string()
    };

    match &attachment.mount_point {
        Some(mount_point) => println!("{} {}", label, mount_point.display()),
        None => {
            println!("{} {}", label, image.display());
            eprintln!(
                "{} could not determine the mount point. Look under {} in Finder, or run `hdiutil info`.",
                "Warning:".yellow(),
                mount_root.display()
            );
        }
    }

    Ok(attachment)
}

/// Resolve `base/folder[/file]`, which must exist
pub fn resolve_target(store: &ConfigStore, folder: &str, file: Option<&str>) -> Result<PathBuf> {
    let folder = paths::relative_folder(folder)?;
    let file = file.map(paths::relative_file).transpose()?;

    let base = settings::base_path(store).map_err(|e| match e {
        Error::NotFound { .. } => {
            anyhow::Error::new(e).context("Is the disk image mounted? Run `projdock open` to mount it")
        }
        other => other.into(),
    })?;

    let folder_path = base.join(folder);
    if !folder_path.is_dir() {
        return Err(Error::NotFound {
            what: "Folder",
            path: folder_path,
        }
        .into());
    }

    match file {
        Some(file) => {
            let file_path = folder_path.join(file);
            if !file_path.exists() {
                return Err(Error::NotFound {
                    what: "File",
                    path: file_path,
                }
                .into());
            }
            Ok(file_path)
        }
        None => Ok(folder_path),
    }
}

/// Editor program and its leading arguments, e.g. `code -n`
fn editor_command(store: &ConfigStore) -> (String, Vec<String>) {
    let editor = settings::get_or(store, settings::EDITOR, settings::DEFAULT_EDITOR);
    let mut parts = editor.split_whitespace().map(str::to_string);
    let program = parts
        .next()
        .unwrap_or_else(|| settings::DEFAULT_EDITOR.to_string());
    (program, parts.collect())
}

/// Open `base/folder[/file]` in the configured editor
pub fn open_in_editor<R: Runner>(
    store: &ConfigStore,
    runner: &R,
    folder: &str,
    file: Option<&str>,
) -> Result<PathBuf> {
    let target = resolve_target(store, folder, file)?;
    let (program, mut args) = editor_command(store);

    require_command(
        &program,
        "Set another editor with: projdock config set editor <command>",
    )?;

    args.push(target.to_string_lossy().into_owned());
    let inv = Invocation::new(&program, args).interactive();
    runner.run(&inv)?.check(&inv)?;

    println!("{} {}", "Opened:".green(), target.display());
    Ok(target)
}

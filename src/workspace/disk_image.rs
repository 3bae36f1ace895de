//! Disk image attach/detach
//!
//! Nothing about an image is cached: attachment, mount point and device nodes
//! are re-derived from a fresh status listing on every call, so the controller
//! stays correct when the user ejects the volume behind our back.

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::mount_point::{self, Strategy};
use super::status::{self, ImageRecord};
use crate::error::Error;
use crate::process::{Invocation, Runner};

const DRIVER: &str = "hdiutil";

/// Result of [`DiskImageController::attach`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// `None` when every discovery strategy failed; the image is still attached
    pub mount_point: Option<PathBuf>,
    /// False when the image was attached before the call
    pub newly_attached: bool,
}

/// Result of [`DiskImageController::detach`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detachment {
    AlreadyDetached,
    /// `absorbed_failures` counts intermediate detach commands that failed
    /// before the final status check showed the image gone
    Detached { absorbed_failures: usize },
}

/// Detach progress. `Failed` is provisional until the post-condition check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DetachState {
    Attached,
    Detaching,
    Detached,
    Failed,
}

pub struct DiskImageController<'a, R: Runner> {
    runner: &'a R,
    mount_root: PathBuf,
}

impl<'a, R: Runner> DiskImageController<'a, R> {
    pub fn new(runner: &'a R, mount_root: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            mount_root: mount_root.into(),
        }
    }

    /// Raw status listing from the driver
    pub fn status(&self) -> Result<String> {
        let inv = Invocation::new(DRIVER, ["info"]);
        let output = self.runner.run(&inv)?.check(&inv)?;
        Ok(output.stdout)
    }

    fn records(&self, image: &Path) -> Result<Vec<ImageRecord>> {
        let listing = self.status()?;
        let records = status::parse(&listing);
        let matched = status::find(&records, &image.to_string_lossy())
            .into_iter()
            .cloned()
            .collect();
        Ok(matched)
    }

    pub fn is_attached(&self, image: &Path) -> Result<bool> {
        Ok(!self.records(image)?.is_empty())
    }

    /// Attach `image` (visible in Finder) and locate its mount point.
    ///
    /// Already attached images are not attached again; their mount point is
    /// looked up the same way minus the attach output.
    pub fn attach(&self, image: &Path) -> Result<Attachment> {
        if !image.is_file() {
            return Err(Error::NotFound {
                what: "Disk image",
                path: image.to_path_buf(),
            }
            .into());
        }

        let newly_attached = !self.is_attached(image)?;
        let attach_output = if newly_attached {
            let path = image.to_string_lossy().into_owned();
            let inv = Invocation::new(DRIVER, ["attach", path.as_str()]);
            info!(image = %image.display(), "attaching");
            self.runner.run(&inv)?.check(&inv)?.stdout
        } else {
            debug!(image = %image.display(), "already attached");
            String::new()
        };

        let mount_point = self.find_mount_point(image, &attach_output);
        if mount_point.is_none() {
            warn!(image = %image.display(), "attached but mount point unknown");
        }

        Ok(Attachment {
            mount_point,
            newly_attached,
        })
    }

    fn find_mount_point(&self, image: &Path, attach_output: &str) -> Option<PathBuf> {
        let image_str = image.to_string_lossy();
        let root = self.mount_root.as_path();

        mount_point::discover(
            |strategy| match strategy {
                Strategy::AttachOutput => mount_point::from_attach_output(attach_output, root),
                Strategy::StatusListing => match self.status() {
                    Ok(listing) => mount_point::from_status_listing(&listing, &image_str),
                    Err(e) => {
                        debug!("status listing unavailable: {:#}", e);
                        None
                    }
                },
                Strategy::NewestDirectory => {
                    mount_point::newest_directory(&mount_point::list_volumes(root))
                }
            },
            |path| path.is_dir(),
        )
        .map(|(_, path)| path)
    }

    /// Detach `image`, escalating to force once per device.
    ///
    /// The outcome is decided by a final status check, not by the individual
    /// commands: if the image is gone at the end, intermediate failures are
    /// absorbed and the call succeeds. The volume may be ejected concurrently
    /// by someone else, so per-command failures are not trusted on their own.
    pub fn detach(&self, image: &Path) -> Result<Detachment> {
        let records = self.records(image)?;
        if records.is_empty() {
            debug!(image = %image.display(), "already detached");
            return Ok(Detachment::AlreadyDetached);
        }

        let mut state = DetachState::Attached;
        debug!(image = %image.display(), ?state, "detach start");
        state = DetachState::Detaching;
        let mut failures = 0;

        let parent = match records.as_slice() {
            [only] => only.parent_device().map(str::to_string),
            _ => None,
        };

        if let Some(device) = parent {
            debug!(%device, "detaching parent device");
            if !self.detach_device(&device, false)? {
                failures += 1;
                if self.is_attached(image)? {
                    if !self.detach_device(&device, true)? {
                        failures += 1;
                    }
                } else {
                    state = DetachState::Detached;
                }
            }
        } else {
            // slices before their whole disks
            let nodes: Vec<String> = records
                .iter()
                .flat_map(|r| r.devices.iter().rev().map(|d| d.node.clone()))
                .collect();
            debug!(?nodes, "no single parent device, detaching each node");

            for node in &nodes {
                if self.detach_device(node, false)? || self.detach_device(node, true)? {
                    continue;
                }
                if self.device_gone(image, node)? {
                    debug!(%node, "device already gone");
                    continue;
                }
                failures += 1;
            }
        }

        if state == DetachState::Detaching {
            state = if failures == 0 {
                DetachState::Detached
            } else {
                DetachState::Failed
            };
        }

        // Post-condition: the observed end state overrides the path taken
        let remaining = self.records(image)?;
        if remaining.is_empty() {
            if state == DetachState::Failed {
                warn!(
                    image = %image.display(),
                    failures,
                    "detach commands failed but image is no longer attached"
                );
            }
            return Ok(Detachment::Detached {
                absorbed_failures: failures,
            });
        }

        let nodes: Vec<String> = remaining
            .iter()
            .flat_map(|r| r.devices.iter().map(|d| d.node.clone()))
            .collect();
        bail!(Error::DetachFailed {
            image: image.to_path_buf(),
            remaining: nodes,
        })
    }

    /// Run one detach command; Ok(false) on a non-zero exit
    fn detach_device(&self, device: &str, force: bool) -> Result<bool> {
        let mut args = vec!["detach"];
        if force {
            args.push("-force");
        }
        args.push(device);
        let inv = Invocation::new(DRIVER, args);
        let output = self.runner.run(&inv)?;
        if !output.success {
            debug!(%device, force, stderr = %output.stderr.trim(), "detach failed");
        }
        Ok(output.success)
    }

    fn device_gone(&self, image: &Path, node: &str) -> Result<bool> {
        Ok(!self
            .records(image)?
            .iter()
            .any(|r| r.devices.iter().any(|d| d.node == node)))
    }
}

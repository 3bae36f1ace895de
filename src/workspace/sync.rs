//! Project folder mirroring to an S3-compatible bucket via rclone
//!
//! Credentials never touch rclone's own config file: they are passed as an
//! environment overlay on the child process, scoped to the remote profile.

use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::info;

use super::paths;
use super::settings;
use super::store::ConfigStore;
use crate::error::Error;
use crate::process::{require_command, Invocation, Runner};

pub const SYNC_TOOL: &str = "rclone";
pub const SYNC_TOOL_HINT: &str = "Install it with `brew install rclone` or see https://rclone.org/install/";

/// Transfer flags, in the order they are passed
const MIRROR_FLAGS: [&str; 6] = [
    "--fast-list",
    "--checksum",
    "--copy-links",
    "--delete-after",
    "--track-renames",
    "--stats-one-line",
];
const PROGRESS_FLAGS: [&str; 3] = ["--progress", "--stats", "1s"];
const QUIET_FLAGS: [&str; 6] = [
    "--stats",
    "1m",
    "--log-level",
    "NOTICE",
    "--stats-log-level",
    "NOTICE",
];

/// Remote transport settings
#[derive(Clone, PartialEq, Eq)]
pub struct RemoteProfile {
    pub name: String,
    pub bucket: String,
    pub endpoint: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub provider: String,
}

// Keep secrets out of debug logs
impl std::fmt::Debug for RemoteProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteProfile")
            .field("name", &self.name)
            .field("bucket", &self.bucket)
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .field("provider", &self.provider)
            .finish_non_exhaustive()
    }
}

impl RemoteProfile {
    /// Child environment that defines this profile for rclone
    pub fn env_overlay(&self) -> Vec<(String, String)> {
        let prefix = format!("RCLONE_CONFIG_{}", self.name.to_uppercase());
        [
            ("TYPE", "s3"),
            ("PROVIDER", self.provider.as_str()),
            ("ACCESS_KEY_ID", self.access_key_id.as_str()),
            ("SECRET_ACCESS_KEY", self.secret_access_key.as_str()),
            ("ENDPOINT", self.endpoint.as_str()),
            ("REGION", self.region.as_str()),
        ]
        .into_iter()
        .map(|(suffix, value)| (format!("{}_{}", prefix, suffix), value.to_string()))
        .collect()
    }

    /// `profile:bucket/folder`
    pub fn address(&self, folder: &str) -> String {
        format!("{}:{}/{}", self.name, self.bucket, folder)
    }
}

/// Local folder and its remote counterpart
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncTarget {
    pub local: PathBuf,
    pub remote: String,
}

pub struct SyncOrchestrator<'a, R: Runner> {
    runner: &'a R,
    base: PathBuf,
    profile: RemoteProfile,
}

impl<'a, R: Runner> SyncOrchestrator<'a, R> {
    pub fn new(runner: &'a R, base: PathBuf, profile: RemoteProfile) -> Self {
        Self {
            runner,
            base,
            profile,
        }
    }

    /// Validate `folder`, then read the base path and transport settings.
    ///
    /// The folder is checked before any setting is read. Missing settings are
    /// reported together in a single error.
    pub fn from_store(runner: &'a R, store: &ConfigStore, folder: &str) -> Result<Self> {
        paths::relative_folder(folder)?;

        let [path, name, bucket, endpoint, region, access_key_id, secret_access_key] =
            settings::require(
                store,
                [
                    settings::PATH,
                    settings::RCLONE_CONFIG_NAME,
                    settings::S3_BUCKET_NAME,
                    settings::S3_ENDPOINT,
                    settings::S3_REGION,
                    settings::S3_ACCESS_KEY_ID,
                    settings::S3_SECRET_ACCESS_KEY,
                ],
            )?;
        let base = settings::existing_base(paths::expand(path))?;

        let profile = RemoteProfile {
            name: name.to_string(),
            bucket: bucket.to_string(),
            endpoint: endpoint.to_string(),
            region: region.to_string(),
            access_key_id: access_key_id.to_string(),
            secret_access_key: secret_access_key.to_string(),
            provider: settings::get_or(store, settings::S3_PROVIDER, settings::DEFAULT_S3_PROVIDER)
                .to_string(),
        };

        require_command(SYNC_TOOL, SYNC_TOOL_HINT)?;
        Ok(Self::new(runner, base, profile))
    }

    pub fn target(&self, folder: &str) -> Result<SyncTarget> {
        let folder = paths::relative_folder(folder)?;
        Ok(SyncTarget {
            local: self.base.join(folder),
            remote: self.profile.address(folder),
        })
    }

    /// rclone arguments for mirroring `target` to the remote
    pub fn mirror_args(target: &SyncTarget, quiet: bool) -> Vec<String> {
        let mut args = vec![
            "sync".to_string(),
            target.local.to_string_lossy().into_owned(),
            target.remote.clone(),
        ];
        args.extend(MIRROR_FLAGS.iter().map(|f| f.to_string()));
        let output_flags: &[&str] = if quiet { &QUIET_FLAGS } else { &PROGRESS_FLAGS };
        args.extend(output_flags.iter().map(|f| f.to_string()));
        args
    }

    /// Mirror `base/folder` to `profile:bucket/folder`
    pub fn mirror(&self, folder: &str, quiet: bool) -> Result<SyncTarget> {
        let target = self.target(folder)?;
        ensure_dir(&target.local)?;

        info!(local = %target.local.display(), remote = %target.remote, quiet, "mirroring");
        let inv = Invocation::new(SYNC_TOOL, Self::mirror_args(&target, quiet))
            .with_env(self.profile.env_overlay())
            .interactive();
        self.runner.run(&inv)?.check(&inv)?;
        Ok(target)
    }

    /// Recursively delete `profile:bucket/folder`. No local effect.
    pub fn unsync(&self, folder: &str) -> Result<SyncTarget> {
        let target = self.target(folder)?;

        info!(remote = %target.remote, "purging");
        let inv = Invocation::new(SYNC_TOOL, ["purge", target.remote.as_str()])
            .with_env(self.profile.env_overlay())
            .interactive();
        self.runner.run(&inv)?.check(&inv)?;
        Ok(target)
    }
}

fn ensure_dir(path: &Path) -> Result<(), Error> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(Error::NotFound {
            what: "Folder",
            path: path.to_path_buf(),
        })
    }
}

//! Platform-specific configuration and paths

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Environment variable overriding the settings file location
pub const CONFIG_ENV: &str = "PROJDOCK_CONFIG";

/// Directory under which the disk-image driver mounts volumes
pub const MOUNT_ROOT: &str = "/Volumes";

/// Get the settings file path
/// - `$PROJDOCK_CONFIG` when set
/// - macOS: ~/Library/Application Support/projdock/config
/// - Linux: ~/.config/projdock/config
pub fn config_file() -> Result<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(path));
    }

    let config = dirs::config_dir().context("Could not determine config directory")?;
    Ok(config.join("projdock").join("config"))
}

/// Get the mount root used for mount-point discovery
pub fn mount_root() -> PathBuf {
    PathBuf::from(MOUNT_ROOT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_file_resolves() {
        // Should not panic, and should name a file called "config" by default
        if std::env::var_os(CONFIG_ENV).is_none() {
            if let Ok(path) = config_file() {
                assert!(path.ends_with("projdock/config"));
            }
        }
    }

    #[test]
    fn test_mount_root() {
        assert_eq!(mount_root(), PathBuf::from("/Volumes"));
    }
}

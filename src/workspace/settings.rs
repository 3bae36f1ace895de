//! Well-known settings keys and batched lookups

use anyhow::Result;
use std::path::PathBuf;

use super::paths;
use super::store::ConfigStore;
use crate::error::Error;

pub const PATH: &str = "path";
pub const DMG: &str = "dmg";
pub const S3_BUCKET_NAME: &str = "s3_bucket_name";
pub const S3_ENDPOINT: &str = "s3_endpoint";
pub const S3_REGION: &str = "s3_region";
pub const S3_ACCESS_KEY_ID: &str = "s3_access_key_id";
pub const S3_SECRET_ACCESS_KEY: &str = "s3_secret_access_key";
pub const RCLONE_CONFIG_NAME: &str = "rclone_config_name";
pub const S3_PROVIDER: &str = "s3_provider";
pub const EDITOR: &str = "editor";
pub const UPDATE_COMMAND: &str = "update_command";

pub const DEFAULT_EDITOR: &str = "code";
pub const DEFAULT_S3_PROVIDER: &str = "Other";

/// Values for every key in `keys`, or one error naming all that are unset.
///
/// Empty values count as unset.
pub fn require<'a, const N: usize>(
    store: &'a ConfigStore,
    keys: [&str; N],
) -> Result<[&'a str; N], Error> {
    let mut missing = Vec::new();
    let values = keys.map(|key| match store.lookup(key).filter(|v| !v.is_empty()) {
        Some(value) => value,
        None => {
            missing.push(key.to_string());
            ""
        }
    });

    if missing.is_empty() {
        Ok(values)
    } else {
        Err(Error::MissingConfig(missing))
    }
}

/// Optional key with a default
pub fn get_or<'a>(store: &'a ConfigStore, key: &str, default: &'a str) -> &'a str {
    store
        .lookup(key)
        .filter(|v| !v.is_empty())
        .unwrap_or(default)
}

/// Configured disk image, expanded
pub fn disk_image(store: &ConfigStore) -> Result<PathBuf, Error> {
    let [dmg] = require(store, [DMG])?;
    Ok(paths::expand(dmg))
}

/// Configured base path, expanded. Must exist.
pub fn base_path(store: &ConfigStore) -> Result<PathBuf, Error> {
    let [path] = require(store, [PATH])?;
    existing_base(paths::expand(path))
}

pub(crate) fn existing_base(base: PathBuf) -> Result<PathBuf, Error> {
    if base.is_dir() {
        Ok(base)
    } else {
        Err(Error::NotFound {
            what: "Base path",
            path: base,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(content: &str) -> (tempfile::TempDir, ConfigStore) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config");
        std::fs::write(&path, content).unwrap();
        let store = ConfigStore::open(&path).unwrap();
        (dir, store)
    }

    #[test]
    fn test_require_batches_missing_keys() {
        let (_dir, store) = store("s3_region: eu\ns3_endpoint:\n");
        let err = require(&store, [S3_BUCKET_NAME, S3_ENDPOINT, S3_REGION]).unwrap_err();
        match err {
            Error::MissingConfig(keys) => {
                assert_eq!(keys, vec!["s3_bucket_name", "s3_endpoint"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_require_returns_values_in_order() {
        let (_dir, store) = store("b: 2\na: 1\n");
        assert_eq!(require(&store, ["a", "b"]).unwrap(), ["1", "2"]);
    }

    #[test]
    fn test_get_or_default() {
        let (_dir, store) = store("editor: vim\ns3_provider:\n");
        assert_eq!(get_or(&store, EDITOR, DEFAULT_EDITOR), "vim");
        assert_eq!(get_or(&store, S3_PROVIDER, DEFAULT_S3_PROVIDER), "Other");
    }

    #[test]
    fn test_base_path_must_exist() {
        let (dir, store) = store("path: /nonexistent/projdock/base\n");
        assert!(matches!(base_path(&store), Err(Error::NotFound { .. })));

        let base = dir.path().join("base");
        std::fs::create_dir(&base).unwrap();
        let (_d2, store) = self::store(&format!("path: {}/\n", base.display()));
        assert_eq!(base_path(&store).unwrap(), base);
    }

    #[test]
    fn test_disk_image_missing() {
        let (_dir, store) = store("");
        let err = disk_image(&store).unwrap_err();
        assert!(err.to_string().contains("dmg"));
    }
}

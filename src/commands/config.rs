//! Config command - Read and write settings

use anyhow::Result;
use owo_colors::OwoColorize;
use projdock::error::Error;
use projdock::workspace::ConfigStore;

use super::utils;

/// Value stored for `key`
pub fn get(store: &ConfigStore, key: &str) -> Result<String> {
    match store.get(key)? {
        Some(value) => Ok(value.to_string()),
        None => Err(Error::KeyNotFound(key.to_string()).into()),
    }
}

pub fn set(store: &mut ConfigStore, key: &str, value: &str) -> Result<()> {
    store.set(key, value)?;
    println!("{} {}", "Set:".green(), key);
    Ok(())
}

/// All settings as sorted `key: value` lines
pub fn list(store: &ConfigStore) -> String {
    utils::format_entries(&store.list())
}

pub fn delete(store: &mut ConfigStore, key: &str) -> Result<()> {
    if store.delete(key)? {
        println!("{} {}", "Deleted:".green(), key);
    } else {
        println!("{} {} was not set", "Note:".yellow(), key);
    }
    Ok(())
}

pub fn reset(store: &mut ConfigStore) -> Result<()> {
    store.reset()?;
    println!(
        "{} all settings cleared ({})",
        "Reset:".green(),
        store.path().display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn store() -> (tempfile::TempDir, ConfigStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::open(dir.path().join("config")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_get_missing_key() {
        let (_dir, store) = store();
        let err = get(&store, "dmg").unwrap_err();
        assert_eq!(err.to_string(), "Key not found: dmg");
    }

    #[test]
    fn test_get_invalid_key() {
        let (_dir, store) = store();
        let err = get(&store, "bad-key").unwrap_err();
        assert!(err.to_string().contains("Invalid key 'bad-key'"));
    }

    #[test]
    fn test_set_get_list() {
        let (_dir, mut store) = store();
        set(&mut store, "path", "/Volumes/Projects").unwrap();
        set(&mut store, "Dmg", "/tmp/x.dmg").unwrap();
        assert_eq!(get(&store, "path").unwrap(), "/Volumes/Projects");
        assert_eq!(list(&store), "Dmg: /tmp/x.dmg\npath: /Volumes/Projects");
    }

    #[test]
    fn test_delete_then_reset() {
        let (_dir, mut store) = store();
        set(&mut store, "a", "1").unwrap();
        set(&mut store, "b", "2").unwrap();

        delete(&mut store, "a").unwrap();
        assert!(get(&store, "a").is_err());
        delete(&mut store, "a").unwrap();

        reset(&mut store).unwrap();
        assert_eq!(list(&store), "");
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "");
    }
}

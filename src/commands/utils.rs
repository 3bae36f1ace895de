//! Shared utilities for commands

use anyhow::{Context, Result};
use projdock::config;
use projdock::workspace::ConfigStore;

/// Open the settings store at its configured location
pub fn open_store() -> Result<ConfigStore> {
    let path = config::config_file()?;
    ConfigStore::open(&path)
        .with_context(|| format!("Failed to load settings from {}", path.display()))
}

/// Render entries as `key: value` lines
pub fn format_entries(entries: &[(&str, &str)]) -> String {
    entries
        .iter()
        .map(|(key, value)| format!("{}: {}", key, value))
        .collect::<Vec<_>>()
        .join("\n")
}

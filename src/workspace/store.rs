//! Line-oriented key/value settings store
//!
//! The file is kept in memory as an ordered list of lines. Entries are parsed
//! once on load; everything else (comments, blanks, malformed lines) is carried
//! through verbatim. Every mutation rewrites the whole file through a temp file
//! in the same directory followed by a rename, so readers see either the old
//! or the new content and never a partial write.

use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::Error;

/// One physical line of the settings file
#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    Entry { key: String, value: String, raw: String },
    Other(String),
}

impl Line {
    fn parse(raw: &str) -> Self {
        match parse_entry(raw) {
            Some((key, value)) => Line::Entry {
                key: key.to_string(),
                value: value.to_string(),
                raw: raw.to_string(),
            },
            None => Line::Other(raw.to_string()),
        }
    }

    fn entry(key: &str, value: &str) -> Self {
        Line::Entry {
            key: key.to_string(),
            value: value.to_string(),
            raw: format!("{}: {}", key, value),
        }
    }

    fn key(&self) -> Option<&str> {
        match self {
            Line::Entry { key, .. } => Some(key),
            Line::Other(_) => None,
        }
    }

    fn raw(&self) -> &str {
        match self {
            Line::Entry { raw, .. } => raw,
            Line::Other(raw) => raw,
        }
    }
}

/// Split `key : value` into its parts.
///
/// Returns `None` for blank lines, `#` comments, lines without `:` and lines
/// whose key part is not a valid key. A single space after the colon belongs
/// to the separator; anything further is part of the value.
fn parse_entry(raw: &str) -> Option<(&str, &str)> {
    let trimmed = raw.trim_start();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }

    let (key, rest) = raw.split_once(':')?;
    let key = key.trim();
    if !is_valid_key(key) {
        return None;
    }

    let value = rest.strip_prefix(' ').unwrap_or(rest);
    Some((key, value.strip_suffix('\r').unwrap_or(value)))
}

/// Keys are non-empty and limited to `[A-Za-z0-9_]`
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty() && key.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

pub fn validate_key(key: &str) -> Result<(), Error> {
    if is_valid_key(key) {
        Ok(())
    } else {
        Err(Error::InvalidKey(key.to_string()))
    }
}

fn validate_value(key: &str, value: &str) -> Result<(), Error> {
    if value.contains(['\n', '\r']) {
        Err(Error::InvalidValue {
            key: key.to_string(),
        })
    } else {
        Ok(())
    }
}

/// Settings file handle
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    lines: Vec<Line>,
}

impl ConfigStore {
    /// Load the store, treating a missing file as empty
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read: {}", path.display()))
            }
        };

        Ok(Self {
            // split on '\n' only so a trailing '\r' stays part of the raw line
            lines: content
                .split_inclusive('\n')
                .map(|line| line.strip_suffix('\n').unwrap_or(line))
                .map(Line::parse)
                .collect(),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// First entry for `key`, in file order
    pub fn get(&self, key: &str) -> Result<Option<&str>> {
        validate_key(key)?;
        Ok(self.lookup(key))
    }

    /// Lookup without the key check, for well-known keys
    pub(crate) fn lookup(&self, key: &str) -> Option<&str> {
        self.lines.iter().find_map(|line| match line {
            Line::Entry { key: k, value, .. } if k == key => Some(value.as_str()),
            _ => None,
        })
    }

    /// Insert or update `key` and persist.
    ///
    /// The first entry for `key` keeps its position; later duplicates are
    /// dropped so the file never holds two entries for one key.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        validate_value(key, value)?;

        let mut updated = false;
        self.lines.retain_mut(|line| {
            if line.key() != Some(key) {
                return true;
            }
            if updated {
                return false;
            }
            *line = Line::entry(key, value);
            updated = true;
            true
        });

        if !updated {
            self.lines.push(Line::entry(key, value));
        }

        debug!(key, updated, "set");
        self.save()
    }

    /// Remove every entry for `key` and persist. Returns whether any existed.
    pub fn delete(&mut self, key: &str) -> Result<bool> {
        validate_key(key)?;

        let before = self.lines.len();
        self.lines.retain(|line| line.key() != Some(key));
        let removed = self.lines.len() != before;

        if removed {
            self.save()?;
        }
        debug!(key, removed, "delete");
        Ok(removed)
    }

    /// All entries sorted case-insensitively by key
    pub fn list(&self) -> Vec<(&str, &str)> {
        let mut entries: Vec<(&str, &str)> = self
            .lines
            .iter()
            .filter_map(|line| match line {
                Line::Entry { key, value, .. } => Some((key.as_str(), value.as_str())),
                Line::Other(_) => None,
            })
            .collect();
        entries.sort_by_cached_key(|(key, _)| key.to_lowercase());
        entries
    }

    /// Drop all content and persist an empty file
    pub fn reset(&mut self) -> Result<()> {
        self.lines.clear();
        self.save()
    }

    /// File content as it would be written
    pub fn render(&self) -> String {
        self.lines
            .iter()
            .map(|line| format!("{}\n", line.raw()))
            .collect()
    }

    fn save(&self) -> Result<()> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;

        let mut tmp = NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to create temp file in: {}", dir.display()))?;
        tmp.write_all(self.render().as_bytes())
            .context("Failed to write settings")?;
        tmp.as_file()
            .sync_all()
            .context("Failed to flush settings")?;
        tmp.persist(&self.path)
            .with_context(|| format!("Failed to write: {}", self.path.display()))?;

        Ok(())
    }
}

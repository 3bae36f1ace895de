//! User-facing error taxonomy
//!
//! Commands propagate `anyhow::Error`; these variants are raised where the
//! message shown to the user matters. All of them end the process with status 1.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Key does not match `[A-Za-z0-9_]+`
    #[error("Invalid key '{0}': keys may only contain letters, digits and underscores")]
    InvalidKey(String),

    #[error("Invalid value for '{key}': values cannot contain line breaks")]
    InvalidValue { key: String },

    /// Folder or file argument is absolute, home-relative or climbs out with `..`
    #[error("Invalid {kind} '{value}': must be relative to the configured base path (no leading '/' or '~', no '.' or '..' segments)")]
    NotRelative { kind: &'static str, value: String },

    /// One or more required settings are unset, reported together
    #[error(
        "Missing configuration: {}\nSet them with: projdock config set <key> <value>",
        .0.join(", ")
    )]
    MissingConfig(Vec<String>),

    #[error("Required command '{command}' not found on PATH. {hint}")]
    MissingDependency { command: String, hint: String },

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("{what} does not exist: {}", .path.display())]
    NotFound { what: &'static str, path: PathBuf },

    #[error("'{command}' failed ({status}){}", format_stderr(.stderr))]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("Could not detach {}: still attached ({})", .image.display(), .remaining.join(", "))]
    DetachFailed {
        image: PathBuf,
        remaining: Vec<String>,
    },
}

fn format_stderr(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {}", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_lists_every_key() {
        let err = Error::MissingConfig(vec!["s3_bucket_name".into(), "s3_region".into()]);
        let msg = err.to_string();
        assert!(msg.contains("s3_bucket_name, s3_region"));
    }

    #[test]
    fn test_command_failed_includes_trimmed_stderr() {
        let err = Error::CommandFailed {
            command: "hdiutil attach".into(),
            status: "exit status 1".into(),
            stderr: "  resource busy\n".into(),
        };
        assert_eq!(
            err.to_string(),
            "'hdiutil attach' failed (exit status 1): resource busy"
        );
    }

    #[test]
    fn test_command_failed_without_stderr() {
        let err = Error::CommandFailed {
            command: "rclone purge".into(),
            status: "exit status 3".into(),
            stderr: String::new(),
        };
        assert_eq!(err.to_string(), "'rclone purge' failed (exit status 3)");
    }
}

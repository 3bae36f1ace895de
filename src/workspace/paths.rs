//! User path expansion and folder-argument checks

use std::path::{Path, PathBuf};

use crate::error::Error;

/// Expand a leading `~` and strip one trailing `/`.
///
/// No other normalization happens: symlinks and `..` are left alone.
pub fn expand(path: &str) -> PathBuf {
    match dirs::home_dir() {
        Some(home) => expand_with_home(path, &home),
        None => PathBuf::from(strip_trailing_separator(path)),
    }
}

/// [`expand`] with an explicit home directory
pub fn expand_with_home(path: &str, home: &Path) -> PathBuf {
    let path = strip_trailing_separator(path);

    if path == "~" {
        return home.to_path_buf();
    }
    match path.strip_prefix("~/") {
        Some(rest) => home.join(rest),
        None => PathBuf::from(path),
    }
}

fn strip_trailing_separator(path: &str) -> &str {
    match path.strip_suffix('/') {
        Some(stripped) if !stripped.is_empty() => stripped,
        _ => path,
    }
}

/// Accept only folder names relative to the base path.
///
/// `.` and `..` segments are refused so a folder always names a prefix below
/// the base, locally and in the bucket.
pub fn relative_folder(folder: &str) -> Result<&str, Error> {
    relative("folder", folder)
}

/// Accept only file names relative to a project folder
pub fn relative_file(file: &str) -> Result<&str, Error> {
    relative("file", file)
}

fn relative<'a>(kind: &'static str, value: &'a str) -> Result<&'a str, Error> {
    let escapes = value.split('/').any(|segment| segment == "." || segment == "..");
    if value.is_empty() || value.starts_with('/') || value.starts_with('~') || escapes {
        return Err(Error::NotRelative {
            kind,
            value: value.to_string(),
        });
    }
    Ok(strip_trailing_separator(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn home() -> PathBuf {
        PathBuf::from("/Users/me")
    }

    #[test]
    fn test_expand_home_prefix() {
        assert_eq!(
            expand_with_home("~/Projects", &home()),
            PathBuf::from("/Users/me/Projects")
        );
        assert_eq!(expand_with_home("~", &home()), home());
        assert_eq!(expand_with_home("~/", &home()), home());
    }

    #[test]
    fn test_expand_strips_one_trailing_slash() {
        assert_eq!(
            expand_with_home("/Volumes/Projects/", &home()),
            PathBuf::from("/Volumes/Projects")
        );
        assert_eq!(
            expand_with_home("~/Projects/", &home()),
            PathBuf::from("/Users/me/Projects")
        );
    }

    #[test]
    fn test_expand_leaves_other_paths_alone() {
        assert_eq!(
            expand_with_home("/a/../b/./c", &home()),
            PathBuf::from("/a/../b/./c")
        );
        // Only a leading "~/" is a home marker
        assert_eq!(
            expand_with_home("~other/x", &home()),
            PathBuf::from("~other/x")
        );
        assert_eq!(expand_with_home("/", &home()), PathBuf::from("/"));
    }

    #[test]
    fn test_relative_folder() {
        assert_eq!(relative_folder("web").unwrap(), "web");
        assert_eq!(relative_folder("clients/acme/").unwrap(), "clients/acme");
        assert!(relative_folder("/abs").is_err());
        assert!(relative_folder("~/x").is_err());
        assert!(relative_folder("~").is_err());
        assert!(relative_folder("").is_err());
    }

    #[test]
    fn test_relative_rejects_dot_segments() {
        for folder in [".", "..", "./", "../web", "a/../..", "web/.", "a/./b"] {
            assert!(relative_folder(folder).is_err(), "should reject {:?}", folder);
        }
        assert!(relative_file("../secret").is_err());
        assert_eq!(relative_folder(".config").unwrap(), ".config");
        assert_eq!(relative_file("notes..md").unwrap(), "notes..md");
    }

    #[test]
    fn test_relative_error_names_argument() {
        let err = relative_file("/etc/hosts").unwrap_err();
        assert!(err.to_string().starts_with("Invalid file '/etc/hosts'"));
        let err = relative_folder("~/web").unwrap_err();
        assert!(err.to_string().starts_with("Invalid folder '~/web'"));
    }
}

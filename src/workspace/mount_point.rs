//! Mount-point discovery
//!
//! The driver's textual output is not a reliable source for where a volume
//! landed, so discovery is an ordered list of strategies. Each strategy maps
//! some piece of evidence to a candidate path; the first candidate that is an
//! existing directory wins.

use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;
use walkdir::WalkDir;

use super::status;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Path under the mount root printed by the attach command itself
    AttachOutput,
    /// Mount field recorded for the image in the status listing
    StatusListing,
    /// Most recently modified directory directly under the mount root
    NewestDirectory,
}

impl Strategy {
    pub const ORDER: [Strategy; 3] = [
        Strategy::AttachOutput,
        Strategy::StatusListing,
        Strategy::NewestDirectory,
    ];
}

/// Try each strategy in [`Strategy::ORDER`].
///
/// `candidate` produces the strategy's guess; `is_dir` confirms it. Evidence is
/// only gathered for strategies that are actually reached.
pub fn discover<C, D>(mut candidate: C, is_dir: D) -> Option<(Strategy, PathBuf)>
where
    C: FnMut(Strategy) -> Option<PathBuf>,
    D: Fn(&Path) -> bool,
{
    for strategy in Strategy::ORDER {
        match candidate(strategy) {
            Some(path) if is_dir(&path) => {
                debug!(?strategy, path = %path.display(), "mount point found");
                return Some((strategy, path));
            }
            Some(path) => {
                debug!(?strategy, path = %path.display(), "candidate is not a directory");
            }
            None => debug!(?strategy, "no candidate"),
        }
    }
    None
}

/// Last path under `mount_root` printed by the attach command.
///
/// Attach output is tab-separated `node  content  [mount point]` rows; the
/// mount point may contain spaces, so everything from the root onwards is kept.
pub fn from_attach_output(output: &str, mount_root: &Path) -> Option<PathBuf> {
    let root = format!("{}/", mount_root.display());

    output
        .lines()
        .filter_map(|line| {
            let start = line.find(&root)?;
            let path = line[start..].trim_end();
            (path.len() > root.len()).then(|| PathBuf::from(path))
        })
        .last()
}

/// Mount field for `image` in a status listing, wherever it is mounted
pub fn from_status_listing(listing: &str, image: &str) -> Option<PathBuf> {
    let records = status::parse(listing);
    let found = status::find(&records, image)
        .into_iter()
        .flat_map(|record| record.mount_points())
        .map(PathBuf::from)
        .next();
    found
}

/// Newest of the given (directory, modified) pairs
pub fn newest_directory(candidates: &[(PathBuf, SystemTime)]) -> Option<PathBuf> {
    candidates
        .iter()
        .max_by_key(|(_, modified)| *modified)
        .map(|(path, _)| path.clone())
}

/// Directories directly under `mount_root` with their modification times
pub fn list_volumes(mount_root: &Path) -> Vec<(PathBuf, SystemTime)> {
    WalkDir::new(mount_root)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir())
        .filter_map(|e| {
            let modified = e.metadata().ok()?.modified().ok()?;
            Some((e.into_path(), modified))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const ATTACH_OUTPUT: &str = "/dev/disk4          \tGUID_partition_scheme          \t\n\
/dev/disk4s1        \tApple_HFS                      \t/Volumes/My Projects\n";

    #[test]
    fn test_from_attach_output() {
        assert_eq!(
            from_attach_output(ATTACH_OUTPUT, Path::new("/Volumes")),
            Some(PathBuf::from("/Volumes/My Projects"))
        );
    }

    #[test]
    fn test_from_attach_output_ignores_bare_root_and_noise() {
        let output = "expected CRC32 $12345678\n/dev/disk4\tGUID\t/Volumes/\n";
        assert_eq!(from_attach_output(output, Path::new("/Volumes")), None);
        assert_eq!(from_attach_output("", Path::new("/Volumes")), None);
    }

    #[test]
    fn test_from_status_listing() {
        let listing = status::fixtures::TWO_IMAGES;
        assert_eq!(
            from_status_listing(listing, "/Users/me/Archive Copy.dmg"),
            Some(PathBuf::from("/Volumes/Archive Copy"))
        );
        assert_eq!(from_status_listing(listing, "/Users/me/Missing.dmg"), None);
    }

    #[test]
    fn test_from_status_listing_outside_mount_root() {
        let listing = "================================================\n\
image-path      : /Users/me/Projects.dmg\n\
/dev/disk4          \tGUID_partition_scheme          \t\n\
/dev/disk4s1        \tApple_HFS                      \t/Users/me/mnt/Projects\n";
        assert_eq!(
            from_status_listing(listing, "/Users/me/Projects.dmg"),
            Some(PathBuf::from("/Users/me/mnt/Projects"))
        );
    }

    #[test]
    fn test_newest_directory() {
        let base = SystemTime::UNIX_EPOCH;
        let candidates = vec![
            (PathBuf::from("/Volumes/Old"), base + Duration::from_secs(10)),
            (PathBuf::from("/Volumes/New"), base + Duration::from_secs(30)),
            (PathBuf::from("/Volumes/Mid"), base + Duration::from_secs(20)),
        ];
        assert_eq!(
            newest_directory(&candidates),
            Some(PathBuf::from("/Volumes/New"))
        );
        assert_eq!(newest_directory(&[]), None);
    }

    #[test]
    fn test_discover_stops_at_first_existing_directory() {
        let mut asked = Vec::new();
        let found = discover(
            |s| {
                asked.push(s);
                Some(PathBuf::from(format!("/m/{:?}", s)))
            },
            |p| p == Path::new("/m/AttachOutput"),
        );
        assert_eq!(
            found,
            Some((Strategy::AttachOutput, PathBuf::from("/m/AttachOutput")))
        );
        assert_eq!(asked, vec![Strategy::AttachOutput]);
    }

    #[test]
    fn test_discover_falls_back_in_order() {
        let mut asked = Vec::new();
        let found = discover(
            |s| {
                asked.push(s);
                match s {
                    Strategy::AttachOutput => Some(PathBuf::from("/gone")),
                    Strategy::StatusListing => None,
                    Strategy::NewestDirectory => Some(PathBuf::from("/Volumes/X")),
                }
            },
            |p| p == Path::new("/Volumes/X"),
        );
        assert_eq!(
            found,
            Some((Strategy::NewestDirectory, PathBuf::from("/Volumes/X")))
        );
        assert_eq!(asked, Strategy::ORDER.to_vec());
    }

    #[test]
    fn test_discover_none() {
        assert_eq!(discover(|_| None, |_| true), None);
    }

    #[test]
    fn test_list_volumes() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join("A")).unwrap();
        std::fs::create_dir(root.path().join("B")).unwrap();
        std::fs::write(root.path().join("file"), "x").unwrap();

        let mut names: Vec<_> = list_volumes(root.path())
            .into_iter()
            .map(|(p, _)| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["A", "B"]);
    }
}

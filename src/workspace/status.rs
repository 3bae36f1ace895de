//! Parser for the disk-image driver's status listing (`hdiutil info`)
//!
//! The listing is a header followed by one block per attached image, blocks
//! separated by a line of `=` characters:
//!
//! ```text
//! ================================================
//! image-path      : /Users/me/Projects.dmg
//! image-type      : read/write
//! /dev/disk4          	GUID_partition_scheme
//! /dev/disk4s1        	Apple_HFS                      	/Volumes/Projects
//! ```

/// One device node belonging to an attached image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceEntry {
    pub node: String,
    pub mount_point: Option<String>,
}

impl DeviceEntry {
    /// Whole-disk node such as `/dev/disk4` (no `sN` slice suffix)
    pub fn is_whole_disk(&self) -> bool {
        self.node
            .strip_prefix("/dev/disk")
            .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
    }
}

/// One attached image as reported by the driver
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageRecord {
    pub image_path: String,
    pub devices: Vec<DeviceEntry>,
}

impl ImageRecord {
    /// Field match on the image path.
    ///
    /// Besides equality, the listed path may carry a leading prefix the driver
    /// adds (e.g. `/System/Volumes/Data`), but it must end exactly at `image`.
    pub fn matches(&self, image: &str) -> bool {
        if self.image_path.is_empty() || image.is_empty() {
            return false;
        }
        self.image_path
            .strip_suffix(image)
            .is_some_and(|prefix| prefix.is_empty() || image.starts_with('/') || prefix.ends_with('/'))
    }

    /// The single whole-disk node, if exactly one is listed
    pub fn parent_device(&self) -> Option<&str> {
        let mut whole = self.devices.iter().filter(|d| d.is_whole_disk());
        match (whole.next(), whole.next()) {
            (Some(only), None) => Some(&only.node),
            _ => None,
        }
    }

    pub fn mount_points(&self) -> impl Iterator<Item = &str> {
        self.devices.iter().filter_map(|d| d.mount_point.as_deref())
    }
}

/// Parse every image block in a status listing
pub fn parse(listing: &str) -> Vec<ImageRecord> {
    let mut records = Vec::new();
    let mut current: Option<ImageRecord> = None;

    for line in listing.lines() {
        let trimmed = line.trim();

        if is_separator(trimmed) {
            records.extend(current.take());
            current = Some(ImageRecord::default());
            continue;
        }

        // Header lines before the first separator carry no image data
        let Some(record) = current.as_mut() else {
            continue;
        };

        if trimmed.starts_with("/dev/") {
            record.devices.push(parse_device(line));
        } else if let Some((field, value)) = trimmed.split_once(':') {
            if field.trim() == "image-path" {
                record.image_path = value.trim().to_string();
            }
        }
    }
    records.extend(current);

    records.retain(|r| !r.image_path.is_empty());
    records
}

/// Records whose image path matches `image`.
///
/// Exact matches win; prefixed paths are only consulted when none exist.
pub fn find<'a>(records: &'a [ImageRecord], image: &str) -> Vec<&'a ImageRecord> {
    let exact: Vec<&ImageRecord> = records
        .iter()
        .filter(|r| !image.is_empty() && r.image_path == image)
        .collect();
    if !exact.is_empty() {
        return exact;
    }
    records.iter().filter(|r| r.matches(image)).collect()
}

fn is_separator(line: &str) -> bool {
    line.len() >= 3 && line.bytes().all(|b| b == b'=')
}

fn parse_device(line: &str) -> DeviceEntry {
    let mut fields = line.split('\t').map(str::trim);
    let node = fields.next().unwrap_or_default().to_string();

    // content hint, then optional mount point
    let mount_point = fields
        .nth(1)
        .filter(|m| !m.is_empty())
        .map(str::to_string);

    DeviceEntry { node, mount_point }
}

//! Inventory entries.
//!
//! A [`FileEntry`] is one row of a parsed inventory. The derived fields
//! (stem, extension, directory) are computed once at construction and the
//! entry is never mutated afterwards.

use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::paths::{normalize_separators, split_file_name};

/// One file listed in an inventory.
///
/// # Examples
///
/// ```
/// use chrono::{DateTime, Utc};
/// use mg_core::FileEntry;
///
/// let entry = FileEntry::new(r"src\components\Chart.test.JSX", 512, DateTime::<Utc>::UNIX_EPOCH);
/// assert_eq!(entry.path.as_str(), "src/components/Chart.test.JSX");
/// assert_eq!(entry.stem, "Chart.test");
/// assert_eq!(entry.extension, "jsx");
/// assert_eq!(entry.directory, "src/components");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Path with `/` separators, as listed in the inventory.
    pub path: Utf8PathBuf,

    /// Size in bytes.
    pub size: u64,

    /// Modification time. Unparseable timestamps become the Unix epoch.
    pub modified: DateTime<Utc>,

    /// File name without its final extension.
    pub stem: String,

    /// Final extension, lowercase, without the dot. Empty when absent.
    pub extension: String,

    /// Parent directory. Empty for bare file names.
    pub directory: String,
}

impl FileEntry {
    /// Creates an entry, normalising separators and deriving the name parts.
    #[must_use]
    pub fn new(path: impl AsRef<str>, size: u64, modified: DateTime<Utc>) -> Self {
        let path = Utf8PathBuf::from(normalize_separators(path.as_ref()));
        let file_name = path.file_name().unwrap_or(path.as_str());
        let (stem, extension) = split_file_name(file_name);
        let stem = stem.to_owned();
        let extension = extension.map(str::to_ascii_lowercase).unwrap_or_default();
        let directory = path.parent().map(Utf8Path::as_str).unwrap_or_default().to_owned();

        Self {
            path,
            size,
            modified,
            stem,
            extension,
            directory,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_entry_bare_name() {
        let entry = FileEntry::new("index.js", 10, DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(entry.directory, "");
        assert_eq!(entry.stem, "index");
        assert_eq!(entry.extension, "js");
    }

    #[test]
    fn test_file_entry_without_extension() {
        let entry = FileEntry::new("bin/run", 10, DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(entry.stem, "run");
        assert_eq!(entry.extension, "");
    }

    #[test]
    fn test_file_entry_serialization() {
        let entry = FileEntry::new("src/App.js", 42, DateTime::<Utc>::UNIX_EPOCH);
        let json = serde_json::to_string(&entry).unwrap();
        let parsed: FileEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(entry, parsed);
    }
}

//! Multi-root inventory rows and reconciliation output.
//!
//! Rows from several scan roots describe "the same" file when their
//! [`IdentityKey`]s are equal: same relative path (case-folded, `/`
//! separators) and same size.

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::paths::normalize_separators;

/// Identity of a master-inventory row: normalised relative path and size.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IdentityKey {
    /// Case-folded relative path with `/` separators and no leading `./` or `/`.
    pub rel_path: String,
    /// Size in bytes.
    pub size: u64,
}

/// One row of a master inventory CSV.
///
/// `mtime` is kept verbatim; reconciliation never looks at it.
///
/// # Examples
///
/// ```
/// use mg_core::MasterDedupRow;
///
/// let row = MasterDedupRow::new("A", r"C:\A\Src\App.js", r".\Src\App.js", 120, "1700000000");
/// let key = row.identity_key();
/// assert_eq!(key.rel_path, "src/app.js");
/// assert_eq!(key.size, 120);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterDedupRow {
    /// Scan root the row came from.
    pub root: String,
    /// Absolute path of the file.
    pub abs_path: Utf8PathBuf,
    /// Path relative to `root`.
    pub rel_path: String,
    /// File name.
    pub base_name: String,
    /// Extension as listed.
    pub ext: String,
    /// Size in bytes.
    pub size: u64,
    /// Modification time as listed.
    pub mtime: String,
}

impl MasterDedupRow {
    /// Creates a row, deriving `base_name` and `ext` from `rel_path`.
    #[must_use]
    pub fn new(
        root: impl Into<String>,
        abs_path: impl Into<Utf8PathBuf>,
        rel_path: impl Into<String>,
        size: u64,
        mtime: impl Into<String>,
    ) -> Self {
        let rel_path = rel_path.into();
        let normalized = normalize_separators(&rel_path);
        let base_name = normalized.rsplit('/').next().unwrap_or_default().to_owned();
        let ext = crate::paths::split_file_name(&base_name)
            .1
            .map(|ext| format!(".{ext}"))
            .unwrap_or_default();

        Self {
            root: root.into(),
            abs_path: abs_path.into(),
            rel_path,
            base_name,
            ext,
            size,
            mtime: mtime.into(),
        }
    }

    /// Returns the row's identity key.
    #[must_use]
    pub fn identity_key(&self) -> IdentityKey {
        IdentityKey {
            rel_path: normalize_rel_path(&self.rel_path),
            size: self.size,
        }
    }
}

/// Case-folds and separator-normalises a relative path.
///
/// # Examples
///
/// ```
/// use mg_core::types::master::normalize_rel_path;
///
/// assert_eq!(normalize_rel_path(r"./Src\\Components/App.JS"), "src/components/app.js");
/// ```
#[must_use]
pub fn normalize_rel_path(rel_path: &str) -> String {
    normalize_separators(rel_path)
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
        .to_lowercase()
}

/// A row that lost to a higher-precedence row with the same identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscardedRow {
    /// The losing row.
    #[serde(flatten)]
    pub row: MasterDedupRow,
    /// Absolute path of the row that was kept instead.
    pub kept_abs_path: Utf8PathBuf,
}

/// Totals and the precedence order used for one reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DedupSummary {
    /// Rows considered.
    pub total: usize,
    /// Rows kept.
    pub kept: usize,
    /// Rows discarded.
    pub discarded: usize,
    /// Precedence list, highest first.
    pub precedence: Vec<String>,
}

/// The full result of a reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DedupOutcome {
    /// One row per identity key.
    pub kept: Vec<MasterDedupRow>,
    /// Every other row, annotated with its keeper.
    pub discarded: Vec<DiscardedRow>,
    /// Totals.
    pub summary: DedupSummary,
}

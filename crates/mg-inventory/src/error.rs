//! Error types for the mg-inventory crate.

use camino::Utf8PathBuf;

/// Errors that can occur while reading inventories.
///
/// Malformed rows are never errors; they are skipped. Only failures to read
/// the input at all surface here.
#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    /// Failed to read an inventory file.
    #[error("failed to read inventory {path}: {source}")]
    Read {
        /// The inventory that couldn't be read.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The CSV reader hit an I/O failure mid-stream.
    #[error("failed to read master inventory: {0}")]
    Csv(#[from] csv::Error),
}

impl InventoryError {
    /// Creates a new [`InventoryError::Read`] error.
    #[inline]
    pub fn read(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Returns the file path associated with this error, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Utf8PathBuf> {
        match self {
            Self::Read { path, .. } => Some(path),
            Self::Csv(_) => None,
        }
    }
}

//! Error types for the mg-audit crate.

use camino::Utf8PathBuf;

/// Errors that can occur while rendering or writing a report.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    /// Creating or writing a report file failed.
    #[error("failed to write report {path}: {source}")]
    Io {
        /// The report path.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// CSV serialization failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AuditError {
    /// Creates an I/O error for `path`.
    pub fn io(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

//! Error types for the mg-pipeline crate.

use camino::Utf8PathBuf;

/// Errors that can occur while driving the pipeline.
///
/// Only contract violations and bookkeeping I/O surface here. Conversion
/// failures, tool failures and validation verdicts are recorded as data.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The requested stage is not in the run's stage list.
    #[error("unknown stage '{stage}' (expected one of: {})", .known.join(", "))]
    UnknownStage {
        /// The stage that was requested.
        stage: String,
        /// The stages the run knows.
        known: Vec<String>,
    },

    /// Writing a stage artifact or staged file failed.
    #[error("failed to write {path}: {source}")]
    Write {
        /// The path being written.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The validator could not be built.
    #[error(transparent)]
    Validate(#[from] mg_validate::ValidateError),
}

impl PipelineError {
    /// Creates a write error.
    pub fn write(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    /// Returns `true` for errors caused by the caller's request rather than the environment.
    #[must_use]
    pub const fn is_contract_violation(&self) -> bool {
        matches!(self, Self::UnknownStage { .. })
    }
}

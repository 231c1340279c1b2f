//! Error types for the mg-validate crate.
//!
//! Validation itself never fails: every problem with an artifact becomes a
//! reason on its [`ValidationResult`](mg_core::ValidationResult). These
//! errors cover building a validator and moving files into quarantine.

use camino::Utf8PathBuf;

/// Errors raised while setting up validation or quarantining an artifact.
#[derive(Debug, thiserror::Error)]
pub enum ValidateError {
    /// A built-in content rule failed to compile.
    #[error("content rule '{name}' failed to compile: {source}")]
    Rule {
        /// Name of the rule.
        name: &'static str,
        /// The regex compilation error.
        #[source]
        source: regex::Error,
    },

    /// Moving an artifact into quarantine failed.
    #[error("failed to quarantine {path} to {destination}: {source}")]
    Quarantine {
        /// The artifact being moved.
        path: Utf8PathBuf,
        /// Where it was headed.
        destination: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The artifact has no file name to quarantine under.
    #[error("artifact path {0} has no file name")]
    NoFileName(Utf8PathBuf),
}

impl ValidateError {
    /// Creates a quarantine error.
    pub fn quarantine(
        path: impl Into<Utf8PathBuf>,
        destination: impl Into<Utf8PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::Quarantine {
            path: path.into(),
            destination: destination.into(),
            source,
        }
    }
}

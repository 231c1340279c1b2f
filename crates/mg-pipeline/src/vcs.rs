//! The version-control collaborator.
//!
//! PR automation lives outside this engine. The driver hands the set of
//! files it wrote and the configured branch name to a [`ChangeSubmitter`]
//! and records whatever comes back.

use camino::Utf8PathBuf;

/// What happened to a submitted change set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// The change set was accepted.
    Submitted {
        /// URL of the opened pull request, if one was created.
        pr_url: Option<String>,
    },
    /// The submission failed.
    Failed {
        /// Why.
        reason: String,
    },
}

impl Submission {
    /// Returns `true` for [`Submission::Submitted`].
    #[must_use]
    pub const fn is_submitted(&self) -> bool {
        matches!(self, Self::Submitted { .. })
    }
}

/// Submits changed files on a branch.
pub trait ChangeSubmitter {
    /// Submits `paths` on `branch`.
    fn submit(&self, paths: &[Utf8PathBuf], branch: &str) -> Submission;
}

//! Artifact validation verdicts.

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Severity of a validation verdict. Ordered so that `max` picks the most severe.
///
/// # Examples
///
/// ```
/// use mg_core::ValidationStatus;
///
/// assert!(ValidationStatus::Fail > ValidationStatus::Flag);
/// assert_eq!(ValidationStatus::Pass.max(ValidationStatus::Flag), ValidationStatus::Flag);
/// assert_eq!(ValidationStatus::Flag.label(), "FLAG");
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum ValidationStatus {
    /// No action needed.
    #[default]
    Pass,
    /// Advisory; surfaced for review, not blocking.
    Flag,
    /// Terminal for the artifact: quarantined or missing.
    Fail,
}

impl ValidationStatus {
    /// Returns the uppercase label used in reports.
    #[inline]
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Flag => "FLAG",
            Self::Fail => "FAIL",
        }
    }

    /// Returns `true` for [`Fail`](Self::Fail).
    #[inline]
    #[must_use]
    pub const fn is_fail(self) -> bool {
        matches!(self, Self::Fail)
    }
}

/// The verdict for one artifact.
///
/// When `status` is `Fail` and `quarantined` is `true`, the file now lives at
/// `quarantine_path` and `filepath` no longer exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// The artifact that was validated (its original location).
    pub filepath: Utf8PathBuf,
    /// Stage label: the expected stage if given, else the inferred one.
    pub stage: Option<String>,
    /// Most severe status among all reasons.
    pub status: ValidationStatus,
    /// Reasons in rule-chain order.
    pub reasons: SmallVec<[String; 4]>,
    /// Whether the artifact was moved to quarantine.
    pub quarantined: bool,
    /// Where the artifact was moved, when quarantined.
    pub quarantine_path: Option<Utf8PathBuf>,
}

impl ValidationResult {
    /// Returns `true` when the artifact can move on (`Pass` or `Flag`).
    #[inline]
    #[must_use]
    pub const fn is_usable(&self) -> bool {
        !self.status.is_fail()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_ordering() {
        let worst = [ValidationStatus::Flag, ValidationStatus::Pass, ValidationStatus::Fail]
            .into_iter()
            .max();
        assert_eq!(worst, Some(ValidationStatus::Fail));
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&ValidationStatus::Fail).unwrap(),
            r#""FAIL""#
        );
        let parsed: ValidationStatus = serde_json::from_str(r#""PASS""#).unwrap();
        assert_eq!(parsed, ValidationStatus::Pass);
    }

    #[test]
    fn test_result_usable() {
        let result = ValidationResult {
            filepath: Utf8PathBuf::from("a.md"),
            stage: None,
            status: ValidationStatus::Flag,
            reasons: SmallVec::new(),
            quarantined: false,
            quarantine_path: None,
        };
        assert!(result.is_usable());
    }
}

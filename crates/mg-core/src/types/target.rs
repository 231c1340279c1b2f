//! Conversion targets.
//!
//! A [`ConversionTarget`] pairs a legacy source path with the path its typed
//! counterpart should be written to.

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

/// What kind of file a conversion produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    /// A plain module (`.js` → `.ts`).
    Module,
    /// A component carrying markup (`.jsx` → `.tsx`).
    Component,
    /// A test or spec file.
    Test,
}

impl TargetKind {
    /// Returns the lowercase label used in reports.
    #[inline]
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Module => "module",
            Self::Component => "component",
            Self::Test => "test",
        }
    }
}

/// A legacy file and where its converted form goes.
///
/// For test and spec sources, `target` is the typed path of the module under
/// test and `test_target` is the typed path of the test itself.
///
/// # Examples
///
/// ```
/// use camino::Utf8PathBuf;
/// use mg_core::{ConversionTarget, TargetKind};
///
/// let target = ConversionTarget {
///     source: Utf8PathBuf::from("src/Widget.jsx"),
///     target: Utf8PathBuf::from("src/Widget.tsx"),
///     test_target: None,
///     kind: TargetKind::Component,
/// };
/// assert!(target.is_supported());
/// assert_eq!(target.write_path(), target.target.as_path());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversionTarget {
    /// The legacy file.
    pub source: Utf8PathBuf,
    /// The typed file the conversion produces.
    pub target: Utf8PathBuf,
    /// The typed test file, for test and spec sources.
    pub test_target: Option<Utf8PathBuf>,
    /// Kind of file produced.
    pub kind: TargetKind,
}

impl ConversionTarget {
    /// Returns `false` when resolution left the path unchanged (unmapped extension).
    #[inline]
    #[must_use]
    pub fn is_supported(&self) -> bool {
        self.source != self.target
    }

    /// Returns the path the converted text of `source` itself is written to.
    #[must_use]
    pub fn write_path(&self) -> &camino::Utf8Path {
        self.test_target.as_deref().unwrap_or(&self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_target() {
        let target = ConversionTarget {
            source: Utf8PathBuf::from("src/style.css"),
            target: Utf8PathBuf::from("src/style.css"),
            test_target: None,
            kind: TargetKind::Module,
        };
        assert!(!target.is_supported());
    }

    #[test]
    fn test_write_path_prefers_test_target() {
        let target = ConversionTarget {
            source: Utf8PathBuf::from("src/Chart.test.jsx"),
            target: Utf8PathBuf::from("src/Chart.tsx"),
            test_target: Some(Utf8PathBuf::from("src/Chart.test.tsx")),
            kind: TargetKind::Test,
        };
        assert_eq!(target.write_path().as_str(), "src/Chart.test.tsx");
    }

    #[test]
    fn test_target_kind_serialization() {
        assert_eq!(
            serde_json::to_string(&TargetKind::Component).unwrap(),
            r#""component""#
        );
        assert_eq!(TargetKind::Test.label(), "test");
    }
}

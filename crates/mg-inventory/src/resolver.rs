//! Legacy → typed target path resolution.
//!
//! [`TargetResolver`] is a pure mapping over a fixed extension table. A path
//! whose extension isn't in the table comes back unchanged; callers detect
//! "unsupported" by comparing input and output.

use camino::{Utf8Path, Utf8PathBuf};
use mg_core::paths::split_file_name;
use mg_core::{ConversionTarget, TargetKind};

/// One row of the extension table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtensionMapping {
    /// Legacy extension (lowercase, no dot).
    pub legacy: &'static str,
    /// Typed extension it converts to.
    pub target: &'static str,
    /// Kind of file produced for non-test sources.
    pub kind: TargetKind,
}

/// The legacy → typed extension table.
pub const EXTENSION_MAPPINGS: &[ExtensionMapping] = &[
    ExtensionMapping {
        legacy: "jsx",
        target: "tsx",
        kind: TargetKind::Component,
    },
    ExtensionMapping {
        legacy: "js",
        target: "ts",
        kind: TargetKind::Module,
    },
    ExtensionMapping {
        legacy: "mjs",
        target: "mts",
        kind: TargetKind::Module,
    },
    ExtensionMapping {
        legacy: "cjs",
        target: "cts",
        kind: TargetKind::Module,
    },
];

/// Extensions of files already in the typed format.
pub const TYPED_EXTENSIONS: &[&str] = &["ts", "tsx", "mts", "cts"];

/// Stem suffixes that mark a test or spec file.
const TEST_SUFFIXES: &[&str] = &[".test", ".spec"];

/// Maps legacy paths to typed target paths.
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use mg_inventory::TargetResolver;
///
/// let resolver = TargetResolver::new();
///
/// let (target, test) = resolver.resolve(Utf8Path::new("src/lib/math.js"));
/// assert_eq!(target.as_str(), "src/lib/math.ts");
/// assert!(test.is_none());
///
/// let (target, test) = resolver.resolve(Utf8Path::new("src/Chart.test.jsx"));
/// assert_eq!(target.as_str(), "src/Chart.tsx");
/// assert_eq!(test.unwrap().as_str(), "src/Chart.test.tsx");
///
/// // Unmapped extensions come back unchanged.
/// let (target, _) = resolver.resolve(Utf8Path::new("src/theme.css"));
/// assert_eq!(target.as_str(), "src/theme.css");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TargetResolver {
    mappings: &'static [ExtensionMapping],
}

impl Default for TargetResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl TargetResolver {
    /// Creates a resolver over [`EXTENSION_MAPPINGS`].
    #[must_use]
    pub const fn new() -> Self {
        Self {
            mappings: EXTENSION_MAPPINGS,
        }
    }

    /// Returns the mapping for a legacy extension (case-insensitive, no dot).
    #[must_use]
    pub fn mapping(&self, extension: &str) -> Option<&'static ExtensionMapping> {
        self.mappings
            .iter()
            .find(|m| m.legacy.eq_ignore_ascii_case(extension))
    }

    /// Returns `true` if `extension` is a legacy extension this resolver maps.
    #[must_use]
    pub fn is_legacy(&self, extension: &str) -> bool {
        self.mapping(extension).is_some()
    }

    /// Returns `true` if `extension` is already a typed extension.
    #[must_use]
    pub fn is_typed(extension: &str) -> bool {
        TYPED_EXTENSIONS
            .iter()
            .any(|typed| typed.eq_ignore_ascii_case(extension))
    }

    /// Resolves `path` to `(target, test_target)`.
    ///
    /// For test/spec files, `target` is the typed module under test and
    /// `test_target` the typed test file. For other mapped files,
    /// `test_target` is `None`. Unmapped paths return `(path, None)`.
    #[must_use]
    pub fn resolve(&self, path: &Utf8Path) -> (Utf8PathBuf, Option<Utf8PathBuf>) {
        let Some((mapping, stem)) = self.split(path) else {
            return (path.to_owned(), None);
        };

        match subject_stem(stem) {
            Some(subject) => (
                path.with_file_name(format!("{subject}.{}", mapping.target)),
                Some(path.with_file_name(format!("{stem}.{}", mapping.target))),
            ),
            None => (path.with_file_name(format!("{stem}.{}", mapping.target)), None),
        }
    }

    /// Resolves `path` into a full [`ConversionTarget`].
    #[must_use]
    pub fn resolve_target(&self, path: &Utf8Path) -> ConversionTarget {
        let (target, test_target) = self.resolve(path);
        let kind = match (&test_target, self.split(path)) {
            (Some(_), _) => TargetKind::Test,
            (None, Some((mapping, _))) => mapping.kind,
            (None, None) => TargetKind::Module,
        };
        ConversionTarget {
            source: path.to_owned(),
            target,
            test_target,
            kind,
        }
    }

    /// Returns where generated tests for a typed `target` go: `<stem>.test.<ext>`.
    ///
    /// # Examples
    ///
    /// ```
    /// use camino::Utf8Path;
    /// use mg_inventory::TargetResolver;
    ///
    /// let path = TargetResolver::companion_test_path(Utf8Path::new("src/Widget.tsx"));
    /// assert_eq!(path.as_str(), "src/Widget.test.tsx");
    /// ```
    #[must_use]
    pub fn companion_test_path(target: &Utf8Path) -> Utf8PathBuf {
        let file_name = target.file_name().unwrap_or(target.as_str());
        match split_file_name(file_name) {
            (stem, Some(ext)) => target.with_file_name(format!("{stem}.test.{ext}")),
            (stem, None) => target.with_file_name(format!("{stem}.test")),
        }
    }

    fn split<'p>(&self, path: &'p Utf8Path) -> Option<(&'static ExtensionMapping, &'p str)> {
        let (stem, extension) = split_file_name(path.file_name()?);
        Some((self.mapping(extension?)?, stem))
    }
}

/// Strips a trailing `.test`/`.spec` from `stem`, returning the subject name.
fn subject_stem(stem: &str) -> Option<&str> {
    let lower = stem.to_ascii_lowercase();
    TEST_SUFFIXES
        .iter()
        .find(|suffix| lower.ends_with(*suffix))
        .map(|suffix| &stem[..stem.len() - suffix.len()])
        .filter(|subject| !subject.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(path: &str) -> (String, Option<String>) {
        let (target, test) = TargetResolver::new().resolve(Utf8Path::new(path));
        (target.into_string(), test.map(Utf8PathBuf::into_string))
    }

    #[test]
    fn test_component_and_module_mappings() {
        assert_eq!(resolve("a/Button.jsx").0, "a/Button.tsx");
        assert_eq!(resolve("a/util.js").0, "a/util.ts");
        assert_eq!(resolve("a/esm.mjs").0, "a/esm.mts");
        assert_eq!(resolve("a/common.cjs").0, "a/common.cts");
    }

    #[test]
    fn test_extension_case_insensitive() {
        assert_eq!(resolve("a/Legacy.JS").0, "a/Legacy.ts");
    }

    #[test]
    fn test_spec_suffix() {
        assert_eq!(
            resolve("src/api.spec.js"),
            ("src/api.ts".to_owned(), Some("src/api.spec.ts".to_owned()))
        );
    }

    #[test]
    fn test_infix_not_at_end_is_not_a_test() {
        assert_eq!(resolve("src/api.test.helpers.js"), ("src/api.test.helpers.ts".to_owned(), None));
    }

    #[test]
    fn test_bare_test_stem_is_not_a_test() {
        // `.test.js` has no subject name.
        assert_eq!(resolve("src/.test.js").1, None);
    }

    #[test]
    fn test_unmapped_and_typed_paths_unchanged() {
        assert_eq!(resolve("src/App.tsx"), ("src/App.tsx".to_owned(), None));
        assert_eq!(resolve("src/README"), ("src/README".to_owned(), None));
    }

    #[test]
    fn test_resolve_target_kinds() {
        let resolver = TargetResolver::new();
        assert_eq!(
            resolver.resolve_target(Utf8Path::new("a/B.jsx")).kind,
            TargetKind::Component
        );
        assert_eq!(
            resolver.resolve_target(Utf8Path::new("a/b.js")).kind,
            TargetKind::Module
        );
        assert_eq!(
            resolver.resolve_target(Utf8Path::new("a/B.test.jsx")).kind,
            TargetKind::Test
        );
        assert!(!resolver.resolve_target(Utf8Path::new("a/b.css")).is_supported());
    }

    #[test]
    fn test_extension_classes() {
        let resolver = TargetResolver::new();
        assert!(resolver.is_legacy("jsx"));
        assert!(!resolver.is_legacy("tsx"));
        assert!(TargetResolver::is_typed("TSX"));
        assert!(!TargetResolver::is_typed("js"));
    }
}

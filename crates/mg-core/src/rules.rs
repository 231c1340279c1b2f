//! Ordered path rule tables.
//!
//! Path classification (is this a test file? which convention does it follow?)
//! is expressed as a table of [`PathRule`]s evaluated top to bottom, first
//! match wins. Each rule can be exercised on its own, and the table doubles as
//! documentation of the conventions the engine recognises.
//!
//! # Examples
//!
//! ```
//! use mg_core::{TEST_FILE_RULES, TestConvention};
//! use camino::Utf8Path;
//!
//! let rule = TEST_FILE_RULES.classify(Utf8Path::new("src/__tests__/App.js")).unwrap();
//! assert_eq!(rule.category, TestConvention::TestsDirectory);
//!
//! assert!(TEST_FILE_RULES.matches(Utf8Path::new("src/Chart.test.jsx")));
//! assert!(!TEST_FILE_RULES.matches(Utf8Path::new("src/Widget.jsx")));
//! ```

use camino::Utf8Path;

/// How a [`PathRule`] inspects a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathMatcher {
    /// A directory component equals the value (ASCII case-insensitive).
    Segment(&'static str),
    /// The file name contains the value (ASCII case-insensitive).
    FileNameContains(&'static str),
}

impl PathMatcher {
    /// Returns `true` if `path` satisfies this matcher.
    #[must_use]
    pub fn is_match(self, path: &Utf8Path) -> bool {
        match self {
            Self::Segment(segment) => path
                .parent()
                .is_some_and(|dir| dir.iter().any(|c| c.eq_ignore_ascii_case(segment))),
            Self::FileNameContains(needle) => path
                .file_name()
                .is_some_and(|name| name.to_ascii_lowercase().contains(needle)),
        }
    }
}

/// One row of a rule table: a named matcher and the category it assigns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathRule<C: 'static> {
    /// Stable rule name, used in logs and reports.
    pub name: &'static str,
    /// The test applied to the path.
    pub matcher: PathMatcher,
    /// The category assigned when the matcher fires.
    pub category: C,
}

/// An ordered, first-match-wins table of [`PathRule`]s.
#[derive(Debug, Clone, Copy)]
pub struct PathRuleTable<C: 'static> {
    rules: &'static [PathRule<C>],
}

impl<C: 'static> PathRuleTable<C> {
    /// Creates a table over a static rule slice.
    #[must_use]
    pub const fn new(rules: &'static [PathRule<C>]) -> Self {
        Self { rules }
    }

    /// Returns the first rule matching `path`, if any.
    #[must_use]
    pub fn classify(&self, path: &Utf8Path) -> Option<&'static PathRule<C>> {
        self.rules.iter().find(|rule| rule.matcher.is_match(path))
    }

    /// Returns `true` if any rule matches `path`.
    #[must_use]
    pub fn matches(&self, path: &Utf8Path) -> bool {
        self.classify(path).is_some()
    }

    /// Returns the rules in evaluation order.
    #[must_use]
    pub const fn rules(&self) -> &'static [PathRule<C>] {
        self.rules
    }
}

/// The test/spec naming convention a path follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TestConvention {
    /// Lives under a `__tests__` directory.
    TestsDirectory,
    /// Lives under a `test` directory.
    TestDirectory,
    /// File name carries a `.test.` infix.
    TestInfix,
    /// File name carries a `.spec.` infix.
    SpecInfix,
}

/// Test-file detection shared by the planner and the target resolver.
pub static TEST_FILE_RULES: PathRuleTable<TestConvention> = PathRuleTable::new(&[
    PathRule {
        name: "tests-directory",
        matcher: PathMatcher::Segment("__tests__"),
        category: TestConvention::TestsDirectory,
    },
    PathRule {
        name: "test-directory",
        matcher: PathMatcher::Segment("test"),
        category: TestConvention::TestDirectory,
    },
    PathRule {
        name: "test-infix",
        matcher: PathMatcher::FileNameContains(".test."),
        category: TestConvention::TestInfix,
    },
    PathRule {
        name: "spec-infix",
        matcher: PathMatcher::FileNameContains(".spec."),
        category: TestConvention::SpecInfix,
    },
]);

#[cfg(test)]
mod tests {
    use super::*;

    fn convention(path: &str) -> Option<TestConvention> {
        TEST_FILE_RULES
            .classify(Utf8Path::new(path))
            .map(|rule| rule.category)
    }

    #[test]
    fn test_tests_directory_rule() {
        assert_eq!(
            convention("src/components/__tests__/Button.jsx"),
            Some(TestConvention::TestsDirectory)
        );
    }

    #[test]
    fn test_test_directory_rule() {
        assert_eq!(convention("test/helpers.js"), Some(TestConvention::TestDirectory));
        assert_eq!(convention("src/Test/helpers.js"), Some(TestConvention::TestDirectory));
    }

    #[test]
    fn test_segment_rule_ignores_file_name() {
        // A file literally named `test` is not inside a test directory.
        assert_eq!(convention("src/test"), None);
        assert_eq!(convention("src/testing/helpers.js"), None);
    }

    #[test]
    fn test_infix_rules() {
        assert_eq!(convention("src/Chart.test.jsx"), Some(TestConvention::TestInfix));
        assert_eq!(convention("src/chart.SPEC.js"), Some(TestConvention::SpecInfix));
        assert_eq!(convention("src/contest.js"), None);
    }

    #[test]
    fn test_first_match_wins() {
        let rule = TEST_FILE_RULES
            .classify(Utf8Path::new("__tests__/Chart.spec.js"))
            .unwrap();
        assert_eq!(rule.name, "tests-directory");
    }

    #[test]
    fn test_rule_order_is_stable() {
        let names: Vec<_> = TEST_FILE_RULES.rules().iter().map(|r| r.name).collect();
        assert_eq!(
            names,
            vec!["tests-directory", "test-directory", "test-infix", "spec-infix"]
        );
    }
}

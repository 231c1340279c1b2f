//! Planning output.
//!
//! A [`PlanResult`] is the immutable product of one planning call: four
//! pairwise-disjoint, lexicographically sorted path lists plus the counts
//! derived from them.

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use super::target::ConversionTarget;

/// Counts derived from the lengths of the plan lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlanCounts {
    /// Entries classified into any list.
    pub total: usize,
    /// Typed files kept as-is.
    pub keep_typed: usize,
    /// Legacy files that already have a typed sibling.
    pub drop_already_converted: usize,
    /// Legacy files that need conversion.
    pub convert_candidates: usize,
    /// Legacy test/spec files left alone.
    pub tests_skipped: usize,
}

/// The categorized result of planning.
///
/// Construct through [`PlanResult::new`], which sorts, dedups, and counts.
///
/// # Examples
///
/// ```
/// use camino::Utf8PathBuf;
/// use mg_core::PlanResult;
///
/// let plan = PlanResult::new(
///     vec![Utf8PathBuf::from("src/App.tsx")],
///     vec![Utf8PathBuf::from("src/App.jsx"), Utf8PathBuf::from("src/App.js")],
///     vec![],
///     vec![],
///     vec![],
/// );
/// assert_eq!(plan.counts.total, 3);
/// assert_eq!(plan.drop_already_converted[0].as_str(), "src/App.js");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlanResult {
    /// Counts derived from the four lists.
    pub counts: PlanCounts,
    /// Typed files kept as-is.
    pub keep_typed: Vec<Utf8PathBuf>,
    /// Legacy files that already have a typed sibling.
    pub drop_already_converted: Vec<Utf8PathBuf>,
    /// Legacy files that need conversion.
    pub convert_candidates: Vec<Utf8PathBuf>,
    /// Legacy test/spec files left alone.
    pub tests_skipped: Vec<Utf8PathBuf>,
    /// Resolved targets for `convert_candidates`, in the same order.
    pub targets: Vec<ConversionTarget>,
}

impl PlanResult {
    /// Builds a plan from unsorted lists.
    #[must_use]
    pub fn new(
        keep_typed: Vec<Utf8PathBuf>,
        drop_already_converted: Vec<Utf8PathBuf>,
        convert_candidates: Vec<Utf8PathBuf>,
        tests_skipped: Vec<Utf8PathBuf>,
        mut targets: Vec<ConversionTarget>,
    ) -> Self {
        let keep_typed = sorted_unique(keep_typed);
        let drop_already_converted = sorted_unique(drop_already_converted);
        let convert_candidates = sorted_unique(convert_candidates);
        let tests_skipped = sorted_unique(tests_skipped);
        targets.sort_by(|a, b| a.source.cmp(&b.source));
        targets.dedup_by(|a, b| a.source == b.source);

        let counts = PlanCounts {
            total: keep_typed.len()
                + drop_already_converted.len()
                + convert_candidates.len()
                + tests_skipped.len(),
            keep_typed: keep_typed.len(),
            drop_already_converted: drop_already_converted.len(),
            convert_candidates: convert_candidates.len(),
            tests_skipped: tests_skipped.len(),
        };

        Self {
            counts,
            keep_typed,
            drop_already_converted,
            convert_candidates,
            tests_skipped,
            targets,
        }
    }
}

fn sorted_unique(mut paths: Vec<Utf8PathBuf>) -> Vec<Utf8PathBuf> {
    paths.sort_unstable();
    paths.dedup();
    paths
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_result_sorts_and_dedups() {
        let plan = PlanResult::new(
            vec![],
            vec![],
            vec![
                Utf8PathBuf::from("src/b.js"),
                Utf8PathBuf::from("src/a.js"),
                Utf8PathBuf::from("src/b.js"),
            ],
            vec![],
            vec![],
        );
        assert_eq!(
            plan.convert_candidates,
            vec![Utf8PathBuf::from("src/a.js"), Utf8PathBuf::from("src/b.js")]
        );
        assert_eq!(plan.counts.convert_candidates, 2);
        assert_eq!(plan.counts.total, 2);
    }

    #[test]
    fn test_plan_counts_serialize_with_names() {
        let json = serde_json::to_value(PlanCounts::default()).unwrap();
        for key in [
            "total",
            "keep_typed",
            "drop_already_converted",
            "convert_candidates",
            "tests_skipped",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
    }
}

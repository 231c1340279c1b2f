//! Dedup planning over parsed inventory entries.
//!
//! Planning runs in three passes:
//!
//! 1. **Filter** entries below the size floor or matching the exclude pattern.
//! 2. **Collapse** exact duplicates: entries sharing `(stem, extension, size,
//!    directory)` reduce to the one with the latest modification time (ties
//!    go to the lexicographically smaller path).
//! 3. **Classify** by `(directory, stem)` in same-directory mode or by stem
//!    alone otherwise. A group containing a typed file keeps its typed files
//!    and drops its legacy files; a group without one sends each legacy file
//!    to `tests_skipped` or `convert_candidates` depending on the test-file
//!    rule table.
//!
//! Every output list is sorted, so identical input always yields identical
//! output regardless of hash-map iteration order.

use std::cmp::Ordering;

use mg_core::{FileEntry, FxHashMap, PlanConfig, PlanResult, TEST_FILE_RULES, fx_hash_map};
use mg_inventory::TargetResolver;
use regex::Regex;
use tracing::{debug, info};

use crate::error::PlanError;

/// Key for exact-duplicate collapsing.
type CollapseKey<'e> = (&'e str, &'e str, u64, &'e str);

/// Key for classification groups: `(directory, stem)`, directory empty in cross-dir mode.
type GroupKey<'e> = (&'e str, &'e str);

/// Plans which legacy files to convert, drop, or skip.
///
/// # Examples
///
/// ```
/// use chrono::{DateTime, Utc};
/// use mg_core::FileEntry;
/// use mg_planner::DedupPlanner;
///
/// let entries = vec![
///     FileEntry::new("src/Chart.test.jsx", 10, DateTime::<Utc>::UNIX_EPOCH),
///     FileEntry::new("src/Chart.jsx", 10, DateTime::<Utc>::UNIX_EPOCH),
/// ];
/// let plan = DedupPlanner::new().plan(&entries, 0, None, true)?;
/// assert_eq!(plan.tests_skipped[0].as_str(), "src/Chart.test.jsx");
/// assert_eq!(plan.convert_candidates[0].as_str(), "src/Chart.jsx");
/// assert_eq!(plan.targets[0].target.as_str(), "src/Chart.tsx");
/// # Ok::<(), mg_planner::PlanError>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct DedupPlanner {
    resolver: TargetResolver,
}

impl DedupPlanner {
    /// Creates a planner using the default extension table.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            resolver: TargetResolver::new(),
        }
    }

    /// Plans using the settings from a [`PlanConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::InvalidPattern`] if the exclude pattern doesn't compile.
    pub fn plan_with_config(
        &self,
        entries: &[FileEntry],
        config: &PlanConfig,
    ) -> Result<PlanResult, PlanError> {
        self.plan(
            entries,
            config.size_min,
            config.exclude_pattern.as_deref(),
            config.same_dir_only,
        )
    }

    /// Filters, collapses, and classifies `entries`.
    ///
    /// # Arguments
    ///
    /// * `entries` - Parsed inventory entries, in any order
    /// * `size_min` - Entries smaller than this many bytes are ignored
    /// * `exclude_pattern` - Regex; entries whose path matches are ignored
    /// * `same_dir_only` - Only typed files in the same directory cover a legacy file
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::InvalidPattern`] if `exclude_pattern` doesn't compile.
    pub fn plan(
        &self,
        entries: &[FileEntry],
        size_min: u64,
        exclude_pattern: Option<&str>,
        same_dir_only: bool,
    ) -> Result<PlanResult, PlanError> {
        let exclude = exclude_pattern
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| PlanError::InvalidPattern {
                    pattern: pattern.to_owned(),
                    source,
                })
            })
            .transpose()?;

        let filtered: Vec<&FileEntry> = entries
            .iter()
            .filter(|entry| entry.size >= size_min)
            .filter(|entry| {
                exclude
                    .as_ref()
                    .is_none_or(|re| !re.is_match(entry.path.as_str()))
            })
            .collect();

        let survivors = collapse_duplicates(&filtered);
        let groups = self.classification_groups(&survivors, same_dir_only);

        let mut keep_typed = Vec::new();
        let mut drop_already_converted = Vec::new();
        let mut convert_candidates = Vec::new();
        let mut tests_skipped = Vec::new();
        let mut targets = Vec::new();

        for members in groups.into_values() {
            let (typed, legacy): (Vec<&FileEntry>, Vec<&FileEntry>) = members
                .into_iter()
                .partition(|entry| TargetResolver::is_typed(&entry.extension));

            if typed.is_empty() {
                for entry in legacy {
                    if let Some(rule) = TEST_FILE_RULES.classify(&entry.path) {
                        debug!(path = %entry.path, rule = rule.name, "Skipping test file");
                        tests_skipped.push(entry.path.clone());
                    } else {
                        targets.push(self.resolver.resolve_target(&entry.path));
                        convert_candidates.push(entry.path.clone());
                    }
                }
            } else {
                keep_typed.extend(typed.iter().map(|entry| entry.path.clone()));
                drop_already_converted.extend(legacy.iter().map(|entry| entry.path.clone()));
            }
        }

        let plan = PlanResult::new(
            keep_typed,
            drop_already_converted,
            convert_candidates,
            tests_skipped,
            targets,
        );

        info!(
            input = entries.len(),
            filtered = filtered.len(),
            survivors = survivors.len(),
            keep_typed = plan.counts.keep_typed,
            drop_already_converted = plan.counts.drop_already_converted,
            convert_candidates = plan.counts.convert_candidates,
            tests_skipped = plan.counts.tests_skipped,
            same_dir_only,
            "Planned migration"
        );
        Ok(plan)
    }

    /// Groups typed and legacy survivors by classification key.
    fn classification_groups<'e>(
        &self,
        survivors: &[&'e FileEntry],
        same_dir_only: bool,
    ) -> FxHashMap<GroupKey<'e>, Vec<&'e FileEntry>> {
        let mut groups: FxHashMap<GroupKey<'e>, Vec<&'e FileEntry>> = fx_hash_map();

        for &entry in survivors {
            let ext = entry.extension.as_str();
            if !TargetResolver::is_typed(ext) && !self.resolver.is_legacy(ext) {
                debug!(path = %entry.path, "Extension is neither typed nor legacy, not classified");
                continue;
            }
            let directory = if same_dir_only {
                entry.directory.as_str()
            } else {
                ""
            };
            groups
                .entry((directory, entry.stem.as_str()))
                .or_default()
                .push(entry);
        }

        groups
    }
}

/// Keeps the newest entry per `(stem, extension, size, directory)`.
fn collapse_duplicates<'e>(entries: &[&'e FileEntry]) -> Vec<&'e FileEntry> {
    let mut keepers: FxHashMap<CollapseKey<'e>, &'e FileEntry> = fx_hash_map();

    for &entry in entries {
        let key = (
            entry.stem.as_str(),
            entry.extension.as_str(),
            entry.size,
            entry.directory.as_str(),
        );
        keepers
            .entry(key)
            .and_modify(|current| {
                if newer(entry, current) == Ordering::Greater {
                    *current = entry;
                }
            })
            .or_insert(entry);
    }

    let mut survivors: Vec<&FileEntry> = keepers.into_values().collect();
    survivors.sort_by(|a, b| a.path.cmp(&b.path));
    survivors
}

/// Orders by modification time, then prefers the smaller path on ties.
fn newer(a: &FileEntry, b: &FileEntry) -> Ordering {
    a.modified
        .cmp(&b.modified)
        .then_with(|| b.path.cmp(&a.path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap()
    }

    fn entry(path: &str, size: u64, day: u32) -> FileEntry {
        FileEntry::new(path, size, at(day))
    }

    fn as_strs(paths: &[Utf8PathBuf]) -> Vec<&str> {
        paths.iter().map(|p| p.as_str()).collect()
    }

    #[test]
    fn test_cross_dir_typed_sibling_drops_all_legacy() {
        let entries = vec![
            entry("src/App.js", 10, 1),
            entry("src/App.jsx", 12, 1),
            entry("src/App.tsx", 14, 1),
        ];
        let plan = DedupPlanner::new().plan(&entries, 0, None, false).unwrap();
        assert_eq!(as_strs(&plan.keep_typed), vec!["src/App.tsx"]);
        assert_eq!(
            as_strs(&plan.drop_already_converted),
            vec!["src/App.js", "src/App.jsx"]
        );
        assert!(plan.convert_candidates.is_empty());
    }

    #[test]
    fn test_cross_dir_covers_other_directories() {
        let entries = vec![entry("old/Button.jsx", 10, 1), entry("new/Button.tsx", 10, 1)];
        let plan = DedupPlanner::new().plan(&entries, 0, None, false).unwrap();
        assert_eq!(as_strs(&plan.drop_already_converted), vec!["old/Button.jsx"]);
    }

    #[test]
    fn test_same_dir_only_requires_same_directory() {
        let entries = vec![
            entry("old/Button.jsx", 10, 1),
            entry("new/Button.tsx", 10, 1),
            entry("new/Button.js", 10, 1),
        ];
        let plan = DedupPlanner::new().plan(&entries, 0, None, true).unwrap();
        assert_eq!(as_strs(&plan.keep_typed), vec!["new/Button.tsx"]);
        assert_eq!(as_strs(&plan.drop_already_converted), vec!["new/Button.js"]);
        assert_eq!(as_strs(&plan.convert_candidates), vec!["old/Button.jsx"]);
    }

    #[test]
    fn test_widget_without_typed_sibling_is_candidate() {
        let entries = vec![entry("src/Widget.jsx", 10, 1)];
        let plan = DedupPlanner::new().plan(&entries, 0, None, false).unwrap();
        assert_eq!(as_strs(&plan.convert_candidates), vec!["src/Widget.jsx"]);
        assert_eq!(plan.targets.len(), 1);
        assert_eq!(plan.targets[0].target.as_str(), "src/Widget.tsx");
    }

    #[test]
    fn test_test_files_skipped() {
        let entries = vec![
            entry("src/Chart.test.jsx", 10, 1),
            entry("src/__tests__/Table.js", 10, 1),
            entry("test/setup.js", 10, 1),
            entry("src/Form.spec.js", 10, 1),
        ];
        let plan = DedupPlanner::new().plan(&entries, 0, None, false).unwrap();
        assert_eq!(plan.tests_skipped.len(), 4);
        assert!(plan.convert_candidates.is_empty());
        assert!(plan.targets.is_empty());
    }

    #[test]
    fn test_typed_test_covers_legacy_test() {
        let entries = vec![entry("src/Chart.test.jsx", 10, 1), entry("src/Chart.test.tsx", 10, 1)];
        let plan = DedupPlanner::new().plan(&entries, 0, None, false).unwrap();
        assert_eq!(as_strs(&plan.drop_already_converted), vec!["src/Chart.test.jsx"]);
        assert!(plan.tests_skipped.is_empty());
    }

    #[test]
    fn test_size_min_and_exclude_filters() {
        let entries = vec![
            entry("src/tiny.js", 2, 1),
            entry("node_modules/react/index.js", 500, 1),
            entry("src/real.js", 500, 1),
        ];
        let plan = DedupPlanner::new()
            .plan(&entries, 10, Some("(^|/)node_modules/"), false)
            .unwrap();
        assert_eq!(as_strs(&plan.convert_candidates), vec!["src/real.js"]);
        assert_eq!(plan.counts.total, 1);
    }

    #[test]
    fn test_invalid_exclude_pattern_is_error() {
        let entries = vec![entry("src/a.js", 1, 1)];
        let err = DedupPlanner::new()
            .plan(&entries, 0, Some("(unclosed"), false)
            .unwrap_err();
        assert!(matches!(err, PlanError::InvalidPattern { .. }));
    }

    #[test]
    fn test_collapse_keeps_newest() {
        let old = entry("src/a.js", 10, 1);
        let new = entry("src/a.js", 10, 5);
        let survivors = collapse_duplicates(&[&old, &new]);
        assert_eq!(survivors.len(), 1);
        assert_eq!(survivors[0].modified, at(5));
    }

    #[test]
    fn test_collapse_tie_is_order_independent() {
        let upper = entry("src/a.JS", 10, 1);
        let lower = entry("src/a.js", 10, 1);
        let forward = collapse_duplicates(&[&upper, &lower]);
        let backward = collapse_duplicates(&[&lower, &upper]);
        assert_eq!(forward[0].path, backward[0].path);
        assert_eq!(forward[0].path.as_str(), "src/a.JS");
    }

    #[test]
    fn test_collapse_distinguishes_size() {
        let a = entry("src/a.js", 10, 1);
        let b = entry("src/a.js", 11, 1);
        assert_eq!(collapse_duplicates(&[&a, &b]).len(), 2);
    }

    #[test]
    fn test_unclassified_extension_ignored() {
        let entries = vec![entry("src/a.vue", 10, 1), entry("src/b.js", 10, 1)];
        let plan = DedupPlanner::new().plan(&entries, 0, None, false).unwrap();
        assert_eq!(plan.counts.total, 1);
    }

    #[test]
    fn test_plan_with_config() {
        let entries = vec![entry("dist/bundle.js", 10, 1), entry("src/a.js", 10, 1)];
        let plan = DedupPlanner::new()
            .plan_with_config(&entries, &PlanConfig::default())
            .unwrap();
        assert_eq!(as_strs(&plan.convert_candidates), vec!["src/a.js"]);
    }
}

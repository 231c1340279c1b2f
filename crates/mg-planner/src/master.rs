//! Precedence-based reconciliation of multi-root inventories.
//!
//! Rows from different scan roots collide when their [`IdentityKey`]s are
//! equal. The row whose root appears earliest in the precedence list wins;
//! roots missing from the list rank after every listed root, and input order
//! settles any remaining tie. The sort is stable and keyed only on
//! `(rank, input index)`, so output never depends on hash-map iteration order.

use camino::{Utf8Path, Utf8PathBuf};
use mg_core::paths::{normalize_separators, root_key};
use mg_core::{
    DedupOutcome, DedupSummary, DiscardedRow, FxHashMap, IdentityKey, MasterDedupRow, fx_hash_map,
};
use tracing::{debug, info, warn};

use crate::error::PlanError;

/// Reconciles master-inventory rows against a root precedence list.
///
/// # Examples
///
/// ```
/// use mg_core::MasterDedupRow;
/// use mg_planner::MasterDeduplicator;
///
/// let dedup = MasterDeduplicator::new(vec!["A".to_owned(), "B".to_owned()])?;
/// let outcome = dedup.reconcile(vec![
///     MasterDedupRow::new("B", "/b/src/app.js", "src/app.js", 10, ""),
///     MasterDedupRow::new("A", "/a/src/App.js", "src/App.js", 10, ""),
/// ]);
/// assert_eq!(outcome.kept[0].root, "A");
/// assert_eq!(outcome.discarded[0].kept_abs_path.as_str(), "/a/src/App.js");
/// # Ok::<(), mg_planner::PlanError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct MasterDeduplicator {
    precedence: Vec<String>,
    ranks: FxHashMap<String, usize>,
}

impl MasterDeduplicator {
    /// Creates a deduplicator for `precedence`, highest priority first.
    ///
    /// Roots are compared with trailing separators removed, so `/mnt/a/`
    /// and `/mnt/a` name the same root.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::DuplicatePrecedenceRoot`] if a root is listed twice.
    pub fn new(precedence: Vec<String>) -> Result<Self, PlanError> {
        let mut ranks = fx_hash_map();
        for (rank, root) in precedence.iter().enumerate() {
            if ranks.insert(root_key(root).to_owned(), rank).is_some() {
                return Err(PlanError::DuplicatePrecedenceRoot(root.clone()));
            }
        }
        Ok(Self { precedence, ranks })
    }

    /// Returns the rank of `root`; unknown roots rank after every listed root.
    fn rank(&self, root: &str) -> usize {
        self.ranks
            .get(root_key(root))
            .copied()
            .unwrap_or(self.precedence.len())
    }

    /// Splits `rows` into one keeper per identity key and the rows it displaced.
    ///
    /// Kept rows come out in winning order (rank, then input order);
    /// discarded rows in the order they lost.
    #[must_use]
    pub fn reconcile(&self, rows: Vec<MasterDedupRow>) -> DedupOutcome {
        let total = rows.len();

        let mut ranked: Vec<(usize, usize, MasterDedupRow)> = rows
            .into_iter()
            .enumerate()
            .map(|(index, row)| (self.rank(&row.root), index, row))
            .collect();
        ranked.sort_by_key(|(rank, index, _)| (*rank, *index));

        let mut keepers: FxHashMap<IdentityKey, Utf8PathBuf> = fx_hash_map();
        let mut kept = Vec::new();
        let mut discarded = Vec::new();

        for (_, _, row) in ranked {
            let key = row.identity_key();
            if let Some(kept_abs_path) = keepers.get(&key) {
                debug!(
                    root = %row.root,
                    abs_path = %row.abs_path,
                    kept = %kept_abs_path,
                    "Discarding duplicate row"
                );
                discarded.push(DiscardedRow {
                    kept_abs_path: kept_abs_path.clone(),
                    row,
                });
            } else {
                keepers.insert(key, row.abs_path.clone());
                kept.push(row);
            }
        }

        let summary = DedupSummary {
            total,
            kept: kept.len(),
            discarded: discarded.len(),
            precedence: self.precedence.clone(),
        };
        info!(
            total = summary.total,
            kept = summary.kept,
            discarded = summary.discarded,
            "Reconciled master inventory"
        );

        DedupOutcome {
            kept,
            discarded,
            summary,
        }
    }
}

/// A kept row that could not be copied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterializeFailure {
    /// Source path of the row.
    pub abs_path: Utf8PathBuf,
    /// Intended destination, if one could be computed.
    pub destination: Option<Utf8PathBuf>,
    /// What went wrong.
    pub reason: String,
}

/// Result of copying kept rows into a destination tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterializeReport {
    /// Destination paths written, in input order.
    pub copied: Vec<Utf8PathBuf>,
    /// Rows that failed; the batch continued past each one.
    pub failures: Vec<MaterializeFailure>,
}

impl MaterializeReport {
    /// Returns `true` when every row was copied.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Copies each kept row to `dest/<rel_path>`.
///
/// Rows are copied in input order. Filesystem errors are recorded per row and
/// logged; they never abort the batch. Relative paths containing `..` are
/// refused. An existing destination file is never replaced: the row is
/// recorded as a failure, so with kept rows in winning order the
/// higher-precedence copy of a shared `rel_path` stays in place.
pub fn materialize(kept: &[MasterDedupRow], dest: &Utf8Path) -> MaterializeReport {
    let mut report = MaterializeReport::default();
    for row in kept {
        match materialize_row(row, dest) {
            Ok(destination) => report.copied.push(destination),
            Err(failure) => report.failures.push(failure),
        }
    }

    info!(
        copied = report.copied.len(),
        failed = report.failures.len(),
        dest = %dest,
        "Materialized kept rows"
    );
    report
}

fn materialize_row(
    row: &MasterDedupRow,
    dest: &Utf8Path,
) -> Result<Utf8PathBuf, MaterializeFailure> {
    let rel_path = clean_rel_path(&row.rel_path);
    if rel_path.is_empty() || rel_path.split('/').any(|segment| segment == "..") {
        warn!(rel_path = %row.rel_path, "Refusing to materialize path outside destination");
        return Err(MaterializeFailure {
            abs_path: row.abs_path.clone(),
            destination: None,
            reason: format!("relative path '{}' escapes destination", row.rel_path),
        });
    }

    let destination = dest.join(&rel_path);
    match copy_row(&row.abs_path, &destination) {
        Ok(()) => Ok(destination),
        Err(e) => {
            warn!(
                from = %row.abs_path,
                to = %destination,
                error = %e,
                "Failed to materialize row"
            );
            Err(MaterializeFailure {
                abs_path: row.abs_path.clone(),
                destination: Some(destination),
                reason: e.to_string(),
            })
        }
    }
}

/// Normalises separators and drops empty and `.` segments, keeping case.
fn clean_rel_path(rel_path: &str) -> String {
    normalize_separators(rel_path)
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

fn copy_row(from: &Utf8Path, to: &Utf8Path) -> std::io::Result<()> {
    let mut source = std::fs::File::open(from)?;
    if let Some(parent) = to.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut target = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(to)?;
    std::io::copy(&mut source, &mut target).map(|_| ())
}

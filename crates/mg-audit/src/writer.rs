//! Report rendering and writing.
//!
//! Each `render_*` function is pure and returns the report text. The
//! [`AuditWriter`] methods render and then create the file under the report
//! directory using [`reserve_output_path`], so an existing report is never
//! overwritten: a second report in the same directory lands at
//! `<stem>.<run_id>.<ext>`.

use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::io::Write as _;

use camino::{Utf8Path, Utf8PathBuf};
use mg_core::paths::reserve_output_path;
use mg_core::{
    ConversionTarget, DedupOutcome, DedupSummary, DiscardedRow, MasterDedupRow, PlanCounts,
    PlanResult, ValidationResult,
};
use serde::Serialize;
use tracing::info;

use crate::error::AuditError;

/// Plan report file name.
pub const PLAN_JSON: &str = "plan.json";
/// Conversion candidates file name.
pub const CANDIDATES_CSV: &str = "convert_candidates.csv";
/// Kept rows file name.
pub const KEPT_CSV: &str = "kept.csv";
/// Discarded rows file name.
pub const DISCARDED_CSV: &str = "discarded.csv";
/// Dedup summary file name.
pub const DEDUP_SUMMARY_MD: &str = "dedup_summary.md";
/// Validation results file name (JSON).
pub const VALIDATION_JSON: &str = "validation.json";
/// Validation results file name (CSV).
pub const VALIDATION_CSV: &str = "validation.csv";

/// Columns of the discarded-rows CSV.
pub const DISCARDED_COLUMNS: [&str; 8] = [
    "root",
    "abs_path",
    "rel_path",
    "base_name",
    "ext",
    "size",
    "mtime",
    "kept_abs_path",
];

/// The plan as written to `plan.json`: counts plus the four lists.
#[derive(Debug, Serialize)]
struct PlanRecord<'a> {
    counts: &'a PlanCounts,
    keep_typed: &'a [Utf8PathBuf],
    drop_already_converted: &'a [Utf8PathBuf],
    convert_candidates: &'a [Utf8PathBuf],
    tests_skipped: &'a [Utf8PathBuf],
}

#[derive(Debug, Serialize)]
struct CandidateRow<'a> {
    source: &'a str,
    target: &'a str,
    test_target: &'a str,
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct ValidationRow<'a> {
    filepath: &'a str,
    stage: &'a str,
    status: &'static str,
    reasons: String,
    quarantined: bool,
    quarantine_path: &'a str,
}

/// Renders `plan.json`.
///
/// # Errors
///
/// Returns [`AuditError::Json`] if serialization fails.
pub fn render_plan_json(plan: &PlanResult) -> Result<String, AuditError> {
    let record = PlanRecord {
        counts: &plan.counts,
        keep_typed: &plan.keep_typed,
        drop_already_converted: &plan.drop_already_converted,
        convert_candidates: &plan.convert_candidates,
        tests_skipped: &plan.tests_skipped,
    };
    let mut json = serde_json::to_string_pretty(&record)?;
    json.push('\n');
    Ok(json)
}

/// Renders the candidates CSV: `source,target,test_target,kind`.
///
/// # Errors
///
/// Returns [`AuditError::Csv`] if serialization fails.
pub fn render_candidates_csv(targets: &[ConversionTarget]) -> Result<String, AuditError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for target in targets {
        writer.serialize(CandidateRow {
            source: target.source.as_str(),
            target: target.target.as_str(),
            test_target: target.test_target.as_ref().map_or("", |path| path.as_str()),
            kind: target.kind.label(),
        })?;
    }
    if targets.is_empty() {
        writer.write_record(["source", "target", "test_target", "kind"])?;
    }
    finish(writer)
}

/// Renders the kept-rows CSV with the master inventory columns.
///
/// # Errors
///
/// Returns [`AuditError::Csv`] if serialization fails.
pub fn render_kept_csv(rows: &[MasterDedupRow]) -> Result<String, AuditError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&DISCARDED_COLUMNS[..7])?;
    for row in rows {
        writer.write_record(master_fields(row))?;
    }
    finish(writer)
}

/// Renders the discarded-rows CSV, which adds a `kept_abs_path` column.
///
/// # Errors
///
/// Returns [`AuditError::Csv`] if serialization fails.
pub fn render_discarded_csv(rows: &[DiscardedRow]) -> Result<String, AuditError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(DISCARDED_COLUMNS)?;
    for discarded in rows {
        let mut fields = master_fields(&discarded.row).to_vec();
        fields.push(discarded.kept_abs_path.to_string());
        writer.write_record(&fields)?;
    }
    finish(writer)
}

/// Renders the dedup summary as Markdown.
#[must_use]
pub fn render_dedup_summary(summary: &DedupSummary) -> String {
    let mut md = String::from("# Dedup summary\n\n");
    md.push_str("| Metric | Count |\n|--------|-------|\n");
    let _ = writeln!(md, "| Total rows | {} |", summary.total);
    let _ = writeln!(md, "| Kept | {} |", summary.kept);
    let _ = writeln!(md, "| Discarded | {} |", summary.discarded);

    md.push_str("\n## Precedence\n\n");
    if summary.precedence.is_empty() {
        md.push_str("No precedence list was given; input order decided every collision.\n");
    } else {
        for (rank, root) in summary.precedence.iter().enumerate() {
            let _ = writeln!(md, "{}. `{root}`", rank + 1);
        }
        md.push_str("\nRoots not listed rank after every listed root, in input order.\n");
    }
    md
}

/// Renders validation results as JSON.
///
/// # Errors
///
/// Returns [`AuditError::Json`] if serialization fails.
pub fn render_validation_json(results: &[ValidationResult]) -> Result<String, AuditError> {
    let mut json = serde_json::to_string_pretty(results)?;
    json.push('\n');
    Ok(json)
}

/// Renders validation results as CSV, reasons joined with `; `.
///
/// # Errors
///
/// Returns [`AuditError::Csv`] if serialization fails.
pub fn render_validation_csv(results: &[ValidationResult]) -> Result<String, AuditError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for result in results {
        writer.serialize(ValidationRow {
            filepath: result.filepath.as_str(),
            stage: result.stage.as_deref().unwrap_or(""),
            status: result.status.label(),
            reasons: result.reasons.join("; "),
            quarantined: result.quarantined,
            quarantine_path: result.quarantine_path.as_ref().map_or("", |path| path.as_str()),
        })?;
    }
    if results.is_empty() {
        writer.write_record([
            "filepath",
            "stage",
            "status",
            "reasons",
            "quarantined",
            "quarantine_path",
        ])?;
    }
    finish(writer)
}

fn master_fields(row: &MasterDedupRow) -> [String; 7] {
    [
        row.root.clone(),
        row.abs_path.to_string(),
        row.rel_path.clone(),
        row.base_name.clone(),
        row.ext.clone(),
        row.size.to_string(),
        row.mtime.clone(),
    ]
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String, AuditError> {
    let bytes = writer
        .into_inner()
        .map_err(|e| AuditError::Csv(csv::Error::from(e.into_error())))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Paths written by [`AuditWriter::write_plan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanReports {
    /// `plan.json`.
    pub plan: Utf8PathBuf,
    /// `convert_candidates.csv`.
    pub candidates: Utf8PathBuf,
}

/// Paths written by [`AuditWriter::write_dedup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DedupReports {
    /// `kept.csv`.
    pub kept: Utf8PathBuf,
    /// `discarded.csv`.
    pub discarded: Utf8PathBuf,
    /// `dedup_summary.md`.
    pub summary: Utf8PathBuf,
}

/// Paths written by [`AuditWriter::write_validation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReports {
    /// `validation.json`.
    pub json: Utf8PathBuf,
    /// `validation.csv`.
    pub csv: Utf8PathBuf,
}

/// Writes reports into one directory, stamping collisions with a run id.
///
/// # Examples
///
/// ```no_run
/// use mg_audit::AuditWriter;
/// use mg_core::PlanResult;
///
/// let writer = AuditWriter::new("reports", "20260101-093000");
/// let paths = writer.write_plan(&PlanResult::default())?;
/// println!("{}", paths.plan);
/// # Ok::<(), mg_audit::AuditError>(())
/// ```
#[derive(Debug, Clone)]
pub struct AuditWriter {
    dir: Utf8PathBuf,
    run_id: String,
}

impl AuditWriter {
    /// Creates a writer for `dir`.
    pub fn new(dir: impl Into<Utf8PathBuf>, run_id: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            run_id: run_id.into(),
        }
    }

    /// The report directory.
    #[must_use]
    pub fn dir(&self) -> &Utf8Path {
        &self.dir
    }

    /// Writes `plan.json` and `convert_candidates.csv`.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering or writing fails.
    pub fn write_plan(&self, plan: &PlanResult) -> Result<PlanReports, AuditError> {
        let reports = PlanReports {
            plan: self.write(PLAN_JSON, &render_plan_json(plan)?)?,
            candidates: self.write(CANDIDATES_CSV, &render_candidates_csv(&plan.targets)?)?,
        };
        info!(plan = %reports.plan, candidates = %reports.candidates, "Wrote plan reports");
        Ok(reports)
    }

    /// Writes `kept.csv`, `discarded.csv` and `dedup_summary.md`.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering or writing fails.
    pub fn write_dedup(&self, outcome: &DedupOutcome) -> Result<DedupReports, AuditError> {
        let reports = DedupReports {
            kept: self.write(KEPT_CSV, &render_kept_csv(&outcome.kept)?)?,
            discarded: self.write(DISCARDED_CSV, &render_discarded_csv(&outcome.discarded)?)?,
            summary: self.write(DEDUP_SUMMARY_MD, &render_dedup_summary(&outcome.summary))?,
        };
        info!(summary = %reports.summary, "Wrote dedup reports");
        Ok(reports)
    }

    /// Writes `validation.json` and `validation.csv`.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering or writing fails.
    pub fn write_validation(
        &self,
        results: &[ValidationResult],
    ) -> Result<ValidationReports, AuditError> {
        let reports = ValidationReports {
            json: self.write(VALIDATION_JSON, &render_validation_json(results)?)?,
            csv: self.write(VALIDATION_CSV, &render_validation_csv(results)?)?,
        };
        info!(json = %reports.json, results = results.len(), "Wrote validation reports");
        Ok(reports)
    }

    /// Creates a fresh file for `file_name` and writes `contents`.
    fn write(&self, file_name: &str, contents: &str) -> Result<Utf8PathBuf, AuditError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| AuditError::io(&self.dir, e))?;
        let path = reserve_output_path(&self.dir, file_name, &self.run_id);
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| AuditError::io(&path, e))?;
        file.write_all(contents.as_bytes())
            .map_err(|e| AuditError::io(&path, e))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mg_core::{TargetKind, ValidationStatus};
    use smallvec::smallvec;
    use tempfile::TempDir;

    fn row(root: &str, abs: &str, rel: &str) -> MasterDedupRow {
        MasterDedupRow::new(root, abs, rel, 12, "1700000000")
    }

    fn outcome() -> DedupOutcome {
        let kept = row("/mnt/a", "/mnt/a/src/App.js", "src/App.js");
        let lost = row("/mnt/b", "/mnt/b/src/app.js", "src/app.js");
        DedupOutcome {
            discarded: vec![DiscardedRow {
                row: lost,
                kept_abs_path: kept.abs_path.clone(),
            }],
            kept: vec![kept],
            summary: DedupSummary {
                total: 2,
                kept: 1,
                discarded: 1,
                precedence: vec!["/mnt/a".to_owned(), "/mnt/b".to_owned()],
            },
        }
    }

    fn plan() -> PlanResult {
        PlanResult::new(
            vec![Utf8PathBuf::from("src/App.tsx")],
            vec![Utf8PathBuf::from("src/App.js")],
            vec![Utf8PathBuf::from("src/Widget.jsx")],
            vec![Utf8PathBuf::from("src/Chart.test.jsx")],
            vec![ConversionTarget {
                source: Utf8PathBuf::from("src/Widget.jsx"),
                target: Utf8PathBuf::from("src/Widget.tsx"),
                test_target: None,
                kind: TargetKind::Component,
            }],
        )
    }

    #[test]
    fn test_plan_json_shape() {
        let json: serde_json::Value = serde_json::from_str(&render_plan_json(&plan()).unwrap()).unwrap();
        assert_eq!(json["counts"]["total"], 4);
        assert_eq!(json["counts"]["convert_candidates"], 1);
        assert_eq!(json["keep_typed"][0], "src/App.tsx");
        assert_eq!(json["tests_skipped"][0], "src/Chart.test.jsx");
        assert!(json.get("targets").is_none());
    }

    #[test]
    fn test_candidates_csv() {
        let csv = render_candidates_csv(&plan().targets).unwrap();
        assert_eq!(
            csv,
            "source,target,test_target,kind\nsrc/Widget.jsx,src/Widget.tsx,,component\n"
        );
        assert_eq!(
            render_candidates_csv(&[]).unwrap(),
            "source,target,test_target,kind\n"
        );
    }

    #[test]
    fn test_kept_and_discarded_csv() {
        let outcome = outcome();
        assert_eq!(
            render_kept_csv(&outcome.kept).unwrap(),
            "root,abs_path,rel_path,base_name,ext,size,mtime\n\
             /mnt/a,/mnt/a/src/App.js,src/App.js,App.js,.js,12,1700000000\n"
        );
        assert_eq!(
            render_discarded_csv(&outcome.discarded).unwrap(),
            "root,abs_path,rel_path,base_name,ext,size,mtime,kept_abs_path\n\
             /mnt/b,/mnt/b/src/app.js,src/app.js,app.js,.js,12,1700000000,/mnt/a/src/App.js\n"
        );
    }

    #[test]
    fn test_dedup_summary_markdown() {
        insta::assert_snapshot!(render_dedup_summary(&outcome().summary), @r"
# Dedup summary

| Metric | Count |
|--------|-------|
| Total rows | 2 |
| Kept | 1 |
| Discarded | 1 |

## Precedence

1. `/mnt/a`
2. `/mnt/b`

Roots not listed rank after every listed root, in input order.
");
    }

    #[test]
    fn test_validation_csv_joins_reasons() {
        let result = ValidationResult {
            filepath: Utf8PathBuf::from("reports/r1/staged/src/Junk.ts"),
            stage: Some("review".to_owned()),
            status: ValidationStatus::Fail,
            reasons: smallvec!["missing-headers: Model".to_owned(), "junk: a, b".to_owned()],
            quarantined: true,
            quarantine_path: Some(Utf8PathBuf::from("reports/quarantine/Junk.ts")),
        };
        let csv = render_validation_csv(&[result]).unwrap();
        assert_eq!(
            csv,
            "filepath,stage,status,reasons,quarantined,quarantine_path\n\
             reports/r1/staged/src/Junk.ts,review,FAIL,\"missing-headers: Model; junk: a, b\",true,reports/quarantine/Junk.ts\n"
        );
    }

    #[test]
    fn test_writer_never_overwrites() {
        let tmp = TempDir::new().unwrap();
        let dir = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).unwrap();
        let writer = AuditWriter::new(&dir, "20260101-093000");

        let first = writer.write_plan(&plan()).unwrap();
        let second = writer.write_plan(&plan()).unwrap();
        let third = writer.write_plan(&plan()).unwrap();

        assert_eq!(first.plan, dir.join("plan.json"));
        assert_eq!(second.plan, dir.join("plan.20260101-093000.json"));
        assert_eq!(third.plan, dir.join("plan.20260101-093000.1.json"));
        assert_eq!(
            second.candidates,
            dir.join("convert_candidates.20260101-093000.csv")
        );
    }

    #[test]
    fn test_write_dedup_and_validation() {
        let tmp = TempDir::new().unwrap();
        let dir = Utf8PathBuf::from_path_buf(tmp.path().join("nested")).unwrap();
        let writer = AuditWriter::new(&dir, "r1");

        let dedup = writer.write_dedup(&outcome()).unwrap();
        assert!(std::fs::read_to_string(&dedup.summary).unwrap().contains("| Kept | 1 |"));
        assert!(dedup.discarded.exists());

        let validation = writer.write_validation(&[]).unwrap();
        assert_eq!(std::fs::read_to_string(&validation.json).unwrap(), "[]\n");
    }
}

//! Audit reports for mg-migration.
//!
//! Every planning, reconciliation and validation result can be written as a
//! machine-readable report (JSON or CSV) and, for reconciliation, a short
//! Markdown summary. Writers never replace an existing report.
//!
//! | Report | Written by |
//! |--------|------------|
//! | `plan.json`, `convert_candidates.csv` | [`AuditWriter::write_plan`] |
//! | `kept.csv`, `discarded.csv`, `dedup_summary.md` | [`AuditWriter::write_dedup`] |
//! | `validation.json`, `validation.csv` | [`AuditWriter::write_validation`] |

#![deny(clippy::all)]
#![warn(missing_docs)]

mod error;
mod writer;

pub use error::AuditError;
pub use writer::{
    AuditWriter, CANDIDATES_CSV, DEDUP_SUMMARY_MD, DISCARDED_COLUMNS, DISCARDED_CSV, DedupReports,
    KEPT_CSV, PLAN_JSON, PlanReports, VALIDATION_CSV, VALIDATION_JSON, ValidationReports,
    render_candidates_csv, render_dedup_summary, render_discarded_csv, render_kept_csv,
    render_plan_json, render_validation_csv, render_validation_json,
};

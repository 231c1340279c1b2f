//! The migration driver.
//!
//! The orchestrator only keeps bookkeeping; the driver does the external
//! work each stage stands for and records it as notes on the stage artifact:
//!
//! - `generate` converts each supported candidate into a staged artifact
//!   under `<run_dir>/staged/`, stamped with a header block
//! - `qa` runs the configured check commands
//! - `review` validates every staged artifact, quarantining hard failures
//! - `evaluate` tallies the results
//! - `persist` writes usable conversions to their targets (never in dry-run
//!   mode, never over an existing file) and hands the written paths to the
//!   change submitter
//!
//! Stage names outside that set only produce their bookkeeping artifact.
//! Nothing here aborts a run: conversion, tool and validation failures all
//! become data on the [`DriverReport`].

use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use chrono::{SecondsFormat, Utc};
use mg_core::{
    CommandSpec, Config, ConversionTarget, PlanResult, ValidationResult, ValidationStatus,
};
use mg_inventory::TargetResolver;
use mg_validate::ArtifactValidator;
use tracing::{debug, info, warn};

use crate::converter::{Conversion, Converter};
use crate::error::PipelineError;
use crate::orchestrator::{PipelineOrchestrator, write_new};
use crate::tools::{ToolReport, ToolRunner};
use crate::vcs::{ChangeSubmitter, Submission};

/// Stage label written into staged artifacts and expected when validating them.
pub const STAGED_ARTIFACT_STAGE: &str = "review";

/// Directory under the run directory holding staged conversions.
pub const STAGED_DIR: &str = "staged";

/// What happened to one conversion candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionStatus {
    /// Converted and staged.
    Staged {
        /// The staged code artifact.
        code: Utf8PathBuf,
        /// The staged test artifact, if the converter produced tests.
        test: Option<Utf8PathBuf>,
    },
    /// No extension mapping exists, so there is nothing to convert to.
    Unsupported,
    /// The source could not be read or the converter failed.
    Failed {
        /// Why.
        reason: String,
    },
}

/// One candidate's record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRecord {
    /// Where the conversion goes.
    pub target: ConversionTarget,
    /// What happened.
    pub status: ConversionStatus,
}

/// Everything a run did.
#[derive(Debug, Clone, Default)]
pub struct DriverReport {
    /// Run identifier.
    pub run_id: String,
    /// Stage artifacts written, in stage order.
    pub stage_artifacts: Vec<Utf8PathBuf>,
    /// Stages whose bookkeeping artifact could not be written.
    pub stage_errors: Vec<String>,
    /// One record per plan target.
    pub conversions: Vec<ConversionRecord>,
    /// Check command results.
    pub tool_reports: Vec<ToolReport>,
    /// Validation results for staged artifacts.
    pub validations: Vec<ValidationResult>,
    /// Files written into the source tree.
    pub persisted: Vec<Utf8PathBuf>,
    /// Outcome of handing persisted files to the submitter.
    pub submission: Option<Submission>,
}

impl DriverReport {
    /// Number of candidates that were staged.
    #[must_use]
    pub fn staged_count(&self) -> usize {
        self.conversions
            .iter()
            .filter(|record| matches!(record.status, ConversionStatus::Staged { .. }))
            .count()
    }

    /// Number of candidates whose conversion failed.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.conversions
            .iter()
            .filter(|record| matches!(record.status, ConversionStatus::Failed { .. }))
            .count()
    }
}

/// A staged conversion awaiting review and persistence.
#[derive(Debug, Clone)]
struct Staged {
    target: ConversionTarget,
    code_path: Utf8PathBuf,
    code: String,
    test: Option<(Utf8PathBuf, String)>,
}

/// Runs a plan through every configured stage.
pub struct MigrationDriver<'a> {
    orchestrator: PipelineOrchestrator,
    source_root: Utf8PathBuf,
    converter: &'a dyn Converter,
    submitter: Option<&'a dyn ChangeSubmitter>,
    validator: ArtifactValidator,
    tools: ToolRunner,
    checks: Vec<CommandSpec>,
    branch: String,
    staged: Vec<Staged>,
}

impl<'a> MigrationDriver<'a> {
    /// Creates a driver for a fresh run.
    ///
    /// Plan paths are resolved against `source_root`; checks run there too.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Validate`] if the validator can't be built.
    pub fn new(
        config: &Config,
        run_id: impl Into<String>,
        source_root: impl Into<Utf8PathBuf>,
        converter: &'a dyn Converter,
    ) -> Result<Self, PipelineError> {
        let source_root = source_root.into();
        let pipeline = &config.pipeline;
        Ok(Self {
            orchestrator: PipelineOrchestrator::from_config(pipeline, run_id),
            validator: ArtifactValidator::new(&config.validate, &pipeline.stages)?,
            tools: ToolRunner::new(Duration::from_secs(pipeline.tool_timeout_secs))
                .with_working_dir(source_root.clone()),
            checks: pipeline.checks.clone(),
            branch: pipeline.branch.clone(),
            source_root,
            converter,
            submitter: None,
            staged: Vec::new(),
        })
    }

    /// Hands persisted files to `submitter` at the end of the `persist` stage.
    #[must_use]
    pub fn with_submitter(mut self, submitter: &'a dyn ChangeSubmitter) -> Self {
        self.submitter = Some(submitter);
        self
    }

    /// The underlying orchestrator.
    #[must_use]
    pub const fn orchestrator(&self) -> &PipelineOrchestrator {
        &self.orchestrator
    }

    /// Runs every configured stage in order against `plan`.
    pub fn run(&mut self, plan: &PlanResult) -> DriverReport {
        let mut report = DriverReport {
            run_id: self.orchestrator.state().run_id().to_owned(),
            ..DriverReport::default()
        };

        let stages = self.orchestrator.state().stages().to_vec();
        for stage in &stages {
            let notes = self.perform(stage, plan, &mut report);
            match self.orchestrator.run_stage_with_notes(stage, &notes) {
                Ok(path) => report.stage_artifacts.push(path),
                Err(e) => {
                    warn!(stage = %stage, error = %e, "Stage artifact not written");
                    report.stage_errors.push(format!("{stage}: {e}"));
                }
            }
        }

        info!(
            run_id = %report.run_id,
            staged = report.staged_count(),
            failed = report.failed_count(),
            persisted = report.persisted.len(),
            "Migration run finished"
        );
        report
    }

    fn perform(&mut self, stage: &str, plan: &PlanResult, report: &mut DriverReport) -> Vec<String> {
        match stage {
            "generate" => self.generate(plan, report),
            "qa" => self.qa(report),
            "review" => self.review(report),
            "evaluate" => evaluate(report),
            "persist" => self.persist(report),
            other => {
                debug!(stage = other, "No work bound to stage");
                Vec::new()
            }
        }
    }

    fn generate(&mut self, plan: &PlanResult, report: &mut DriverReport) -> Vec<String> {
        let staged_root = self.orchestrator.run_dir().join(STAGED_DIR);

        for target in &plan.targets {
            let status = if target.is_supported() {
                self.convert_one(target, &staged_root)
            } else {
                debug!(source = %target.source, "Unsupported extension, skipping");
                ConversionStatus::Unsupported
            };
            report.conversions.push(ConversionRecord {
                target: target.clone(),
                status,
            });
        }

        let unsupported = report
            .conversions
            .iter()
            .filter(|record| record.status == ConversionStatus::Unsupported)
            .count();
        vec![format!(
            "staged {} of {} candidates ({} failed, {unsupported} unsupported)",
            report.staged_count(),
            report.conversions.len(),
            report.failed_count(),
        )]
    }

    fn convert_one(&mut self, target: &ConversionTarget, staged_root: &Utf8Path) -> ConversionStatus {
        let source_path = self.source_root.join(&target.source);
        let source = match std::fs::read_to_string(&source_path) {
            Ok(source) => source,
            Err(e) => {
                warn!(path = %source_path, error = %e, "Failed to read candidate");
                return ConversionStatus::Failed {
                    reason: format!("unreadable source: {e}"),
                };
            }
        };

        let (code, test_code) = match self.converter.convert(&target.source, &source) {
            Conversion::Converted { code, test_code } => (code, test_code),
            Conversion::Failed { reason } => {
                info!(source = %target.source, reason = %reason, "Conversion failed");
                return ConversionStatus::Failed { reason };
            }
        };

        let write_path = target.write_path().to_path_buf();
        let Some(code_path) = staged_path(staged_root, &write_path) else {
            return ConversionStatus::Failed {
                reason: format!("target {write_path} is outside the source tree"),
            };
        };
        if let Err(e) = self.stage_file(&code_path, &target.source, &code) {
            return ConversionStatus::Failed {
                reason: e.to_string(),
            };
        }

        let mut test = None;
        if let Some(test_code) = test_code {
            let test_target = TargetResolver::companion_test_path(&write_path);
            if let Some(test_path) = staged_path(staged_root, &test_target) {
                match self.stage_file(&test_path, &target.source, &test_code) {
                    Ok(()) => test = Some((test_path, test_code)),
                    Err(e) => warn!(error = %e, "Generated test not staged"),
                }
            }
        }

        let status = ConversionStatus::Staged {
            code: code_path.clone(),
            test: test.as_ref().map(|(path, _)| path.clone()),
        };
        self.staged.push(Staged {
            target: target.clone(),
            code_path,
            code,
            test,
        });
        status
    }

    fn stage_file(&self, path: &Utf8Path, source: &Utf8Path, body: &str) -> Result<(), PipelineError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| PipelineError::write(parent, e))?;
        }
        let text = format!(
            "{}{body}",
            staged_header(
                self.orchestrator.state().run_id(),
                source,
                self.converter.model(),
            )
        );
        write_new(path, &text)
    }

    fn qa(&self, report: &mut DriverReport) -> Vec<String> {
        if self.checks.is_empty() {
            return vec!["no checks configured".to_owned()];
        }
        report.tool_reports = self.tools.run_all(&self.checks);
        report
            .tool_reports
            .iter()
            .map(|tool| format!("{}: {}", tool.name, tool.outcome.label()))
            .collect()
    }

    fn review(&self, report: &mut DriverReport) -> Vec<String> {
        let paths = self.staged.iter().flat_map(|staged| {
            std::iter::once(staged.code_path.as_path())
                .chain(staged.test.as_ref().map(|(path, _)| path.as_path()))
        });
        report.validations = self
            .validator
            .validate_all(paths, Some(STAGED_ARTIFACT_STAGE));

        let quarantined = report.validations.iter().filter(|v| v.quarantined).count();
        vec![format!(
            "validated {} artifacts ({quarantined} quarantined)",
            report.validations.len()
        )]
    }

    fn persist(&self, report: &mut DriverReport) -> Vec<String> {
        if self.orchestrator.state().dry_run() {
            return vec!["dry-run: nothing persisted".to_owned()];
        }

        for staged in &self.staged {
            if !is_usable(&report.validations, &staged.code_path) {
                debug!(source = %staged.target.source, "Staged conversion not usable, not persisting");
                continue;
            }
            let write_path = staged.target.write_path();
            if let Some(path) = self.persist_file(write_path, &staged.code) {
                report.persisted.push(path);
            }
            if let Some((test_path, test_code)) = &staged.test {
                if is_usable(&report.validations, test_path) {
                    let test_target = TargetResolver::companion_test_path(write_path);
                    if let Some(path) = self.persist_file(&test_target, test_code) {
                        report.persisted.push(path);
                    }
                }
            }
        }

        let mut notes = vec![format!("persisted {} files", report.persisted.len())];
        if let Some(submitter) = self.submitter {
            if report.persisted.is_empty() {
                notes.push("nothing to submit".to_owned());
            } else {
                let submission = submitter.submit(&report.persisted, &self.branch);
                notes.push(match &submission {
                    Submission::Submitted { pr_url: Some(url) } => format!("submitted: {url}"),
                    Submission::Submitted { pr_url: None } => "submitted".to_owned(),
                    Submission::Failed { reason } => format!("submission failed: {reason}"),
                });
                report.submission = Some(submission);
            }
        }
        notes
    }

    fn persist_file(&self, relative: &Utf8Path, body: &str) -> Option<Utf8PathBuf> {
        let path = self.source_root.join(relative);
        if path.exists() {
            warn!(path = %path, "Target already exists, not overwriting");
            return None;
        }
        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!(path = %parent, error = %e, "Failed to create target directory");
                return None;
            }
        }
        match write_new(&path, body) {
            Ok(()) => Some(path),
            Err(e) => {
                warn!(error = %e, "Failed to persist conversion");
                None
            }
        }
    }
}

fn evaluate(report: &DriverReport) -> Vec<String> {
    let count = |status: ValidationStatus| {
        report
            .validations
            .iter()
            .filter(|v| v.status == status)
            .count()
    };
    let tools_passed = report
        .tool_reports
        .iter()
        .filter(|tool| tool.outcome.is_success())
        .count();
    vec![
        format!(
            "validation: {} pass, {} flag, {} fail",
            count(ValidationStatus::Pass),
            count(ValidationStatus::Flag),
            count(ValidationStatus::Fail),
        ),
        format!("checks: {tools_passed} of {} passed", report.tool_reports.len()),
    ]
}

fn is_usable(validations: &[ValidationResult], path: &Utf8Path) -> bool {
    validations
        .iter()
        .find(|v| v.filepath == path)
        .is_some_and(ValidationResult::is_usable)
}

/// Maps a target path into the staged tree, refusing paths that escape it.
fn staged_path(staged_root: &Utf8Path, target: &Utf8Path) -> Option<Utf8PathBuf> {
    let relative = target.as_str().trim_start_matches('/');
    if relative.is_empty() || relative.split('/').any(|segment| segment == "..") {
        return None;
    }
    Some(staged_root.join(relative))
}

/// Renders the comment header stamped on staged artifacts.
#[must_use]
pub fn staged_header(run_id: &str, source: &Utf8Path, model: &str) -> String {
    format!(
        "// Run-ID: {run_id}\n// Stage: {STAGED_ARTIFACT_STAGE}\n// Timestamp: {}\n// Source: {source}\n// Model: {model}\n",
        Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
    )
}

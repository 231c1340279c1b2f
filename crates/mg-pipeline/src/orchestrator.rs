//! The stage state machine.
//!
//! A run owns a fixed, ordered stage list. Running a stage writes one small
//! header-tagged artifact under `<output_dir>/<run_id>/` and appends the
//! stage name to the completed list. Unknown stage names are rejected with no
//! state change. Running a stage twice appends it twice.

use std::fs::OpenOptions;
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, SecondsFormat, Utc};
use mg_core::paths::reserve_output_path;
use mg_core::{PipelineConfig, RunState};
use tracing::{info, warn};

use crate::error::PipelineError;

/// File-name suffix of stage artifacts: `<stage>.stage.txt`.
pub const STAGE_ARTIFACT_SUFFIX: &str = "stage.txt";

/// `Source` header value of stage artifacts.
const STAGE_ARTIFACT_SOURCE: &str = "orchestrator";

/// `Model` header value of artifacts no model produced.
const NO_MODEL: &str = "none";

/// Drives a [`RunState`] through its stages.
///
/// # Examples
///
/// ```no_run
/// use mg_core::RunState;
/// use mg_pipeline::PipelineOrchestrator;
///
/// let mut run = PipelineOrchestrator::new(
///     RunState::with_default_stages("20260101-000000", true),
///     "reports",
/// );
/// let artifact = run.run_stage("generate")?;
/// assert_eq!(run.state().completed(), ["generate"]);
/// assert!(run.run_stage("bogus").is_err());
/// # let _ = artifact;
/// # Ok::<(), mg_pipeline::PipelineError>(())
/// ```
#[derive(Debug, Clone)]
pub struct PipelineOrchestrator {
    state: RunState,
    output_dir: Utf8PathBuf,
}

impl PipelineOrchestrator {
    /// Creates an orchestrator writing under `output_dir`.
    pub fn new(state: RunState, output_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            state,
            output_dir: output_dir.into(),
        }
    }

    /// Creates a fresh run from pipeline configuration.
    pub fn from_config(config: &PipelineConfig, run_id: impl Into<String>) -> Self {
        Self::new(
            RunState::new(run_id, config.stages.clone(), config.dry_run),
            config.output_dir.clone(),
        )
    }

    /// The run state.
    #[must_use]
    pub const fn state(&self) -> &RunState {
        &self.state
    }

    /// The directory holding this run's artifacts.
    #[must_use]
    pub fn run_dir(&self) -> Utf8PathBuf {
        self.output_dir.join(self.state.run_id())
    }

    /// Runs one stage, returning the artifact it wrote.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::UnknownStage`] if `name` is not in the stage
    /// list, or [`PipelineError::Write`] if the artifact can't be written.
    /// The completed list is unchanged in both cases.
    pub fn run_stage(&mut self, name: &str) -> Result<Utf8PathBuf, PipelineError> {
        self.run_stage_with_notes(name, &[])
    }

    /// Runs one stage, adding `notes` as `Note:` lines to its artifact.
    ///
    /// # Errors
    ///
    /// Same as [`run_stage`](Self::run_stage).
    pub fn run_stage_with_notes(
        &mut self,
        name: &str,
        notes: &[String],
    ) -> Result<Utf8PathBuf, PipelineError> {
        if !self.state.has_stage(name) {
            return Err(PipelineError::UnknownStage {
                stage: name.to_owned(),
                known: self.state.stages().to_vec(),
            });
        }

        let run_dir = self.run_dir();
        std::fs::create_dir_all(&run_dir).map_err(|e| PipelineError::write(&run_dir, e))?;

        let file_name = format!("{name}.{STAGE_ARTIFACT_SUFFIX}");
        let path = reserve_output_path(&run_dir, &file_name, self.state.run_id());
        let body = render_stage_artifact(&self.state, name, Utc::now(), notes);
        write_new(&path, &body)?;

        self.state.record_completed(name);
        info!(
            run_id = self.state.run_id(),
            stage = name,
            artifact = %path,
            "Stage completed"
        );
        Ok(path)
    }

    /// Runs every configured stage in order.
    ///
    /// A stage whose artifact cannot be written is logged and reported in
    /// its slot; the remaining stages still run.
    pub fn run_all(&mut self) -> Vec<Result<Utf8PathBuf, PipelineError>> {
        let stages = self.state.stages().to_vec();
        stages
            .iter()
            .map(|stage| {
                self.run_stage(stage).inspect_err(|e| {
                    warn!(stage = %stage, error = %e, "Stage artifact not written");
                })
            })
            .collect()
    }
}

/// Renders the text of a stage artifact.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use mg_core::RunState;
/// use mg_pipeline::render_stage_artifact;
///
/// let state = RunState::with_default_stages("20260101-000000", false);
/// let at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
/// let text = render_stage_artifact(&state, "qa", at, &[]);
/// assert!(text.starts_with("Run-ID: 20260101-000000\nStage: qa\n"));
/// ```
#[must_use]
pub fn render_stage_artifact(
    state: &RunState,
    stage: &str,
    at: DateTime<Utc>,
    notes: &[String],
) -> String {
    let mut body = format!(
        "Run-ID: {}\nStage: {stage}\nTimestamp: {}\nSource: {STAGE_ARTIFACT_SOURCE}\nModel: {NO_MODEL}\nDry-Run: {}\n",
        state.run_id(),
        at.to_rfc3339_opts(SecondsFormat::Secs, true),
        state.dry_run(),
    );
    for note in notes {
        body.push_str("Note: ");
        body.push_str(note);
        body.push('\n');
    }
    body
}

/// Creates `path` and writes `body`, refusing to replace an existing file.
pub(crate) fn write_new(path: &Utf8Path, body: &str) -> Result<(), PipelineError> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| PipelineError::write(path, e))?;
    file.write_all(body.as_bytes())
        .map_err(|e| PipelineError::write(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn orchestrator(tmp: &TempDir) -> PipelineOrchestrator {
        let out = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).unwrap();
        PipelineOrchestrator::new(RunState::with_default_stages("20260101-093000", false), out)
    }

    fn files_in(dir: &Utf8Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .map(|entries| {
                entries
                    .filter_map(Result::ok)
                    .map(|entry| entry.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }

    #[test]
    fn test_unknown_stage_leaves_state_unchanged() {
        let tmp = TempDir::new().unwrap();
        let mut run = orchestrator(&tmp);

        let err = run.run_stage("bogus").unwrap_err();
        assert!(matches!(err, PipelineError::UnknownStage { ref stage, .. } if stage == "bogus"));
        assert!(run.state().completed().is_empty());
        assert!(!run.run_dir().exists());
    }

    #[test]
    fn test_generate_writes_one_artifact() {
        let tmp = TempDir::new().unwrap();
        let mut run = orchestrator(&tmp);

        let path = run.run_stage("generate").unwrap();
        assert_eq!(run.state().completed(), ["generate"]);
        assert_eq!(files_in(&run.run_dir()), vec!["generate.stage.txt"]);

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.lines().any(|line| line.starts_with("Run-ID:")));
        assert!(text.contains("Stage: generate\n"));
        assert!(text.contains("Dry-Run: false\n"));
    }

    #[test]
    fn test_rerun_appends_duplicate_entry() {
        let tmp = TempDir::new().unwrap();
        let mut run = orchestrator(&tmp);

        let first = run.run_stage("qa").unwrap();
        let second = run.run_stage("qa").unwrap();

        assert_eq!(run.state().completed(), ["qa", "qa"]);
        assert_ne!(first, second);
        assert_eq!(
            files_in(&run.run_dir()),
            vec!["qa.stage.20260101-093000.txt", "qa.stage.txt"]
        );
    }

    #[test]
    fn test_run_all_runs_every_stage_in_order() {
        let tmp = TempDir::new().unwrap();
        let mut run = orchestrator(&tmp);

        let results = run.run_all();
        assert_eq!(results.len(), 5);
        assert!(results.iter().all(Result::is_ok));
        assert_eq!(
            run.state().completed(),
            ["generate", "qa", "review", "evaluate", "persist"]
        );
    }

    #[test]
    fn test_stage_artifacts_pass_validation() {
        let tmp = TempDir::new().unwrap();
        let mut run = orchestrator(&tmp);
        let artifacts: Vec<Utf8PathBuf> = run.run_all().into_iter().map(Result::unwrap).collect();

        let config = mg_core::ValidateConfig {
            quarantine_dir: run.run_dir().join("quarantine"),
            ..mg_core::ValidateConfig::default()
        };
        let validator =
            mg_validate::ArtifactValidator::new(&config, run.state().stages()).unwrap();
        for (artifact, stage) in artifacts.iter().zip(run.state().stages()) {
            let result = validator.validate(artifact, Some(stage.as_str()));
            assert_eq!(result.status, mg_core::ValidationStatus::Pass, "{result:?}");
        }
    }

    #[test]
    fn test_notes_are_rendered() {
        let state = RunState::with_default_stages("r1", true);
        let at = DateTime::<Utc>::UNIX_EPOCH;
        let text = render_stage_artifact(&state, "evaluate", at, &["3 passed".to_owned()]);
        assert_eq!(
            text,
            "Run-ID: r1\nStage: evaluate\nTimestamp: 1970-01-01T00:00:00Z\nSource: orchestrator\nModel: none\nDry-Run: true\nNote: 3 passed\n"
        );
    }

    #[test]
    fn test_from_config() {
        let config = PipelineConfig {
            stages: vec!["generate".to_owned(), "persist".to_owned()],
            dry_run: true,
            output_dir: Utf8PathBuf::from("out"),
            ..PipelineConfig::default()
        };
        let run = PipelineOrchestrator::from_config(&config, "r2");
        assert_eq!(run.run_dir(), Utf8PathBuf::from("out/r2"));
        assert!(run.state().dry_run());
        assert_eq!(run.state().stages(), ["generate", "persist"]);
    }
}

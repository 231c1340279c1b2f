//! Pipeline run state.

use serde::{Deserialize, Serialize};

/// The stage list used when configuration does not override it.
pub const DEFAULT_STAGES: &[&str] = &["generate", "qa", "review", "evaluate", "persist"];

/// State of one pipeline run.
///
/// The stage list is fixed at construction; `completed` is append-only.
///
/// # Examples
///
/// ```
/// use mg_core::RunState;
///
/// let state = RunState::with_default_stages("20260101-000000", false);
/// assert!(state.has_stage("qa"));
/// assert!(!state.has_stage("bogus"));
/// assert!(state.completed().is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunState {
    run_id: String,
    stages: Vec<String>,
    completed: Vec<String>,
    dry_run: bool,
}

impl RunState {
    /// Creates a fresh run over `stages`.
    #[must_use]
    pub fn new(run_id: impl Into<String>, stages: Vec<String>, dry_run: bool) -> Self {
        Self {
            run_id: run_id.into(),
            stages,
            completed: Vec::new(),
            dry_run,
        }
    }

    /// Creates a fresh run over [`DEFAULT_STAGES`].
    #[must_use]
    pub fn with_default_stages(run_id: impl Into<String>, dry_run: bool) -> Self {
        Self::new(
            run_id,
            DEFAULT_STAGES.iter().map(|stage| (*stage).to_owned()).collect(),
            dry_run,
        )
    }

    /// The run identifier.
    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// The configured stages, in order.
    #[must_use]
    pub fn stages(&self) -> &[String] {
        &self.stages
    }

    /// Stage names completed so far, in completion order, repeats included.
    #[must_use]
    pub fn completed(&self) -> &[String] {
        &self.completed
    }

    /// Whether this run avoids writes outside its output directory.
    #[must_use]
    pub const fn dry_run(&self) -> bool {
        self.dry_run
    }

    /// Returns `true` if `stage` is in the configured list.
    #[must_use]
    pub fn has_stage(&self, stage: &str) -> bool {
        self.stages.iter().any(|s| s == stage)
    }

    /// Appends `stage` to the completed list.
    ///
    /// Callers check [`has_stage`](Self::has_stage) first; this does not.
    pub fn record_completed(&mut self, stage: &str) {
        self.completed.push(stage.to_owned());
    }
}

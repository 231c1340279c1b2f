//! The artifact validator.
//!
//! Judgment and side effects are split. [`ArtifactValidator::assess`] is a
//! pure function from an artifact's name and contents to an [`Assessment`];
//! [`ArtifactValidator::validate`] reads the file, assesses it, and applies
//! the quarantine decision through the injected [`Quarantine`].
//!
//! Rules run in a fixed chain. The hard failures (missing, empty, oversized,
//! not UTF-8) end the chain; every later rule adds a reason and the final
//! status is the most severe one seen.

use camino::{Utf8Path, Utf8PathBuf};
use mg_core::{ValidateConfig, ValidationResult, ValidationStatus};
use smallvec::SmallVec;
use tracing::{debug, warn};

use crate::error::ValidateError;
use crate::headers::ArtifactHeaders;
use crate::patterns::{CODE_SHAPE_RULES, CompiledRules, JUNK_RULES, rule_names};
use crate::quarantine::{FsQuarantine, Quarantine};

/// Stages whose artifacts are expected to contain code.
const CODE_STAGES: [&str; 3] = ["review", "evaluate", "persist"];

/// Junk rule hits at or above this count are a hard failure.
const JUNK_FAIL_HITS: usize = 2;

/// Code-shape hits at or above this count flag prose stages.
const CODE_SHAPE_HITS: usize = 2;

/// What the validator knows about an artifact before judging it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe<'a> {
    /// Nothing exists at the path.
    Missing,
    /// The path exists but could not be read.
    Unreadable,
    /// The file is larger than the ceiling and was not read.
    Oversized(u64),
    /// The file's bytes.
    Contents(&'a [u8]),
}

/// The pure outcome of judging an artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assessment {
    /// Stage label: the expected stage if given, else the inferred one.
    pub stage: Option<String>,
    /// Most severe status.
    pub status: ValidationStatus,
    /// Reasons in rule-chain order.
    pub reasons: SmallVec<[String; 4]>,
    /// Whether the artifact should be moved to quarantine.
    pub quarantine: bool,
}

impl Assessment {
    fn new(stage: Option<String>) -> Self {
        Self {
            stage,
            status: ValidationStatus::Pass,
            reasons: SmallVec::new(),
            quarantine: false,
        }
    }

    fn record(&mut self, status: ValidationStatus, reason: impl Into<String>) {
        self.status = self.status.max(status);
        self.reasons.push(reason.into());
    }

    fn fail(mut self, reason: impl Into<String>, quarantine: bool) -> Self {
        self.record(ValidationStatus::Fail, reason);
        self.quarantine = quarantine;
        self
    }
}

/// Validates pipeline artifacts.
///
/// # Examples
///
/// ```
/// use mg_core::{ValidateConfig, ValidationStatus};
/// use mg_validate::{ArtifactValidator, Probe};
///
/// let stages = vec!["generate".to_owned(), "review".to_owned()];
/// let validator = ArtifactValidator::new(&ValidateConfig::default(), &stages)?;
///
/// let empty = validator.assess("review.txt", Probe::Contents(b""), Some("review"));
/// assert_eq!(empty.status, ValidationStatus::Fail);
/// assert!(empty.quarantine);
/// # Ok::<(), mg_validate::ValidateError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ArtifactValidator<Q = FsQuarantine> {
    max_bytes: u64,
    header_scan_lines: usize,
    stages: Vec<String>,
    junk: CompiledRules,
    code: CompiledRules,
    quarantine: Q,
}

impl ArtifactValidator<FsQuarantine> {
    /// Creates a validator that quarantines into `config.quarantine_dir`.
    ///
    /// `stages` are the pipeline's stage names, used to infer a stage from a
    /// file name when the artifact has no `Stage` header.
    ///
    /// # Errors
    ///
    /// Returns [`ValidateError::Rule`] if a content rule fails to compile.
    pub fn new(config: &ValidateConfig, stages: &[String]) -> Result<Self, ValidateError> {
        Self::with_quarantine(
            config,
            stages,
            FsQuarantine::new(config.quarantine_dir.clone()),
        )
    }
}

impl<Q: Quarantine> ArtifactValidator<Q> {
    /// Creates a validator with a custom quarantine capability.
    ///
    /// # Errors
    ///
    /// Returns [`ValidateError::Rule`] if a content rule fails to compile.
    pub fn with_quarantine(
        config: &ValidateConfig,
        stages: &[String],
        quarantine: Q,
    ) -> Result<Self, ValidateError> {
        Ok(Self {
            max_bytes: config.max_bytes,
            header_scan_lines: config.header_scan_lines,
            stages: stages.iter().map(|stage| stage.to_ascii_lowercase()).collect(),
            junk: CompiledRules::compile(JUNK_RULES)?,
            code: CompiledRules::compile(CODE_SHAPE_RULES)?,
            quarantine,
        })
    }

    /// Judges an artifact without touching the filesystem.
    ///
    /// `file_name` is used for stage inference when the artifact has no
    /// `Stage` header.
    #[must_use]
    pub fn assess(
        &self,
        file_name: &str,
        probe: Probe<'_>,
        expected_stage: Option<&str>,
    ) -> Assessment {
        let expected = expected_stage.map(normalize_stage).filter(|s| !s.is_empty());
        let from_name = self.stage_from_file_name(file_name);
        let label = |inferred: Option<&String>| expected.clone().or_else(|| inferred.cloned());

        let bytes = match probe {
            Probe::Missing => {
                return Assessment::new(label(from_name.as_ref())).fail("file-missing", false);
            }
            Probe::Unreadable => {
                return Assessment::new(label(from_name.as_ref())).fail("file-unreadable", false);
            }
            Probe::Oversized(size) => {
                return Assessment::new(label(from_name.as_ref())).fail(
                    format!("too-large: {size} bytes exceeds {}", self.max_bytes),
                    true,
                );
            }
            Probe::Contents(bytes) => bytes,
        };

        if bytes.is_empty() {
            return Assessment::new(label(from_name.as_ref())).fail("empty-file", true);
        }
        let size = bytes.len() as u64;
        if size > self.max_bytes {
            return Assessment::new(label(from_name.as_ref())).fail(
                format!("too-large: {size} bytes exceeds {}", self.max_bytes),
                true,
            );
        }
        let Ok(text) = std::str::from_utf8(bytes) else {
            return Assessment::new(label(from_name.as_ref())).fail("not-utf8", true);
        };

        let headers = ArtifactHeaders::parse(text, self.header_scan_lines);
        let inferred = headers
            .get("Stage")
            .map(normalize_stage)
            .filter(|s| !s.is_empty())
            .or(from_name);
        let mut assessment = Assessment::new(label(inferred.as_ref()));

        let missing = headers.missing();
        if !missing.is_empty() {
            assessment.record(
                ValidationStatus::Flag,
                format!("missing-headers: {}", missing.join(", ")),
            );
        }

        match (&expected, &inferred) {
            (Some(expected), Some(inferred)) if expected != inferred => assessment.record(
                ValidationStatus::Flag,
                format!("stage-mismatch: expected {expected}, found {inferred}"),
            ),
            (Some(_), None) => assessment.record(ValidationStatus::Flag, "stage-unknown"),
            _ => {}
        }

        let junk = self.junk.hits(text);
        if junk.len() >= JUNK_FAIL_HITS {
            assessment.record(ValidationStatus::Fail, format!("junk: {}", rule_names(&junk)));
            assessment.quarantine = true;
        } else if let [hit] = junk.as_slice() {
            assessment.record(
                ValidationStatus::Flag,
                format!("junk-suspected: {}", hit.name),
            );
        }

        let code_expected = assessment
            .stage
            .as_deref()
            .is_some_and(|stage| CODE_STAGES.contains(&stage));
        if !code_expected {
            let shapes = self.code.hits(text);
            if shapes.len() >= CODE_SHAPE_HITS {
                assessment.record(
                    ValidationStatus::Flag,
                    format!("looks-like-code: {}", rule_names(&shapes)),
                );
            }
        }

        assessment
    }

    /// Validates the artifact at `path`, quarantining it on a hard failure.
    ///
    /// Never fails: filesystem problems become reasons on the result. If the
    /// quarantine move itself fails, the result stays `Fail` with
    /// `quarantined == false` and a `quarantine-failed` reason.
    pub fn validate(&self, path: &Utf8Path, expected_stage: Option<&str>) -> ValidationResult {
        let file_name = path.file_name().unwrap_or(path.as_str());
        let contents = self.read(path);
        let probe = match &contents {
            ReadOutcome::Missing => Probe::Missing,
            ReadOutcome::Unreadable => Probe::Unreadable,
            ReadOutcome::Oversized(size) => Probe::Oversized(*size),
            ReadOutcome::Bytes(bytes) => Probe::Contents(bytes),
        };
        let assessment = self.assess(file_name, probe, expected_stage);

        let mut result = ValidationResult {
            filepath: path.to_path_buf(),
            stage: assessment.stage,
            status: assessment.status,
            reasons: assessment.reasons,
            quarantined: false,
            quarantine_path: None,
        };

        if assessment.quarantine {
            match self.quarantine.quarantine(path) {
                Ok(destination) => {
                    result.quarantined = true;
                    result.quarantine_path = Some(destination);
                }
                Err(e) => {
                    warn!(path = %path, error = %e, "Quarantine failed");
                    result.reasons.push(format!("quarantine-failed: {e}"));
                }
            }
        }

        debug!(
            path = %path,
            status = result.status.label(),
            reasons = result.reasons.len(),
            quarantined = result.quarantined,
            "Validated artifact"
        );
        result
    }

    /// Validates several artifacts against one expected stage.
    pub fn validate_all<'p>(
        &self,
        paths: impl IntoIterator<Item = &'p Utf8Path>,
        expected_stage: Option<&str>,
    ) -> Vec<ValidationResult> {
        paths
            .into_iter()
            .map(|path| self.validate(path, expected_stage))
            .collect()
    }

    fn read(&self, path: &Utf8Path) -> ReadOutcome {
        let metadata = match std::fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return ReadOutcome::Missing,
            Err(e) => {
                warn!(path = %path, error = %e, "Failed to stat artifact");
                return ReadOutcome::Unreadable;
            }
        };
        if !metadata.is_file() {
            return ReadOutcome::Unreadable;
        }
        if metadata.len() > self.max_bytes {
            return ReadOutcome::Oversized(metadata.len());
        }
        match std::fs::read(path) {
            Ok(bytes) => ReadOutcome::Bytes(bytes),
            Err(e) => {
                warn!(path = %path, error = %e, "Failed to read artifact");
                ReadOutcome::Unreadable
            }
        }
    }

    /// Infers a stage from file-name tokens split on `.`, `_` and `-`.
    fn stage_from_file_name(&self, file_name: &str) -> Option<String> {
        file_name
            .split(['.', '_', '-'])
            .map(str::to_ascii_lowercase)
            .find(|token| self.stages.contains(token))
    }
}

enum ReadOutcome {
    Missing,
    Unreadable,
    Oversized(u64),
    Bytes(Vec<u8>),
}

fn normalize_stage(stage: &str) -> String {
    stage.trim().to_ascii_lowercase()
}

/// Paths of results that were quarantined.
pub fn quarantined_paths(results: &[ValidationResult]) -> Vec<Utf8PathBuf> {
    results
        .iter()
        .filter_map(|result| result.quarantine_path.clone())
        .collect()
}

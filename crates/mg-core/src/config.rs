//! Configuration structures for the mg-migration engine.
//!
//! This module provides one configuration section per component:
//!
//! - [`InventoryConfig`] - Which file extensions inventory parsing keeps
//! - [`PlanConfig`] - Size floor, exclude pattern, and grouping mode for planning
//! - [`DedupConfig`] - Root precedence for multi-root reconciliation
//! - [`ValidateConfig`] - Size ceiling, header window, and quarantine location
//! - [`PipelineConfig`] - Stage list, output directory, and external commands
//! - [`Config`] - Root configuration combining all sections
//!
//! All sections implement [`Default`] and deserialize with `#[serde(default)]`,
//! so a configuration file only needs the keys it overrides. A [`Config`] is
//! passed explicitly to every operation; nothing reads process-wide settings.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::DEFAULT_STAGES;

/// Configuration for inventory parsing.
///
/// # Examples
///
/// ```
/// use mg_core::InventoryConfig;
///
/// let config = InventoryConfig::default();
/// assert!(config.allows("jsx"));
/// assert!(config.allows("TSX"));
/// assert!(!config.allows("css"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    /// Extensions (without the leading dot, lowercase) an entry must carry to be kept.
    pub allowed_extensions: Vec<String>,
}

impl InventoryConfig {
    /// Returns `true` if `extension` (case-insensitive, no dot) is allowed.
    #[must_use]
    pub fn allows(&self, extension: &str) -> bool {
        self.allowed_extensions
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(extension))
    }
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            allowed_extensions: ["js", "jsx", "mjs", "cjs", "ts", "tsx", "mts", "cts"]
                .iter()
                .map(|ext| (*ext).to_owned())
                .collect(),
        }
    }
}

/// Configuration for the dedup planner.
///
/// # Examples
///
/// ```
/// use mg_core::PlanConfig;
///
/// let config = PlanConfig::default();
/// assert_eq!(config.size_min, 0);
/// assert!(!config.same_dir_only);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanConfig {
    /// Entries smaller than this many bytes are dropped before planning.
    pub size_min: u64,

    /// Regular expression; entries whose path matches are dropped before planning.
    pub exclude_pattern: Option<String>,

    /// Classify by `(directory, stem)` instead of by stem alone.
    pub same_dir_only: bool,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            size_min: 0,
            exclude_pattern: Some(r"(^|/)(node_modules|dist|build|coverage)/".to_owned()),
            same_dir_only: false,
        }
    }
}

/// Configuration for the master deduplicator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    /// Scan roots, highest precedence first.
    pub precedence: Vec<String>,
}

/// Configuration for artifact validation.
///
/// # Examples
///
/// ```
/// use mg_core::ValidateConfig;
///
/// let config = ValidateConfig::default();
/// assert_eq!(config.header_scan_lines, 20);
/// assert_eq!(config.quarantine_dir.as_str(), "reports/quarantine");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidateConfig {
    /// Artifacts larger than this many bytes fail validation.
    pub max_bytes: u64,

    /// Number of leading lines searched for `Key: Value` headers.
    pub header_scan_lines: usize,

    /// Directory that receives quarantined artifacts.
    pub quarantine_dir: Utf8PathBuf,
}

impl Default for ValidateConfig {
    fn default() -> Self {
        Self {
            max_bytes: 2 * 1024 * 1024,
            header_scan_lines: 20,
            quarantine_dir: Utf8PathBuf::from("reports/quarantine"),
        }
    }
}

/// An external command: a program plus fixed arguments.
///
/// # Examples
///
/// ```
/// use mg_core::CommandSpec;
///
/// let tsc = CommandSpec::new("tsc", "npx", &["tsc", "--noEmit"]);
/// assert_eq!(tsc.display(), "npx tsc --noEmit");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    /// Label used in logs and reports.
    pub name: String,
    /// Program to execute.
    pub program: String,
    /// Arguments passed to the program.
    #[serde(default)]
    pub args: Vec<String>,
}

impl CommandSpec {
    /// Creates a new command specification.
    #[must_use]
    pub fn new(name: impl Into<String>, program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args: args.iter().map(|arg| (*arg).to_owned()).collect(),
        }
    }

    /// Returns the command line as a single space-joined string.
    #[must_use]
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Configuration for pipeline runs.
///
/// # Examples
///
/// ```
/// use mg_core::PipelineConfig;
///
/// let config = PipelineConfig::default();
/// assert_eq!(config.stages, vec!["generate", "qa", "review", "evaluate", "persist"]);
/// assert!(!config.dry_run);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Ordered stage names. Fixed for the lifetime of a run.
    pub stages: Vec<String>,

    /// Directory that receives stage artifacts and reports.
    pub output_dir: Utf8PathBuf,

    /// When set, nothing outside the output directory is written.
    pub dry_run: bool,

    /// Timeout applied to every external command, in seconds.
    pub tool_timeout_secs: u64,

    /// Command that converts one legacy file (source on stdin, result on stdout).
    pub converter: Option<CommandSpec>,

    /// Compiler/test/lint commands run during the `qa` stage.
    pub checks: Vec<CommandSpec>,

    /// Branch name handed to the VCS collaborator.
    pub branch: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stages: DEFAULT_STAGES.iter().map(|stage| (*stage).to_owned()).collect(),
            output_dir: Utf8PathBuf::from("reports"),
            dry_run: false,
            tool_timeout_secs: 120,
            converter: None,
            checks: Vec::new(),
            branch: "migrate/typescript".to_owned(),
        }
    }
}

/// Root configuration for the mg-migration engine.
///
/// # Examples
///
/// ```
/// use mg_core::Config;
///
/// let config = Config::default();
/// assert!(config.validate().is_ok());
///
/// let json = serde_json::to_string_pretty(&config).unwrap();
/// assert!(json.contains("\"same_dir_only\""));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Inventory parsing configuration.
    pub inventory: InventoryConfig,

    /// Dedup planning configuration.
    pub plan: PlanConfig,

    /// Multi-root reconciliation configuration.
    pub dedup: DedupConfig,

    /// Artifact validation configuration.
    pub validate: ValidateConfig,

    /// Pipeline run configuration.
    pub pipeline: PipelineConfig,
}

impl Config {
    /// Loads and validates a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Parse`] if it is not valid JSON for this structure, or
    /// any error from [`validate`](Self::validate).
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field invariants that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOption`] for an empty or duplicated stage
    /// list, a duplicated precedence root, or a zero size ceiling, and
    /// [`ConfigError::InvalidPath`] for an empty quarantine or output directory.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pipeline.stages.is_empty() {
            return Err(ConfigError::invalid_option(
                "pipeline.stages",
                "must name at least one stage",
            ));
        }
        if let Some(dup) = first_duplicate(&self.pipeline.stages, |stage| stage) {
            return Err(ConfigError::invalid_option(
                "pipeline.stages",
                format!("stage '{dup}' is listed more than once"),
            ));
        }
        if let Some(dup) = first_duplicate(&self.dedup.precedence, crate::paths::root_key) {
            return Err(ConfigError::invalid_option(
                "dedup.precedence",
                format!("root '{dup}' is listed more than once"),
            ));
        }
        if self.validate.max_bytes == 0 {
            return Err(ConfigError::invalid_option(
                "validate.max_bytes",
                "must be greater than zero",
            ));
        }
        if self.validate.quarantine_dir.as_str().is_empty() {
            return Err(ConfigError::InvalidPath {
                path: self.validate.quarantine_dir.clone(),
                reason: "quarantine directory must not be empty".to_owned(),
            });
        }
        if self.pipeline.output_dir.as_str().is_empty() {
            return Err(ConfigError::InvalidPath {
                path: self.pipeline.output_dir.clone(),
                reason: "output directory must not be empty".to_owned(),
            });
        }
        Ok(())
    }
}

/// Returns the first value whose `key` was already seen, in list order.
fn first_duplicate(values: &[String], key: fn(&str) -> &str) -> Option<&str> {
    let mut seen = crate::hash::fx_hash_set();
    values
        .iter()
        .map(String::as_str)
        .find(|value| !seen.insert(key(value)))
}

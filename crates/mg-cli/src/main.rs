//! CLI entry point for the mg-migration engine.
//!
//! This binary is a thin request layer over the library crates: it loads the
//! configuration, applies flag overrides, calls one engine operation and writes
//! its reports.
//!
//! # Usage
//!
//! ```bash
//! mg-migrate [OPTIONS] <COMMAND>
//!
//! # Plan which legacy files need conversion
//! mg-migrate plan inventory-a.txt inventory-b.txt --size-min 1
//!
//! # Reconcile a multi-root master inventory
//! mg-migrate dedup master.csv --precedence /mnt/a,/mnt/b
//!
//! # Validate generated artifacts
//! mg-migrate validate --stage review out/*.md
//!
//! # Run the whole pipeline
//! mg-migrate --config mg-migrate.json run inventory.txt --source-root .
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

use std::io::Write;
use std::process::ExitCode;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use color_eyre::eyre::{WrapErr, eyre};
use mg_audit::AuditWriter;
use mg_core::paths::new_run_id;
use mg_core::{Config, DedupOutcome, PlanResult, ValidationResult, ValidationStatus};
use mg_inventory::{InventoryParser, read_master_csv_path};
use mg_pipeline::{CommandConverter, DriverReport, MigrationDriver, PipelineOrchestrator};
use mg_planner::{DedupPlanner, MasterDeduplicator, MaterializeReport, materialize};
use mg_validate::{ArtifactValidator, quarantined_paths};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// CLI ARGUMENT TYPES
// =============================================================================

/// Migration planning and validation for legacy-to-typed source trees.
#[derive(Parser)]
#[command(name = "mg-migrate", version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    command: Commands,

    /// JSON configuration file.
    ///
    /// Every section is optional; missing values use the built-in defaults.
    #[arg(short, long, global = true, env = "MG_MIGRATE_CONFIG")]
    config: Option<Utf8PathBuf>,

    /// Directory that receives reports and stage artifacts.
    #[arg(short, long, global = true, env = "MG_MIGRATE_OUTPUT_DIR")]
    output_dir: Option<Utf8PathBuf>,

    /// Run identifier (defaults to the current UTC time, `YYYYMMDD-HHMMSS`).
    #[arg(long, global = true, env = "MG_MIGRATE_RUN_ID")]
    run_id: Option<String>,

    /// Never write outside the output directory.
    #[arg(long, global = true, env = "MG_MIGRATE_DRY_RUN")]
    dry_run: bool,

    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Classify inventory entries into keep/drop/convert/skip lists.
    Plan {
        #[command(flatten)]
        inventory: InventoryArgs,
    },

    /// Reconcile a multi-root master inventory CSV.
    Dedup {
        /// Master inventory CSV.
        master: Utf8PathBuf,

        /// Root precedence, highest first (comma separated).
        #[arg(short, long, value_delimiter = ',')]
        precedence: Vec<String>,

        /// Copy kept files into this directory, preserving relative paths.
        #[arg(short, long)]
        materialize: Option<Utf8PathBuf>,
    },

    /// Validate artifacts, quarantining hard failures.
    Validate {
        /// Artifacts to validate.
        #[arg(required = true)]
        paths: Vec<Utf8PathBuf>,

        /// Stage every artifact is expected to belong to.
        #[arg(short, long)]
        stage: Option<String>,

        /// Directory that receives quarantined artifacts.
        #[arg(short, long, env = "MG_MIGRATE_QUARANTINE_DIR")]
        quarantine_dir: Option<Utf8PathBuf>,
    },

    /// Record one stage of a run.
    Stage {
        /// Stage name.
        name: String,

        /// Note line added to the stage artifact (repeatable).
        #[arg(short, long = "note")]
        notes: Vec<String>,
    },

    /// Plan, convert, check, review, evaluate and persist.
    Run {
        #[command(flatten)]
        inventory: InventoryArgs,

        /// Root the inventory paths are relative to.
        #[arg(short, long, default_value = ".")]
        source_root: Utf8PathBuf,
    },
}

/// Inventory inputs and planning overrides shared by `plan` and `run`.
#[derive(clap::Args)]
struct InventoryArgs {
    /// Inventory files (`path | size | timestamp` rows).
    #[arg(required = true)]
    inventories: Vec<Utf8PathBuf>,

    /// Ignore entries smaller than this many bytes.
    #[arg(long)]
    size_min: Option<u64>,

    /// Ignore entries whose path matches this regex.
    #[arg(short, long)]
    exclude: Option<String>,

    /// Only typed files in the same directory cover a legacy file.
    #[arg(long)]
    same_dir_only: bool,
}

// =============================================================================
// INITIALIZATION FUNCTIONS
// =============================================================================

/// Initializes the tracing subscriber for logging.
///
/// Respects the `RUST_LOG` environment variable if set. Otherwise, uses
/// `debug` level if `--verbose` is set, or `info` level by default.
fn init_tracing(verbose: bool, no_color: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));

    // Check if colors should be disabled (flag or NO_COLOR env var)
    let use_ansi = !no_color && std::env::var("NO_COLOR").is_err();

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(use_ansi)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

/// Builds a [`Config`] from the optional config file and global flags.
///
/// # Errors
///
/// Returns an error if the file can't be loaded or the result is invalid.
fn build_config(cli: &Cli) -> color_eyre::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            Config::load(path).wrap_err_with(|| format!("Failed to load config {path}"))?
        }
        None => Config::default(),
    };

    if let Some(dir) = &cli.output_dir {
        config.pipeline.output_dir.clone_from(dir);
    }
    if cli.dry_run {
        config.pipeline.dry_run = true;
    }

    match &cli.command {
        Commands::Plan { inventory } | Commands::Run { inventory, .. } => {
            if let Some(size_min) = inventory.size_min {
                config.plan.size_min = size_min;
            }
            if let Some(pattern) = &inventory.exclude {
                config.plan.exclude_pattern = Some(pattern.clone());
            }
            if inventory.same_dir_only {
                config.plan.same_dir_only = true;
            }
        }
        Commands::Dedup { precedence, .. } if !precedence.is_empty() => {
            config.dedup.precedence.clone_from(precedence);
        }
        Commands::Validate {
            quarantine_dir: Some(dir),
            ..
        } => {
            config.validate.quarantine_dir.clone_from(dir);
        }
        _ => {}
    }

    config.validate()?;
    Ok(config)
}

// =============================================================================
// COMMAND IMPLEMENTATIONS
// =============================================================================

/// Reads and plans the given inventory files.
fn plan_inventories(config: &Config, inventories: &[Utf8PathBuf]) -> color_eyre::Result<PlanResult> {
    let blobs = inventories
        .iter()
        .map(|path| {
            std::fs::read_to_string(path).wrap_err_with(|| format!("Failed to read inventory {path}"))
        })
        .collect::<color_eyre::Result<Vec<_>>>()?;

    let entries = InventoryParser::new(&config.inventory).parse_all(blobs.iter().map(String::as_str));
    info!(files = inventories.len(), entries = entries.len(), "Parsed inventories");

    Ok(DedupPlanner::new().plan_with_config(&entries, &config.plan)?)
}

fn run_plan(config: &Config, run_id: &str, inventories: &[Utf8PathBuf]) -> color_eyre::Result<()> {
    let plan = plan_inventories(config, inventories)?;
    let reports = AuditWriter::new(&config.pipeline.output_dir, run_id).write_plan(&plan)?;

    print_plan_summary(&plan);
    print_written(&[&reports.plan, &reports.candidates]);
    Ok(())
}

fn run_dedup(
    config: &Config,
    run_id: &str,
    master: &Utf8Path,
    dest: Option<&Utf8Path>,
) -> color_eyre::Result<ExitCode> {
    let rows = read_master_csv_path(master)?;
    let outcome = MasterDeduplicator::new(config.dedup.precedence.clone())?.reconcile(rows);

    let copied = dest.map(|dest| materialize(&outcome.kept, dest));
    let reports = AuditWriter::new(&config.pipeline.output_dir, run_id).write_dedup(&outcome)?;

    print_dedup_summary(&outcome, copied.as_ref());
    print_written(&[&reports.kept, &reports.discarded, &reports.summary]);

    Ok(match copied {
        Some(report) if !report.is_complete() => ExitCode::FAILURE,
        _ => ExitCode::SUCCESS,
    })
}

fn run_validate(
    config: &Config,
    run_id: &str,
    paths: &[Utf8PathBuf],
    stage: Option<&str>,
) -> color_eyre::Result<ExitCode> {
    let validator = ArtifactValidator::new(&config.validate, &config.pipeline.stages)?;
    let results = validator.validate_all(paths.iter().map(Utf8PathBuf::as_path), stage);
    let reports =
        AuditWriter::new(&config.pipeline.output_dir, run_id).write_validation(&results)?;

    print_validation_summary(&results);
    print_written(&[&reports.json, &reports.csv]);

    Ok(if results.iter().any(|result| result.status.is_fail()) {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

/// Exit status for a request the engine refused, such as an unknown stage.
const EXIT_USAGE: u8 = 2;

fn run_stage(
    config: &Config,
    run_id: &str,
    name: &str,
    notes: &[String],
) -> color_eyre::Result<ExitCode> {
    let mut orchestrator = PipelineOrchestrator::from_config(&config.pipeline, run_id);
    match orchestrator.run_stage_with_notes(name, notes) {
        Ok(artifact) => {
            print_written(&[&artifact]);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) if e.is_contract_violation() => {
            error!(error = %e, "Stage rejected");
            Ok(ExitCode::from(EXIT_USAGE))
        }
        Err(e) => Err(e.into()),
    }
}

fn run_pipeline(
    config: &Config,
    run_id: &str,
    inventories: &[Utf8PathBuf],
    source_root: &Utf8Path,
) -> color_eyre::Result<ExitCode> {
    let spec = config
        .pipeline
        .converter
        .clone()
        .ok_or_else(|| eyre!("No converter configured (set `pipeline.converter` in the config file)"))?;
    let converter = CommandConverter::new(spec, Duration::from_secs(config.pipeline.tool_timeout_secs));

    let plan = plan_inventories(config, inventories)?;
    let mut driver = MigrationDriver::new(config, run_id, source_root, &converter)?;
    let report = driver.run(&plan);

    let writer = AuditWriter::new(driver.orchestrator().run_dir(), run_id);
    let plan_reports = writer.write_plan(&plan)?;
    let validation_reports = writer.write_validation(&report.validations)?;

    print_plan_summary(&plan);
    print_run_summary(&report);
    print_written(&[
        &plan_reports.plan,
        &plan_reports.candidates,
        &validation_reports.json,
        &validation_reports.csv,
    ]);

    Ok(if report.stage_errors.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

// =============================================================================
// OUTPUT HELPERS
// =============================================================================

fn print_plan_summary(plan: &PlanResult) {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    let counts = &plan.counts;

    let _ = writeln!(handle);
    let _ = writeln!(handle, "Migration Plan");
    let _ = writeln!(handle, "==============");
    let _ = writeln!(handle);
    let _ = writeln!(handle, "Total files classified: {}", counts.total);
    let _ = writeln!(handle, "  Keep (typed):       {}", counts.keep_typed);
    let _ = writeln!(handle, "  Drop (converted):   {}", counts.drop_already_converted);
    let _ = writeln!(handle, "  Convert:            {}", counts.convert_candidates);
    let _ = writeln!(handle, "  Tests skipped:      {}", counts.tests_skipped);

    let unsupported = plan.targets.iter().filter(|target| !target.is_supported()).count();
    if unsupported > 0 {
        let _ = writeln!(handle, "  Unsupported:        {unsupported} (no extension mapping)");
    }
}

fn print_dedup_summary(outcome: &DedupOutcome, copied: Option<&MaterializeReport>) {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    let summary = &outcome.summary;

    let _ = writeln!(handle);
    let _ = writeln!(handle, "Dedup Summary");
    let _ = writeln!(handle, "=============");
    let _ = writeln!(handle);
    let _ = writeln!(handle, "Total rows: {}", summary.total);
    let _ = writeln!(handle, "  Kept:      {}", summary.kept);
    let _ = writeln!(handle, "  Discarded: {}", summary.discarded);

    if let Some(report) = copied {
        let _ = writeln!(handle);
        let _ = writeln!(handle, "Materialized: {} copied", report.copied.len());
        if !report.failures.is_empty() {
            let _ = writeln!(handle, "Copy failures ({}):", report.failures.len());
            for failure in &report.failures {
                let _ = writeln!(handle, "  {} - {}", failure.abs_path, failure.reason);
            }
        }
    }
}

fn print_validation_summary(results: &[ValidationResult]) {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    let count = |status: ValidationStatus| results.iter().filter(|r| r.status == status).count();

    let _ = writeln!(handle);
    let _ = writeln!(handle, "Validation");
    let _ = writeln!(handle, "==========");
    let _ = writeln!(handle);
    let _ = writeln!(handle, "Artifacts: {}", results.len());
    let _ = writeln!(handle, "  PASS: {}", count(ValidationStatus::Pass));
    let _ = writeln!(handle, "  FLAG: {}", count(ValidationStatus::Flag));
    let _ = writeln!(handle, "  FAIL: {}", count(ValidationStatus::Fail));

    for result in results.iter().filter(|r| r.status != ValidationStatus::Pass) {
        let _ = writeln!(
            handle,
            "  [{}] {} - {}",
            result.status.label(),
            result.filepath,
            result.reasons.join("; ")
        );
    }

    let quarantined = quarantined_paths(results);
    if !quarantined.is_empty() {
        let _ = writeln!(handle);
        let _ = writeln!(handle, "Quarantined ({}):", quarantined.len());
        for path in &quarantined {
            let _ = writeln!(handle, "  {path}");
        }
    }
}

fn print_run_summary(report: &DriverReport) {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();

    let _ = writeln!(handle);
    let _ = writeln!(handle, "Run {}", report.run_id);
    let _ = writeln!(handle, "  Staged:     {}", report.staged_count());
    let _ = writeln!(handle, "  Failed:     {}", report.failed_count());
    let _ = writeln!(
        handle,
        "  Usable:     {}",
        report.validations.iter().filter(|r| r.is_usable()).count()
    );
    let _ = writeln!(handle, "  Persisted:  {}", report.persisted.len());
    for tool in &report.tool_reports {
        let _ = writeln!(handle, "  Check {}: {}", tool.name, tool.outcome.label());
    }
    for stage in &report.stage_errors {
        let _ = writeln!(handle, "  Stage error: {stage}");
    }
}

fn print_written(paths: &[&Utf8PathBuf]) {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    let _ = writeln!(handle);
    for path in paths {
        let _ = writeln!(handle, "Wrote {path}");
    }
}

// =============================================================================
// MAIN ENTRY POINT
// =============================================================================

/// Application entry point.
fn main() -> color_eyre::Result<ExitCode> {
    // 1. Install color-eyre FIRST (before any potential panics)
    color_eyre::install()?;

    // 2. Parse CLI arguments
    let cli = Cli::parse();

    // 3. Initialize tracing (handles --no-color for log output)
    init_tracing(cli.verbose, cli.no_color);

    // 4. Load configuration and apply overrides
    let config = build_config(&cli)?;
    let run_id = cli.run_id.clone().unwrap_or_else(new_run_id);
    info!(run_id = %run_id, dry_run = config.pipeline.dry_run, "Starting");

    // 5. Route to appropriate command
    match &cli.command {
        Commands::Plan { inventory } => {
            run_plan(&config, &run_id, &inventory.inventories).map(|()| ExitCode::SUCCESS)
        }
        Commands::Dedup {
            master,
            materialize,
            ..
        } => run_dedup(&config, &run_id, master, materialize.as_deref()),
        Commands::Validate { paths, stage, .. } => {
            run_validate(&config, &run_id, paths, stage.as_deref())
        }
        Commands::Stage { name, notes } => run_stage(&config, &run_id, name, notes),
        Commands::Run {
            inventory,
            source_root,
        } => run_pipeline(&config, &run_id, &inventory.inventories, source_root),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("mg-migrate").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_plan_overrides() {
        let cli = parse(&[
            "plan",
            "inv.txt",
            "--size-min",
            "10",
            "--exclude",
            "vendor/",
            "--same-dir-only",
            "--output-dir",
            "out",
        ]);
        let config = build_config(&cli).unwrap();
        assert_eq!(config.plan.size_min, 10);
        assert_eq!(config.plan.exclude_pattern.as_deref(), Some("vendor/"));
        assert!(config.plan.same_dir_only);
        assert_eq!(config.pipeline.output_dir, Utf8PathBuf::from("out"));
    }

    #[test]
    fn test_dedup_precedence_flag_replaces_config() {
        let cli = parse(&["dedup", "master.csv", "--precedence", "/mnt/b,/mnt/a"]);
        let config = build_config(&cli).unwrap();
        assert_eq!(config.dedup.precedence, vec!["/mnt/b", "/mnt/a"]);
    }

    #[test]
    fn test_duplicate_precedence_is_rejected() {
        let cli = parse(&["dedup", "master.csv", "--precedence", "/mnt/a,/mnt/a"]);
        assert!(build_config(&cli).is_err());
    }

    #[test]
    fn test_config_file_then_flags() {
        let tmp = TempDir::new().unwrap();
        let path = Utf8PathBuf::from_path_buf(tmp.path().join("mg.json")).unwrap();
        let mut file_config = Config::default();
        file_config.pipeline.output_dir = Utf8PathBuf::from("from-file");
        file_config.validate.quarantine_dir = Utf8PathBuf::from("q-file");
        std::fs::write(&path, serde_json::to_string(&file_config).unwrap()).unwrap();

        let cli = parse(&[
            "--config",
            path.as_str(),
            "--dry-run",
            "validate",
            "a.md",
            "--quarantine-dir",
            "q-flag",
        ]);
        let config = build_config(&cli).unwrap();
        assert_eq!(config.pipeline.output_dir, Utf8PathBuf::from("from-file"));
        assert_eq!(config.validate.quarantine_dir, Utf8PathBuf::from("q-flag"));
        assert!(config.pipeline.dry_run);
    }

    #[test]
    fn test_plan_inventories_reads_every_file() {
        let tmp = TempDir::new().unwrap();
        let dir = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).unwrap();
        let a = dir.join("a.txt");
        let b = dir.join("b.txt");
        std::fs::write(&a, "src/App.tsx | 10 | 2024-01-01 00:00:00\n").unwrap();
        std::fs::write(&b, "src/App.js | 10 | 2024-01-01 00:00:00\nsrc/Widget.jsx | 9 | x\n")
            .unwrap();

        let plan = plan_inventories(&Config::default(), &[a, b]).unwrap();
        assert_eq!(plan.keep_typed, [Utf8PathBuf::from("src/App.tsx")]);
        assert_eq!(plan.drop_already_converted, [Utf8PathBuf::from("src/App.js")]);
        assert_eq!(plan.convert_candidates, [Utf8PathBuf::from("src/Widget.jsx")]);
    }

    #[test]
    fn test_unknown_stage_exits_with_usage_status() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.pipeline.output_dir = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).unwrap();

        let code = run_stage(&config, "20260101-093000", "bogus", &[]).unwrap();
        assert_eq!(code, ExitCode::from(EXIT_USAGE));
        assert!(!config.pipeline.output_dir.join("20260101-093000").exists());

        let code = run_stage(&config, "20260101-093000", "qa", &[]).unwrap();
        assert_eq!(code, ExitCode::SUCCESS);
    }

    #[test]
    fn test_missing_inventory_is_an_error() {
        let err = plan_inventories(&Config::default(), &[Utf8PathBuf::from("/no/such/inventory")])
            .unwrap_err();
        assert!(err.to_string().contains("/no/such/inventory"));
    }
}

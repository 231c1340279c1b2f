//! Core types, configuration, and utilities for the mg-migration engine.
//!
//! This crate provides the foundational types shared across the workspace:
//!
//! - Domain types ([`FileEntry`], [`ConversionTarget`], [`PlanResult`],
//!   [`MasterDedupRow`], [`ValidationResult`], [`RunState`])
//! - Configuration structures threaded explicitly through every call
//! - [`ConfigError`] for configuration loading and validation
//! - Type aliases for `FxHashMap`/`FxHashSet`
//! - The ordered test-file rule table used by planning and target resolution
//! - Output-path reservation and file-move helpers for report writers

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod hash;
pub mod paths;
pub mod rules;
pub mod types;

pub use config::{
    CommandSpec, Config, DedupConfig, InventoryConfig, PipelineConfig, PlanConfig, ValidateConfig,
};
pub use error::ConfigError;
pub use hash::{FxHashMap, FxHashSet, fx_hash_map, fx_hash_set};
pub use rules::{PathMatcher, PathRule, PathRuleTable, TEST_FILE_RULES, TestConvention};
pub use types::{
    ConversionTarget, DEFAULT_STAGES, DedupOutcome, DedupSummary, DiscardedRow, FileEntry,
    IdentityKey, MasterDedupRow, PlanCounts, PlanResult, RunState, TargetKind, ValidationResult,
    ValidationStatus,
};

//! Domain types for the mg-migration engine.
//!
//! # Module Organization
//!
//! - [`entry`] - Inventory entries used by planning
//! - [`target`] - Resolved conversion targets
//! - [`plan`] - Output of one planning call
//! - [`master`] - Multi-root inventory rows and reconciliation output
//! - [`validation`] - Artifact validation verdicts
//! - [`run`] - Pipeline run state
//!
//! All public types are re-exported here and at the crate root:
//!
//! ```
//! use mg_core::{FileEntry, PlanResult, RunState, ValidationStatus};
//! ```

pub mod entry;
pub mod master;
pub mod plan;
pub mod run;
pub mod target;
pub mod validation;

pub use entry::FileEntry;
pub use master::{DedupOutcome, DedupSummary, DiscardedRow, IdentityKey, MasterDedupRow};
pub use plan::{PlanCounts, PlanResult};
pub use run::{DEFAULT_STAGES, RunState};
pub use target::{ConversionTarget, TargetKind};
pub use validation::{ValidationResult, ValidationStatus};

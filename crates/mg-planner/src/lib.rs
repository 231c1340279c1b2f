//! Dedup planning and multi-root reconciliation for mg-migration.
//!
//! # Overview
//!
//! - [`DedupPlanner`] collapses duplicate inventory entries and sorts the
//!   survivors into four disjoint lists: typed files to keep, legacy files
//!   already converted, legacy files to convert, and legacy tests to skip.
//! - [`MasterDeduplicator`] reconciles rows from several scan roots, keeping
//!   one row per identity key according to a root precedence list.
//! - [`materialize`] copies kept rows into a destination tree.
//!
//! # Example
//!
//! ```
//! use mg_core::InventoryConfig;
//! use mg_inventory::InventoryParser;
//! use mg_planner::DedupPlanner;
//!
//! let inventory = "\
//! src/App.js | 100 | 2024-01-01 00:00:00
//! src/App.tsx | 140 | 2024-02-01 00:00:00
//! src/Widget.jsx | 80 | 2024-01-01 00:00:00
//! ";
//! let config = InventoryConfig::default();
//! let entries = InventoryParser::new(&config).parse(inventory);
//!
//! let plan = DedupPlanner::new().plan(&entries, 0, None, false)?;
//! assert_eq!(plan.keep_typed[0].as_str(), "src/App.tsx");
//! assert_eq!(plan.drop_already_converted[0].as_str(), "src/App.js");
//! assert_eq!(plan.convert_candidates[0].as_str(), "src/Widget.jsx");
//! # Ok::<(), mg_planner::PlanError>(())
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

mod error;
mod master;
mod planner;

pub use error::PlanError;
pub use master::{MasterDeduplicator, MaterializeFailure, MaterializeReport, materialize};
pub use planner::DedupPlanner;

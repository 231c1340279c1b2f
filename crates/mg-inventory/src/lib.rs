//! Inventory parsing and target resolution for mg-migration.
//!
//! This crate turns raw inventory text into structured entries and maps
//! legacy paths to their typed counterparts:
//!
//! - [`InventoryParser`] - pipe-delimited `path | size | timestamp` rows
//! - [`read_master_csv`] - multi-root master inventory CSV
//! - [`TargetResolver`] - pure legacy → typed path mapping
//!
//! # Example
//!
//! ```
//! use mg_core::InventoryConfig;
//! use mg_inventory::{InventoryParser, TargetResolver};
//!
//! let config = InventoryConfig::default();
//! let parser = InventoryParser::new(&config);
//! let entries = parser.parse("src/Widget.jsx | 812 | 2024-05-01 10:00:00\n");
//! assert_eq!(entries.len(), 1);
//!
//! let (target, test_target) = TargetResolver::new().resolve(&entries[0].path);
//! assert_eq!(target.as_str(), "src/Widget.tsx");
//! assert!(test_target.is_none());
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

mod error;
mod inventory;
mod master;
mod resolver;

pub use error::InventoryError;
pub use inventory::{InventoryParser, parse_timestamp};
pub use master::{MASTER_COLUMNS, read_master_csv, read_master_csv_path};
pub use resolver::{EXTENSION_MAPPINGS, ExtensionMapping, TYPED_EXTENSIONS, TargetResolver};

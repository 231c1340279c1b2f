//! Artifact validation for mg-migration.
//!
//! Every pipeline artifact gets a [`ValidationResult`](mg_core::ValidationResult)
//! with a status of `PASS`, `FLAG` or `FAIL`:
//!
//! | Rule | Outcome |
//! |------|---------|
//! | file missing | `FAIL`, not quarantined |
//! | empty, oversized, or not UTF-8 | `FAIL`, quarantined |
//! | required headers missing | `FLAG`, reason names them |
//! | stage mismatch or unknown | `FLAG` |
//! | one junk rule matches | `FLAG` |
//! | two or more junk rules match | `FAIL`, quarantined |
//! | code in a prose stage | `FLAG` |
//!
//! The judgment ([`ArtifactValidator::assess`]) is pure. The file move goes
//! through a [`Quarantine`] implementation supplied by the caller.

#![deny(clippy::all)]
#![warn(missing_docs)]

mod error;
pub mod headers;
pub mod patterns;
mod quarantine;
mod validator;

pub use error::ValidateError;
pub use headers::{ArtifactHeaders, REQUIRED_HEADERS};
pub use quarantine::{FsQuarantine, Quarantine};
pub use validator::{ArtifactValidator, Assessment, Probe, quarantined_paths};

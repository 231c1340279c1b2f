//! Error types for the mg-planner crate.
//!
//! Planning itself never fails on data: bad rows were dropped at parse time
//! and classification always produces a result. The errors here are
//! configuration errors the caller must fix.

/// Errors that can occur when setting up a planning call.
///
/// # Examples
///
/// ```
/// use mg_planner::PlanError;
///
/// let err = PlanError::DuplicatePrecedenceRoot("/mnt/a".to_owned());
/// assert!(err.to_string().contains("/mnt/a"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    /// The exclude pattern is not a valid regular expression.
    #[error("invalid exclude pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The pattern as supplied.
        pattern: String,
        /// The regex compilation error.
        #[source]
        source: regex::Error,
    },

    /// A root appears more than once in the precedence list.
    #[error("root '{0}' appears more than once in the precedence list")]
    DuplicatePrecedenceRoot(String),
}

//! The quarantine capability.
//!
//! Validation decides *whether* an artifact is quarantined; a [`Quarantine`]
//! implementation performs the move. [`FsQuarantine`] moves files into a
//! directory and never overwrites: when the name is taken, the artifact lands
//! at `<stem>.<n>.<ext>` with the smallest free `n`.

use camino::{Utf8Path, Utf8PathBuf};
use mg_core::paths::{move_file, next_numbered_path};
use tracing::info;

use crate::error::ValidateError;

/// Moves failed artifacts out of the pipeline.
pub trait Quarantine {
    /// Moves `path` into quarantine and returns its new location.
    ///
    /// # Errors
    ///
    /// Returns an error if the artifact could not be moved; it then stays
    /// where it was.
    fn quarantine(&self, path: &Utf8Path) -> Result<Utf8PathBuf, ValidateError>;
}

/// Quarantines artifacts into a directory on the local filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsQuarantine {
    dir: Utf8PathBuf,
}

impl FsQuarantine {
    /// Creates a quarantine rooted at `dir`. The directory is created on first use.
    pub fn new(dir: impl Into<Utf8PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl Quarantine for FsQuarantine {
    fn quarantine(&self, path: &Utf8Path) -> Result<Utf8PathBuf, ValidateError> {
        let file_name = path
            .file_name()
            .ok_or_else(|| ValidateError::NoFileName(path.to_path_buf()))?;
        let destination = next_numbered_path(&self.dir, file_name);

        move_file(path, &destination)
            .map_err(|e| ValidateError::quarantine(path, destination.clone(), e))?;

        info!(from = %path, to = %destination, "Quarantined artifact");
        Ok(destination)
    }
}

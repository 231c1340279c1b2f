//! Path helpers shared by every writer in the workspace.
//!
//! All report and artifact writers follow one discipline for the shared
//! output directory: create the file if the name is free, otherwise write to a
//! sibling stamped with the current run identifier, and never overwrite.
//! Two runs stamped in the same second can still collide on the stamped
//! name; [`reserve_output_path`] then falls back to a numbered variant, but
//! there is no cross-process locking.

use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};

/// Format of run identifiers: UTC, second resolution.
const RUN_ID_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Returns the run identifier for a given instant, e.g. `20260101-093000`.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use mg_core::paths::run_id_at;
///
/// let at = Utc.with_ymd_and_hms(2026, 1, 1, 9, 30, 0).unwrap();
/// assert_eq!(run_id_at(at), "20260101-093000");
/// ```
#[must_use]
pub fn run_id_at(at: DateTime<Utc>) -> String {
    at.format(RUN_ID_FORMAT).to_string()
}

/// Returns a fresh run identifier for the current instant.
#[must_use]
pub fn new_run_id() -> String {
    run_id_at(Utc::now())
}

/// Replaces Windows separators with `/`.
///
/// # Examples
///
/// ```
/// use mg_core::paths::normalize_separators;
///
/// assert_eq!(normalize_separators(r"src\app\App.js"), "src/app/App.js");
/// ```
#[must_use]
pub fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}

/// Comparison key for a scan root: trailing separators removed.
///
/// A root made only of separators is returned unchanged.
///
/// ```
/// use mg_core::paths::root_key;
///
/// assert_eq!(root_key("/mnt/a/"), root_key("/mnt/a"));
/// assert_eq!(root_key("/"), "/");
/// ```
#[must_use]
pub fn root_key(root: &str) -> &str {
    let trimmed = root.trim_end_matches(['/', '\\']);
    if trimmed.is_empty() { root } else { trimmed }
}

/// Splits a file name into `(stem, extension)` at the last dot.
///
/// Leading dots do not count, so `.eslintrc` has no extension.
#[must_use]
pub fn split_file_name(file_name: &str) -> (&str, Option<&str>) {
    match file_name.rfind('.') {
        Some(idx) if idx > 0 => (&file_name[..idx], Some(&file_name[idx + 1..])),
        _ => (file_name, None),
    }
}

fn with_infix(file_name: &str, infix: &str) -> String {
    match split_file_name(file_name) {
        (stem, Some(ext)) => format!("{stem}.{infix}.{ext}"),
        (stem, None) => format!("{stem}.{infix}"),
    }
}

/// Picks the path a writer should create for `file_name` inside `dir`.
///
/// Returns `dir/file_name` when nothing exists there, otherwise
/// `dir/<stem>.<run_id>.<ext>`, otherwise `dir/<stem>.<run_id>.<n>.<ext>` for
/// the smallest free `n`.
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use mg_core::paths::reserve_output_path;
///
/// let path = reserve_output_path(Utf8Path::new("/nonexistent"), "plan.json", "20260101-000000");
/// assert_eq!(path.as_str(), "/nonexistent/plan.json");
/// ```
#[must_use]
pub fn reserve_output_path(dir: &Utf8Path, file_name: &str, run_id: &str) -> Utf8PathBuf {
    let plain = dir.join(file_name);
    if !plain.exists() {
        return plain;
    }
    let stamped = with_infix(file_name, run_id);
    let candidate = dir.join(&stamped);
    if !candidate.exists() {
        return candidate;
    }
    next_numbered_path(dir, &stamped)
}

/// Returns `dir/file_name` if free, else `dir/<stem>.<n>.<ext>` for the smallest free `n >= 1`.
#[must_use]
pub fn next_numbered_path(dir: &Utf8Path, file_name: &str) -> Utf8PathBuf {
    let plain = dir.join(file_name);
    if !plain.exists() {
        return plain;
    }
    (1u32..)
        .map(|n| dir.join(with_infix(file_name, &n.to_string())))
        .find(|candidate| !candidate.exists())
        .unwrap_or(plain)
}

/// Moves a file, creating the destination's parent directories.
///
/// Uses a rename (atomic on one filesystem) and falls back to copy-then-remove
/// when the rename fails, e.g. across devices.
///
/// # Errors
///
/// Returns the underlying I/O error if neither strategy succeeds.
pub fn move_file(from: &Utf8Path, to: &Utf8Path) -> io::Result<()> {
    if let Some(parent) = to.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if std::fs::rename(from, to).is_ok() {
        return Ok(());
    }
    std::fs::copy(from, to)?;
    std::fs::remove_file(from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn utf8_dir(dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap()
    }

    #[test]
    fn test_run_id_format() {
        let at = Utc.with_ymd_and_hms(2026, 10, 19, 7, 5, 3).unwrap();
        assert_eq!(run_id_at(at), "20261019-070503");
    }

    #[test]
    fn test_split_file_name() {
        assert_eq!(split_file_name("App.test.jsx"), ("App.test", Some("jsx")));
        assert_eq!(split_file_name("Makefile"), ("Makefile", None));
        assert_eq!(split_file_name(".eslintrc"), (".eslintrc", None));
    }

    #[test]
    fn test_reserve_output_path_prefers_plain_name() {
        let dir = TempDir::new().unwrap();
        let root = utf8_dir(&dir);
        assert_eq!(
            reserve_output_path(&root, "plan.json", "r1"),
            root.join("plan.json")
        );
    }

    #[test]
    fn test_reserve_output_path_never_overwrites() {
        let dir = TempDir::new().unwrap();
        let root = utf8_dir(&dir);
        std::fs::write(root.join("plan.json"), "{}").unwrap();

        let stamped = reserve_output_path(&root, "plan.json", "r1");
        assert_eq!(stamped, root.join("plan.r1.json"));

        std::fs::write(&stamped, "{}").unwrap();
        let numbered = reserve_output_path(&root, "plan.json", "r1");
        assert_eq!(numbered, root.join("plan.r1.1.json"));
    }

    #[test]
    fn test_next_numbered_path() {
        let dir = TempDir::new().unwrap();
        let root = utf8_dir(&dir);
        std::fs::write(root.join("a.md"), "").unwrap();
        std::fs::write(root.join("a.1.md"), "").unwrap();
        assert_eq!(next_numbered_path(&root, "a.md"), root.join("a.2.md"));
    }

    #[test]
    fn test_move_file_creates_parent() {
        let dir = TempDir::new().unwrap();
        let root = utf8_dir(&dir);
        let from = root.join("bad.txt");
        std::fs::write(&from, "junk").unwrap();

        let to = root.join("quarantine/nested/bad.txt");
        move_file(&from, &to).unwrap();

        assert!(!from.exists());
        assert_eq!(std::fs::read_to_string(&to).unwrap(), "junk");
    }

    #[test]
    fn test_move_missing_file_errors() {
        let dir = TempDir::new().unwrap();
        let root = utf8_dir(&dir);
        assert!(move_file(&root.join("missing"), &root.join("dest")).is_err());
    }
}

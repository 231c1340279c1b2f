//! Pipe-delimited inventory parsing.
//!
//! Inventory blobs carry one row per line: `path | size | timestamp`.
//! Header lines, markdown separators, and anything else that doesn't fit the
//! row shape are skipped without error. Only paths whose extension is allowed
//! by [`InventoryConfig`] are kept.
//!
//! # Timestamps
//!
//! Timestamps are parsed leniently (see [`parse_timestamp`]). A timestamp that
//! can't be parsed becomes the Unix epoch, which makes that entry the oldest
//! in its duplicate group. Inventories with malformed timestamps can therefore
//! pick a different keeper than the file system would suggest.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use mg_core::{FileEntry, InventoryConfig};
use tracing::debug;

/// Naive datetime layouts accepted after RFC 3339, tried in order.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
];

/// Parses pipe-delimited inventory text into [`FileEntry`] values.
///
/// # Examples
///
/// ```
/// use mg_core::InventoryConfig;
/// use mg_inventory::InventoryParser;
///
/// let text = "\
/// path | size | timestamp
/// -----|------|----------
/// src/App.js | 120 | 2024-01-02 03:04:05
/// src/styles.css | 99 | 2024-01-02 03:04:05
/// garbage line
/// ";
///
/// let config = InventoryConfig::default();
/// let entries = InventoryParser::new(&config).parse(text);
/// assert_eq!(entries.len(), 1);
/// assert_eq!(entries[0].path.as_str(), "src/App.js");
/// assert_eq!(entries[0].size, 120);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct InventoryParser<'a> {
    config: &'a InventoryConfig,
}

impl<'a> InventoryParser<'a> {
    /// Creates a parser that keeps the extensions allowed by `config`.
    #[must_use]
    pub const fn new(config: &'a InventoryConfig) -> Self {
        Self { config }
    }

    /// Parses one blob. Rows that don't conform are skipped.
    #[must_use]
    pub fn parse(&self, text: &str) -> Vec<FileEntry> {
        let mut entries = Vec::new();
        let mut skipped = 0usize;
        let mut filtered = 0usize;

        for line in text.lines() {
            match parse_row(line) {
                Some(entry) if self.config.allows(&entry.extension) => entries.push(entry),
                Some(_) => filtered += 1,
                None => skipped += 1,
            }
        }

        debug!(
            kept = entries.len(),
            skipped, filtered, "Parsed inventory blob"
        );
        entries
    }

    /// Parses several blobs and concatenates the entries in input order.
    #[must_use]
    pub fn parse_all<'t>(&self, blobs: impl IntoIterator<Item = &'t str>) -> Vec<FileEntry> {
        blobs.into_iter().flat_map(|blob| self.parse(blob)).collect()
    }
}

/// Parses a single `path | size | timestamp` row.
///
/// Leading and trailing pipes (markdown table style) are tolerated. The size
/// column must be an unsigned integer; this is what rejects header rows.
fn parse_row(line: &str) -> Option<FileEntry> {
    let trimmed = line.trim().trim_start_matches('|').trim_end_matches('|');
    let mut columns = trimmed.split('|').map(str::trim);

    let path = columns.next().filter(|p| !p.is_empty())?;
    let size = columns.next()?.parse::<u64>().ok()?;
    let timestamp = columns.next()?;
    if columns.next().is_some() {
        return None;
    }

    Some(FileEntry::new(path, size, parse_timestamp(timestamp)))
}

/// Parses an ISO-like timestamp, falling back to the Unix epoch.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM[:SS[.fff]]` (space or `T` separated),
/// `YYYY/MM/DD HH:MM:SS`, and bare dates. Naive values are read as UTC.
///
/// # Examples
///
/// ```
/// use chrono::{DateTime, Utc};
/// use mg_inventory::parse_timestamp;
///
/// assert_eq!(parse_timestamp("2024-01-02 03:04:05").timestamp(), 1_704_164_645);
/// assert_eq!(parse_timestamp("yesterday"), DateTime::<Utc>::UNIX_EPOCH);
/// ```
#[must_use]
pub fn parse_timestamp(text: &str) -> DateTime<Utc> {
    let text = text.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return parsed.with_timezone(&Utc);
    }
    if let Some(naive) = DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
    {
        return naive.and_utc();
    }
    if let Some(midnight) = NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
    {
        return midnight.and_utc();
    }

    debug!(timestamp = text, "Unparseable timestamp, using epoch");
    DateTime::<Utc>::UNIX_EPOCH
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn parser_config() -> InventoryConfig {
        InventoryConfig::default()
    }

    #[test]
    fn test_parse_row_basic() {
        let entry = parse_row("src/App.js | 120 | 2024-01-02 03:04:05").unwrap();
        assert_eq!(entry.path.as_str(), "src/App.js");
        assert_eq!(entry.size, 120);
        assert_eq!(
            entry.modified,
            Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()
        );
    }

    #[test]
    fn test_parse_row_markdown_table() {
        let entry = parse_row("| src/App.jsx | 7 | 2024-01-02T03:04:05Z |").unwrap();
        assert_eq!(entry.extension, "jsx");
        assert_eq!(entry.size, 7);
    }

    #[test]
    fn test_parse_row_rejects_nonconforming() {
        assert!(parse_row("path | size | timestamp").is_none());
        assert!(parse_row("---|---|---").is_none());
        assert!(parse_row("src/App.js | 12").is_none());
        assert!(parse_row("src/App.js | 12 | 2024-01-01 | extra").is_none());
        assert!(parse_row(" | 12 | 2024-01-01").is_none());
        assert!(parse_row("").is_none());
        assert!(parse_row("src/App.js | -5 | 2024-01-01").is_none());
    }

    #[test]
    fn test_parse_filters_extensions() {
        let config = parser_config();
        let text = "a/App.js | 1 | 2024-01-01\na/App.css | 1 | 2024-01-01\na/App.TSX | 1 | 2024-01-01\n";
        let entries = InventoryParser::new(&config).parse(text);
        let paths: Vec<_> = entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["a/App.js", "a/App.TSX"]);
    }

    #[test]
    fn test_parse_normalizes_backslashes() {
        let config = parser_config();
        let entries = InventoryParser::new(&config).parse(r"src\lib\util.mjs | 3 | 2024-01-01");
        assert_eq!(entries[0].path.as_str(), "src/lib/util.mjs");
        assert_eq!(entries[0].directory, "src/lib");
    }

    #[test]
    fn test_parse_all_keeps_input_order() {
        let config = parser_config();
        let entries = InventoryParser::new(&config).parse_all([
            "b.js | 1 | 2024-01-01",
            "a.js | 1 | 2024-01-01",
        ]);
        assert_eq!(entries[0].path.as_str(), "b.js");
        assert_eq!(entries[1].path.as_str(), "a.js");
    }

    #[test]
    fn test_malformed_timestamp_is_epoch() {
        let entry = parse_row("a.js | 1 | not a date").unwrap();
        assert_eq!(entry.modified, DateTime::<Utc>::UNIX_EPOCH);
    }

    #[test]
    fn test_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 9, 14, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2024-03-09 14:30:00"), expected);
        assert_eq!(parse_timestamp("2024-03-09T14:30:00"), expected);
        assert_eq!(parse_timestamp("2024-03-09 14:30"), expected);
        assert_eq!(parse_timestamp("2024/03/09 14:30:00"), expected);
        assert_eq!(parse_timestamp("2024-03-09T16:30:00+02:00"), expected);
        assert_eq!(parse_timestamp("2024-03-09 14:30:00.000"), expected);
        assert_eq!(
            parse_timestamp("2024-03-09"),
            Utc.with_ymd_and_hms(2024, 3, 9, 0, 0, 0).unwrap()
        );
    }
}

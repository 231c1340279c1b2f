//! `Key: Value` header parsing for stage artifacts.
//!
//! Artifacts carry a small header block near the top. Headers may sit inside
//! a comment, so leading `//`, `#`, `/*` and `*` markers are stripped before a
//! line is split at its first colon.

/// Header names every artifact must carry.
pub const REQUIRED_HEADERS: [&str; 5] = ["Run-ID", "Stage", "Timestamp", "Source", "Model"];

const COMMENT_MARKERS: [&str; 4] = ["/*", "//", "#", "*"];

/// Headers found in the leading lines of an artifact, in file order.
///
/// # Examples
///
/// ```
/// use mg_validate::ArtifactHeaders;
///
/// let headers = ArtifactHeaders::parse("// Run-ID: 20260101-000000\n// Stage: review\n", 20);
/// assert_eq!(headers.get("stage"), Some("review"));
/// assert_eq!(headers.missing(), vec!["Timestamp", "Source", "Model"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactHeaders {
    fields: Vec<(String, String)>,
}

impl ArtifactHeaders {
    /// Parses headers from the first `scan_lines` lines of `text`.
    ///
    /// The first occurrence of a key wins.
    #[must_use]
    pub fn parse(text: &str, scan_lines: usize) -> Self {
        let mut fields: Vec<(String, String)> = Vec::new();
        for line in text.lines().take(scan_lines) {
            let Some((key, value)) = parse_line(line) else {
                continue;
            };
            if !fields.iter().any(|(seen, _)| seen.eq_ignore_ascii_case(key)) {
                fields.push((key.to_owned(), value.to_owned()));
            }
        }
        Self { fields }
    }

    /// Returns the value for `name`, matched case-insensitively.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Returns the required headers that are absent or empty, in canonical order.
    #[must_use]
    pub fn missing(&self) -> Vec<&'static str> {
        REQUIRED_HEADERS
            .iter()
            .copied()
            .filter(|name| self.get(name).is_none_or(str::is_empty))
            .collect()
    }
}

fn parse_line(line: &str) -> Option<(&str, &str)> {
    let mut rest = line.trim_start();
    for marker in COMMENT_MARKERS {
        if let Some(stripped) = rest.strip_prefix(marker) {
            rest = stripped.trim_start();
            break;
        }
    }

    let (key, value) = rest.split_once(':')?;
    let key = key.trim();
    if key.is_empty()
        || !key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return None;
    }

    let value = value.trim();
    let value = value.strip_suffix("*/").map_or(value, str::trim_end);
    Some((key, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = "\
/*
 * Run-ID: 20260101-093000
 * Stage: generate
 * Timestamp: 2026-01-01T09:30:00Z
 * Source: src/App.jsx
 * Model: converter */
export const App = () => null;
";

    #[test]
    fn test_parse_comment_block() {
        let headers = ArtifactHeaders::parse(FULL, 20);
        assert!(headers.missing().is_empty());
        assert_eq!(headers.get("Run-ID"), Some("20260101-093000"));
        assert_eq!(headers.get("Model"), Some("converter"));
        assert_eq!(headers.get("source"), Some("src/App.jsx"));
    }

    #[test]
    fn test_missing_lists_all_when_absent() {
        let headers = ArtifactHeaders::parse("plain prose\nno headers here.\n", 20);
        assert_eq!(headers.missing(), REQUIRED_HEADERS.to_vec());
    }

    #[test]
    fn test_scan_window_is_respected() {
        let mut text = "filler line\n".repeat(25);
        text.push_str("Run-ID: late\n");
        let headers = ArtifactHeaders::parse(&text, 20);
        assert_eq!(headers.get("Run-ID"), None);
    }

    #[test]
    fn test_empty_value_counts_as_missing() {
        let headers = ArtifactHeaders::parse("# Run-ID:\n# Stage: qa\n", 20);
        assert!(headers.missing().contains(&"Run-ID"));
        assert!(!headers.missing().contains(&"Stage"));
    }

    #[test]
    fn test_first_occurrence_wins() {
        let headers = ArtifactHeaders::parse("Stage: review\nstage: persist\n", 20);
        assert_eq!(headers.get("Stage"), Some("review"));
    }

    #[test]
    fn test_code_lines_are_not_headers() {
        let headers = ArtifactHeaders::parse("const url = \"http://x\";\nfoo(a: 1)\n", 20);
        assert_eq!(headers.missing(), REQUIRED_HEADERS.to_vec());
    }
}

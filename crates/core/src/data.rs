//! Data structures for repositories, commits and benchmark artifacts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Number of characters of a commit identifier shown as its display label
pub const SHORT_ID_LEN: usize = 7;

/// A repository owned by an account on the hosting service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Repository {
    /// Repository name (without the owner)
    pub name: String,
    /// Owning account
    pub owner: String,
}

/// A branch of a repository
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Branch {
    /// Branch name
    pub name: String,
    /// Name of the repository the branch belongs to
    pub repository: String,
}

/// A commit as returned by a history query
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Commit {
    /// Full commit identifier (content hash)
    pub id: String,
    /// First line of the commit message
    pub summary: String,
    /// Author date, when the hosting service reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Web URL of the commit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Commit {
    /// Create a commit from an identifier and a full commit message.
    ///
    /// Only the first line of `message` is kept.
    pub fn new(id: impl Into<String>, message: &str) -> Self {
        Self {
            id: id.into(),
            summary: summary_line(message).to_string(),
            timestamp: None,
            url: None,
        }
    }

    /// The identifier truncated for display
    pub fn short_id(&self) -> &str {
        short_id(&self.id)
    }

    /// Dropdown-style label, e.g. `abc1234 - Fix parser`
    pub fn label(&self) -> String {
        format!("{} - {}", self.short_id(), self.summary)
    }
}

/// Truncate a commit identifier to its first [`SHORT_ID_LEN`] characters
pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(SHORT_ID_LEN) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}

/// First line of a commit message
pub fn summary_line(message: &str) -> &str {
    message.lines().next().unwrap_or("")
}

/// One benchmark's measurement in an artifact.
///
/// Artifacts may carry arbitrary extra fields per benchmark; only the
/// median is read.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct BenchmarkMeasurement {
    /// Median execution time in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub median_time: Option<f64>,
}

impl BenchmarkMeasurement {
    pub fn from_median(median_time: f64) -> Self {
        Self {
            median_time: Some(median_time),
        }
    }
}

/// A parsed benchmark artifact: benchmark name -> measurement
pub type BenchmarkDocument = BTreeMap<String, BenchmarkMeasurement>;

/// Parse an artifact body.
///
/// The body must be a JSON object. Each entry is read leniently: an entry
/// whose `median_time` is absent or not a number keeps its name with no
/// measurement, and non-object entries (e.g. a top-level `"version": 2`)
/// are skipped.
pub fn parse_document(content: &str) -> crate::error::Result<BenchmarkDocument> {
    let raw: BTreeMap<String, Value> = serde_json::from_str(content)?;

    Ok(raw
        .into_iter()
        .filter_map(|(name, record)| {
            let median_time = record.as_object()?.get("median_time").and_then(Value::as_f64);
            Some((name, BenchmarkMeasurement { median_time }))
        })
        .collect())
}

/// Artifacts of one query, keyed by commit identifier.
///
/// A commit without an entry had no artifact (or its fetch failed). That is
/// a gap in the data, not an error.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct BenchmarkTable {
    entries: BTreeMap<String, BenchmarkDocument>,
}

impl BenchmarkTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the artifact of a commit, replacing any previous one
    pub fn insert(&mut self, commit: impl Into<String>, document: BenchmarkDocument) {
        self.entries.insert(commit.into(), document);
    }

    pub fn get(&self, commit: &str) -> Option<&BenchmarkDocument> {
        self.entries.get(commit)
    }

    pub fn contains(&self, commit: &str) -> bool {
        self.entries.contains_key(commit)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Commit identifiers that have an artifact, in lexical order
    pub fn commits(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Median time of `benchmark` at `commit`, if both are present
    pub fn median_time(&self, commit: &str, benchmark: &str) -> Option<f64> {
        self.entries
            .get(commit)?
            .get(benchmark)?
            .median_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("0123456789abcdef"), "0123456");
        assert_eq!(short_id("abc"), "abc");
        assert_eq!(short_id(""), "");
    }

    #[test]
    fn test_commit_keeps_first_message_line() {
        let commit = Commit::new("abcdef0123", "Fix parser\n\nLonger body here");
        assert_eq!(commit.summary, "Fix parser");
        assert_eq!(commit.label(), "abcdef0 - Fix parser");
    }

    #[test]
    fn test_commit_empty_message() {
        let commit = Commit::new("abcdef0123", "");
        assert_eq!(commit.summary, "");
    }

    #[test]
    fn test_parse_document_ignores_extra_fields() {
        let doc = parse_document(
            r#"{
                "sumcheck": {"median_time": 0.0025, "mean_time": 0.003, "samples": 100},
                "gkr": {"median_time": 1.5}
            }"#,
        )
        .unwrap();

        assert_eq!(doc.len(), 2);
        assert_eq!(doc["sumcheck"].median_time, Some(0.0025));
        assert_eq!(doc["gkr"].median_time, Some(1.5));
    }

    #[test]
    fn test_parse_document_missing_median() {
        let doc = parse_document(r#"{"broken": {"mean_time": 0.5}}"#).unwrap();
        assert_eq!(doc["broken"].median_time, None);
    }

    #[test]
    fn test_malformed_record_keeps_its_siblings() {
        let doc = parse_document(
            r#"{
                "fft": {"median_time": 0.5},
                "msm": {"median_time": 0.25},
                "broken": {"median_time": "n/a"},
                "version": 2
            }"#,
        )
        .unwrap();

        assert_eq!(doc.len(), 3);
        assert_eq!(doc["fft"].median_time, Some(0.5));
        assert_eq!(doc["msm"].median_time, Some(0.25));
        assert_eq!(doc["broken"].median_time, None);
        assert!(!doc.contains_key("version"));
    }

    #[test]
    fn test_integer_median_is_read() {
        let doc = parse_document(r#"{"sleep": {"median_time": 2}}"#).unwrap();
        assert_eq!(doc["sleep"].median_time, Some(2.0));
    }

    #[test]
    fn test_parse_document_rejects_non_object() {
        assert!(parse_document("[1, 2, 3]").is_err());
        assert!(parse_document("<html>not found</html>").is_err());
    }

    #[test]
    fn test_table_lookup() {
        let mut table = BenchmarkTable::new();
        let mut doc = BenchmarkDocument::new();
        doc.insert("a".to_string(), BenchmarkMeasurement::from_median(2.0));
        table.insert("c1", doc);

        assert_eq!(table.len(), 1);
        assert!(table.contains("c1"));
        assert_eq!(table.median_time("c1", "a"), Some(2.0));
        assert_eq!(table.median_time("c1", "b"), None);
        assert_eq!(table.median_time("c2", "a"), None);
    }
}

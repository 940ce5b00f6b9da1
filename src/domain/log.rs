//! Run narrative: tagged log entries in an append-only log.
//!
//! Every stage reports what happened by appending entries here. The log is
//! the only channel through which failures reach the caller.

use serde::{Deserialize, Serialize};

/// Classification of a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// The caller's human-directed request that opened the run
    Request,

    /// Informational step progress
    Progress,

    /// A stage completed its work
    Success,

    /// A stage failed; the failure was contained
    Error,

    /// Free-text findings returned by the analysis capability
    Analysis,
}

impl EntryKind {
    /// Short lowercase label used in rendered output
    pub fn label(&self) -> &'static str {
        match self {
            Self::Request => "request",
            Self::Progress => "progress",
            Self::Success => "success",
            Self::Error => "error",
            Self::Analysis => "analysis",
        }
    }
}

/// One immutable unit of the run's narrative
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    kind: EntryKind,

    /// Stage that produced the entry (None for caller-supplied entries)
    #[serde(skip_serializing_if = "Option::is_none")]
    stage: Option<String>,

    text: String,
}

impl LogEntry {
    /// Create an entry produced by a stage
    pub fn from_stage(stage: impl Into<String>, kind: EntryKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            stage: Some(stage.into()),
            text: text.into(),
        }
    }

    /// Create the caller's request entry
    pub fn request(text: impl Into<String>) -> Self {
        Self {
            kind: EntryKind::Request,
            stage: None,
            text: text.into(),
        }
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    pub fn stage(&self) -> Option<&str> {
        self.stage.as_deref()
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Append-only ordered log of entries.
///
/// There is no API to remove, replace, or reorder entries: within a run the
/// log only grows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageLog {
    entries: Vec<LogEntry>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry at the end of the log
    pub fn push(&mut self, entry: LogEntry) {
        self.entries.push(entry);
    }

    pub fn progress(&mut self, stage: &str, text: impl Into<String>) {
        self.push(LogEntry::from_stage(stage, EntryKind::Progress, text));
    }

    pub fn success(&mut self, stage: &str, text: impl Into<String>) {
        self.push(LogEntry::from_stage(stage, EntryKind::Success, text));
    }

    pub fn error(&mut self, stage: &str, text: impl Into<String>) {
        self.push(LogEntry::from_stage(stage, EntryKind::Error, text));
    }

    pub fn analysis(&mut self, stage: &str, text: impl Into<String>) {
        self.push(LogEntry::from_stage(stage, EntryKind::Analysis, text));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.last()
    }

    /// Entries of a given kind, in log order
    pub fn by_kind(&self, kind: EntryKind) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter().filter(move |e| e.kind == kind)
    }

    /// Entries appended by the named stage, in log order
    pub fn from_stage<'a>(&'a self, stage: &'a str) -> impl Iterator<Item = &'a LogEntry> {
        self.entries
            .iter()
            .filter(move |e| e.stage.as_deref() == Some(stage))
    }
}

impl<'a> IntoIterator for &'a MessageLog {
    type Item = &'a LogEntry;
    type IntoIter = std::slice::Iter<'a, LogEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_preserves_insertion_order() {
        let mut log = MessageLog::new();
        log.push(LogEntry::request("Analyze data for anomalies"));
        log.success("load", "Loaded 3 records");
        log.analysis("analyze", "nothing unusual");

        let kinds: Vec<EntryKind> = log.iter().map(|e| e.kind()).collect();
        assert_eq!(
            kinds,
            vec![EntryKind::Request, EntryKind::Success, EntryKind::Analysis]
        );
        assert_eq!(log.last().unwrap().text(), "nothing unusual");
    }

    #[test]
    fn test_filters_by_kind_and_stage() {
        let mut log = MessageLog::new();
        log.error("load", "Error loading data: missing");
        log.error("analyze", "No data available");
        log.progress("analyze", "waiting");

        assert_eq!(log.by_kind(EntryKind::Error).count(), 2);
        assert_eq!(log.from_stage("load").count(), 1);
        assert_eq!(log.from_stage("analyze").count(), 2);
        assert_eq!(log.from_stage("report").count(), 0);
    }

    #[test]
    fn test_request_entry_has_no_stage() {
        let entry = LogEntry::request("hello");
        assert_eq!(entry.kind(), EntryKind::Request);
        assert!(entry.stage().is_none());
    }

    #[test]
    fn test_entry_serialization_uses_snake_case_tags() {
        let entry = LogEntry::from_stage("load", EntryKind::Success, "ok");
        let json = serde_json::to_value(&entry).unwrap();

        assert_eq!(json["kind"], "success");
        assert_eq!(json["stage"], "load");

        let request = serde_json::to_value(LogEntry::request("go")).unwrap();
        assert!(request.get("stage").is_none());
    }
}

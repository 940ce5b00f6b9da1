//! Shared state threaded through the pipeline.

use std::path::{Path, PathBuf};

use super::dataset::Dataset;
use super::log::{LogEntry, MessageLog};

/// Request text used when the caller does not supply one
pub const DEFAULT_REQUEST: &str = "Analyze data for anomalies";

/// The record each stage receives, updates, and hands on.
///
/// Ownership moves linearly from the caller through every stage and back, so
/// exactly one instance exists per run.
#[derive(Debug, Clone, Default)]
pub struct SharedState {
    /// Run narrative; only ever appended to
    pub messages: MessageLog,

    /// Requested data source. `None` or an empty path means "use the default".
    /// After a successful load this is the location actually read.
    pub source_path: Option<PathBuf>,

    /// Loaded table; absent until the load stage succeeds
    pub dataset: Option<Dataset>,
}

impl SharedState {
    /// Create the initial state for a run, opening the log with the caller's request
    pub fn new(source_path: Option<PathBuf>, request: impl Into<String>) -> Self {
        let mut messages = MessageLog::new();
        messages.push(LogEntry::request(request));

        Self {
            messages,
            source_path,
            dataset: None,
        }
    }

    /// Initial state for the given source with the default request
    pub fn with_source(source_path: impl Into<PathBuf>) -> Self {
        Self::new(Some(source_path.into()), DEFAULT_REQUEST)
    }

    /// The requested source, treating an empty or blank path as unset
    pub fn requested_source(&self) -> Option<&Path> {
        self.source_path
            .as_deref()
            .filter(|p| !p.as_os_str().to_string_lossy().trim().is_empty())
    }

    /// True when a dataset with at least one row is loaded
    pub fn has_data(&self) -> bool {
        self.dataset.as_ref().is_some_and(|d| !d.is_empty())
    }
}

//! Run reports and rendering.
//!
//! Turns a finished [`SharedState`] into what a host shows: the tagged
//! results, the message history, a dataset preview, or a JSON document.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::{ANALYZE_STAGE, LOAD_STAGE};
use crate::domain::{Dataset, EntryKind, LogEntry, MessageLog, SharedState};

/// How the load stage ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadOutcome {
    Loaded,
    LoadFailed,
    /// No entry from the load stage (it was not part of the pipeline)
    NotRun,
}

/// How the analyze stage ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisOutcome {
    Analyzed,
    AnalysisSkipped,
    AnalysisFailed,
    NotRun,
}

/// Terminal states of a run, derived from the stage-attributed log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub load: LoadOutcome,
    pub analysis: AnalysisOutcome,
}

impl RunSummary {
    pub fn from_log(log: &MessageLog) -> Self {
        let load = match last_kind(log, LOAD_STAGE) {
            Some(EntryKind::Success) => LoadOutcome::Loaded,
            Some(_) => LoadOutcome::LoadFailed,
            None => LoadOutcome::NotRun,
        };

        // An analyze error before any call means there was nothing to analyze
        let analysis = match log.from_stage(ANALYZE_STAGE).last() {
            Some(e) if e.kind() == EntryKind::Analysis => AnalysisOutcome::Analyzed,
            Some(e) if e.kind() == EntryKind::Progress => AnalysisOutcome::AnalysisSkipped,
            Some(_) if load != LoadOutcome::Loaded => AnalysisOutcome::AnalysisSkipped,
            Some(_) => AnalysisOutcome::AnalysisFailed,
            None => AnalysisOutcome::NotRun,
        };

        Self { load, analysis }
    }

    /// True when both stages did their work
    pub fn is_success(&self) -> bool {
        self.load == LoadOutcome::Loaded && self.analysis == AnalysisOutcome::Analyzed
    }
}

fn last_kind(log: &MessageLog, stage: &str) -> Option<EntryKind> {
    log.from_stage(stage).last().map(|e| e.kind())
}

/// Row and column counts of the loaded dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetShape {
    pub rows: usize,
    pub columns: usize,
}

/// Serializable record of a finished run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub source_path: Option<PathBuf>,
    pub summary: RunSummary,
    pub dataset: Option<DatasetShape>,
    pub messages: Vec<LogEntry>,
}

impl RunReport {
    pub fn new(run_id: Uuid, started_at: DateTime<Utc>, state: &SharedState) -> Self {
        Self {
            run_id,
            started_at,
            finished_at: Utc::now(),
            source_path: state.source_path.clone(),
            summary: RunSummary::from_log(&state.messages),
            dataset: state.dataset.as_ref().map(|d| DatasetShape {
                rows: d.row_count(),
                columns: d.column_count(),
            }),
            messages: state.messages.entries().to_vec(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize run report")
    }

    /// Write the report as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)
            .with_context(|| format!("Failed to write report: {}", path.display()))
    }
}

/// Marker shown before an entry of each kind
fn marker(kind: EntryKind) -> &'static str {
    match kind {
        EntryKind::Request => ">",
        EntryKind::Progress => "…",
        EntryKind::Success => "✓",
        EntryKind::Error => "✗",
        EntryKind::Analysis => "🤖",
    }
}

/// Results view: every stage entry with its marker, caller request omitted
pub fn render_text(state: &SharedState) -> String {
    let mut out = String::new();
    for entry in state.messages.iter() {
        if entry.kind() == EntryKind::Request {
            continue;
        }
        let _ = writeln!(out, "{} {}\n", marker(entry.kind()), entry.text());
    }
    out
}

/// Message history view, numbered, including the caller's request
pub fn render_workflow(state: &SharedState) -> String {
    let mut out = String::from("Workflow: 1) load data  2) analyze  3) report\n\n");
    for (i, entry) in state.messages.iter().enumerate() {
        let role = match entry.stage() {
            None => "Human".to_string(),
            Some(stage) => format!("AI/{}", stage),
        };
        let _ = writeln!(
            out,
            "Message {} ({}, {})\n{}\n",
            i + 1,
            role,
            entry.kind().label(),
            entry.text()
        );
    }
    out
}

/// Dataset preview: shape, first rows, column information, numeric statistics
pub fn render_preview(dataset: &Dataset, source: &Path, rows: usize) -> String {
    let mut out = String::new();
    let file_name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| source.display().to_string());

    let _ = writeln!(
        out,
        "Records: {} | Columns: {} | File: {}\n",
        dataset.row_count(),
        dataset.column_count(),
        file_name
    );

    out.push_str(&dataset.headers().join(" | "));
    out.push('\n');
    for row in dataset.head(rows) {
        out.push_str(&row.join(" | "));
        out.push('\n');
    }

    let _ = writeln!(
        out,
        "\n{:<40} {:<8} {:>10} {:>10}",
        "COLUMN", "TYPE", "NON-NULL", "NULL"
    );
    out.push_str(&"-".repeat(71));
    out.push('\n');
    for info in dataset.column_info() {
        let _ = writeln!(
            out,
            "{:<40} {:<8} {:>10} {:>10}",
            info.name,
            info.column_type.label(),
            info.non_null,
            info.null
        );
    }

    let summary = dataset.numeric_summary();
    if !summary.is_empty() {
        let _ = writeln!(
            out,
            "\n{:<40} {:>8} {:>14} {:>14} {:>14} {:>14}",
            "METRIC", "COUNT", "MEAN", "STD", "MIN", "MAX"
        );
        out.push_str(&"-".repeat(109));
        out.push('\n');
        for s in summary {
            let _ = writeln!(
                out,
                "{:<40} {:>8} {:>14.3} {:>14.3} {:>14.3} {:>14.3}",
                s.name, s.count, s.mean, s.std, s.min, s.max
            );
        }
    }

    out
}

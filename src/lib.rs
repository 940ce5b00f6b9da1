//! metric-sentinel - anomaly analysis pipeline for system metrics
//!
//! Loads a CSV of system metrics and asks an external analysis service (an
//! LLM behind an OpenAI-compatible API) to report anomalies.
//!
//! # Architecture
//!
//! The system is a fixed two-stage linear pipeline over a typed state:
//! - `load` reads the dataset into the state
//! - `analyze` sends it to the analysis capability
//! - Every stage appends tagged entries to an append-only message log
//! - Failures are recorded as log entries, never propagated, so every
//!   stage always runs and the caller always gets the full narrative
//!
//! # Modules
//!
//! - `adapters`: External analysis services (OpenAI-compatible)
//! - `core`: Pipeline, stages, analysis instruction
//! - `domain`: Data structures (SharedState, MessageLog, Dataset)
//! - `ingest`: CSV loading and default-source resolution
//! - `report`: Run summaries and rendering
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Analyze the bundled dataset
//! sentinel run
//!
//! # Analyze a specific file, print the JSON report
//! sentinel run --source metrics.csv --format json
//!
//! # Preview a dataset
//! sentinel preview --source metrics.csv
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod ingest;
pub mod report;

// Re-export main types at crate root for convenience
pub use adapters::{AnalysisCapability, AnalysisError, OpenAiAnalyzer};
pub use crate::core::{Pipeline, Stage};
pub use domain::{Dataset, EntryKind, LogEntry, MessageLog, SharedState};
pub use report::{RunReport, RunSummary};

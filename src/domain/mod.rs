//! Domain types for the anomaly pipeline.
//!
//! This module contains the core data structures:
//! - SharedState: The record threaded through every stage
//! - MessageLog: Append-only, tagged run narrative
//! - Dataset: Loaded tabular metrics

pub mod dataset;
pub mod log;
pub mod state;

// Re-export commonly used types
pub use dataset::{ColumnInfo, ColumnType, Dataset, DatasetError, NumericSummary};
pub use log::{EntryKind, LogEntry, MessageLog};
pub use state::{SharedState, DEFAULT_REQUEST};

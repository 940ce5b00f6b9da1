//! The concrete stages of the anomaly pipeline.
//!
//! - `load`: read the dataset (caller path or default)
//! - `analyze`: ask the analysis capability for anomaly findings
//!
//! Neither stage propagates a failure; both record it in the message log.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::adapters::AnalysisCapability;
use crate::domain::SharedState;
use crate::ingest::{load_csv, resolve_source};

use super::pipeline::Stage;
use super::prompt::build_instruction;

pub const LOAD_STAGE: &str = "load";
pub const ANALYZE_STAGE: &str = "analyze";

/// Text of the entry recorded when there is nothing to analyze
pub const NO_DATA_MESSAGE: &str = "No data available";

/// Loads the dataset into the state
pub struct LoadStage {
    /// Used when the state names no source
    default_source: PathBuf,
}

impl LoadStage {
    pub fn new(default_source: impl Into<PathBuf>) -> Self {
        Self {
            default_source: default_source.into(),
        }
    }
}

#[async_trait]
impl Stage for LoadStage {
    fn name(&self) -> &str {
        LOAD_STAGE
    }

    async fn run(&self, mut state: SharedState) -> SharedState {
        let path = resolve_source(state.requested_source(), &self.default_source);

        match load_csv(&path).await {
            Ok(dataset) => {
                let file_name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());

                info!(
                    path = %path.display(),
                    rows = dataset.row_count(),
                    columns = dataset.column_count(),
                    "Loaded dataset"
                );
                state.messages.success(
                    LOAD_STAGE,
                    format!(
                        "Loaded {} records from {} with {} metrics",
                        dataset.row_count(),
                        file_name,
                        dataset.column_count()
                    ),
                );
                state.dataset = Some(dataset);
                state.source_path = Some(path);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to load dataset");
                state
                    .messages
                    .error(LOAD_STAGE, format!("Error loading data: {}", e));
            }
        }

        state
    }
}

/// Sends the dataset to the analysis capability
pub struct AnalyzeStage {
    analyzer: Arc<dyn AnalysisCapability>,
}

impl AnalyzeStage {
    pub fn new(analyzer: Arc<dyn AnalysisCapability>) -> Self {
        Self { analyzer }
    }
}

#[async_trait]
impl Stage for AnalyzeStage {
    fn name(&self) -> &str {
        ANALYZE_STAGE
    }

    async fn run(&self, mut state: SharedState) -> SharedState {
        let Some(dataset) = state.dataset.as_ref() else {
            warn!("No dataset loaded, skipping analysis");
            state.messages.error(ANALYZE_STAGE, NO_DATA_MESSAGE);
            return state;
        };

        if dataset.is_empty() {
            info!("Dataset has no records, skipping analysis");
            state.messages.progress(
                ANALYZE_STAGE,
                format!("{}: dataset has no records", NO_DATA_MESSAGE),
            );
            return state;
        }

        let instruction = build_instruction(dataset.headers());
        info!(capability = self.analyzer.name(), "Requesting analysis");

        match self.analyzer.analyze(dataset, &instruction).await {
            Ok(text) => {
                state
                    .messages
                    .analysis(ANALYZE_STAGE, format!("LLM Analysis:\n\n{}", text));
            }
            Err(e) => {
                warn!(capability = self.analyzer.name(), error = %e, "Analysis failed");
                state
                    .messages
                    .error(ANALYZE_STAGE, format!("Error during analysis: {}", e));
            }
        }

        state
    }
}

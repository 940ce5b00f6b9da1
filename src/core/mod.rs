//! Core pipeline logic.
//!
//! This module contains:
//! - Pipeline: Ordered stage execution over a shared state
//! - Stages: The load and analyze stages
//! - Prompt: The anomaly-analysis instruction

pub mod pipeline;
pub mod prompt;
pub mod stages;

// Re-export commonly used types
pub use pipeline::{Pipeline, Stage};
pub use prompt::{build_instruction, ANALYSIS_INSTRUCTION, METRICS_OF_INTEREST};
pub use stages::{AnalyzeStage, LoadStage, ANALYZE_STAGE, LOAD_STAGE, NO_DATA_MESSAGE};

//! Adapter interfaces for external analysis services.
//!
//! The analyze stage only knows the [`AnalysisCapability`] contract: given a
//! table and a natural-language instruction, return text. How the answer is
//! produced (statistics, ML, an LLM writing pandas) is up to the service.

pub mod openai;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::Dataset;

// Re-export the OpenAI-compatible adapter
pub use openai::OpenAiAnalyzer;

/// Failure of an external analysis call
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("no API key configured (set OPENAI_API_KEY)")]
    MissingApiKey,

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("service returned no analysis")]
    EmptyResponse,

    #[error("{0}")]
    Other(String),
}

/// An external service that analyzes a table against an instruction
#[async_trait]
pub trait AnalysisCapability: Send + Sync {
    /// Human-readable capability name
    fn name(&self) -> &str;

    /// Analyze `dataset` following `instruction`, returning free text
    async fn analyze(&self, dataset: &Dataset, instruction: &str) -> Result<String, AnalysisError>;

    /// Check the service is reachable and configured
    async fn health_check(&self) -> Result<(), AnalysisError> {
        Ok(())
    }
}

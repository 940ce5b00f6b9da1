//! OpenAI-compatible chat-completions adapter.
//!
//! Sends the instruction together with a column overview and the table (as
//! CSV, capped at `max_prompt_rows`) to `POST {base_url}/chat/completions`
//! and returns the first choice's content.

use std::fmt::Write as _;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{AnalysisCapability, AnalysisError};
use crate::config::AnalysisSettings;
use crate::domain::Dataset;

const SYSTEM_PROMPT: &str = "You are a data analyst for infrastructure monitoring. \
You receive a table of system metrics as CSV together with a column overview. \
Answer strictly from the data, quoting concrete values and timestamps.";

/// Analysis capability backed by an OpenAI-compatible LLM endpoint
pub struct OpenAiAnalyzer {
    settings: AnalysisSettings,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Error envelope returned by OpenAI-style APIs
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

impl OpenAiAnalyzer {
    /// Create an analyzer from resolved settings
    ///
    /// Fails if the HTTP client cannot be built (e.g. no TLS backend).
    pub fn new(settings: AnalysisSettings) -> Result<Self, AnalysisError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()?;

        Ok(Self { settings, client })
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    /// Build API URL
    fn api_url(&self, path: &str) -> String {
        format!("{}/{}", self.settings.base_url.trim_end_matches('/'), path)
    }

    fn api_key(&self) -> Result<&str, AnalysisError> {
        self.settings
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(AnalysisError::MissingApiKey)
    }

    fn map_transport(&self, err: reqwest::Error) -> AnalysisError {
        if err.is_timeout() {
            AnalysisError::Timeout(self.settings.timeout_seconds)
        } else {
            AnalysisError::Transport(err)
        }
    }

    /// Turn a non-success response into an `Api` error, preferring the service's message
    async fn api_error(response: reqwest::Response) -> AnalysisError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.error.message)
            .unwrap_or_else(|_| body.trim().to_string());

        AnalysisError::Api { status, message }
    }
}

/// Compose the user message: instruction, shape, column overview, and data
pub(crate) fn build_user_message(
    dataset: &Dataset,
    instruction: &str,
    max_rows: usize,
) -> Result<String, AnalysisError> {
    let mut msg = String::new();
    let _ = writeln!(msg, "{}", instruction.trim());
    let _ = writeln!(
        msg,
        "\nDataset: {} rows x {} columns.",
        dataset.row_count(),
        dataset.column_count()
    );

    msg.push_str("\nColumns:\n");
    for info in dataset.column_info() {
        let _ = writeln!(
            msg,
            "- {} ({}, {} null)",
            info.name,
            info.column_type.label(),
            info.null
        );
    }

    let summary = dataset.numeric_summary();
    if !summary.is_empty() {
        msg.push_str("\nNumeric summary (count, mean, std, min, max):\n");
        for s in summary {
            let _ = writeln!(
                msg,
                "- {}: {}, {:.3}, {:.3}, {}, {}",
                s.name, s.count, s.mean, s.std, s.min, s.max
            );
        }
    }

    let (csv, truncated) = dataset
        .to_csv_string(max_rows)
        .map_err(|e| AnalysisError::Other(format!("failed to render dataset: {}", e)))?;
    if truncated {
        let _ = writeln!(
            msg,
            "\nData (CSV, first {} of {} rows):",
            max_rows,
            dataset.row_count()
        );
    } else {
        msg.push_str("\nData (CSV):\n");
    }
    msg.push_str("```csv\n");
    msg.push_str(&csv);
    msg.push_str("```\n");

    Ok(msg)
}

#[async_trait]
impl AnalysisCapability for OpenAiAnalyzer {
    fn name(&self) -> &str {
        "openai"
    }

    #[instrument(skip_all, fields(model = %self.settings.model, rows = dataset.row_count()))]
    async fn analyze(&self, dataset: &Dataset, instruction: &str) -> Result<String, AnalysisError> {
        let api_key = self.api_key()?;

        let request = ChatRequest {
            model: &self.settings.model,
            temperature: self.settings.temperature,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: build_user_message(
                        dataset,
                        instruction,
                        self.settings.max_prompt_rows,
                    )?,
                },
            ],
        };

        let response = self
            .client
            .post(self.api_url("chat/completions"))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let body: ChatResponse = response.json().await.map_err(|e| self.map_transport(e))?;
        debug!(choices = body.choices.len(), "Received completion");

        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or(AnalysisError::EmptyResponse)
    }

    async fn health_check(&self) -> Result<(), AnalysisError> {
        let api_key = self.api_key()?;

        let response = self
            .client
            .get(self.api_url("models"))
            .bearer_auth(api_key)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        Ok(())
    }
}

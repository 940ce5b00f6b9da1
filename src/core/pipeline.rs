//! Linear stage pipeline over a shared state.
//!
//! A pipeline is an ordered list of stages. Running it hands the state to the
//! first stage, the result to the next, and so on; the last stage's output is
//! returned to the caller. There is no branching and no early exit.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, info, info_span, Instrument};

use crate::adapters::AnalysisCapability;
use crate::domain::SharedState;

use super::stages::{AnalyzeStage, LoadStage};

/// A unit of work transforming the shared state.
///
/// `run` has no error channel: a stage contains its own failures and records
/// them in `state.messages`.
#[async_trait]
pub trait Stage: Send + Sync {
    /// Stage name (unique within a pipeline)
    fn name(&self) -> &str;

    /// Consume the state and return the updated state
    async fn run(&self, state: SharedState) -> SharedState;
}

/// An ordered sequence of stages
pub struct Pipeline {
    /// Pipeline name (used in logs)
    name: String,

    /// Stages in execution order
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    /// Create an empty pipeline
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
        }
    }

    /// Append a stage; stages run in the order they are added
    pub fn stage(mut self, stage: impl Stage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// The two-stage anomaly pipeline: `load` then `analyze`
    pub fn anomaly_detection(
        analyzer: Arc<dyn AnalysisCapability>,
        default_source: impl Into<PathBuf>,
    ) -> Self {
        Self::new("anomaly_detection")
            .stage(LoadStage::new(default_source))
            .stage(AnalyzeStage::new(analyzer))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stage names in execution order
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run every stage in order and return the final state
    pub async fn run(&self, initial: SharedState) -> SharedState {
        info!(pipeline = %self.name, stages = self.stages.len(), "Starting pipeline");

        let mut state = initial;
        for stage in &self.stages {
            let span = info_span!("stage", name = stage.name());
            let before = state.messages.len();
            let started = Instant::now();

            state = stage.run(state).instrument(span).await;

            debug!(
                stage = stage.name(),
                entries_added = state.messages.len() - before,
                duration_ms = started.elapsed().as_millis() as u64,
                "Stage finished"
            );
        }

        info!(pipeline = %self.name, entries = state.messages.len(), "Pipeline finished");
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EntryKind;

    /// Appends a progress entry carrying its own name
    struct Mark(&'static str);

    #[async_trait]
    impl Stage for Mark {
        fn name(&self) -> &str {
            self.0
        }

        async fn run(&self, mut state: SharedState) -> SharedState {
            state.messages.progress(self.0, format!("ran {}", self.0));
            state
        }
    }

    /// Records an error the way a failing stage would
    struct Failing;

    #[async_trait]
    impl Stage for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        async fn run(&self, mut state: SharedState) -> SharedState {
            state.messages.error("failing", "something broke");
            state
        }
    }

    #[tokio::test]
    async fn test_stages_run_in_declaration_order() {
        let pipeline = Pipeline::new("ordered")
            .stage(Mark("first"))
            .stage(Mark("second"))
            .stage(Mark("third"));

        let state = pipeline.run(SharedState::default()).await;
        let texts: Vec<&str> = state.messages.iter().map(|e| e.text()).collect();

        assert_eq!(texts, vec!["ran first", "ran second", "ran third"]);
        assert_eq!(pipeline.stage_names(), vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_later_stages() {
        let pipeline = Pipeline::new("resilient")
            .stage(Failing)
            .stage(Mark("after"));

        let state = pipeline.run(SharedState::default()).await;

        assert_eq!(state.messages.len(), 2);
        assert_eq!(state.messages.last().unwrap().kind(), EntryKind::Progress);
        assert_eq!(state.messages.last().unwrap().stage(), Some("after"));
    }

    #[tokio::test]
    async fn test_empty_pipeline_returns_state_unchanged() {
        let pipeline = Pipeline::new("empty");
        assert!(pipeline.is_empty());

        let initial = SharedState::new(None, "request");
        let state = pipeline.run(initial).await;
        assert_eq!(state.messages.len(), 1);
    }
}

//! Pipeline Integration Tests
//!
//! End-to-end runs of the load → analyze pipeline with stub analysis services.

use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use metric_sentinel::core::{ANALYZE_STAGE, LOAD_STAGE, NO_DATA_MESSAGE};
use metric_sentinel::ingest::default_source_path;
use metric_sentinel::report::{AnalysisOutcome, LoadOutcome, RunSummary};
use metric_sentinel::{AnalysisCapability, AnalysisError, Dataset, EntryKind, Pipeline, SharedState};
use tempfile::NamedTempFile;

/// Deterministic analysis service that counts calls
#[derive(Default)]
struct StubAnalyzer {
    calls: AtomicUsize,
}

#[async_trait]
impl AnalysisCapability for StubAnalyzer {
    fn name(&self) -> &str {
        "stub"
    }

    async fn analyze(&self, dataset: &Dataset, _instruction: &str) -> Result<String, AnalysisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!(
            "Peak CPU across {} samples; no sustained anomalies",
            dataset.row_count()
        ))
    }
}

struct UnreachableAnalyzer;

#[async_trait]
impl AnalysisCapability for UnreachableAnalyzer {
    fn name(&self) -> &str {
        "unreachable"
    }

    async fn analyze(&self, _: &Dataset, _: &str) -> Result<String, AnalysisError> {
        Err(AnalysisError::Other("connection refused".to_string()))
    }
}

fn pipeline_with(analyzer: Arc<dyn AnalysisCapability>) -> Pipeline {
    Pipeline::anomaly_detection(analyzer, default_source_path())
}

fn csv_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[tokio::test]
async fn test_default_source_loads_and_analyzes() {
    let stub = Arc::new(StubAnalyzer::default());
    let pipeline = pipeline_with(stub.clone());

    let state = pipeline.run(SharedState::with_source("")).await;

    let success: Vec<_> = state.messages.by_kind(EntryKind::Success).collect();
    assert_eq!(success.len(), 1);
    assert!(success[0].text().contains("500"));
    assert!(success[0].text().contains("12"));
    assert!(success[0].text().contains("merged_metrics.csv"));

    let analysis: Vec<_> = state.messages.by_kind(EntryKind::Analysis).collect();
    assert_eq!(analysis.len(), 1);
    assert_eq!(state.messages.by_kind(EntryKind::Error).count(), 0);

    // success comes before analysis
    let kinds: Vec<EntryKind> = state.messages.iter().map(|e| e.kind()).collect();
    assert_eq!(
        kinds,
        vec![EntryKind::Request, EntryKind::Success, EntryKind::Analysis]
    );

    assert_eq!(state.source_path, Some(default_source_path()));
    assert_eq!(stub.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_nonexistent_source_completes_without_data() {
    let stub = Arc::new(StubAnalyzer::default());
    let pipeline = pipeline_with(stub.clone());

    let state = pipeline
        .run(SharedState::with_source("/nonexistent.csv"))
        .await;

    assert!(state.dataset.is_none());

    let load_errors: Vec<_> = state
        .messages
        .from_stage(LOAD_STAGE)
        .filter(|e| e.kind() == EntryKind::Error)
        .collect();
    assert_eq!(load_errors.len(), 1);

    let analyze_entries: Vec<_> = state.messages.from_stage(ANALYZE_STAGE).collect();
    assert_eq!(analyze_entries.len(), 1);
    assert_eq!(analyze_entries[0].text(), NO_DATA_MESSAGE);

    assert_eq!(stub.calls.load(Ordering::SeqCst), 0);

    let summary = RunSummary::from_log(&state.messages);
    assert_eq!(summary.load, LoadOutcome::LoadFailed);
    assert_eq!(summary.analysis, AnalysisOutcome::AnalysisSkipped);
}

#[tokio::test]
async fn test_success_entry_reports_exact_shape() {
    let file = csv_file("timestamp,system.cpu.percent,system.memory.used.percent\nt1,1,2\nt2,3,4\nt3,5,6\n");
    let pipeline = pipeline_with(Arc::new(StubAnalyzer::default()));

    let state = pipeline.run(SharedState::with_source(file.path())).await;

    let success = state.messages.by_kind(EntryKind::Success).next().unwrap();
    let file_name = file.path().file_name().unwrap().to_string_lossy();
    assert_eq!(
        success.text(),
        format!("Loaded 3 records from {} with 3 metrics", file_name)
    );
    assert_eq!(state.source_path.as_deref(), Some(file.path()));
}

#[tokio::test]
async fn test_header_only_file_skips_external_call() {
    let file = csv_file("timestamp,system.cpu.percent\n");
    let stub = Arc::new(StubAnalyzer::default());
    let pipeline = pipeline_with(stub.clone());

    let state = pipeline.run(SharedState::with_source(file.path())).await;

    assert!(state.dataset.as_ref().unwrap().is_empty());
    assert_eq!(stub.calls.load(Ordering::SeqCst), 0);

    let last = state.messages.last().unwrap();
    assert_eq!(last.stage(), Some(ANALYZE_STAGE));
    assert_eq!(last.kind(), EntryKind::Progress);
}

#[tokio::test]
async fn test_analysis_failure_is_recorded() {
    let pipeline = pipeline_with(Arc::new(UnreachableAnalyzer));

    let state = pipeline.run(SharedState::with_source("")).await;

    assert!(state.dataset.is_some());
    let last = state.messages.last().unwrap();
    assert_eq!(last.kind(), EntryKind::Error);
    assert_eq!(last.text(), "Error during analysis: connection refused");

    let summary = RunSummary::from_log(&state.messages);
    assert_eq!(summary.load, LoadOutcome::Loaded);
    assert_eq!(summary.analysis, AnalysisOutcome::AnalysisFailed);
}

#[tokio::test]
async fn test_log_never_shrinks() {
    let pipeline = pipeline_with(Arc::new(StubAnalyzer::default()));

    for source in ["", "/nonexistent.csv"] {
        let mut initial = SharedState::with_source(source);
        initial.messages.progress("caller", "queued");
        let before = initial.messages.entries().to_vec();

        let state = pipeline.run(initial).await;

        assert!(state.messages.len() >= before.len());
        assert_eq!(&state.messages.entries()[..before.len()], before.as_slice());
    }
}

#[tokio::test]
async fn test_repeated_runs_are_identical() {
    let pipeline = pipeline_with(Arc::new(StubAnalyzer::default()));

    let first = pipeline.run(SharedState::with_source("")).await;
    let second = pipeline.run(SharedState::with_source("")).await;

    assert_eq!(first.messages, second.messages);
    assert_eq!(first.dataset, second.dataset);
}

#[tokio::test]
async fn test_pipeline_shape() {
    let pipeline = pipeline_with(Arc::new(StubAnalyzer::default()));

    assert_eq!(pipeline.name(), "anomaly_detection");
    assert_eq!(pipeline.stage_names(), vec![LOAD_STAGE, ANALYZE_STAGE]);
}

#[tokio::test]
async fn test_default_source_can_be_overridden() {
    let file = csv_file("a,b\n1,2\n");
    let pipeline = Pipeline::anomaly_detection(
        Arc::new(StubAnalyzer::default()),
        PathBuf::from(file.path()),
    );

    let state = pipeline.run(SharedState::default()).await;

    assert_eq!(state.dataset.unwrap().row_count(), 1);
}

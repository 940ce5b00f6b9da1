//! Command-line interface for sentinel.
//!
//! Provides commands for running the anomaly pipeline, previewing a dataset,
//! checking the analysis backend, and showing the resolved configuration.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use uuid::Uuid;

use crate::adapters::{AnalysisCapability, OpenAiAnalyzer};
use crate::config::{self, ResolvedConfig};
use crate::core::Pipeline;
use crate::domain::{SharedState, DEFAULT_REQUEST};
use crate::ingest::{load_csv, resolve_source};
use crate::report::{self, RunReport};

/// sentinel - anomaly analysis for system metrics
#[derive(Parser, Debug)]
#[command(name = "sentinel")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load a metrics CSV and ask the analysis service for anomalies
    Run {
        /// CSV file to analyze (uses the default dataset if omitted)
        #[arg(short, long, env = "SENTINEL_SOURCE")]
        source: Option<PathBuf>,

        /// Request message that opens the run
        #[arg(short, long, default_value = DEFAULT_REQUEST)]
        request: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Also write the JSON report to this file
        #[arg(long)]
        save: Option<PathBuf>,

        /// Exit non-zero unless both load and analysis succeeded
        #[arg(long)]
        strict: bool,
    },

    /// Preview a dataset without running the analysis
    Preview {
        /// CSV file to preview (uses the default dataset if omitted)
        #[arg(short, long)]
        source: Option<PathBuf>,

        /// Number of rows to show
        #[arg(short, long, default_value = "10")]
        rows: usize,
    },

    /// Check that the analysis service is reachable
    Check,

    /// Show resolved configuration (debug)
    Config,
}

/// How `run` prints its result
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Tagged results
    Text,

    /// Numbered message history
    Workflow,

    /// JSON run report
    Json,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Run {
                source,
                request,
                format,
                save,
                strict,
            } => run_analysis(source, request, format, save, strict).await,
            Commands::Preview { source, rows } => preview(source, rows).await,
            Commands::Check => check().await,
            Commands::Config => show_config(),
        }
    }
}

fn analyzer(config: &ResolvedConfig) -> Result<Arc<dyn AnalysisCapability>> {
    let analyzer = OpenAiAnalyzer::new(config.analysis.clone())
        .context("Failed to set up the analysis client")?;
    Ok(Arc::new(analyzer))
}

/// Run the two-stage pipeline and print the outcome
async fn run_analysis(
    source: Option<PathBuf>,
    request: String,
    format: OutputFormat,
    save: Option<PathBuf>,
    strict: bool,
) -> Result<()> {
    let config = config::config()?;
    let pipeline = Pipeline::anomaly_detection(analyzer(config)?, &config.default_source);

    let run_id = Uuid::new_v4();
    let started_at = Utc::now();
    let state = pipeline.run(SharedState::new(source, request)).await;
    let run_report = RunReport::new(run_id, started_at, &state);

    match format {
        OutputFormat::Text => print!("{}", report::render_text(&state)),
        OutputFormat::Workflow => print!("{}", report::render_workflow(&state)),
        OutputFormat::Json => println!("{}", run_report.to_json()?),
    }

    if let Some(path) = save {
        run_report.save(&path)?;
        eprintln!("[Report saved to {}]", path.display());
    }

    let summary = run_report.summary;
    if strict && !summary.is_success() {
        eprintln!(
            "\n[Run {} incomplete: load={:?}, analysis={:?}]",
            run_id, summary.load, summary.analysis
        );
        std::process::exit(1);
    }

    Ok(())
}

/// Load a dataset and print its preview
async fn preview(source: Option<PathBuf>, rows: usize) -> Result<()> {
    let config = config::config()?;
    let path = resolve_source(source.as_deref(), &config.default_source);

    let dataset = load_csv(&path)
        .await
        .with_context(|| format!("Could not preview dataset {}", path.display()))?;

    print!("{}", report::render_preview(&dataset, &path, rows));
    Ok(())
}

/// Health-check the analysis backend
async fn check() -> Result<()> {
    let config = config::config()?;
    let analyzer = analyzer(config)?;

    analyzer
        .health_check()
        .await
        .with_context(|| format!("Analysis service '{}' is not available", analyzer.name()))?;

    println!(
        "✓ {} reachable at {} (model {})",
        analyzer.name(),
        config.analysis.base_url,
        config.analysis.model
    );
    Ok(())
}

/// Show resolved configuration
fn show_config() -> Result<()> {
    let config = config::config()?;

    println!("Config file:     {}", match &config.config_file {
        Some(path) => path.display().to_string(),
        None => "(none)".to_string(),
    });
    println!("Default source:  {}", config.default_source.display());
    println!("Base URL:        {}", config.analysis.base_url);
    println!("Model:           {}", config.analysis.model);
    println!("Temperature:     {}", config.analysis.temperature);
    println!("Timeout:         {}s", config.analysis.timeout_seconds);
    println!("Max prompt rows: {}", config.analysis.max_prompt_rows);
    println!("API key:         {}", config.analysis.redacted_key());

    Ok(())
}

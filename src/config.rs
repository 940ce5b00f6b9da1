//! Configuration for sentinel.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (SENTINEL_DEFAULT_SOURCE, OPENAI_API_KEY,
//!    OPENAI_BASE_URL, SENTINEL_MODEL)
//!
//! `SENTINEL_SOURCE` is not a config value: clap reads it as the fallback for
//! `sentinel run --source`, and it takes precedence over the default source.
//! 2. Config file (.sentinel/config.yaml, then the user config dir)
//! 3. Defaults (bundled dataset, api.openai.com, gpt-4o-mini)
//!
//! Config file discovery:
//! - Searches current directory and parents for .sentinel/config.yaml
//! - Falls back to <config dir>/sentinel/config.yaml
//! - Paths in config file are relative to the project root (parent of .sentinel/)

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::ingest::default_source_path;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub analysis: Option<AnalysisConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DataConfig {
    /// Dataset used when a run names no source (relative to project root)
    pub default_source: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub timeout_seconds: Option<u64>,
    pub max_prompt_rows: Option<usize>,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Dataset read when the caller gives no source
    pub default_source: PathBuf,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
    /// Analysis backend settings
    pub analysis: AnalysisSettings,
}

/// Settings for the LLM analysis backend
#[derive(Debug, Clone)]
pub struct AnalysisSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub timeout_seconds: u64,
    /// Maximum data rows embedded in a prompt
    pub max_prompt_rows: usize,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.0,
            timeout_seconds: 120,
            max_prompt_rows: 500,
        }
    }
}

impl AnalysisSettings {
    /// API key for display, with everything but the last four characters hidden
    pub fn redacted_key(&self) -> String {
        match self.api_key.as_deref() {
            None | Some("") => "(not set)".to_string(),
            Some(key) if key.chars().count() <= 4 => "****".to_string(),
            Some(key) => {
                let tail: String = key.chars().skip(key.chars().count() - 4).collect();
                format!("****{}", tail)
            }
        }
    }

    /// Apply config-file values over the current settings
    fn merge_file(&mut self, file: &AnalysisConfig) {
        if let Some(ref url) = file.base_url {
            self.base_url = url.clone();
        }
        if let Some(ref model) = file.model {
            self.model = model.clone();
        }
        if let Some(t) = file.temperature {
            self.temperature = t;
        }
        if let Some(t) = file.timeout_seconds {
            self.timeout_seconds = t;
        }
        if let Some(rows) = file.max_prompt_rows {
            self.max_prompt_rows = rows;
        }
    }

    /// Apply environment overrides
    fn merge_env(&mut self) {
        if let Some(key) = env_var("OPENAI_API_KEY") {
            self.api_key = Some(key);
        }
        if let Some(url) = env_var("OPENAI_BASE_URL") {
            self.base_url = url;
        }
        if let Some(model) = env_var("SENTINEL_MODEL") {
            self.model = model;
        }
    }
}

/// Read a non-empty environment variable
fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".sentinel").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    let user_config = dirs::config_dir()?.join("sentinel").join("config.yaml");
    user_config.exists().then_some(user_config)
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the project root
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// Merge a parsed config file (found at `config_path`) over defaults, then env
fn resolve(config_path: Option<&Path>, file: Option<&ConfigFile>) -> ResolvedConfig {
    let mut analysis = AnalysisSettings::default();
    let mut default_source = default_source_path();

    if let (Some(config_path), Some(file)) = (config_path, file) {
        // Base directory is the parent of .sentinel/ (i.e., grandparent of config.yaml)
        let base_dir = config_path
            .parent()
            .and_then(|p| p.parent())
            .unwrap_or(Path::new("."));

        if let Some(ref source) = file.data.default_source {
            default_source = resolve_path(base_dir, source);
        }
        if let Some(ref section) = file.analysis {
            analysis.merge_file(section);
        }
    }

    if let Some(source) = env_var("SENTINEL_DEFAULT_SOURCE") {
        default_source = PathBuf::from(source);
    }
    analysis.merge_env();

    ResolvedConfig {
        default_source,
        config_file: config_path.map(Path::to_path_buf),
        analysis,
    }
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let config_file = find_config_file();

    let parsed = match config_file {
        Some(ref path) => Some(load_config_file(path)?),
        None => None,
    };

    Ok(resolve(config_file.as_deref(), parsed.as_ref()))
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Force reload configuration (useful for testing)
pub fn reload_config() -> Result<ResolvedConfig> {
    load_config()
}

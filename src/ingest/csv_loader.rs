//! CSV metrics loader.
//!
//! Reads a delimited file with a header row into a [`Dataset`]. The whole
//! file is parsed before anything is returned, so a failure never leaves a
//! partially loaded table behind.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::domain::{Dataset, DatasetError};

/// File name of the dataset bundled with the crate
pub const DEFAULT_DATASET_FILE: &str = "merged_metrics.csv";

/// Errors raised while loading a dataset
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{0} has no header row")]
    NoHeader(PathBuf),

    #[error("malformed table in {path}: {source}")]
    Shape {
        path: PathBuf,
        #[source]
        source: DatasetError,
    },
}

/// Location of the bundled default dataset
pub fn default_source_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("data")
        .join(DEFAULT_DATASET_FILE)
}

/// Pick the location to read: the requested path, or `default` when none was given
pub fn resolve_source(requested: Option<&Path>, default: &Path) -> PathBuf {
    match requested {
        Some(path) if !path.as_os_str().to_string_lossy().trim().is_empty() => {
            path.to_path_buf()
        }
        _ => default.to_path_buf(),
    }
}

/// Load a CSV file into a dataset
pub async fn load_csv(path: &Path) -> Result<Dataset, LoadError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let dataset = parse_csv(path, &bytes)?;
    debug!(
        path = %path.display(),
        rows = dataset.row_count(),
        columns = dataset.column_count(),
        "Parsed CSV"
    );
    Ok(dataset)
}

/// Parse CSV bytes. `path` is only used in error messages.
pub fn parse_csv(path: &Path, bytes: &[u8]) -> Result<Dataset, LoadError> {
    let csv_err = |source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(String::from)
        .collect();

    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(LoadError::NoHeader(path.to_path_buf()));
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_err)?;
        rows.push(record.iter().map(String::from).collect());
    }

    Dataset::new(headers, rows).map_err(|source| LoadError::Shape {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_resolve_source_falls_back_to_default() {
        let default = Path::new("/data/default.csv");

        assert_eq!(resolve_source(None, default), default);
        assert_eq!(resolve_source(Some(Path::new("")), default), default);
        assert_eq!(resolve_source(Some(Path::new("  ")), default), default);
        assert_eq!(
            resolve_source(Some(Path::new("/tmp/other.csv")), default),
            PathBuf::from("/tmp/other.csv")
        );
    }

    #[test]
    fn test_default_source_points_at_bundled_file() {
        let path = default_source_path();
        assert!(path.ends_with("data/merged_metrics.csv"));
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_load_csv_reads_headers_and_rows() {
        let file = write_csv("timestamp,cpu,mem\n2025-11-01,10,50\n2025-11-02,20,55\n");

        let ds = load_csv(file.path()).await.unwrap();
        assert_eq!(ds.headers(), &["timestamp", "cpu", "mem"]);
        assert_eq!(ds.row_count(), 2);
        assert_eq!(ds.rows()[1][1], "20");
    }

    #[tokio::test]
    async fn test_load_csv_missing_file() {
        let err = load_csv(Path::new("/nonexistent/metrics.csv"))
            .await
            .unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/metrics.csv"));
    }

    #[tokio::test]
    async fn test_load_csv_rejects_ragged_rows() {
        let file = write_csv("a,b,c\n1,2,3\n4,5\n");

        let err = load_csv(file.path()).await.unwrap_err();
        assert!(matches!(err, LoadError::Csv { .. }));
    }

    #[test]
    fn test_parse_empty_input_has_no_header() {
        let err = parse_csv(Path::new("empty.csv"), b"").unwrap_err();
        assert!(matches!(err, LoadError::NoHeader(_)));
    }

    #[test]
    fn test_parse_header_only() {
        let ds = parse_csv(Path::new("h.csv"), b"a,b\n").unwrap();
        assert_eq!(ds.column_count(), 2);
        assert!(ds.is_empty());
    }
}

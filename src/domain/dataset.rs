//! In-memory tabular dataset.
//!
//! A dataset is a header row plus data rows of raw string cells. Typing is
//! inferred on demand for previews and summaries; the analysis capability
//! receives the raw table.

use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Cell values treated as missing
const NULL_MARKERS: &[&str] = &["na", "n/a", "nan", "null", "none"];

/// Rejected table shape
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DatasetError {
    #[error("row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// A fully loaded table of named columns.
///
/// Every row has exactly one cell per header; construction enforces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dataset {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

/// Inferred column type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Integer,
    Float,
    Text,
    /// Every cell is null
    Empty,
}

impl ColumnType {
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer | Self::Float)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Text => "text",
            Self::Empty => "empty",
        }
    }
}

/// Per-column overview
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub column_type: ColumnType,
    pub non_null: usize,
    pub null: usize,
}

/// Descriptive statistics for a numeric column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericSummary {
    pub name: String,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (0 when fewer than two values)
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

impl Dataset {
    /// Build a dataset, rejecting rows whose width differs from the header
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self, DatasetError> {
        if let Some((row, r)) = rows
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() != headers.len())
        {
            return Err(DatasetError::RaggedRow {
                row,
                expected: headers.len(),
                found: r.len(),
            });
        }
        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// True when the table has no data rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First `n` rows
    pub fn head(&self, n: usize) -> &[Vec<String>] {
        &self.rows[..n.min(self.rows.len())]
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// All cells of a named column, in row order
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| r[idx].as_str()).collect())
    }

    /// Type and null counts for every column
    pub fn column_info(&self) -> Vec<ColumnInfo> {
        self.headers
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let cells: Vec<&str> = self
                    .rows
                    .iter()
                    .map(|r| r[idx].as_str())
                    .filter(|c| !is_null(c))
                    .collect();

                ColumnInfo {
                    name: name.clone(),
                    column_type: infer_type(&cells),
                    non_null: cells.len(),
                    null: self.rows.len() - cells.len(),
                }
            })
            .collect()
    }

    /// Statistics for every numeric column, in header order
    pub fn numeric_summary(&self) -> Vec<NumericSummary> {
        self.column_info()
            .into_iter()
            .enumerate()
            .filter(|(_, info)| info.column_type.is_numeric())
            .filter_map(|(idx, info)| {
                let values: Vec<f64> = self
                    .rows
                    .iter()
                    .map(|r| r[idx].as_str())
                    .filter(|c| !is_null(c))
                    .filter_map(|c| c.trim().parse::<f64>().ok())
                    .filter(|v| v.is_finite())
                    .collect();
                summarize(info.name, &values)
            })
            .collect()
    }

    /// Render the table as CSV, keeping at most `max_rows` data rows.
    ///
    /// Returns the text and whether rows were dropped.
    pub fn to_csv_string(&self, max_rows: usize) -> csv::Result<(String, bool)> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&self.headers)?;
        for row in self.head(max_rows) {
            writer.write_record(row)?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| csv::Error::from(e.into_error()))?;
        let text = String::from_utf8(bytes)
            .map_err(|e| csv::Error::from(io::Error::new(io::ErrorKind::InvalidData, e)))?;

        Ok((text, self.rows.len() > max_rows))
    }
}

/// Empty cells, null markers, and non-finite numbers (`inf`, `NaN`) count as missing
fn is_null(cell: &str) -> bool {
    let trimmed = cell.trim();
    trimmed.is_empty()
        || NULL_MARKERS.contains(&trimmed.to_ascii_lowercase().as_str())
        || trimmed.parse::<f64>().is_ok_and(|v| !v.is_finite())
}

fn infer_type(cells: &[&str]) -> ColumnType {
    if cells.is_empty() {
        return ColumnType::Empty;
    }
    if cells.iter().all(|c| c.trim().parse::<i64>().is_ok()) {
        return ColumnType::Integer;
    }
    if cells.iter().all(|c| c.trim().parse::<f64>().is_ok()) {
        return ColumnType::Float;
    }
    ColumnType::Text
}

fn summarize(name: String, values: &[f64]) -> Option<NumericSummary> {
    if values.is_empty() {
        return None;
    }

    let count = values.len();
    let mean = values.iter().sum::<f64>() / count as f64;
    let std = if count > 1 {
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count - 1) as f64;
        var.sqrt()
    } else {
        0.0
    };
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    Some(NumericSummary {
        name,
        count,
        mean,
        std,
        min,
        max,
    })
}

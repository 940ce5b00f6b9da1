//! Dataset ingestion.
//!
//! Resolves where metrics come from (caller path or bundled default) and
//! parses them into a [`Dataset`](crate::domain::Dataset).

pub mod csv_loader;

// Re-export key types
pub use csv_loader::{
    default_source_path, load_csv, parse_csv, resolve_source, LoadError, DEFAULT_DATASET_FILE,
};

//! Error types for dataset loading and query validation.

use std::path::PathBuf;

use thiserror::Error;

/// Failure to build the cutoff table. Always fatal at startup.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported data file extension: .{0}")]
    UnsupportedFormat(String),

    #[error("workbook error: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("worksheet not found: {0}")]
    MissingSheet(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("no header row after skipping {0} title row(s)")]
    MissingHeaderRow(usize),

    #[error("invalid header map: {0}")]
    HeaderMap(String),
}

/// Per-request failure. Leaves the table untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// One or more of `rank`, `category`, `gender` was not supplied.
    #[error("Missing input: {}", .0.join(", "))]
    MissingInput(Vec<&'static str>),

    /// `rank` was supplied but is not a whole number.
    #[error("Invalid rank: {0:?} is not an integer")]
    InvalidRank(String),
}

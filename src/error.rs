//! Error types for orbit-prep
//!
//! Every failure names the file or combination it came from so a failed
//! run can be fixed and simply rerun (all stages overwrite their outputs).

use std::fmt::Write as _;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// orbit-prep error types
#[derive(Error, Debug)]
pub enum Error {
    /// Table file missing, unreadable, or not a numeric table
    #[error("Data access error: {}: {reason}", .path.display())]
    DataAccess {
        /// File that could not be read or parsed
        path: PathBuf,
        /// What went wrong
        reason: String,
    },

    /// Table has too few rows or columns for the requested operation
    #[error("Shape error: {0}")]
    Shape(String),

    /// Split name outside train/validation/test
    #[error("Unknown split: {0:?} (expected train, validation or test)")]
    UnknownSplit(String),

    /// Table kind outside input/output
    #[error("Unknown table kind: {0:?} (expected input or output)")]
    UnknownKind(String),

    /// Invalid pipeline configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Orbit integration diverged or failed to reach the next sample
    #[error("Integration error: {0}")]
    Integration(String),

    /// Worker pool could not be started
    #[error("Thread pool error: {0}")]
    ThreadPool(String),

    /// One or more concatenation jobs failed
    #[error("{}", describe_failures(.failures))]
    Concatenation {
        /// `(combination, error)` for every failed job
        failures: Vec<(String, Error)>,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Arrow error
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Parquet error
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
}

impl Error {
    /// Shorthand for [`Error::DataAccess`]
    pub fn data_access(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::DataAccess {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

fn describe_failures(failures: &[(String, Error)]) -> String {
    let mut message = format!("{} concatenation job(s) failed", failures.len());
    for (combination, error) in failures {
        let _ = write!(message, "\n  {combination}: {error}");
    }
    message
}

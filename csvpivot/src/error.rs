//! Error types for the csvpivot filters.
//!
//! - [`CsvError`] - reading, decoding and writing delimited text
//! - [`ConfigError`] - invalid options, reported before any row is read
//! - [`TransformError`] - top-level error returned by the pipeline
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.
//!
//! Missing columns and short rows are not represented here:
//! an unresolved column name produces null cells, never a failure.

use std::io;

use thiserror::Error;

// =============================================================================
// CSV Errors
// =============================================================================

/// Errors while reading or writing delimited text.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read or write a stream.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Malformed record, or a write the csv writer refused.
    #[error("Invalid CSV data: {0}")]
    Record(#[from] csv::Error),

    /// The requested input encoding is not a known label.
    #[error("Unknown encoding: {0}")]
    UnknownEncoding(String),

    /// Input bytes could not be decoded with the selected encoding.
    #[error("Failed to decode input as {0}")]
    Decode(String),
}

impl CsvError {
    /// True when the underlying failure is the reader of our output going away.
    pub fn is_broken_pipe(&self) -> bool {
        match self {
            CsvError::Io(e) => e.kind() == io::ErrorKind::BrokenPipe,
            CsvError::Record(e) => match e.kind() {
                csv::ErrorKind::Io(io_err) => io_err.kind() == io::ErrorKind::BrokenPipe,
                _ => false,
            },
            _ => false,
        }
    }
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Invalid options. Processing never starts when one of these is raised.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No name column was designated for a pivot.
    #[error("A name column is required (EACH <column>)")]
    MissingNameColumn,

    /// Neither group columns nor expansion columns were given.
    #[error("Either group columns or expansion columns must be given")]
    MissingColumnRoles,

    /// A required column list was empty.
    #[error("Missing required option: {0}")]
    MissingOption(&'static str),

    /// Row count that is neither a number nor `ALL`.
    #[error("Invalid row count '{0}': expected a number or ALL")]
    InvalidRowCount(String),

    /// Delimiter, quote or terminator that cannot be used.
    #[error("Invalid {what} '{value}': {reason}")]
    InvalidDialect {
        what: &'static str,
        value: String,
        reason: &'static str,
    },

    /// Option file could not be read.
    #[error("Cannot read option file: {0}")]
    Io(#[from] io::Error),

    /// Option file is not valid JSON for the expected options.
    #[error("Invalid option file: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Top-level Errors
// =============================================================================

/// Top-level error returned by the pipeline entry points.
#[derive(Debug, Error)]
pub enum TransformError {
    /// Reading or writing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// Options were rejected.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl From<io::Error> for TransformError {
    fn from(e: io::Error) -> Self {
        TransformError::Csv(CsvError::Io(e))
    }
}

impl From<csv::Error> for TransformError {
    fn from(e: csv::Error) -> Self {
        TransformError::Csv(CsvError::Record(e))
    }
}

impl TransformError {
    /// Downstream consumer exited early (`csvpivot ... | head`).
    ///
    /// Treated as a normal end of output rather than a failure.
    pub fn is_broken_pipe(&self) -> bool {
        match self {
            TransformError::Csv(e) => e.is_broken_pipe(),
            TransformError::Config(_) => false,
        }
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for reading and writing.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for option handling.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for pipeline operations.
pub type TransformResult<T> = Result<T, TransformError>;

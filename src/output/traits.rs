//! Output handler traits and types
//!
//! This module defines the trait interface for output handlers and the
//! errors they report.

use crate::listing::ListingRecord;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("Failed to read table: {0}")]
    Read(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Trait for handling harvest output
///
/// Implementations receive the finished record set once per run.
pub trait OutputHandler {
    /// Writes all records
    ///
    /// Returns the number of rows written.
    fn write_records(&mut self, records: &[ListingRecord]) -> OutputResult<usize>;

    /// Flushes any buffered output
    fn flush(&mut self) -> OutputResult<()>;
}

//! Output handler trait and error types

use crate::output::Report;
use thiserror::Error;

/// Errors that can occur while writing output
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("Failed to format output: {0}")]
    Format(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// A destination for a finished report
///
/// The CLI builds one handler per configured output and hands each the same
/// report once every domain has finished.
pub trait OutputHandler {
    /// Short name used in log messages
    fn name(&self) -> &str;

    /// Writes the report
    fn write_report(&self, report: &Report) -> OutputResult<()>;
}

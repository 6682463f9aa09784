//! Output module for aggregating and writing crawl results
//!
//! This module handles:
//! - Merging per-domain results into a hostname-keyed report
//! - Writing the report as JSON
//! - Generating an optional markdown summary

mod json;
mod markdown;
mod report;
mod traits;

pub use json::{format_json_report, JsonReportWriter};
pub use markdown::{format_markdown_summary, MarkdownSummaryWriter};
pub use report::{merge, CrawlResult, CrawlStats, Report};
pub use traits::{OutputError, OutputHandler, OutputResult};

use crate::config::OutputConfig;

/// Builds the handlers for every output the configuration asks for
///
/// `report_override` replaces the configured report path.
pub fn handlers_from_config(
    config: &OutputConfig,
    report_override: Option<&str>,
) -> Vec<Box<dyn OutputHandler>> {
    let report_path = report_override.unwrap_or(&config.report_path);
    let mut handlers: Vec<Box<dyn OutputHandler>> =
        vec![Box::new(JsonReportWriter::new(report_path, config.flat))];

    if let Some(summary_path) = &config.summary_path {
        handlers.push(Box::new(MarkdownSummaryWriter::new(summary_path)));
    }

    handlers
}

/// Hands the report to every handler
///
/// Stops at the first handler that fails.
pub fn write_outputs(handlers: &[Box<dyn OutputHandler>], report: &Report) -> OutputResult<()> {
    for handler in handlers {
        handler.write_report(report)?;
        tracing::info!("Wrote {}", handler.name());
    }
    Ok(())
}

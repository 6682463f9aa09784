//! Markdown summary generation
//!
//! This module generates a human-readable markdown summary of a finished
//! crawl: run metadata, per-domain outcomes, failures, and the product URLs
//! found on each domain.

use crate::output::traits::{OutputHandler, OutputResult};
use crate::output::Report;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

/// Product URLs listed per domain before the list is cut short
const MAX_LISTED_PRODUCTS: usize = 50;

/// Writes a markdown summary next to the JSON report
#[derive(Debug, Clone)]
pub struct MarkdownSummaryWriter {
    path: PathBuf,
}

impl MarkdownSummaryWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl OutputHandler for MarkdownSummaryWriter {
    fn name(&self) -> &str {
        "markdown summary"
    }

    fn write_report(&self, report: &Report) -> OutputResult<()> {
        let markdown = format_markdown_summary(report);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = File::create(&self.path)?;
        file.write_all(markdown.as_bytes())?;

        Ok(())
    }
}

/// Formats a report as markdown
pub fn format_markdown_summary(report: &Report) -> String {
    let mut md = String::new();

    md.push_str("# Catalog-Scout Crawl Summary\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    if let Some(started) = report.started_at {
        md.push_str(&format!("- **Started**: {}\n", started.to_rfc3339()));
    }
    if let Some(finished) = report.finished_at {
        md.push_str(&format!("- **Finished**: {}\n", finished.to_rfc3339()));
    }
    if let Some(duration) = report.duration_seconds() {
        md.push_str(&format!(
            "- **Duration**: {} seconds ({:.2} minutes)\n",
            duration,
            duration as f64 / 60.0
        ));
    }
    if let Some(hash) = &report.config_hash {
        md.push_str(&format!("- **Config Hash**: {}\n", hash));
    }
    md.push('\n');

    // Overall statistics
    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!("- **Domains**: {}\n", report.len()));
    md.push_str(&format!("- **Succeeded**: {}\n", report.succeeded_count()));
    md.push_str(&format!("- **Failed**: {}\n", report.failed_count()));
    md.push_str(&format!("- **Product URLs**: {}\n\n", report.total_products()));

    if report.is_empty() {
        return md;
    }

    // Domain breakdown
    md.push_str("## Domains\n\n");
    md.push_str("| Domain | Status | Products | Pages Fetched | Pages Failed | Time (s) |\n");
    md.push_str("|--------|--------|----------|---------------|--------------|----------|\n");
    for (hostname, result) in &report.domains {
        let status = if result.succeeded { "ok" } else { "failed" };
        md.push_str(&format!(
            "| {} | {} | {} | {} | {} | {:.1} |\n",
            hostname,
            status,
            result.product_urls.len(),
            result.stats.pages_fetched,
            result.stats.pages_failed,
            result.stats.elapsed_ms as f64 / 1000.0
        ));
    }
    md.push('\n');

    // Failures
    if report.failed_count() > 0 {
        md.push_str("## Failures\n\n");
        for result in report.failures() {
            md.push_str(&format!(
                "- **{}**: {}\n",
                result.hostname,
                result.error.as_deref().unwrap_or("unknown error")
            ));
        }
        md.push('\n');
    }

    // Product URLs
    for (hostname, result) in &report.domains {
        if result.product_urls.is_empty() {
            continue;
        }

        md.push_str(&format!("## Products on {}\n\n", hostname));
        for url in result.product_urls.iter().take(MAX_LISTED_PRODUCTS) {
            md.push_str(&format!("- {}\n", url));
        }
        if result.product_urls.len() > MAX_LISTED_PRODUCTS {
            md.push_str(&format!(
                "\n... and {} more\n",
                result.product_urls.len() - MAX_LISTED_PRODUCTS
            ));
        }
        md.push('\n');
    }

    md
}

//! JSON report output

use crate::output::traits::{OutputError, OutputHandler, OutputResult};
use crate::output::Report;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Writes the report as pretty-printed JSON
///
/// In flat mode the file is a plain `hostname -> [product URLs]` object;
/// otherwise it carries every domain's status, error and counters too.
#[derive(Debug, Clone)]
pub struct JsonReportWriter {
    path: PathBuf,
    flat: bool,
}

impl JsonReportWriter {
    pub fn new(path: impl Into<PathBuf>, flat: bool) -> Self {
        Self {
            path: path.into(),
            flat,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl OutputHandler for JsonReportWriter {
    fn name(&self) -> &str {
        "json report"
    }

    fn write_report(&self, report: &Report) -> OutputResult<()> {
        let json = format_json_report(report, self.flat)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let file = File::create(&self.path).map_err(|e| {
            OutputError::Write(format!("{}: {}", self.path.display(), e))
        })?;
        let mut writer = BufWriter::new(file);
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        Ok(())
    }
}

/// Serializes a report to a JSON string
pub fn format_json_report(report: &Report, flat: bool) -> OutputResult<String> {
    let json = if flat {
        serde_json::to_string_pretty(&report.product_urls())?
    } else {
        serde_json::to_string_pretty(report)?
    };
    Ok(json)
}

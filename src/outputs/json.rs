//! JSON report output.
//!
//! Reports are grouped by the local date of the run:
//! ```text
//! json_output_dir/
//! └── 2021-06-24/
//!     ├── senate-reaches-budget-deal.json
//!     └── wildfire-season-starts-early.json
//! ```
//!
//! A second run on the same article and day overwrites the earlier report.

use crate::models::DiscoveryReport;
use crate::utils::report_slug;
use chrono::{Local, NaiveDate};
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

/// Where the report for `report` goes when written on `date`.
pub fn report_path(json_output_dir: &str, date: NaiveDate, report: &DiscoveryReport) -> PathBuf {
    Path::new(json_output_dir)
        .join(date.format("%Y-%m-%d").to_string())
        .join(format!("{}.json", report_slug(report.title.as_deref(), &report.url)))
}

/// Write a [`DiscoveryReport`] as pretty JSON and return the file path.
#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir))]
pub async fn write_report(
    report: &DiscoveryReport,
    json_output_dir: &str,
) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(report)?;
    let path = report_path(json_output_dir, Local::now().date_naive(), report);

    if let Some(dir) = path.parent() {
        if let Err(e) = fs::create_dir_all(dir).await {
            error!(dir = %dir.display(), error = %e, "Failed to create JSON dir");
            return Err(e.into());
        }
    }

    fs::write(&path, json).await?;
    info!(path = %path.display(), outcome = ?report.outcome, "Wrote JSON report");
    Ok(path)
}

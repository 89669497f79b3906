use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::core::VerificationReport;

#[derive(Debug, Serialize)]
struct RunLog<'a> {
    schema_version: &'static str,
    tool_version: String,
    command: &'a str,
    started_at: String,
    finished_at: String,
    duration_ms: i64,
    status: &'static str,
    report: &'a VerificationReport,
}

pub fn logs_dir(home_dir: &Path) -> PathBuf {
    crate::config::config_dir(home_dir).join("logs")
}

pub fn write_run_log(
    home_dir: &Path,
    command: &str,
    started_at: OffsetDateTime,
    finished_at: OffsetDateTime,
    report: &VerificationReport,
) -> Result<PathBuf> {
    let dir = logs_dir(home_dir);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create log directory: {}", dir.display()))?;

    let pid = std::process::id();
    let ts = finished_at.unix_timestamp_nanos();
    let path = dir.join(format!("{command}-{pid}-{ts}.json"));

    let log = RunLog {
        schema_version: "1.0",
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
        command,
        started_at: format_ts(started_at),
        finished_at: format_ts(finished_at),
        duration_ms: (finished_at - started_at).whole_milliseconds() as i64,
        status: if report.is_ok() { "ok" } else { "failed" },
        report,
    };

    let buf = serde_json::to_vec_pretty(&log)?;
    std::fs::write(&path, buf)
        .with_context(|| format!("failed to write run log: {}", path.display()))?;
    Ok(path)
}

/// `~/...` form for display.
pub fn display_path(path: &Path, home_dir: &Path) -> String {
    path.strip_prefix(home_dir)
        .map(|p| format!("~/{}", p.display()))
        .unwrap_or_else(|_| path.display().to_string())
}

fn format_ts(ts: OffsetDateTime) -> String {
    ts.format(&Rfc3339).unwrap_or_else(|_| "unknown".to_string())
}

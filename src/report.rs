//! Plain-text rendering of the published state

use std::fmt::Write;

use crate::scheduler::snapshot::ReconciliationResult;
use crate::version::checker::PortStatus;

/// Display format of the last-checked timestamp
pub const CHECKED_AT_FORMAT: &str = "%Y-%m-%d %H:%M";

fn status_mark(status: PortStatus) -> &'static str {
    match status {
        PortStatus::Latest => "✓",
        PortStatus::Outdated => "✗",
        PortStatus::Unknown => "?",
    }
}

/// Header line: last check time, or a loading notice while a run is active
pub fn render_header(result: &ReconciliationResult, loading: bool) -> String {
    if loading {
        return "Last checked: loading...".to_string();
    }
    let checked = result
        .checked_at
        .map(|t| t.format(CHECKED_AT_FORMAT).to_string())
        .unwrap_or_default();
    let summary = result.summary();
    format!(
        "Last checked: {} ({} latest, {} outdated, {} unknown)",
        checked, summary.latest, summary.outdated, summary.unknown
    )
}

/// Render the header followed by one line per port
pub fn render(result: &ReconciliationResult, loading: bool) -> String {
    let mut out = render_header(result, loading);
    out.push('\n');

    if result.records.is_empty() {
        out.push_str("No ports installed\n");
        return out;
    }

    let name_width = result
        .records
        .iter()
        .map(|r| r.name.chars().count())
        .max()
        .unwrap_or(0);

    for record in &result.records {
        let status = record.status();
        let _ = write!(
            out,
            "{} {:<width$} {}",
            status_mark(status),
            record.name,
            record.installed_version,
            width = name_width
        );
        if status == PortStatus::Outdated
            && let Some(latest) = &record.latest_version
        {
            let _ = write!(out, " -> {}", latest);
        }
        out.push('\n');
    }

    out
}

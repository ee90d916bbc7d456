use chrono::NaiveDate;

use crate::io::storage::Storage;
use crate::model::{DailyReport, ProjectId, ReportStatus};
use crate::store::DataStore;

pub const UNKNOWN_PROJECT: &str = "Unknown Project";

const CSV_HEADERS: [&str; 8] = [
    "Date",
    "Project",
    "Workers",
    "Hours Worked",
    "Tasks Completed",
    "Weather",
    "Status",
    "Notes",
];

/// The filters above the report list. Empty fields match everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportFilter {
    pub date: Option<NaiveDate>,
    pub project: Option<ProjectId>,
    pub status: Option<ReportStatus>,
}

impl ReportFilter {
    fn matches(&self, report: &DailyReport) -> bool {
        self.date.is_none_or(|d| report.date == d)
            && self.project.is_none_or(|p| report.project_id == Some(p))
            && self.status.is_none_or(|s| report.status == s)
    }
}

/// Reports passing `filter`, newest date first. Reports on the same date
/// keep the order they were filed in.
pub fn filter_reports<'a, S: Storage>(
    store: &'a DataStore<S>,
    filter: &ReportFilter,
) -> Vec<&'a DailyReport> {
    let mut reports: Vec<&DailyReport> = store.reports().filter(|r| filter.matches(r)).collect();
    reports.sort_by(|a, b| b.date.cmp(&a.date));
    reports
}

/// Name of a report's project, or "Unknown Project" once it is gone
pub fn project_name<S: Storage>(store: &DataStore<S>, report: &DailyReport) -> String {
    report
        .project_id
        .and_then(|id| store.project(id))
        .map(|p| p.name.clone())
        .unwrap_or_else(|| UNKNOWN_PROJECT.to_string())
}

/// Every report as CSV, one row per report in filing order.
pub fn export_csv<S: Storage>(store: &DataStore<S>) -> String {
    let mut out = CSV_HEADERS.join(",");
    out.push('\n');
    for report in store.reports() {
        let row = [
            report.date.format("%Y-%m-%d").to_string(),
            project_name(store, report),
            report.crew_details.workers.to_string(),
            report.crew_details.hours_worked.to_string(),
            report.tasks_completed.join("; "),
            report.weather.condition.clone(),
            report.status.as_str().to_string(),
            report.notes.clone(),
        ];
        let fields: Vec<String> = row.iter().map(|f| csv_escape(f)).collect();
        out.push_str(&fields.join(","));
        out.push('\n');
    }
    out
}

fn should_neutralize(value: &str) -> bool {
    let trimmed = value.trim_start();
    if trimmed.starts_with('\'') {
        return false;
    }
    matches!(trimmed.chars().next(), Some('=' | '+' | '-' | '@'))
}

/// Spreadsheets must not evaluate a cell a user typed
fn csv_escape(value: &str) -> String {
    let safe = if should_neutralize(value) {
        format!("'{}", value)
    } else {
        value.to_string()
    };
    if safe.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", safe.replace('"', "\"\""))
    } else {
        safe
    }
}

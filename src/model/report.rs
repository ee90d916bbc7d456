use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{ProjectId, ReportId};

pub const DEFAULT_CREW_TYPE: &str = "general";
pub const DEFAULT_AUTHOR: &str = "admin";
/// Recorded as `approvedBy` when a report is approved
pub const APPROVER: &str = "Supervisor";

/// Review state of a daily report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    #[default]
    Draft,
    Submitted,
    Approved,
}

impl ReportStatus {
    pub const ALL: [ReportStatus; 3] = [
        ReportStatus::Draft,
        ReportStatus::Submitted,
        ReportStatus::Approved,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ReportStatus::Draft => "draft",
            ReportStatus::Submitted => "submitted",
            ReportStatus::Approved => "approved",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ReportStatus::Draft => "Draft",
            ReportStatus::Submitted => "Submitted",
            ReportStatus::Approved => "Approved",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|st| st.as_str() == s.trim())
    }

    /// Reports only move forward; an approved report is final.
    pub fn can_move_to(self, to: ReportStatus) -> bool {
        matches!(
            (self, to),
            (ReportStatus::Draft, ReportStatus::Submitted)
                | (ReportStatus::Draft, ReportStatus::Approved)
                | (ReportStatus::Submitted, ReportStatus::Approved)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrewDetails {
    #[serde(default)]
    pub workers: u32,
    #[serde(default)]
    pub hours_worked: f64,
    #[serde(default = "default_crew_type")]
    pub crew_type: String,
}

impl Default for CrewDetails {
    fn default() -> Self {
        CrewDetails {
            workers: 0,
            hours_worked: 0.0,
            crew_type: default_crew_type(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Weather {
    #[serde(default)]
    pub condition: String,
    /// Degrees, as entered
    #[serde(default)]
    pub temperature: Option<i16>,
    #[serde(default)]
    pub notes: String,
}

/// A daily progress report for one site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyReport {
    pub id: ReportId,
    pub date: NaiveDate,
    /// `None` once the project has been deleted
    #[serde(default)]
    pub project_id: Option<ProjectId>,
    #[serde(default)]
    pub crew_details: CrewDetails,
    /// One entry per line of the form
    #[serde(default)]
    pub tasks_completed: Vec<String>,
    #[serde(default)]
    pub weather: Weather,
    #[serde(default)]
    pub notes: String,
    pub created_at: DateTime<Utc>,
    #[serde(default = "default_author")]
    pub created_by: String,
    #[serde(default)]
    pub status: ReportStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
}

impl DailyReport {
    pub fn new(id: ReportId, date: NaiveDate, created_at: DateTime<Utc>) -> Self {
        DailyReport {
            id,
            date,
            project_id: None,
            crew_details: CrewDetails::default(),
            tasks_completed: Vec::new(),
            weather: Weather::default(),
            notes: String::new(),
            created_at,
            created_by: default_author(),
            status: ReportStatus::default(),
            updated_at: None,
            approved_by: None,
            approved_at: None,
        }
    }
}

fn default_crew_type() -> String {
    DEFAULT_CREW_TYPE.to_string()
}

fn default_author() -> String {
    DEFAULT_AUTHOR.to_string()
}

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::form::{ReportForm, SelectControl, TaskForm};
use crate::model::time_ago;
use crate::ops::stats::DashboardStats;
use crate::view::pages::{
    CalendarView, MemberRow, NotificationsView, ProjectDetailView, ProjectRow, ReportRow, TaskRow,
};

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct ProjectJson {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub status: &'static str,
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    pub task_count: usize,
}

#[derive(Serialize)]
pub struct TaskJson {
    pub id: u64,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    pub priority: &'static str,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
}

#[derive(Serialize)]
pub struct MemberJson {
    pub id: u64,
    pub name: String,
    pub role: &'static str,
    pub email: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub phone: String,
}

#[derive(Serialize)]
pub struct StatsJson {
    pub total_projects: usize,
    pub completed_tasks: usize,
    pub overdue_tasks: usize,
    pub team_members: usize,
}

#[derive(Serialize)]
pub struct ProjectDetailJson {
    #[serde(flatten)]
    pub project: ProjectJson,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_days: Option<i64>,
    pub completed: usize,
    pub in_progress: usize,
    pub pending: usize,
    pub completion_rate: u8,
    pub team: Vec<String>,
    pub tasks: Vec<TaskJson>,
}

#[derive(Serialize)]
pub struct OptionJson {
    pub value: String,
    pub label: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub disabled: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub selected: bool,
}

#[derive(Serialize)]
pub struct TaskFormJson {
    pub title: String,
    pub debug_info: String,
    pub project: Vec<OptionJson>,
    pub project_locked: bool,
    pub assignee: Vec<OptionJson>,
    pub dependencies: Vec<OptionJson>,
}

#[derive(Serialize)]
pub struct ReportJson {
    pub id: u64,
    pub date: String,
    pub project: String,
    pub status: &'static str,
    pub workers: u32,
    pub hours_worked: f64,
    pub crew_type: String,
    pub tasks_completed: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub weather: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub notes: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
}

#[derive(Serialize)]
pub struct NotificationJson {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub message: String,
    pub priority: &'static str,
    pub read: bool,
    pub timestamp: String,
}

#[derive(Serialize)]
pub struct NotificationsJson {
    pub unread: usize,
    pub items: Vec<NotificationJson>,
}

#[derive(Serialize)]
pub struct CalendarDayJson {
    pub date: String,
    pub tasks: Vec<TaskJson>,
}

#[derive(Serialize)]
pub struct ReportFormJson {
    pub title: String,
    pub date: String,
    pub project: Vec<OptionJson>,
}

fn date_string(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format("%Y-%m-%d").to_string())
}

pub fn project_to_json(row: &ProjectRow) -> ProjectJson {
    ProjectJson {
        id: row.id.0,
        name: row.name.clone(),
        description: row.description.clone(),
        status: row.status.as_str(),
        progress: row.progress,
        start_date: date_string(row.start_date),
        end_date: date_string(row.end_date),
        task_count: row.task_count,
    }
}

pub fn task_to_json(row: &TaskRow) -> TaskJson {
    TaskJson {
        id: row.id.0,
        name: row.name.clone(),
        description: row.description.clone(),
        project: row.project.clone(),
        assignee: row.assignee.clone(),
        due_date: date_string(row.due_date),
        priority: row.priority.as_str(),
        status: row.status.as_str(),
        depends_on: row.depends_on.clone(),
    }
}

pub fn member_to_json(row: &MemberRow) -> MemberJson {
    MemberJson {
        id: row.id.0,
        name: row.name.clone(),
        role: row.role.as_str(),
        email: row.email.clone(),
        phone: row.phone.clone(),
    }
}

pub fn stats_to_json(stats: &DashboardStats) -> StatsJson {
    StatsJson {
        total_projects: stats.total_projects,
        completed_tasks: stats.completed_tasks,
        overdue_tasks: stats.overdue_tasks,
        team_members: stats.team_members,
    }
}

pub fn detail_to_json(view: &ProjectDetailView) -> ProjectDetailJson {
    ProjectDetailJson {
        project: ProjectJson {
            id: view.project_id.0,
            name: view.title.clone(),
            description: view.description.clone(),
            status: view.status.as_str(),
            progress: view.progress,
            start_date: date_string(view.start_date),
            end_date: date_string(view.end_date),
            task_count: view.stats.total,
        },
        duration_days: view.duration_days,
        completed: view.stats.completed,
        in_progress: view.stats.in_progress,
        pending: view.stats.pending,
        completion_rate: view.stats.completion_rate(),
        team: view.members.clone(),
        tasks: view.tasks.iter().map(task_to_json).collect(),
    }
}

fn options_to_json(control: &SelectControl) -> Vec<OptionJson> {
    control
        .options
        .iter()
        .map(|o| OptionJson {
            value: o.value.clone(),
            label: o.label.clone(),
            disabled: o.disabled,
            selected: control.selected.contains(&o.value),
        })
        .collect()
}

pub fn task_form_to_json(form: &TaskForm) -> TaskFormJson {
    TaskFormJson {
        title: form.title.clone(),
        debug_info: form.debug_info.clone(),
        project: options_to_json(&form.project),
        project_locked: form.project.locked,
        assignee: options_to_json(&form.assignee),
        dependencies: options_to_json(&form.dependencies),
    }
}

pub fn report_to_json(row: &ReportRow) -> ReportJson {
    ReportJson {
        id: row.id.0,
        date: row.date.format("%Y-%m-%d").to_string(),
        project: row.project.clone(),
        status: row.status.as_str(),
        workers: row.workers,
        hours_worked: row.hours_worked,
        crew_type: row.crew_type.clone(),
        tasks_completed: row.tasks_completed.clone(),
        weather: row.weather.clone(),
        notes: row.notes.clone(),
        approved_by: row.approved_by.clone(),
    }
}

pub fn notifications_to_json(view: &NotificationsView) -> NotificationsJson {
    NotificationsJson {
        unread: view.unread,
        items: view
            .items
            .iter()
            .map(|n| NotificationJson {
                id: n.id.0,
                kind: n.kind.as_str(),
                message: n.message.clone(),
                priority: n.priority.as_str(),
                read: n.read,
                timestamp: n.timestamp.to_rfc3339(),
            })
            .collect(),
    }
}

pub fn calendar_to_json(view: &CalendarView) -> Vec<CalendarDayJson> {
    view.days
        .iter()
        .map(|(day, rows)| CalendarDayJson {
            date: day.format("%Y-%m-%d").to_string(),
            tasks: rows.iter().map(task_to_json).collect(),
        })
        .collect()
}

pub fn report_form_to_json(form: &ReportForm) -> ReportFormJson {
    ReportFormJson {
        title: form.title.clone(),
        date: form.date.clone(),
        project: options_to_json(&form.project),
    }
}

// ---------------------------------------------------------------------------
// Text formatting
// ---------------------------------------------------------------------------

fn date_or_dash(date: Option<NaiveDate>) -> String {
    date_string(date).unwrap_or_else(|| "-".to_string())
}

pub fn format_project_row(row: &ProjectRow) -> String {
    format!(
        "{}  {}  [{}]  {}%  {} tasks",
        row.id,
        row.name,
        row.status.as_str(),
        row.progress,
        row.task_count
    )
}

pub fn format_task_row(row: &TaskRow) -> String {
    let mut line = format!(
        "{}  [{}]  {}  ({})  {}  due {}  -> {}",
        row.id,
        row.status.as_str(),
        row.name,
        row.project.as_deref().unwrap_or("no project"),
        row.priority.as_str(),
        date_or_dash(row.due_date),
        row.assignee.as_deref().unwrap_or("unassigned"),
    );
    if !row.depends_on.is_empty() {
        line.push_str(&format!("  after: {}", row.depends_on.join(", ")));
    }
    line
}

pub fn format_member_row(row: &MemberRow) -> String {
    let mut line = format!("{}  {}  {}  {}", row.id, row.name, row.role.label(), row.email);
    if !row.phone.is_empty() {
        line.push_str(&format!("  {}", row.phone));
    }
    line
}

pub fn format_stats(stats: &DashboardStats) -> String {
    format!(
        "Total projects:  {}\nCompleted tasks: {}\nOverdue tasks:   {}\nTeam members:    {}\n",
        stats.total_projects, stats.completed_tasks, stats.overdue_tasks, stats.team_members
    )
}

pub fn format_project_detail(view: &ProjectDetailView) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", view.title));
    if !view.description.is_empty() {
        out.push_str(&format!("  {}\n", view.description));
    }
    out.push_str(&format!(
        "  Status: {}  Progress: {}%\n",
        view.status.label(),
        view.progress
    ));
    out.push_str(&format!(
        "  Timeline: {} -> {}",
        date_or_dash(view.start_date),
        date_or_dash(view.end_date)
    ));
    if let Some(days) = view.duration_days {
        out.push_str(&format!(" ({} days)", days));
    }
    out.push('\n');
    let s = &view.stats;
    out.push_str(&format!(
        "  Tasks: {} ({} completed, {} in progress, {} pending), {}% complete\n",
        s.total,
        s.completed,
        s.in_progress,
        s.pending,
        s.completion_rate()
    ));
    if !view.members.is_empty() {
        out.push_str(&format!("  Team: {}\n", view.members.join(", ")));
    }
    for task in &view.tasks {
        out.push_str(&format!("  {}\n", format_task_row(task)));
    }
    out
}

fn format_control(out: &mut String, name: &str, control: &SelectControl) {
    out.push_str(&format!("{}:", name));
    if control.locked {
        out.push_str(" (locked)");
    }
    out.push('\n');
    for option in &control.options {
        let mark = if control.selected.contains(&option.value) {
            '*'
        } else {
            ' '
        };
        out.push_str(&format!("{} {:>2} {}", mark, option.value, option.label));
        if option.disabled {
            out.push_str(" (disabled)");
        }
        out.push('\n');
    }
}

pub fn format_task_form(form: &TaskForm) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", form.title));
    out.push_str(&format!("{}\n", form.debug_info));
    format_control(&mut out, "project", &form.project);
    format_control(&mut out, "assignee", &form.assignee);
    format_control(&mut out, "dependencies", &form.dependencies);
    out
}

pub fn format_report_row(row: &ReportRow) -> String {
    let mut line = format!(
        "{}  {}  [{}]  {}  {} workers  {}h  {}",
        row.id,
        row.date.format("%Y-%m-%d"),
        row.status.as_str(),
        row.project,
        row.workers,
        row.hours_worked,
        row.crew_type,
    );
    if !row.weather.is_empty() {
        line.push_str(&format!("  weather: {}", row.weather));
    }
    if !row.tasks_completed.is_empty() {
        line.push_str(&format!("  done: {}", row.tasks_completed.join("; ")));
    }
    if let Some(by) = &row.approved_by {
        line.push_str(&format!("  approved by {}", by));
    }
    line
}

/// The bell: unread count, then the dropdown with relative times
pub fn format_notifications(view: &NotificationsView, now: DateTime<Utc>) -> String {
    let mut out = format!("{} unread\n", view.unread);
    for n in &view.items {
        let mark = if n.read { ' ' } else { '*' };
        out.push_str(&format!(
            "{} {:>2}  [{}]  {}  ({})\n",
            mark,
            n.id.0,
            n.priority.as_str(),
            n.message,
            time_ago(n.timestamp, now)
        ));
    }
    out
}

pub fn format_calendar(view: &CalendarView) -> String {
    let mut out = format!("Week of {}\n", view.week_start.format("%Y-%m-%d"));
    for (day, rows) in &view.days {
        out.push_str(&format!("{}\n", day.format("%a %Y-%m-%d")));
        for row in rows {
            out.push_str(&format!(
                "  {}  [{}]  {}  ({})\n",
                row.id,
                row.status.as_str(),
                row.name,
                row.project.as_deref().unwrap_or("no project")
            ));
        }
    }
    out
}

pub fn format_report_form(form: &ReportForm) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", form.title));
    out.push_str(&format!("date: {}\n", form.date));
    format_control(&mut out, "project", &form.project);
    out
}

//! Headless view-models for each page. A view holds only rendered fields and
//! rebuilds them from the store on [`View::refresh`].

use chrono::{DateTime, NaiveDate, Utc};

use crate::io::storage::Storage;
use crate::model::{
    NotificationId, NotificationKind, Priority, Project, ProjectId, ProjectStatus, ReportId,
    ReportStatus, Role, Task, TaskId, TaskStatus,
};
use crate::ops::calendar;
use crate::ops::notifications::{dropdown, unread_count};
use crate::ops::reports::{ReportFilter, filter_reports, project_name};
use crate::ops::search::{TaskFilter, filter_tasks};
use crate::ops::stats::{DashboardStats, ProjectStats, dashboard_stats, project_stats};
use crate::store::{Collection, DataStore, EntityRef};

use super::registry::Topic;

/// One row of a project list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRow {
    pub id: ProjectId,
    pub name: String,
    pub description: String,
    pub status: ProjectStatus,
    pub progress: u8,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub task_count: usize,
}

impl ProjectRow {
    fn build<S: Storage>(project: &Project, store: &DataStore<S>) -> Self {
        ProjectRow {
            id: project.id,
            name: project.name.clone(),
            description: project.description.clone(),
            status: project.status,
            progress: project.progress,
            start_date: project.start_date,
            end_date: project.end_date,
            task_count: store.tasks_for_project(project.id).count(),
        }
    }
}

/// One task card, with references resolved to names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRow {
    pub id: TaskId,
    pub name: String,
    pub description: String,
    /// `None` when the task has no project
    pub project: Option<String>,
    pub assignee: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub priority: Priority,
    pub status: TaskStatus,
    /// Names of the tasks this one depends on
    pub depends_on: Vec<String>,
}

impl TaskRow {
    fn build<S: Storage>(task: &Task, store: &DataStore<S>) -> Self {
        TaskRow {
            id: task.id,
            name: task.name.clone(),
            description: task.description.clone(),
            project: task
                .project_id
                .and_then(|id| store.project(id))
                .map(|p| p.name.clone()),
            assignee: task
                .assignee
                .and_then(|id| store.member(id))
                .map(|m| m.name.clone()),
            due_date: task.due_date,
            priority: task.priority,
            status: task.status,
            depends_on: task
                .dependencies
                .iter()
                .filter_map(|id| store.task(*id))
                .map(|t| t.name.clone())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRow {
    pub id: crate::model::MemberId,
    pub name: String,
    pub role: Role,
    pub email: String,
    pub phone: String,
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectListView {
    pub rows: Vec<ProjectRow>,
}

impl ProjectListView {
    pub fn refresh<S: Storage>(&mut self, store: &DataStore<S>) {
        self.rows = store.projects().map(|p| ProjectRow::build(p, store)).collect();
    }
}

/// The project details page. `title` is bound to the project's name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDetailView {
    pub project_id: ProjectId,
    /// False once the project has been deleted; other fields keep their
    /// last rendered values
    pub found: bool,
    pub title: String,
    pub description: String,
    pub status: ProjectStatus,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub duration_days: Option<i64>,
    pub progress: u8,
    pub stats: ProjectStats,
    /// Names of members assigned to the project's tasks
    pub members: Vec<String>,
    pub tasks: Vec<TaskRow>,
}

impl ProjectDetailView {
    pub fn new(project_id: ProjectId) -> Self {
        ProjectDetailView {
            project_id,
            found: false,
            title: String::new(),
            description: String::new(),
            status: ProjectStatus::default(),
            start_date: None,
            end_date: None,
            duration_days: None,
            progress: 0,
            stats: ProjectStats::default(),
            members: Vec::new(),
            tasks: Vec::new(),
        }
    }

    pub fn refresh<S: Storage>(&mut self, store: &DataStore<S>) {
        let Some(project) = store.project(self.project_id) else {
            self.found = false;
            return;
        };
        self.found = true;
        self.title = project.name.clone();
        self.description = project.description.clone();
        self.status = project.status;
        self.start_date = project.start_date;
        self.end_date = project.end_date;
        self.duration_days = project.duration_days();
        self.progress = project.progress;
        self.stats = project_stats(store, self.project_id);
        self.members = self
            .stats
            .assigned
            .iter()
            .filter_map(|id| store.member(*id))
            .map(|m| m.name.clone())
            .collect();
        self.tasks = store
            .tasks_for_project(self.project_id)
            .map(|t| TaskRow::build(t, store))
            .collect();
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskListView {
    pub filter: TaskFilter,
    pub rows: Vec<TaskRow>,
}

impl TaskListView {
    pub fn new(filter: TaskFilter) -> Self {
        TaskListView {
            filter,
            rows: Vec::new(),
        }
    }

    pub fn refresh<S: Storage>(&mut self, store: &DataStore<S>) {
        self.rows = filter_tasks(store, &self.filter)
            .into_iter()
            .map(|t| TaskRow::build(t, store))
            .collect();
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamListView {
    pub rows: Vec<MemberRow>,
}

impl TeamListView {
    pub fn refresh<S: Storage>(&mut self, store: &DataStore<S>) {
        self.rows = store
            .members()
            .map(|m| MemberRow {
                id: m.id,
                name: m.name.clone(),
                role: m.role,
                email: m.email.clone(),
                phone: m.phone.clone(),
            })
            .collect();
    }
}

/// Dashboard counters plus the project overview
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardView {
    /// Reference date for overdue tasks
    pub today: NaiveDate,
    pub stats: DashboardStats,
    pub projects: Vec<ProjectRow>,
}

impl DashboardView {
    pub fn new(today: NaiveDate) -> Self {
        DashboardView {
            today,
            stats: DashboardStats::default(),
            projects: Vec::new(),
        }
    }

    pub fn refresh<S: Storage>(&mut self, store: &DataStore<S>) {
        self.stats = dashboard_stats(store, self.today);
        self.projects = store.projects().map(|p| ProjectRow::build(p, store)).collect();
    }
}

/// One daily report card
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub id: ReportId,
    pub date: NaiveDate,
    pub project: String,
    pub status: ReportStatus,
    pub workers: u32,
    pub hours_worked: f64,
    pub crew_type: String,
    pub tasks_completed: Vec<String>,
    pub weather: String,
    pub notes: String,
    pub approved_by: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportListView {
    pub filter: ReportFilter,
    pub rows: Vec<ReportRow>,
}

impl ReportListView {
    pub fn new(filter: ReportFilter) -> Self {
        ReportListView {
            filter,
            rows: Vec::new(),
        }
    }

    pub fn refresh<S: Storage>(&mut self, store: &DataStore<S>) {
        self.rows = filter_reports(store, &self.filter)
            .into_iter()
            .map(|r| ReportRow {
                id: r.id,
                date: r.date,
                project: project_name(store, r),
                status: r.status,
                workers: r.crew_details.workers,
                hours_worked: r.crew_details.hours_worked,
                crew_type: r.crew_details.crew_type.clone(),
                tasks_completed: r.tasks_completed.clone(),
                weather: r.weather.condition.clone(),
                notes: r.notes.clone(),
                approved_by: r.approved_by.clone(),
            })
            .collect();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationItem {
    pub id: NotificationId,
    pub kind: NotificationKind,
    pub message: String,
    pub priority: Priority,
    pub read: bool,
    pub timestamp: DateTime<Utc>,
}

/// The bell: unread badge plus the dropdown list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationsView {
    pub unread: usize,
    pub items: Vec<NotificationItem>,
}

impl NotificationsView {
    pub fn refresh<S: Storage>(&mut self, store: &DataStore<S>) {
        self.unread = unread_count(store);
        self.items = dropdown(store)
            .into_iter()
            .map(|n| NotificationItem {
                id: n.id,
                kind: n.kind,
                message: n.message.clone(),
                priority: n.priority,
                read: n.read,
                timestamp: n.timestamp,
            })
            .collect();
    }
}

/// One week of due tasks, Sunday first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarView {
    pub date: NaiveDate,
    pub project: Option<ProjectId>,
    pub week_start: NaiveDate,
    pub days: Vec<(NaiveDate, Vec<TaskRow>)>,
}

impl CalendarView {
    pub fn new(date: NaiveDate, project: Option<ProjectId>) -> Self {
        CalendarView {
            date,
            project,
            week_start: calendar::start_of_week(date),
            days: Vec::new(),
        }
    }

    pub fn refresh<S: Storage>(&mut self, store: &DataStore<S>) {
        self.week_start = calendar::start_of_week(self.date);
        self.days = calendar::week(store, self.date, self.project)
            .into_iter()
            .map(|(day, tasks)| {
                let rows = tasks.into_iter().map(|t| TaskRow::build(t, store)).collect();
                (day, rows)
            })
            .collect();
    }
}

/// Any mountable view
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    Dashboard(DashboardView),
    ProjectList(ProjectListView),
    ProjectDetail(ProjectDetailView),
    TaskList(TaskListView),
    Team(TeamListView),
    Reports(ReportListView),
    Notifications(NotificationsView),
    Calendar(CalendarView),
}

impl View {
    pub fn refresh<S: Storage>(&mut self, store: &DataStore<S>) {
        match self {
            View::Dashboard(v) => v.refresh(store),
            View::ProjectList(v) => v.refresh(store),
            View::ProjectDetail(v) => v.refresh(store),
            View::TaskList(v) => v.refresh(store),
            View::Team(v) => v.refresh(store),
            View::Reports(v) => v.refresh(store),
            View::Notifications(v) => v.refresh(store),
            View::Calendar(v) => v.refresh(store),
        }
    }

    /// What the view displays, and so what it must be refreshed on
    pub fn topics(&self) -> Vec<Topic> {
        match self {
            View::Dashboard(_) => vec![
                Topic::Collection(Collection::Projects),
                Topic::Collection(Collection::Tasks),
                Topic::Collection(Collection::Team),
            ],
            // task counts per project
            View::ProjectList(_) => vec![
                Topic::Collection(Collection::Projects),
                Topic::Collection(Collection::Tasks),
            ],
            View::ProjectDetail(v) => vec![
                Topic::Entity(EntityRef::Project(v.project_id)),
                Topic::Collection(Collection::Tasks),
                Topic::Collection(Collection::Team),
            ],
            View::TaskList(_) => vec![
                Topic::Collection(Collection::Tasks),
                Topic::Collection(Collection::Projects),
                Topic::Collection(Collection::Team),
            ],
            View::Team(_) => vec![Topic::Collection(Collection::Team)],
            View::Reports(_) => vec![
                Topic::Collection(Collection::Reports),
                Topic::Collection(Collection::Projects),
            ],
            View::Notifications(_) => vec![Topic::Collection(Collection::Notifications)],
            View::Calendar(_) => vec![
                Topic::Collection(Collection::Tasks),
                Topic::Collection(Collection::Projects),
                Topic::Collection(Collection::Team),
            ],
        }
    }
}

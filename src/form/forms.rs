//! Modal form state and the parsing of submitted fields into entities.
//!
//! Fields are held as the raw strings a user typed. Parsing never touches the
//! store; it only produces an entity or a list of field errors.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;

use crate::model::{
    CrewDetails, DEFAULT_CREW_TYPE, DailyReport, MemberId, Priority, Project, ProjectId,
    ProjectStatus, ReportId, Role, Task, TaskId, TaskStatus, TeamMember, Weather,
};
use crate::store::StoreError;

use super::select::SelectControl;

const DATE_FORMAT: &str = "%Y-%m-%d";
const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

/// A validation failure tied to one form field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Every field error found in one submission
#[derive(Debug, Clone, Default, PartialEq, Eq, thiserror::Error)]
#[error("{}", join_errors(.errors))]
pub struct FormErrors {
    pub errors: Vec<FieldError>,
}

fn join_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl FormErrors {
    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = FormErrors::default();
        errors.push(field, message);
        errors
    }

    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn for_field(&self, field: &str) -> Option<&FieldError> {
        self.errors.iter().find(|e| e.field == field)
    }

    fn into_result<T>(self, value: T) -> Result<T, FormErrors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }

    /// Field-level form of a store rejection. Storage and serialization
    /// failures are not about any field and yield `None`.
    pub fn from_store(err: &StoreError) -> Option<Self> {
        let field = match err {
            StoreError::UnknownProject(_) => "project",
            StoreError::UnknownMember(_) => "assignee",
            StoreError::UnknownTask(_)
            | StoreError::SelfDependency(_)
            | StoreError::DependencyCycle { .. } => "dependencies",
            StoreError::EmptyName { .. } => "name",
            StoreError::InvalidProgress(_) => "progress",
            StoreError::InvalidHours(_) => "hours_worked",
            StoreError::ReportTransition { .. } => "status",
            StoreError::RetiredId { .. }
            | StoreError::IdExhausted { .. }
            | StoreError::UnknownReport(_) => "id",
            StoreError::UnknownNotification(_)
            | StoreError::InvalidSeed(_)
            | StoreError::Storage(_)
            | StoreError::Serialize(_) => {
                return None;
            }
        };
        Some(FormErrors::single(field, err.to_string()))
    }
}

fn parse_date(
    errors: &mut FormErrors,
    field: &'static str,
    raw: &str,
) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match NaiveDate::parse_from_str(raw, DATE_FORMAT) {
        Ok(d) => Some(d),
        Err(_) => {
            errors.push(field, format!("invalid date {:?}, expected YYYY-MM-DD", raw));
            None
        }
    }
}

fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format(DATE_FORMAT).to_string())
        .unwrap_or_default()
}

fn require_name(errors: &mut FormErrors, raw: &str) -> String {
    let name = raw.trim();
    if name.is_empty() {
        errors.push("name", "name is required");
    }
    name.to_string()
}

fn is_valid_email(email: &str) -> bool {
    Regex::new(EMAIL_PATTERN).is_ok_and(|re| re.is_match(email))
}

// ---------------------------------------------------------------------------
// Task form
// ---------------------------------------------------------------------------

/// The task modal: "Add New Task", "Edit Task", or add-to-project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskForm {
    /// `None` while creating
    pub id: Option<TaskId>,
    pub title: String,
    pub name: String,
    pub description: String,
    pub project: SelectControl,
    pub assignee: SelectControl,
    pub dependencies: SelectControl,
    pub due_date: String,
    pub priority: String,
    pub status: String,
    /// "Projects: P, Team: M", set when the form is populated
    pub debug_info: String,
    pub errors: FormErrors,
}

impl TaskForm {
    pub fn new() -> Self {
        TaskForm {
            id: None,
            title: "Add New Task".to_string(),
            name: String::new(),
            description: String::new(),
            project: SelectControl::new(),
            assignee: SelectControl::new(),
            dependencies: SelectControl::new_multiple(),
            due_date: String::new(),
            priority: Priority::default().as_str().to_string(),
            status: TaskStatus::default().as_str().to_string(),
            debug_info: String::new(),
            errors: FormErrors::default(),
        }
    }

    /// New-task form whose project selector is fixed to `project`
    pub fn for_project(project: ProjectId) -> Self {
        let mut form = TaskForm::new();
        form.project.preselect([project.to_string()]);
        form.project.locked = true;
        form
    }

    /// Pre-filled edit form
    pub fn edit(task: &Task) -> Self {
        let mut form = TaskForm::new();
        form.id = Some(task.id);
        form.title = "Edit Task".to_string();
        form.name = task.name.clone();
        form.description = task.description.clone();
        form.project.preselect(task.project_id.map(|id| id.to_string()));
        form.assignee.preselect(task.assignee.map(|id| id.to_string()));
        form.dependencies
            .preselect(task.dependencies.iter().map(|id| id.to_string()));
        form.due_date = format_date(task.due_date);
        form.priority = task.priority.as_str().to_string();
        form.status = task.status.as_str().to_string();
        form
    }

    /// Parse every field into a task with id `id`.
    pub fn parse(&self, id: TaskId) -> Result<Task, FormErrors> {
        let mut errors = FormErrors::default();
        let name = require_name(&mut errors, &self.name);

        let project_id = match self.project.selected_value() {
            None => {
                errors.push("project", "select a project");
                None
            }
            Some(v) => match v.parse::<ProjectId>() {
                Ok(id) => Some(id),
                Err(_) => {
                    errors.push("project", format!("invalid project {:?}", v));
                    None
                }
            },
        };

        let assignee = match self.assignee.selected_value() {
            None => None,
            Some(v) => match v.parse::<MemberId>() {
                Ok(id) => Some(id),
                Err(_) => {
                    errors.push("assignee", format!("invalid team member {:?}", v));
                    None
                }
            },
        };

        let mut dependencies = Vec::new();
        for v in self.dependencies.selected.iter().filter(|v| !v.is_empty()) {
            match v.parse::<TaskId>() {
                Ok(dep) => dependencies.push(dep),
                Err(_) => errors.push("dependencies", format!("invalid task {:?}", v)),
            }
        }

        let due_date = parse_date(&mut errors, "due_date", &self.due_date);

        let priority = Priority::parse(&self.priority).unwrap_or_else(|| {
            errors.push("priority", format!("unknown priority {:?}", self.priority));
            Priority::default()
        });
        let status = TaskStatus::parse(&self.status).unwrap_or_else(|| {
            errors.push("status", format!("unknown status {:?}", self.status));
            TaskStatus::default()
        });

        errors.into_result(Task {
            id,
            project_id,
            name,
            description: self.description.trim().to_string(),
            due_date,
            priority,
            status,
            assignee,
            dependencies,
        })
    }
}

impl Default for TaskForm {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Project form
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectForm {
    pub id: Option<ProjectId>,
    pub title: String,
    pub name: String,
    pub description: String,
    pub start_date: String,
    pub end_date: String,
    pub status: String,
    pub progress: String,
    pub errors: FormErrors,
}

impl ProjectForm {
    pub fn new() -> Self {
        ProjectForm {
            id: None,
            title: "Add New Project".to_string(),
            name: String::new(),
            description: String::new(),
            start_date: String::new(),
            end_date: String::new(),
            status: ProjectStatus::default().as_str().to_string(),
            progress: "0".to_string(),
            errors: FormErrors::default(),
        }
    }

    pub fn edit(project: &Project) -> Self {
        ProjectForm {
            id: Some(project.id),
            title: "Edit Project".to_string(),
            name: project.name.clone(),
            description: project.description.clone(),
            start_date: format_date(project.start_date),
            end_date: format_date(project.end_date),
            status: project.status.as_str().to_string(),
            progress: project.progress.to_string(),
            errors: FormErrors::default(),
        }
    }

    pub fn parse(&self, id: ProjectId) -> Result<Project, FormErrors> {
        let mut errors = FormErrors::default();
        let name = require_name(&mut errors, &self.name);
        let start_date = parse_date(&mut errors, "start_date", &self.start_date);
        let end_date = parse_date(&mut errors, "end_date", &self.end_date);
        if let (Some(start), Some(end)) = (start_date, end_date)
            && end < start
        {
            errors.push("end_date", "end date is before start date");
        }

        let status = ProjectStatus::parse(&self.status).unwrap_or_else(|| {
            errors.push("status", format!("unknown status {:?}", self.status));
            ProjectStatus::default()
        });

        let raw = self.progress.trim();
        let progress = if raw.is_empty() {
            0
        } else {
            match raw.parse::<u8>() {
                Ok(p) if p <= 100 => p,
                _ => {
                    errors.push("progress", "progress must be a whole number from 0 to 100");
                    0
                }
            }
        };

        errors.into_result(Project {
            id,
            name,
            description: self.description.trim().to_string(),
            start_date,
            end_date,
            status,
            progress,
        })
    }
}

impl Default for ProjectForm {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Team member form
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberForm {
    pub id: Option<MemberId>,
    pub title: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub phone: String,
    pub errors: FormErrors,
}

impl MemberForm {
    pub fn new() -> Self {
        MemberForm {
            id: None,
            title: "Add Team Member".to_string(),
            name: String::new(),
            email: String::new(),
            role: Role::default().as_str().to_string(),
            phone: String::new(),
            errors: FormErrors::default(),
        }
    }

    pub fn edit(member: &TeamMember) -> Self {
        MemberForm {
            id: Some(member.id),
            title: "Edit Team Member".to_string(),
            name: member.name.clone(),
            email: member.email.clone(),
            role: member.role.as_str().to_string(),
            phone: member.phone.clone(),
            errors: FormErrors::default(),
        }
    }

    pub fn parse(&self, id: MemberId) -> Result<TeamMember, FormErrors> {
        let mut errors = FormErrors::default();
        let name = require_name(&mut errors, &self.name);
        let email = self.email.trim().to_string();
        if email.is_empty() {
            errors.push("email", "email is required");
        } else if !is_valid_email(&email) {
            errors.push("email", format!("invalid email {:?}", email));
        }
        let role = Role::parse(&self.role).unwrap_or_else(|| {
            errors.push("role", format!("unknown role {:?}", self.role));
            Role::default()
        });

        errors.into_result(TeamMember {
            id,
            name,
            email,
            role,
            phone: self.phone.trim().to_string(),
        })
    }
}

impl Default for MemberForm {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Daily report form
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportForm {
    pub id: Option<ReportId>,
    pub title: String,
    pub date: String,
    pub project: SelectControl,
    pub crew_type: String,
    pub workers: String,
    pub hours_worked: String,
    /// One completed task per line
    pub tasks_completed: String,
    pub weather_condition: String,
    pub temperature: String,
    pub weather_notes: String,
    pub notes: String,
    pub errors: FormErrors,
}

impl ReportForm {
    /// Blank report dated `today`
    pub fn new(today: NaiveDate) -> Self {
        ReportForm {
            id: None,
            title: "New Daily Progress Report".to_string(),
            date: format_date(Some(today)),
            project: SelectControl::new(),
            crew_type: DEFAULT_CREW_TYPE.to_string(),
            workers: String::new(),
            hours_worked: String::new(),
            tasks_completed: String::new(),
            weather_condition: String::new(),
            temperature: String::new(),
            weather_notes: String::new(),
            notes: String::new(),
            errors: FormErrors::default(),
        }
    }

    pub fn edit(report: &DailyReport) -> Self {
        let mut form = ReportForm::new(report.date);
        form.id = Some(report.id);
        form.title = "Edit Daily Progress Report".to_string();
        form.project
            .preselect(report.project_id.map(|id| id.to_string()));
        form.crew_type = report.crew_details.crew_type.clone();
        form.workers = report.crew_details.workers.to_string();
        form.hours_worked = report.crew_details.hours_worked.to_string();
        form.tasks_completed = report.tasks_completed.join("\n");
        form.weather_condition = report.weather.condition.clone();
        form.temperature = report
            .weather
            .temperature
            .map(|t| t.to_string())
            .unwrap_or_default();
        form.weather_notes = report.weather.notes.clone();
        form.notes = report.notes.clone();
        form
    }

    /// Parse every field into a draft report with id `id`, created `at`.
    /// Review state is the store's to keep; an edit only replaces content.
    pub fn parse(&self, id: ReportId, at: DateTime<Utc>) -> Result<DailyReport, FormErrors> {
        let mut errors = FormErrors::default();

        let date = parse_date(&mut errors, "date", &self.date);
        if date.is_none() && self.date.trim().is_empty() {
            errors.push("date", "date is required");
        }

        let project_id = match self.project.selected_value() {
            None => {
                errors.push("project", "select a project");
                None
            }
            Some(v) => match v.parse::<ProjectId>() {
                Ok(id) => Some(id),
                Err(_) => {
                    errors.push("project", format!("invalid project {:?}", v));
                    None
                }
            },
        };

        let raw = self.workers.trim();
        let workers = if raw.is_empty() {
            0
        } else {
            raw.parse::<u32>().unwrap_or_else(|_| {
                errors.push("workers", "workers must be a whole number");
                0
            })
        };

        let raw = self.hours_worked.trim();
        let hours_worked = if raw.is_empty() {
            0.0
        } else {
            match raw.parse::<f64>() {
                Ok(h) if h.is_finite() && h >= 0.0 => h,
                _ => {
                    errors.push("hours_worked", "hours worked must be a number, zero or more");
                    0.0
                }
            }
        };

        let raw = self.temperature.trim();
        let temperature = if raw.is_empty() {
            None
        } else {
            match raw.parse::<i16>() {
                Ok(t) => Some(t),
                Err(_) => {
                    errors.push("temperature", format!("invalid temperature {:?}", raw));
                    None
                }
            }
        };

        let crew_type = match self.crew_type.trim() {
            "" => DEFAULT_CREW_TYPE.to_string(),
            other => other.to_string(),
        };
        let tasks_completed = self
            .tasks_completed
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        let Some(date) = date else {
            return Err(errors);
        };
        let mut report = DailyReport::new(id, date, at);
        report.project_id = project_id;
        report.crew_details = CrewDetails {
            workers,
            hours_worked,
            crew_type,
        };
        report.tasks_completed = tasks_completed;
        report.weather = Weather {
            condition: self.weather_condition.trim().to_string(),
            temperature,
            notes: self.weather_notes.trim().to_string(),
        };
        report.notes = self.notes.trim().to_string();
        errors.into_result(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn options(control: &mut SelectControl, values: &[&str]) {
        for v in values {
            control.push_option(*v, format!("option {}", v));
        }
    }

    fn filled_task_form() -> TaskForm {
        let mut form = TaskForm::new();
        form.name = "  Pour slab ".into();
        options(&mut form.project, &["1", "2"]);
        options(&mut form.assignee, &["1"]);
        options(&mut form.dependencies, &["1", "3"]);
        form.project.select("2");
        form.assignee.select("1");
        form.dependencies.select("3");
        form.dependencies.select("1");
        form.due_date = "2024-06-01".into();
        form.priority = "high".into();
        form
    }

    #[test]
    fn task_form_parses_all_fields() {
        let task = filled_task_form().parse(TaskId(5)).unwrap();
        assert_eq!(task.name, "Pour slab");
        assert_eq!(task.project_id, Some(ProjectId(2)));
        assert_eq!(task.assignee, Some(MemberId(1)));
        assert_eq!(task.dependencies, vec![TaskId(3), TaskId(1)]);
        assert_eq!(task.due_date, NaiveDate::from_ymd_opt(2024, 6, 1));
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.status, TaskStatus::Pending);
    }

    #[test]
    fn task_form_collects_every_error() {
        let mut form = TaskForm::new();
        form.due_date = "June 1st".into();
        form.priority = "urgent".into();
        let errors = form.parse(TaskId(1)).unwrap_err();
        let fields: Vec<&str> = errors.errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["name", "project", "due_date", "priority"]);
    }

    #[test]
    fn unassigned_parses_to_none() {
        let mut form = filled_task_form();
        form.assignee.push_placeholder("Unassigned", false);
        form.assignee.select("");
        assert_eq!(form.parse(TaskId(1)).unwrap().assignee, None);
    }

    #[test]
    fn edit_form_round_trips_the_task() {
        let mut task = Task::new(TaskId(7), "Inspect rebar");
        task.project_id = Some(ProjectId(1));
        task.assignee = Some(MemberId(2));
        task.dependencies = vec![TaskId(3)];
        task.due_date = NaiveDate::from_ymd_opt(2024, 3, 9);
        task.status = TaskStatus::InProgress;

        let form = TaskForm::edit(&task);
        assert_eq!(form.title, "Edit Task");
        assert_eq!(form.due_date, "2024-03-09");
        assert_eq!(form.parse(TaskId(7)).unwrap(), task);
    }

    #[test]
    fn project_locked_form_keeps_its_project() {
        let mut form = TaskForm::for_project(ProjectId(3));
        form.name = "Survey".into();
        options(&mut form.project, &["1", "3"]);
        assert!(!form.project.select("1"));
        assert_eq!(form.parse(TaskId(1)).unwrap().project_id, Some(ProjectId(3)));
    }

    #[test]
    fn project_form_checks_dates_and_progress() {
        let mut form = ProjectForm::new();
        form.name = "Depot".into();
        form.start_date = "2024-05-01".into();
        form.end_date = "2024-04-01".into();
        form.progress = "120".into();
        let errors = form.parse(ProjectId(1)).unwrap_err();
        assert!(errors.for_field("end_date").is_some());
        assert!(errors.for_field("progress").is_some());

        form.end_date = "2024-09-30".into();
        form.progress = "".into();
        let project = form.parse(ProjectId(1)).unwrap();
        assert_eq!(project.progress, 0);
        assert_eq!(project.duration_days(), Some(152));
    }

    #[test]
    fn project_edit_form_prefills() {
        let mut project = Project::new(ProjectId(2), "Bridge");
        project.status = ProjectStatus::OnHold;
        project.progress = 40;
        let form = ProjectForm::edit(&project);
        assert_eq!(form.status, "on-hold");
        assert_eq!(form.progress, "40");
        assert_eq!(form.parse(ProjectId(2)).unwrap(), project);
    }

    #[test]
    fn member_form_validates_email() {
        let mut form = MemberForm::new();
        form.name = "Lena Park".into();
        form.email = "lena.park".into();
        assert!(form.parse(MemberId(4)).unwrap_err().for_field("email").is_some());

        form.email = "lena.park@company.com".into();
        form.role = "foreman".into();
        let member = form.parse(MemberId(4)).unwrap();
        assert_eq!(member.role, Role::Foreman);
    }

    #[test]
    fn store_rejections_map_to_fields() {
        let errors = FormErrors::from_store(&StoreError::UnknownMember(MemberId(9))).unwrap();
        assert_eq!(errors.errors[0].field, "assignee");
        let errors = FormErrors::from_store(&StoreError::DependencyCycle {
            task: TaskId(1),
            dep: TaskId(2),
        })
        .unwrap();
        assert_eq!(errors.errors[0].field, "dependencies");
    }

    fn report_form() -> ReportForm {
        let mut form = ReportForm::new(NaiveDate::from_ymd_opt(2024, 4, 2).unwrap());
        options(&mut form.project, &["1", "2"]);
        form.project.select("1");
        form.workers = "12".into();
        form.hours_worked = "7.5".into();
        form.tasks_completed = "Poured level 2 slab\n\n  Stripped forms \n".into();
        form.weather_condition = "sunny".into();
        form
    }

    #[test]
    fn report_form_parses_crew_and_task_lines() {
        let at = DateTime::<Utc>::default();
        let report = report_form().parse(ReportId(1), at).unwrap();
        assert_eq!(report.date, NaiveDate::from_ymd_opt(2024, 4, 2).unwrap());
        assert_eq!(report.project_id, Some(ProjectId(1)));
        assert_eq!(report.crew_details.workers, 12);
        assert_eq!(report.crew_details.hours_worked, 7.5);
        assert_eq!(report.crew_details.crew_type, "general");
        assert_eq!(
            report.tasks_completed,
            vec!["Poured level 2 slab", "Stripped forms"]
        );
        assert_eq!(report.weather.temperature, None);
    }

    #[test]
    fn report_form_rejects_bad_numbers() {
        let mut form = report_form();
        form.date = String::new();
        form.workers = "twelve".into();
        form.hours_worked = "-2".into();
        form.temperature = "warm".into();
        let errors = form.parse(ReportId(1), DateTime::<Utc>::default()).unwrap_err();
        let fields: Vec<&str> = errors.errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["date", "workers", "hours_worked", "temperature"]);
    }

    #[test]
    fn report_edit_form_prefills() {
        let at = DateTime::<Utc>::default();
        let report = report_form().parse(ReportId(4), at).unwrap();
        let form = ReportForm::edit(&report);
        assert_eq!(form.title, "Edit Daily Progress Report");
        assert_eq!(form.tasks_completed, "Poured level 2 slab\nStripped forms");
        assert_eq!(form.hours_worked, "7.5");
        assert_eq!(form.parse(ReportId(4), at).unwrap(), report);
    }

    #[test]
    fn report_rejections_map_to_fields() {
        let errors = FormErrors::from_store(&StoreError::InvalidHours(-1.0)).unwrap();
        assert_eq!(errors.errors[0].field, "hours_worked");
        let errors =
            FormErrors::from_store(&StoreError::IdExhausted { entity: "report" }).unwrap();
        assert_eq!(errors.errors[0].field, "id");
    }

    #[test]
    fn errors_display_joined() {
        let mut errors = FormErrors::single("name", "name is required");
        errors.push("email", "email is required");
        assert_eq!(
            errors.to_string(),
            "name: name is required; email: email is required"
        );
    }
}

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "fm", about = concat!("foreman v", env!("CARGO_PKG_VERSION"), " - construction projects, tasks and crews"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Data directory (default: ./.foreman)
    #[arg(short = 'C', long = "data-dir", global = true, env = "FOREMAN_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Log level: off, error, warn, info, debug, trace
    #[arg(long, global = true, env = crate::logging::LOG_ENV)]
    pub log_level: Option<String>,

    /// Date used for overdue checks and new reports, YYYY-MM-DD (default: today)
    #[arg(long, global = true)]
    pub today: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List projects
    Projects,
    /// List team members
    Team,
    /// List tasks, optionally filtered
    Tasks(TasksArgs),
    /// Show dashboard statistics
    Stats,
    /// Show project details
    Show(ShowArgs),
    /// List daily reports, newest first
    Reports(ReportsArgs),
    /// Show the week of due tasks
    Calendar(CalendarArgs),
    /// List notifications, or mark them read
    Notifications(NotificationsCmd),
    /// Print a populated form
    Form(FormCmd),
    /// Add, edit, start, complete or remove tasks
    Task(TaskCmd),
    /// Add, edit or remove projects
    Project(ProjectCmd),
    /// Add, edit or remove team members
    Member(MemberCmd),
    /// Add, edit, submit, approve or export daily reports
    Report(ReportCmd),
    /// Delete stored data; the next run starts from the sample data
    Reset,
}

// ---------------------------------------------------------------------------
// Read command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct TasksArgs {
    /// Only tasks of this project
    #[arg(long)]
    pub project: Option<u64>,
    /// Only tasks with this status (pending, in-progress, completed)
    #[arg(long)]
    pub status: Option<String>,
    /// Regex matched against name and description (case-insensitive)
    #[arg(long)]
    pub search: Option<String>,
}

#[derive(Args)]
pub struct ShowArgs {
    /// Project ID
    pub id: u64,
}

#[derive(Args)]
pub struct ReportsArgs {
    /// Only reports for this date (YYYY-MM-DD)
    #[arg(long)]
    pub date: Option<String>,
    /// Only reports of this project
    #[arg(long)]
    pub project: Option<u64>,
    /// Only reports with this status (draft, submitted, approved)
    #[arg(long)]
    pub status: Option<String>,
}

#[derive(Args)]
pub struct CalendarArgs {
    /// Any day of the week to show (default: --today)
    #[arg(long)]
    pub date: Option<String>,
    /// Only tasks of this project
    #[arg(long)]
    pub project: Option<u64>,
}

#[derive(Args)]
pub struct NotificationsCmd {
    #[command(subcommand)]
    pub action: Option<NotificationAction>,
}

#[derive(Subcommand)]
pub enum NotificationAction {
    /// Mark one notification read
    Read(IdArg),
    /// Mark every notification read
    ReadAll,
    /// Raise notices for tasks due or overdue as of --today
    Check,
}

#[derive(Args)]
pub struct FormCmd {
    #[command(subcommand)]
    pub action: FormAction,
}

#[derive(Subcommand)]
pub enum FormAction {
    /// The task form, as "Add Task" or "Edit Task" would open it
    Task(FormTaskArgs),
    /// The daily report form
    Report(FormReportArgs),
}

#[derive(Args)]
pub struct FormReportArgs {
    /// Open as "Edit Daily Progress Report" for this report
    #[arg(long)]
    pub edit: Option<u64>,
}

#[derive(Args)]
pub struct FormTaskArgs {
    /// Open as "Edit Task" for this task
    #[arg(long, conflicts_with = "project")]
    pub edit: Option<u64>,
    /// Open as "Add Task to Project" for this project
    #[arg(long)]
    pub project: Option<u64>,
}

// ---------------------------------------------------------------------------
// Task commands
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct TaskCmd {
    #[command(subcommand)]
    pub action: TaskAction,
}

#[derive(Subcommand)]
pub enum TaskAction {
    /// Add a task
    Add(TaskAddArgs),
    /// Edit a task
    Edit(TaskEditArgs),
    /// Start a task (status in-progress)
    Start(IdArg),
    /// Mark a task complete
    Done(IdArg),
    /// Delete a task
    Rm(IdArg),
}

#[derive(Args)]
pub struct IdArg {
    pub id: u64,
}

#[derive(Args)]
pub struct TaskAddArgs {
    /// Task name
    pub name: String,
    /// Project ID
    #[arg(long)]
    pub project: u64,
    /// Assignee team member ID
    #[arg(long)]
    pub assignee: Option<u64>,
    /// Task IDs this task depends on
    #[arg(long, value_delimiter = ',')]
    pub depends: Vec<u64>,
    /// Due date (YYYY-MM-DD)
    #[arg(long)]
    pub due: Option<String>,
    /// Priority (low, medium, high, critical)
    #[arg(long)]
    pub priority: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
}

#[derive(Args)]
pub struct TaskEditArgs {
    pub id: u64,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub project: Option<u64>,
    /// Assignee team member ID, or "none"
    #[arg(long)]
    pub assignee: Option<String>,
    /// Replace dependencies with these task IDs
    #[arg(long, value_delimiter = ',', conflicts_with = "no_deps")]
    pub depends: Option<Vec<u64>>,
    /// Remove all dependencies
    #[arg(long)]
    pub no_deps: bool,
    /// Due date (YYYY-MM-DD), or "" to clear
    #[arg(long)]
    pub due: Option<String>,
    #[arg(long)]
    pub priority: Option<String>,
    /// Status (pending, in-progress, completed)
    #[arg(long)]
    pub status: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
}

// ---------------------------------------------------------------------------
// Project commands
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ProjectCmd {
    #[command(subcommand)]
    pub action: ProjectAction,
}

#[derive(Subcommand)]
pub enum ProjectAction {
    /// Add a project
    Add(ProjectAddArgs),
    /// Edit a project
    Edit(ProjectEditArgs),
    /// Delete a project; its tasks are kept without a project
    Rm(IdArg),
}

#[derive(Args)]
pub struct ProjectAddArgs {
    pub name: String,
    #[arg(long)]
    pub description: Option<String>,
    /// Start date (YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<String>,
    /// End date (YYYY-MM-DD)
    #[arg(long)]
    pub end: Option<String>,
    /// Status (planning, active, on-hold, completed)
    #[arg(long)]
    pub status: Option<String>,
    /// Percent complete, 0-100
    #[arg(long)]
    pub progress: Option<String>,
}

#[derive(Args)]
pub struct ProjectEditArgs {
    pub id: u64,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub start: Option<String>,
    #[arg(long)]
    pub end: Option<String>,
    #[arg(long)]
    pub status: Option<String>,
    #[arg(long)]
    pub progress: Option<String>,
}

// ---------------------------------------------------------------------------
// Member commands
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct MemberCmd {
    #[command(subcommand)]
    pub action: MemberAction,
}

#[derive(Subcommand)]
pub enum MemberAction {
    /// Add a team member
    Add(MemberAddArgs),
    /// Edit a team member
    Edit(MemberEditArgs),
    /// Remove a team member; their tasks become unassigned
    Rm(IdArg),
}

#[derive(Args)]
pub struct MemberAddArgs {
    pub name: String,
    #[arg(long)]
    pub email: String,
    /// Role (project-manager, site-supervisor, engineer, foreman, worker)
    #[arg(long)]
    pub role: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
}

#[derive(Args)]
pub struct MemberEditArgs {
    pub id: u64,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub role: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
}

// ---------------------------------------------------------------------------
// Daily report commands
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ReportCmd {
    #[command(subcommand)]
    pub action: ReportAction,
}

#[derive(Subcommand)]
pub enum ReportAction {
    /// File a daily report (starts as a draft)
    Add(ReportAddArgs),
    /// Edit a report's content
    Edit(ReportEditArgs),
    /// Submit a draft for approval
    Submit(IdArg),
    /// Approve a report
    Approve(IdArg),
    /// Print every report as CSV
    Export,
}

/// Report content shared by add and edit
#[derive(Args)]
pub struct ReportFields {
    /// Report date (YYYY-MM-DD)
    #[arg(long)]
    pub date: Option<String>,
    /// Crew type (default: general)
    #[arg(long)]
    pub crew: Option<String>,
    /// Number of workers on site
    #[arg(long)]
    pub workers: Option<String>,
    /// Hours worked
    #[arg(long)]
    pub hours: Option<String>,
    /// A completed task; repeat for more (replaces the list on edit)
    #[arg(long = "done")]
    pub done: Vec<String>,
    /// Weather condition, such as sunny or rain
    #[arg(long)]
    pub weather: Option<String>,
    /// Temperature in whole degrees
    #[arg(long, allow_hyphen_values = true)]
    pub temperature: Option<String>,
    #[arg(long)]
    pub weather_notes: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Args)]
pub struct ReportAddArgs {
    /// Project ID
    #[arg(long)]
    pub project: u64,
    #[command(flatten)]
    pub fields: ReportFields,
}

#[derive(Args)]
pub struct ReportEditArgs {
    pub id: u64,
    #[arg(long)]
    pub project: Option<u64>,
    #[command(flatten)]
    pub fields: ReportFields,
}

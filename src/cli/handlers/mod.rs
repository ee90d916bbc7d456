mod write;

use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io;
use crate::io::storage::{FileStorage, StorageError};
use crate::model::config::AppConfig;
use crate::model::{ProjectId, ReportId, ReportStatus, TaskId, TaskStatus};
use crate::ops::reports::ReportFilter;
use crate::ops::search::TaskFilter;
use crate::store::{DataStore, LoadOutcome};
use crate::view::{Controller, ModalForm, Tab, View};

/// Data directory used when neither -C nor FOREMAN_DATA_DIR is given
pub const DEFAULT_DATA_DIR: &str = ".foreman";

type CliResult = Result<(), Box<dyn Error>>;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CliResult {
    let json = cli.json;
    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
    let config = config_io::read_config(&data_dir)?;
    let today = parse_today(cli.today.as_deref())?;
    let open = || open_controller(&data_dir, &config, today);

    match cli.command {
        // Reset must not load the store, which would reseed it
        Commands::Reset => cmd_reset(&data_dir, &config),

        // Read commands
        Commands::Projects => cmd_projects(&mut open()?, json),
        Commands::Team => cmd_team(&mut open()?, json),
        Commands::Tasks(args) => cmd_tasks(&mut open()?, args, json),
        Commands::Stats => cmd_stats(&open()?, json),
        Commands::Show(args) => cmd_show(&mut open()?, args, json),
        Commands::Reports(args) => cmd_reports(&mut open()?, args, json),
        Commands::Calendar(args) => cmd_calendar(&mut open()?, args, today, json),
        Commands::Notifications(cmd) => match cmd.action {
            None => cmd_notifications(&open()?, json),
            Some(action) => write::cmd_notification(&mut open()?, action),
        },
        Commands::Form(cmd) => match cmd.action {
            FormAction::Task(args) => cmd_form_task(&mut open()?, args, json),
            FormAction::Report(args) => cmd_form_report(&mut open()?, args, json),
        },

        // Write commands
        Commands::Task(cmd) => write::cmd_task(&mut open()?, cmd.action),
        Commands::Project(cmd) => write::cmd_project(&mut open()?, cmd.action),
        Commands::Member(cmd) => write::cmd_member(&mut open()?, cmd.action),
        Commands::Report(cmd) => write::cmd_report(&mut open()?, cmd.action),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_today(raw: Option<&str>) -> Result<NaiveDate, String> {
    match raw {
        None => Ok(chrono::Local::now().date_naive()),
        Some(s) => parse_date_arg("--today", s),
    }
}

fn parse_date_arg(flag: &str, raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|e| format!("invalid {} '{}': {}", flag, raw, e))
}

fn open_controller(
    data_dir: &Path,
    config: &AppConfig,
    today: NaiveDate,
) -> Result<Controller<FileStorage>, Box<dyn Error>> {
    let storage = file_storage(data_dir, config)?;
    let store = DataStore::load(storage, config)?;
    if let LoadOutcome::Recovered { reason } = store.load_outcome() {
        eprintln!(
            "warning: stored data was unreadable ({}); kept a copy as {}.corrupt and loaded sample data",
            reason,
            store.key()
        );
    }
    Ok(Controller::new(store, today))
}

fn file_storage(data_dir: &Path, config: &AppConfig) -> Result<FileStorage, StorageError> {
    let timeout = Duration::from_millis(config.storage.lock_timeout_ms);
    Ok(FileStorage::open(data_dir)?.with_lock_timeout(timeout))
}

fn print_json<T: serde::Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn not_mounted(tab: Tab) -> Box<dyn Error> {
    format!("{:?} view is not mounted", tab).into()
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_projects(ctl: &mut Controller<FileStorage>, json: bool) -> CliResult {
    ctl.switch_tab(Tab::Projects)?;
    let Some(View::ProjectList(list)) = ctl.current_view() else {
        return Err(not_mounted(Tab::Projects));
    };
    if json {
        let out: Vec<ProjectJson> = list.rows.iter().map(project_to_json).collect();
        return print_json(&out);
    }
    if list.rows.is_empty() {
        println!("no projects");
    }
    for row in &list.rows {
        println!("{}", format_project_row(row));
    }
    Ok(())
}

fn cmd_team(ctl: &mut Controller<FileStorage>, json: bool) -> CliResult {
    ctl.switch_tab(Tab::Team)?;
    let Some(View::Team(team)) = ctl.current_view() else {
        return Err(not_mounted(Tab::Team));
    };
    if json {
        let out: Vec<MemberJson> = team.rows.iter().map(member_to_json).collect();
        return print_json(&out);
    }
    if team.rows.is_empty() {
        println!("no team members");
    }
    for row in &team.rows {
        println!("{}", format_member_row(row));
    }
    Ok(())
}

fn cmd_tasks(ctl: &mut Controller<FileStorage>, args: TasksArgs, json: bool) -> CliResult {
    let status = match args.status.as_deref() {
        None => None,
        Some(s) => Some(TaskStatus::parse(s).ok_or_else(|| {
            format!("unknown status '{}' (use pending, in-progress or completed)", s)
        })?),
    };
    ctl.set_task_filter(TaskFilter {
        project: args.project.map(ProjectId),
        status,
        search: args.search,
    })?;
    let Some(View::TaskList(list)) = ctl.current_view() else {
        return Err(not_mounted(Tab::Tasks));
    };
    if json {
        let out: Vec<TaskJson> = list.rows.iter().map(task_to_json).collect();
        return print_json(&out);
    }
    if list.rows.is_empty() {
        println!("no tasks found");
    }
    for row in &list.rows {
        println!("{}", format_task_row(row));
    }
    Ok(())
}

fn cmd_stats(ctl: &Controller<FileStorage>, json: bool) -> CliResult {
    // the dashboard is the starting tab
    let Some(View::Dashboard(dash)) = ctl.current_view() else {
        return Err(not_mounted(Tab::Dashboard));
    };
    if json {
        return print_json(&stats_to_json(&dash.stats));
    }
    print!("{}", format_stats(&dash.stats));
    Ok(())
}

fn cmd_show(ctl: &mut Controller<FileStorage>, args: ShowArgs, json: bool) -> CliResult {
    let id = ProjectId(args.id);
    ctl.show_project_details(id)?;
    let Some(View::ProjectDetail(detail)) = ctl.current_view() else {
        return Err(not_mounted(Tab::ProjectDetails(id)));
    };
    if json {
        return print_json(&detail_to_json(detail));
    }
    print!("{}", format_project_detail(detail));
    Ok(())
}

fn cmd_reports(ctl: &mut Controller<FileStorage>, args: ReportsArgs, json: bool) -> CliResult {
    let status = match args.status.as_deref() {
        None => None,
        Some(s) => Some(ReportStatus::parse(s).ok_or_else(|| {
            format!("unknown status '{}' (use draft, submitted or approved)", s)
        })?),
    };
    let date = args
        .date
        .as_deref()
        .map(|d| parse_date_arg("--date", d))
        .transpose()?;
    ctl.set_report_filter(ReportFilter {
        date,
        project: args.project.map(ProjectId),
        status,
    })?;
    let Some(View::Reports(list)) = ctl.current_view() else {
        return Err(not_mounted(Tab::Reports));
    };
    if json {
        let out: Vec<ReportJson> = list.rows.iter().map(report_to_json).collect();
        return print_json(&out);
    }
    if list.rows.is_empty() {
        println!("no reports found");
    }
    for row in &list.rows {
        println!("{}", format_report_row(row));
    }
    Ok(())
}

fn cmd_calendar(
    ctl: &mut Controller<FileStorage>,
    args: CalendarArgs,
    today: NaiveDate,
    json: bool,
) -> CliResult {
    let date = match args.date.as_deref() {
        None => today,
        Some(d) => parse_date_arg("--date", d)?,
    };
    let project = args.project.map(ProjectId);
    if let Some(pid) = project
        && ctl.store().project(pid).is_none()
    {
        return Err(format!("project not found: {}", pid).into());
    }
    let tab = Tab::Calendar { date, project };
    ctl.switch_tab(tab)?;
    let Some(View::Calendar(cal)) = ctl.current_view() else {
        return Err(not_mounted(tab));
    };
    if json {
        return print_json(&calendar_to_json(cal));
    }
    print!("{}", format_calendar(cal));
    Ok(())
}

/// Reading the bell never writes; `notifications check` raises due notices
fn cmd_notifications(ctl: &Controller<FileStorage>, json: bool) -> CliResult {
    let Some(bell) = ctl.notifications_view() else {
        return Err("notification panel is not mounted".into());
    };
    if json {
        return print_json(&notifications_to_json(bell));
    }
    print!("{}", format_notifications(bell, ctl.store().now()));
    Ok(())
}

fn cmd_form_report(
    ctl: &mut Controller<FileStorage>,
    args: FormReportArgs,
    json: bool,
) -> CliResult {
    match args.edit {
        Some(id) => ctl.open_edit_report(ReportId(id))?,
        None => ctl.open_add_report()?,
    }
    if let Some(ModalForm::Report(form)) = ctl.modal().form() {
        if json {
            print_json(&report_form_to_json(form))?;
        } else {
            print!("{}", format_report_form(form));
        }
    }
    ctl.cancel()?;
    Ok(())
}

fn cmd_form_task(ctl: &mut Controller<FileStorage>, args: FormTaskArgs, json: bool) -> CliResult {
    match (args.edit, args.project) {
        (Some(id), _) => ctl.open_edit_task(TaskId(id))?,
        (None, Some(project)) => ctl.open_add_task_to_project(ProjectId(project))?,
        (None, None) => ctl.open_add_task()?,
    }
    if let Some(ModalForm::Task(form)) = ctl.modal().form() {
        if json {
            print_json(&task_form_to_json(form))?;
        } else {
            print!("{}", format_task_form(form));
        }
    }
    ctl.cancel()?;
    Ok(())
}

fn cmd_reset(data_dir: &Path, config: &AppConfig) -> CliResult {
    let mut storage = file_storage(data_dir, config)?;
    DataStore::clear(&mut storage, config)?;
    println!("cleared {}", storage.path_for(&config.storage.key).display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn today_defaults_and_parses() {
        assert_eq!(
            parse_today(Some("2024-04-01")).unwrap(),
            NaiveDate::from_ymd_opt(2024, 4, 1).unwrap()
        );
        assert!(parse_today(Some("April 1")).is_err());
        assert!(parse_today(None).is_ok());
    }
}

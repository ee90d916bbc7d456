use std::error::Error;

use crate::cli::commands::*;
use crate::form::{ReportForm, SelectControl};
use crate::io::storage::Storage;
use crate::model::{MemberId, NotificationId, ProjectId, ReportId, TaskId};
use crate::ops::reports::export_csv;
use crate::store::{ChangeKind, ChangeSet, EntityRef};
use crate::view::Controller;

type CliResult = Result<(), Box<dyn Error>>;

/// Pick `value` in a populated select, or explain why it is not on offer
fn choose(control: &mut SelectControl, what: &str, value: &str) -> Result<(), String> {
    if control.select(value) {
        Ok(())
    } else if control.locked {
        Err(format!("{} is fixed for this form", what))
    } else {
        Err(format!("{} {} is not an option", what, value))
    }
}

fn choose_dependencies(control: &mut SelectControl, ids: &[u64]) -> Result<(), String> {
    control.deselect_all();
    for id in ids {
        choose(control, "dependency", &id.to_string())?;
    }
    Ok(())
}

/// Print one line per changed entity, the first one named
fn report<S: Storage>(ctl: &Controller<S>, changes: &ChangeSet) {
    for change in &changes.changes {
        let verb = match change.kind {
            ChangeKind::Created => "added",
            ChangeKind::Updated => "updated",
            ChangeKind::Deleted => "deleted",
        };
        let store = ctl.store();
        let line = match change.entity {
            EntityRef::Project(id) => match store.project(id) {
                Some(p) => format!("{} project {}: {}", verb, id, p.name),
                None => format!("{} project {}", verb, id),
            },
            EntityRef::Member(id) => match store.member(id) {
                Some(m) => format!("{} team member {}: {}", verb, id, m.name),
                None => format!("{} team member {}", verb, id),
            },
            EntityRef::Task(id) => match store.task(id) {
                Some(t) => format!("{} task {}: {}", verb, id, t.name),
                None => format!("{} task {}", verb, id),
            },
            EntityRef::Notification(id) => match store.notification(id) {
                Some(n) => format!("{} notification {}: {}", verb, id, n.message),
                None => format!("{} notification {}", verb, id),
            },
            EntityRef::Report(id) => match store.report(id) {
                Some(r) => format!(
                    "{} report {}: {} [{}]",
                    verb,
                    id,
                    r.date.format("%Y-%m-%d"),
                    r.status.as_str()
                ),
                None => format!("{} report {}", verb, id),
            },
        };
        println!("{}", line);
    }
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

pub fn cmd_task<S: Storage>(ctl: &mut Controller<S>, action: TaskAction) -> CliResult {
    let changes = match action {
        TaskAction::Add(args) => {
            ctl.open_add_task()?;
            let form = ctl.task_form_mut()?;
            form.name = args.name;
            choose(&mut form.project, "project", &args.project.to_string())?;
            if let Some(member) = args.assignee {
                choose(&mut form.assignee, "team member", &member.to_string())?;
            }
            choose_dependencies(&mut form.dependencies, &args.depends)?;
            if let Some(due) = args.due {
                form.due_date = due;
            }
            if let Some(priority) = args.priority {
                form.priority = priority;
            }
            if let Some(description) = args.description {
                form.description = description;
            }
            ctl.submit()?
        }
        TaskAction::Edit(args) => {
            ctl.open_edit_task(TaskId(args.id))?;
            let form = ctl.task_form_mut()?;
            if let Some(name) = args.name {
                form.name = name;
            }
            if let Some(project) = args.project {
                choose(&mut form.project, "project", &project.to_string())?;
            }
            match args.assignee.as_deref() {
                None => {}
                Some("none") => choose(&mut form.assignee, "team member", "")?,
                Some(member) => choose(&mut form.assignee, "team member", member)?,
            }
            if args.no_deps {
                form.dependencies.deselect_all();
            } else if let Some(deps) = &args.depends {
                choose_dependencies(&mut form.dependencies, deps)?;
            }
            if let Some(due) = args.due {
                form.due_date = due;
            }
            if let Some(priority) = args.priority {
                form.priority = priority;
            }
            if let Some(status) = args.status {
                form.status = status;
            }
            if let Some(description) = args.description {
                form.description = description;
            }
            ctl.submit()?
        }
        TaskAction::Start(arg) => ctl.start_task(TaskId(arg.id))?,
        TaskAction::Done(arg) => ctl.complete_task(TaskId(arg.id))?,
        TaskAction::Rm(arg) => ctl.delete_task(TaskId(arg.id))?,
    };
    report(ctl, &changes);
    Ok(())
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

pub fn cmd_project<S: Storage>(ctl: &mut Controller<S>, action: ProjectAction) -> CliResult {
    let changes = match action {
        ProjectAction::Add(args) => {
            ctl.open_add_project()?;
            let form = ctl.project_form_mut()?;
            form.name = args.name;
            if let Some(description) = args.description {
                form.description = description;
            }
            if let Some(start) = args.start {
                form.start_date = start;
            }
            if let Some(end) = args.end {
                form.end_date = end;
            }
            if let Some(status) = args.status {
                form.status = status;
            }
            if let Some(progress) = args.progress {
                form.progress = progress;
            }
            ctl.submit()?
        }
        ProjectAction::Edit(args) => {
            ctl.open_edit_project(ProjectId(args.id))?;
            let form = ctl.project_form_mut()?;
            if let Some(name) = args.name {
                form.name = name;
            }
            if let Some(description) = args.description {
                form.description = description;
            }
            if let Some(start) = args.start {
                form.start_date = start;
            }
            if let Some(end) = args.end {
                form.end_date = end;
            }
            if let Some(status) = args.status {
                form.status = status;
            }
            if let Some(progress) = args.progress {
                form.progress = progress;
            }
            ctl.submit()?
        }
        ProjectAction::Rm(arg) => ctl.delete_project(ProjectId(arg.id))?,
    };
    report(ctl, &changes);
    Ok(())
}

// ---------------------------------------------------------------------------
// Team members
// ---------------------------------------------------------------------------

pub fn cmd_member<S: Storage>(ctl: &mut Controller<S>, action: MemberAction) -> CliResult {
    let changes = match action {
        MemberAction::Add(args) => {
            ctl.open_add_member()?;
            let form = ctl.member_form_mut()?;
            form.name = args.name;
            form.email = args.email;
            if let Some(role) = args.role {
                form.role = role;
            }
            if let Some(phone) = args.phone {
                form.phone = phone;
            }
            ctl.submit()?
        }
        MemberAction::Edit(args) => {
            ctl.open_edit_member(MemberId(args.id))?;
            let form = ctl.member_form_mut()?;
            if let Some(name) = args.name {
                form.name = name;
            }
            if let Some(email) = args.email {
                form.email = email;
            }
            if let Some(role) = args.role {
                form.role = role;
            }
            if let Some(phone) = args.phone {
                form.phone = phone;
            }
            ctl.submit()?
        }
        MemberAction::Rm(arg) => ctl.delete_member(MemberId(arg.id))?,
    };
    report(ctl, &changes);
    Ok(())
}

// ---------------------------------------------------------------------------
// Daily reports
// ---------------------------------------------------------------------------

fn fill_report(form: &mut ReportForm, fields: ReportFields) {
    if let Some(date) = fields.date {
        form.date = date;
    }
    if let Some(crew) = fields.crew {
        form.crew_type = crew;
    }
    if let Some(workers) = fields.workers {
        form.workers = workers;
    }
    if let Some(hours) = fields.hours {
        form.hours_worked = hours;
    }
    if !fields.done.is_empty() {
        form.tasks_completed = fields.done.join("\n");
    }
    if let Some(weather) = fields.weather {
        form.weather_condition = weather;
    }
    if let Some(temperature) = fields.temperature {
        form.temperature = temperature;
    }
    if let Some(notes) = fields.weather_notes {
        form.weather_notes = notes;
    }
    if let Some(notes) = fields.notes {
        form.notes = notes;
    }
}

pub fn cmd_report<S: Storage>(ctl: &mut Controller<S>, action: ReportAction) -> CliResult {
    let changes = match action {
        ReportAction::Add(args) => {
            ctl.open_add_report()?;
            let form = ctl.report_form_mut()?;
            choose(&mut form.project, "project", &args.project.to_string())?;
            fill_report(form, args.fields);
            ctl.submit()?
        }
        ReportAction::Edit(args) => {
            ctl.open_edit_report(ReportId(args.id))?;
            let form = ctl.report_form_mut()?;
            if let Some(project) = args.project {
                choose(&mut form.project, "project", &project.to_string())?;
            }
            fill_report(form, args.fields);
            ctl.submit()?
        }
        ReportAction::Submit(arg) => ctl.submit_report_for_review(ReportId(arg.id))?,
        ReportAction::Approve(arg) => ctl.approve_report(ReportId(arg.id))?,
        ReportAction::Export => {
            print!("{}", export_csv(ctl.store()));
            return Ok(());
        }
    };
    report(ctl, &changes);
    Ok(())
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

pub fn cmd_notification<S: Storage>(
    ctl: &mut Controller<S>,
    action: NotificationAction,
) -> CliResult {
    let changes = match action {
        NotificationAction::Read(arg) => ctl.mark_notification_read(NotificationId(arg.id))?,
        NotificationAction::ReadAll => ctl.mark_all_notifications_read()?,
        NotificationAction::Check => ctl.check_due_tasks()?,
    };
    if changes.is_empty() {
        println!("nothing to update");
    }
    report(ctl, &changes);
    Ok(())
}

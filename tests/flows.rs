//! End-to-end flows through the controller: first run, form population,
//! edits reaching mounted views, and persistence across reloads.

use chrono::NaiveDate;
use pretty_assertions::assert_eq;

use foreman::io::storage::{FileStorage, MemoryStorage, Storage};
use foreman::model::config::AppConfig;
use foreman::model::{
    MemberId, NotificationId, NotificationKind, ProjectId, ReportId, ReportStatus, TaskId,
    TaskStatus,
};
use foreman::ops::reports::{ReportFilter, export_csv};
use foreman::store::{DataStore, LoadOutcome, StoreError};
use foreman::view::pages::ProjectDetailView;
use foreman::view::{Controller, ControllerError, ModalPhase, Tab, View};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 4, 1).unwrap()
}

fn fresh() -> Controller<MemoryStorage> {
    let store = DataStore::load(MemoryStorage::new(), &AppConfig::default()).unwrap();
    Controller::new(store, today())
}

fn reload(c: Controller<MemoryStorage>) -> Controller<MemoryStorage> {
    let storage = c.into_store().into_storage();
    let store = DataStore::load(storage, &AppConfig::default()).unwrap();
    assert_eq!(store.load_outcome(), &LoadOutcome::Restored);
    Controller::new(store, today())
}

fn detail(c: &Controller<MemoryStorage>) -> &ProjectDetailView {
    match c.current_view() {
        Some(View::ProjectDetail(d)) => d,
        _ => panic!("details tab not mounted"),
    }
}

// ---------------------------------------------------------------------------
// First run and form population
// ---------------------------------------------------------------------------

#[test]
fn first_run_seeds_and_persists() {
    let c = fresh();
    assert_eq!(c.store().load_outcome(), &LoadOutcome::Seeded);
    assert_eq!(c.store().projects().len(), 3);
    assert_eq!(c.store().members().len(), 3);
    assert_eq!(c.store().tasks().len(), 4);
    assert!(c.store().storage().get("foreman").unwrap().is_some());
}

#[test]
fn task_form_lists_every_project_and_member() {
    let mut c = fresh();
    c.open_add_task().unwrap();
    let form = c.task_form_mut().unwrap();

    assert_eq!(
        form.project.labels(),
        vec![
            "Select Project",
            "Downtown Office Complex",
            "Residential Housing Development",
            "Highway Infrastructure Upgrade",
        ]
    );
    assert!(form.project.options[0].disabled);
    assert_eq!(
        form.assignee.labels(),
        vec!["Unassigned", "John Smith", "Maria Garcia", "David Johnson"]
    );
    assert_eq!(form.debug_info, "Projects: 3, Team: 3");
}

#[test]
fn new_member_shows_up_in_the_next_task_form() {
    let mut c = fresh();
    c.open_add_member().unwrap();
    let form = c.member_form_mut().unwrap();
    form.name = "Lena Park".into();
    form.email = "lena.park@company.com".into();
    form.role = "foreman".into();
    c.submit().unwrap();

    c.open_add_task().unwrap();
    let form = c.task_form_mut().unwrap();
    assert_eq!(form.assignee.labels().last(), Some(&"Lena Park"));
    assert_eq!(form.assignee.values().last(), Some(&"4"));
}

// ---------------------------------------------------------------------------
// Edit propagation
// ---------------------------------------------------------------------------

#[test]
fn project_edit_refreshes_details_and_the_next_form() {
    let mut c = fresh();
    c.show_project_details(ProjectId(1)).unwrap();
    assert_eq!(detail(&c).title, "Downtown Office Complex");

    c.open_edit_project(ProjectId(1)).unwrap();
    c.project_form_mut().unwrap().name = "Downtown Tower".into();
    c.submit().unwrap();
    assert_eq!(detail(&c).title, "Downtown Tower");

    c.open_edit_project(ProjectId(1)).unwrap();
    assert_eq!(c.project_form_mut().unwrap().name, "Downtown Tower");
    c.cancel().unwrap();

    c.open_add_task().unwrap();
    let labels = c.task_form_mut().unwrap().project.labels();
    assert_eq!(labels[1], "Downtown Tower");
}

#[test]
fn completing_a_task_updates_the_project_page() {
    let mut c = fresh();
    c.show_project_details(ProjectId(1)).unwrap();
    assert_eq!(detail(&c).stats.completed, 1);
    c.complete_task(TaskId(2)).unwrap();
    assert_eq!(detail(&c).stats.completed, 2);
    assert_eq!(detail(&c).stats.completion_rate(), 100);
}

#[test]
fn cancel_leaves_the_store_untouched() {
    let mut c = fresh();
    let before = c.store().to_json().unwrap();

    c.open_edit_task(TaskId(4)).unwrap();
    let form = c.task_form_mut().unwrap();
    form.name = "Something else".into();
    assert!(form.assignee.select("2"));
    c.cancel().unwrap();

    assert_eq!(c.modal().phase(), ModalPhase::Hidden);
    assert_eq!(c.store().to_json().unwrap(), before);
}

// ---------------------------------------------------------------------------
// Deletes
// ---------------------------------------------------------------------------

#[test]
fn deleting_a_member_unassigns_their_tasks() {
    let mut c = fresh();
    c.delete_member(MemberId(2)).unwrap();
    assert_eq!(c.store().task(TaskId(2)).unwrap().assignee, None);

    c.open_edit_task(TaskId(2)).unwrap();
    let form = c.task_form_mut().unwrap();
    assert_eq!(form.assignee.selected_value(), None);
    assert_eq!(form.assignee.options.len(), 3);
}

#[test]
fn deleting_a_task_drops_it_from_dependencies() {
    let mut c = fresh();
    let changes = c.delete_task(TaskId(3)).unwrap();
    // the task, the task depending on it, and its completion notice
    assert_eq!(changes.changes.len(), 3);
    assert!(c.store().task(TaskId(4)).unwrap().dependencies.is_empty());
    assert_eq!(c.store().notification(NotificationId(2)).unwrap().task_id, None);
}

#[test]
fn deleting_a_project_keeps_its_tasks() {
    let mut c = fresh();
    c.delete_project(ProjectId(1)).unwrap();
    assert_eq!(c.store().tasks().len(), 4);
    assert_eq!(c.store().task(TaskId(1)).unwrap().project_id, None);
    assert!(c.store().tasks_for_project(ProjectId(1)).next().is_none());
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[test]
fn reload_restores_the_same_store() {
    let mut c = fresh();
    c.start_task(TaskId(4)).unwrap();
    c.delete_task(TaskId(1)).unwrap();
    let before = c.store().to_json().unwrap();

    let mut c = reload(c);
    assert_eq!(c.store().to_json().unwrap(), before);
    assert_eq!(
        c.store().task(TaskId(4)).unwrap().status,
        TaskStatus::InProgress
    );

    // a deleted id is never handed out again, even the highest one
    c.delete_task(TaskId(4)).unwrap();
    c.open_add_task().unwrap();
    let form = c.task_form_mut().unwrap();
    form.name = "Roofing".into();
    assert!(form.project.select("2"));
    c.submit().unwrap();
    assert!(c.store().task(TaskId(5)).is_some());
    assert!(c.store().task(TaskId(4)).is_none());
}

#[test]
fn failed_write_rolls_back_and_keeps_the_modal() {
    let mut c = fresh();
    c.switch_tab(Tab::Projects).unwrap();
    let before = c.store().to_json().unwrap();

    let mut storage = c.into_store().into_storage();
    storage.set_read_only(true);
    let store = DataStore::load(storage, &AppConfig::default()).unwrap();
    let mut c = Controller::new(store, today());

    c.open_edit_project(ProjectId(2)).unwrap();
    c.project_form_mut().unwrap().name = "Renamed".into();
    let err = c.submit().unwrap_err();
    assert!(matches!(err, ControllerError::Store(StoreError::Storage(_))));
    assert_eq!(c.modal().phase(), ModalPhase::Visible);
    assert_eq!(c.store().to_json().unwrap(), before);
    assert!(matches!(
        c.complete_task(TaskId(4)),
        Err(ControllerError::Store(_))
    ));
}

#[test]
fn file_storage_survives_a_restart() {
    let tmp = tempfile::TempDir::new().unwrap();
    let config = AppConfig::default();

    let store = DataStore::load(FileStorage::open(tmp.path()).unwrap(), &config).unwrap();
    let mut c = Controller::new(store, today());
    c.open_add_project().unwrap();
    let form = c.project_form_mut().unwrap();
    form.name = "Water Treatment Plant".into();
    form.start_date = "2024-05-01".into();
    form.end_date = "2025-05-01".into();
    c.submit().unwrap();
    drop(c);

    assert!(tmp.path().join("foreman.json").exists());
    let store = DataStore::load(FileStorage::open(tmp.path()).unwrap(), &config).unwrap();
    assert_eq!(store.load_outcome(), &LoadOutcome::Restored);
    let project = store.project(ProjectId(4)).unwrap();
    assert_eq!(project.name, "Water Treatment Plant");
    assert_eq!(project.duration_days(), Some(365));
}

#[test]
fn corrupt_snapshot_is_set_aside() {
    let mut storage = MemoryStorage::new();
    storage.set("foreman", "{ not json").unwrap();
    let store = DataStore::load(storage, &AppConfig::default()).unwrap();
    assert!(matches!(store.load_outcome(), LoadOutcome::Recovered { .. }));
    assert_eq!(store.projects().len(), 3);
    assert_eq!(
        store.storage().get("foreman.corrupt").unwrap().as_deref(),
        Some("{ not json")
    );
}

// ---------------------------------------------------------------------------
// Daily reports and notifications
// ---------------------------------------------------------------------------

#[test]
fn daily_report_lifecycle_survives_a_reload() {
    let mut c = fresh();
    c.open_add_report().unwrap();
    let form = c.report_form_mut().unwrap();
    assert_eq!(form.title, "New Daily Progress Report");
    assert!(form.project.select("2"));
    form.workers = "14".into();
    form.hours_worked = "8".into();
    form.tasks_completed = "Backfilled trench\nSet manholes".into();
    form.weather_condition = "rain".into();
    c.submit().unwrap();
    c.submit_report_for_review(ReportId(1)).unwrap();

    let mut c = reload(c);
    let report = c.store().report(ReportId(1)).unwrap();
    assert_eq!(report.status, ReportStatus::Submitted);
    assert_eq!(report.tasks_completed, vec!["Backfilled trench", "Set manholes"]);

    c.approve_report(ReportId(1)).unwrap();
    c.set_report_filter(ReportFilter {
        status: Some(ReportStatus::Approved),
        ..Default::default()
    })
    .unwrap();
    let Some(View::Reports(list)) = c.current_view() else {
        panic!("reports tab not mounted");
    };
    assert_eq!(list.rows.len(), 1);
    assert_eq!(list.rows[0].project, "Residential Housing Development");

    let csv = export_csv(c.store());
    assert!(csv.contains("Residential Housing Development,14,8,Backfilled trench; Set manholes,rain,approved,"));
}

#[test]
fn deleting_a_project_keeps_its_reports() {
    let mut c = fresh();
    c.open_add_report().unwrap();
    assert!(c.report_form_mut().unwrap().project.select("1"));
    c.submit().unwrap();
    c.switch_tab(Tab::Reports).unwrap();

    c.delete_project(ProjectId(1)).unwrap();
    let Some(View::Reports(list)) = c.current_view() else {
        panic!("reports tab not mounted");
    };
    assert_eq!(list.rows[0].project, "Unknown Project");
    let c = reload(c);
    assert_eq!(c.store().report(ReportId(1)).unwrap().project_id, None);
}

#[test]
fn completion_notice_reaches_the_bell_and_persists() {
    let mut c = fresh();
    c.complete_task(TaskId(4)).unwrap();
    let bell = c.notifications_view().unwrap();
    assert_eq!(bell.unread, 3);
    assert!(
        bell.items
            .iter()
            .any(|n| n.kind == NotificationKind::TaskCompleted
                && n.message == "Utility Connections has been completed")
    );

    let mut c = reload(c);
    assert_eq!(c.notifications_view().unwrap().unread, 3);
    c.mark_all_notifications_read().unwrap();
    let c = reload(c);
    assert_eq!(c.notifications_view().unwrap().unread, 0);
}

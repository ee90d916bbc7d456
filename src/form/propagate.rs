//! Commit a submitted form and refresh the views that show what changed.

use log::{debug, info};

use crate::io::storage::Storage;
use crate::store::{ChangeSet, DataStore, StoreError};
use crate::view::registry::ViewRegistry;

use super::forms::{FormErrors, MemberForm, ProjectForm, ReportForm, TaskForm};

/// Why a submission did not go through
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// The form needs correcting; nothing was written
    #[error("{0}")]
    Invalid(FormErrors),
    /// The store could not persist the change; nothing was written
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for SubmitError {
    fn from(err: StoreError) -> Self {
        match FormErrors::from_store(&err) {
            Some(errors) => SubmitError::Invalid(errors),
            None => SubmitError::Store(err),
        }
    }
}

fn finish<S: Storage>(
    changes: ChangeSet,
    store: &DataStore<S>,
    views: &mut ViewRegistry,
) -> ChangeSet {
    let refreshed = views.notify(&changes, store);
    debug!(
        "{} changes refreshed {} mounted views",
        changes.changes.len(),
        refreshed
    );
    changes
}

pub fn submit_task<S: Storage>(
    form: &TaskForm,
    store: &mut DataStore<S>,
    views: &mut ViewRegistry,
) -> Result<ChangeSet, SubmitError> {
    let id = form.id.unwrap_or_else(|| store.next_task_id());
    let task = form.parse(id).map_err(SubmitError::Invalid)?;
    let name = task.name.clone();
    let changes = store.upsert_task(task)?;
    info!("task {} saved: {}", id, name);
    Ok(finish(changes, store, views))
}

pub fn submit_project<S: Storage>(
    form: &ProjectForm,
    store: &mut DataStore<S>,
    views: &mut ViewRegistry,
) -> Result<ChangeSet, SubmitError> {
    let id = form.id.unwrap_or_else(|| store.next_project_id());
    let project = form.parse(id).map_err(SubmitError::Invalid)?;
    let name = project.name.clone();
    let changes = store.upsert_project(project)?;
    info!("project {} saved: {}", id, name);
    Ok(finish(changes, store, views))
}

pub fn submit_member<S: Storage>(
    form: &MemberForm,
    store: &mut DataStore<S>,
    views: &mut ViewRegistry,
) -> Result<ChangeSet, SubmitError> {
    let id = form.id.unwrap_or_else(|| store.next_member_id());
    let member = form.parse(id).map_err(SubmitError::Invalid)?;
    let name = member.name.clone();
    let changes = store.upsert_member(member)?;
    info!("team member {} saved: {}", id, name);
    Ok(finish(changes, store, views))
}

pub fn submit_report<S: Storage>(
    form: &ReportForm,
    store: &mut DataStore<S>,
    views: &mut ViewRegistry,
) -> Result<ChangeSet, SubmitError> {
    let id = form.id.unwrap_or_else(|| store.next_report_id());
    let report = form.parse(id, store.now()).map_err(SubmitError::Invalid)?;
    let date = report.date;
    let changes = store.upsert_report(report)?;
    info!("daily report {} saved for {}", id, date);
    Ok(finish(changes, store, views))
}

/// Refresh views after a mutation that did not come from a form
pub fn propagate<S: Storage>(
    result: Result<ChangeSet, StoreError>,
    store: &DataStore<S>,
    views: &mut ViewRegistry,
) -> Result<ChangeSet, StoreError> {
    result.map(|changes| finish(changes, store, views))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::populate::populate_project_options;
    use crate::io::storage::{MemoryStorage, StorageError};
    use crate::model::config::AppConfig;
    use crate::model::ProjectId;
    use crate::view::pages::{ProjectDetailView, View};
    use crate::view::registry::Topic;
    use crate::store::EntityRef;

    fn setup() -> (DataStore<MemoryStorage>, ViewRegistry) {
        let store = DataStore::load(MemoryStorage::new(), &AppConfig::default()).unwrap();
        (store, ViewRegistry::new())
    }

    #[test]
    fn submit_refreshes_subscribed_views() {
        let (mut store, mut views) = setup();
        let detail = views.mount_with(
            View::ProjectDetail(ProjectDetailView::new(ProjectId(1))),
            vec![Topic::Entity(EntityRef::Project(ProjectId(1)))],
            &store,
        );

        let mut form = ProjectForm::edit(store.project(ProjectId(1)).unwrap());
        form.name = "Downtown Office Tower".into();
        submit_project(&form, &mut store, &mut views).unwrap();

        match views.get(detail) {
            Some(View::ProjectDetail(v)) => assert_eq!(v.title, "Downtown Office Tower"),
            other => panic!("unexpected view {:?}", other),
        }
        assert_eq!(views.refresh_count(detail), Some(2));
    }

    #[test]
    fn invalid_form_changes_nothing() {
        let (mut store, mut views) = setup();
        let detail = views.mount_with(
            View::ProjectDetail(ProjectDetailView::new(ProjectId(1))),
            vec![Topic::Entity(EntityRef::Project(ProjectId(1)))],
            &store,
        );
        let before = store.to_json().unwrap();

        let mut form = ProjectForm::edit(store.project(ProjectId(1)).unwrap());
        form.name = String::new();
        let err = submit_project(&form, &mut store, &mut views).unwrap_err();
        assert!(matches!(err, SubmitError::Invalid(_)));
        assert_eq!(store.to_json().unwrap(), before);
        assert_eq!(views.refresh_count(detail), Some(1));
    }

    #[test]
    fn new_task_gets_next_id() {
        let (mut store, mut views) = setup();
        let mut form = TaskForm::new();
        populate_project_options(&mut form.project, &store);
        form.name = "Pour slab".into();
        form.project.select("3");
        let changes = submit_task(&form, &mut store, &mut views).unwrap();
        assert!(changes.touches(EntityRef::Task(crate::model::TaskId(5))));
        assert_eq!(store.tasks().len(), 5);
    }

    #[test]
    fn referential_failure_becomes_a_field_error() {
        let (mut store, mut views) = setup();
        let mut form = TaskForm::new();
        form.name = "Pour slab".into();
        form.project.preselect(["42".to_string()]);
        match submit_task(&form, &mut store, &mut views) {
            Err(SubmitError::Invalid(errors)) => assert!(errors.for_field("project").is_some()),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn report_submit_creates_then_edits() {
        let (mut store, mut views) = setup();
        let today = chrono::NaiveDate::from_ymd_opt(2024, 4, 2).unwrap();
        let mut form = ReportForm::new(today);
        populate_project_options(&mut form.project, &store);
        form.project.select("2");
        form.hours_worked = "6".into();
        let changes = submit_report(&form, &mut store, &mut views).unwrap();
        let id = crate::model::ReportId(1);
        assert!(changes.touches(EntityRef::Report(id)));

        let mut edit = ReportForm::edit(store.report(id).unwrap());
        edit.notes = "Crane down after lunch".into();
        submit_report(&edit, &mut store, &mut views).unwrap();
        assert_eq!(store.reports().len(), 1);
        assert_eq!(store.report(id).unwrap().notes, "Crane down after lunch");
    }

    #[test]
    fn storage_failure_is_not_a_form_error() {
        let (mut store, mut views) = setup();
        store.storage_mut().set_read_only(true);
        let mut form = MemberForm::new();
        form.name = "Lena Park".into();
        form.email = "lena@company.com".into();
        assert!(matches!(
            submit_member(&form, &mut store, &mut views),
            Err(SubmitError::Store(StoreError::Storage(StorageError::ReadOnly)))
        ));
        assert_eq!(store.members().len(), 3);
    }
}

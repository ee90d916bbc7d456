//! Tab navigation and the modal flows, wired to the store and the mounted
//! views.

use chrono::NaiveDate;
use log::{debug, info};

use crate::form::populate::{
    debug_info, populate_assignee_options, populate_dependency_options, populate_project_options,
};
use crate::form::propagate::{
    SubmitError, propagate, submit_member, submit_project, submit_report, submit_task,
};
use crate::form::{FormErrors, MemberForm, ProjectForm, ReportForm, TaskForm};
use crate::io::storage::Storage;
use crate::model::{MemberId, NotificationId, ProjectId, ReportId, ReportStatus, TaskId, TaskStatus};
use crate::ops::reports::ReportFilter;
use crate::ops::search::TaskFilter;
use crate::store::{ChangeSet, DataStore, StoreError};

use super::modal::{Modal, ModalError, ModalForm, ModalKind, ModalPhase};
use super::pages::{
    CalendarView, DashboardView, NotificationsView, ProjectDetailView, ProjectListView,
    ReportListView, TaskListView, TeamListView, View,
};
use super::registry::{ViewId, ViewRegistry};

/// Top-level page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Dashboard,
    Projects,
    ProjectDetails(ProjectId),
    Tasks,
    Team,
    Reports,
    /// The week holding `date`
    Calendar {
        date: NaiveDate,
        project: Option<ProjectId>,
    },
}

/// Error type for controller actions
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error(transparent)]
    Modal(#[from] ModalError),
    /// The form was rejected; the modal stays open with the errors attached
    #[error("{0}")]
    Invalid(FormErrors),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<SubmitError> for ControllerError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::Invalid(errors) => ControllerError::Invalid(errors),
            SubmitError::Store(e) => ControllerError::Store(e),
        }
    }
}

/// Owns the store, the mounted views, and the single modal slot.
pub struct Controller<S: Storage> {
    store: DataStore<S>,
    views: ViewRegistry,
    modal: Modal,
    tab: Tab,
    tab_view: Option<ViewId>,
    bell: ViewId,
    today: NaiveDate,
}

impl<S: Storage> Controller<S> {
    /// Start on the dashboard with the notification bell mounted. `today`
    /// dates the overdue counter, new reports, and the due-task check.
    pub fn new(store: DataStore<S>, today: NaiveDate) -> Self {
        let mut views = ViewRegistry::new();
        let bell = views.mount(View::Notifications(NotificationsView::default()), &store);
        let mut controller = Controller {
            store,
            views,
            modal: Modal::new(),
            tab: Tab::Dashboard,
            tab_view: None,
            bell,
            today,
        };
        controller.mount_tab(Tab::Dashboard);
        controller
    }

    pub fn store(&self) -> &DataStore<S> {
        &self.store
    }

    pub fn into_store(self) -> DataStore<S> {
        self.store
    }

    pub fn views(&self) -> &ViewRegistry {
        &self.views
    }

    /// Mount an extra view outside the tab, such as a side panel
    pub fn mount(&mut self, view: View) -> ViewId {
        self.views.mount(view, &self.store)
    }

    pub fn unmount(&mut self, id: ViewId) -> Option<View> {
        self.views.unmount(id)
    }

    pub fn modal(&self) -> &Modal {
        &self.modal
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// The notification bell, mounted for the controller's whole life
    pub fn notifications_view(&self) -> Option<&NotificationsView> {
        match self.views.get(self.bell) {
            Some(View::Notifications(v)) => Some(v),
            _ => None,
        }
    }

    // -----------------------------------------------------------------------
    // Tabs
    // -----------------------------------------------------------------------

    pub fn tab(&self) -> Tab {
        self.tab
    }

    /// The view mounted for the current tab
    pub fn current_view(&self) -> Option<&View> {
        self.tab_view.and_then(|id| self.views.get(id))
    }

    pub fn current_view_id(&self) -> Option<ViewId> {
        self.tab_view
    }

    pub fn switch_tab(&mut self, tab: Tab) -> Result<(), ControllerError> {
        if let Tab::ProjectDetails(id) = tab
            && self.store.project(id).is_none()
        {
            return Err(StoreError::UnknownProject(id).into());
        }
        if let Some(old) = self.tab_view.take() {
            self.views.unmount(old);
        }
        self.mount_tab(tab);
        debug!("switched to tab {:?}", tab);
        Ok(())
    }

    pub fn show_project_details(&mut self, id: ProjectId) -> Result<(), ControllerError> {
        self.switch_tab(Tab::ProjectDetails(id))
    }

    fn mount_tab(&mut self, tab: Tab) {
        let view = match tab {
            Tab::Dashboard => View::Dashboard(DashboardView::new(self.today)),
            Tab::Projects => View::ProjectList(ProjectListView::default()),
            Tab::ProjectDetails(id) => View::ProjectDetail(ProjectDetailView::new(id)),
            Tab::Tasks => View::TaskList(TaskListView::default()),
            Tab::Team => View::Team(TeamListView::default()),
            Tab::Reports => View::Reports(ReportListView::default()),
            Tab::Calendar { date, project } => View::Calendar(CalendarView::new(date, project)),
        };
        self.tab = tab;
        self.tab_view = Some(self.views.mount(view, &self.store));
    }

    /// Replace the task list's filter; switches to the Tasks tab first.
    pub fn set_task_filter(&mut self, filter: TaskFilter) -> Result<(), ControllerError> {
        if self.tab != Tab::Tasks {
            self.switch_tab(Tab::Tasks)?;
        }
        if let Some(id) = self.tab_view {
            self.views.update(id, &self.store, |view| {
                if let View::TaskList(list) = view {
                    list.filter = filter;
                }
            });
        }
        Ok(())
    }

    /// Replace the report list's filter; switches to the Reports tab first.
    pub fn set_report_filter(&mut self, filter: ReportFilter) -> Result<(), ControllerError> {
        if let Some(pid) = filter.project
            && self.store.project(pid).is_none()
        {
            return Err(StoreError::UnknownProject(pid).into());
        }
        if self.tab != Tab::Reports {
            self.switch_tab(Tab::Reports)?;
        }
        if let Some(id) = self.tab_view {
            self.views.update(id, &self.store, |view| {
                if let View::Reports(list) = view {
                    list.filter = filter;
                }
            });
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Opening modals
    // -----------------------------------------------------------------------

    /// Hidden -> Opening -> Visible. Any other open modal is cancelled first,
    /// and the form is populated before it becomes visible.
    fn open(&mut self, form: ModalForm) -> Result<(), ControllerError> {
        if self.modal.phase() == ModalPhase::Visible {
            debug!("cancelling open {:?} modal", self.modal.kind());
            self.modal.close()?;
        }
        self.modal.begin_open(form)?;
        match self.modal.form_mut()? {
            ModalForm::Task(form) => populate_task_form(form, &self.store),
            ModalForm::Report(form) => populate_project_options(&mut form.project, &self.store),
            ModalForm::Project(_) | ModalForm::Member(_) => {}
        }
        self.modal.transition(ModalPhase::Visible)?;
        Ok(())
    }

    /// "Add Task"
    pub fn open_add_task(&mut self) -> Result<(), ControllerError> {
        self.open(ModalForm::Task(TaskForm::new()))
    }

    /// "Edit Task"
    pub fn open_edit_task(&mut self, id: TaskId) -> Result<(), ControllerError> {
        let task = self.store.task(id).ok_or(StoreError::UnknownTask(id))?;
        let form = TaskForm::edit(task);
        self.open(ModalForm::Task(form))
    }

    /// "Add Task to Project": the project selector is fixed to `project`
    pub fn open_add_task_to_project(&mut self, project: ProjectId) -> Result<(), ControllerError> {
        if self.store.project(project).is_none() {
            return Err(StoreError::UnknownProject(project).into());
        }
        self.open(ModalForm::Task(TaskForm::for_project(project)))
    }

    /// "Add Project"
    pub fn open_add_project(&mut self) -> Result<(), ControllerError> {
        self.open(ModalForm::Project(ProjectForm::new()))
    }

    /// "Edit Project"
    pub fn open_edit_project(&mut self, id: ProjectId) -> Result<(), ControllerError> {
        let project = self.store.project(id).ok_or(StoreError::UnknownProject(id))?;
        let form = ProjectForm::edit(project);
        self.open(ModalForm::Project(form))
    }

    /// "Add Member"
    pub fn open_add_member(&mut self) -> Result<(), ControllerError> {
        self.open(ModalForm::Member(MemberForm::new()))
    }

    /// "Edit Member"
    pub fn open_edit_member(&mut self, id: MemberId) -> Result<(), ControllerError> {
        let member = self.store.member(id).ok_or(StoreError::UnknownMember(id))?;
        let form = MemberForm::edit(member);
        self.open(ModalForm::Member(form))
    }

    /// "New Daily Report", dated today
    pub fn open_add_report(&mut self) -> Result<(), ControllerError> {
        self.open(ModalForm::Report(ReportForm::new(self.today)))
    }

    /// "Edit Report"
    pub fn open_edit_report(&mut self, id: ReportId) -> Result<(), ControllerError> {
        let report = self.store.report(id).ok_or(StoreError::UnknownReport(id))?;
        let form = ReportForm::edit(report);
        self.open(ModalForm::Report(form))
    }

    pub fn task_form_mut(&mut self) -> Result<&mut TaskForm, ModalError> {
        self.visible()?;
        self.modal.task_form_mut()
    }

    pub fn project_form_mut(&mut self) -> Result<&mut ProjectForm, ModalError> {
        self.visible()?;
        self.modal.project_form_mut()
    }

    pub fn member_form_mut(&mut self) -> Result<&mut MemberForm, ModalError> {
        self.visible()?;
        self.modal.member_form_mut()
    }

    pub fn report_form_mut(&mut self) -> Result<&mut ReportForm, ModalError> {
        self.visible()?;
        self.modal.report_form_mut()
    }

    fn visible(&self) -> Result<(), ModalError> {
        if self.modal.is_visible() {
            Ok(())
        } else {
            Err(ModalError::NotOpen)
        }
    }

    // -----------------------------------------------------------------------
    // Submitting and cancelling
    // -----------------------------------------------------------------------

    /// Commit the open form. On success the store is persisted, subscribed
    /// views are refreshed, and only then does the modal close. On failure
    /// the modal stays visible; field errors are attached to the form.
    pub fn submit(&mut self) -> Result<ChangeSet, ControllerError> {
        self.visible()?;
        let result = match self.modal.form_mut()? {
            ModalForm::Task(form) => submit_task(form, &mut self.store, &mut self.views),
            ModalForm::Project(form) => submit_project(form, &mut self.store, &mut self.views),
            ModalForm::Member(form) => submit_member(form, &mut self.store, &mut self.views),
            ModalForm::Report(form) => submit_report(form, &mut self.store, &mut self.views),
        };

        match result {
            Ok(changes) => {
                self.modal.close()?;
                Ok(changes)
            }
            Err(SubmitError::Invalid(errors)) => {
                set_form_errors(self.modal.form_mut()?, errors.clone());
                Err(ControllerError::Invalid(errors))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Close the open modal without touching the store
    pub fn cancel(&mut self) -> Result<(), ControllerError> {
        self.modal.close()?;
        Ok(())
    }

    /// Which kind of modal is visible, if any
    pub fn open_modal(&self) -> Option<ModalKind> {
        if self.modal.is_visible() {
            self.modal.kind()
        } else {
            None
        }
    }

    // -----------------------------------------------------------------------
    // Row actions
    // -----------------------------------------------------------------------

    /// "Start Task"
    pub fn start_task(&mut self, id: TaskId) -> Result<ChangeSet, ControllerError> {
        self.set_task_status(id, TaskStatus::InProgress)
    }

    /// "Mark Complete"
    pub fn complete_task(&mut self, id: TaskId) -> Result<ChangeSet, ControllerError> {
        self.set_task_status(id, TaskStatus::Completed)
    }

    pub fn set_task_status(
        &mut self,
        id: TaskId,
        status: TaskStatus,
    ) -> Result<ChangeSet, ControllerError> {
        let result = self.store.set_task_status(id, status);
        Ok(propagate(result, &self.store, &mut self.views)?)
    }

    pub fn delete_task(&mut self, id: TaskId) -> Result<ChangeSet, ControllerError> {
        let result = self.store.delete_task(id);
        let changes = propagate(result, &self.store, &mut self.views)?;
        info!("deleted task {}", id);
        Ok(changes)
    }

    pub fn delete_member(&mut self, id: MemberId) -> Result<ChangeSet, ControllerError> {
        let result = self.store.delete_member(id);
        let changes = propagate(result, &self.store, &mut self.views)?;
        info!("deleted team member {}", id);
        Ok(changes)
    }

    /// Delete a project. Leaves its details page if that page is showing.
    pub fn delete_project(&mut self, id: ProjectId) -> Result<ChangeSet, ControllerError> {
        let result = self.store.delete_project(id);
        let changes = propagate(result, &self.store, &mut self.views)?;
        info!("deleted project {}", id);
        if self.tab == Tab::ProjectDetails(id) {
            self.switch_tab(Tab::Projects)?;
        }
        Ok(changes)
    }

    /// "Submit" on a draft report
    pub fn submit_report_for_review(&mut self, id: ReportId) -> Result<ChangeSet, ControllerError> {
        let result = self.store.set_report_status(id, ReportStatus::Submitted);
        Ok(propagate(result, &self.store, &mut self.views)?)
    }

    /// "Approve"
    pub fn approve_report(&mut self, id: ReportId) -> Result<ChangeSet, ControllerError> {
        let result = self.store.set_report_status(id, ReportStatus::Approved);
        let changes = propagate(result, &self.store, &mut self.views)?;
        info!("approved report {}", id);
        Ok(changes)
    }

    // -----------------------------------------------------------------------
    // Notifications
    // -----------------------------------------------------------------------

    pub fn mark_notification_read(
        &mut self,
        id: NotificationId,
    ) -> Result<ChangeSet, ControllerError> {
        let result = self.store.mark_notification_read(id);
        Ok(propagate(result, &self.store, &mut self.views)?)
    }

    /// "Mark all read"
    pub fn mark_all_notifications_read(&mut self) -> Result<ChangeSet, ControllerError> {
        let result = self.store.mark_all_notifications_read();
        Ok(propagate(result, &self.store, &mut self.views)?)
    }

    /// Raise due and overdue notices as of today
    pub fn check_due_tasks(&mut self) -> Result<ChangeSet, ControllerError> {
        let result = self.store.notify_due_tasks(self.today);
        let changes = propagate(result, &self.store, &mut self.views)?;
        if !changes.is_empty() {
            info!("raised {} due-task notifications", changes.changes.len());
        }
        Ok(changes)
    }
}

fn populate_task_form<S: Storage>(form: &mut TaskForm, store: &DataStore<S>) {
    populate_project_options(&mut form.project, store);
    populate_assignee_options(&mut form.assignee, store);
    populate_dependency_options(&mut form.dependencies, store, form.id);
    form.debug_info = debug_info(store);
}

fn set_form_errors(form: &mut ModalForm, errors: FormErrors) {
    match form {
        ModalForm::Task(f) => f.errors = errors,
        ModalForm::Project(f) => f.errors = errors,
        ModalForm::Member(f) => f.errors = errors,
        ModalForm::Report(f) => f.errors = errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::storage::MemoryStorage;
    use crate::model::config::AppConfig;
    use pretty_assertions::assert_eq;

    fn controller() -> Controller<MemoryStorage> {
        let store = DataStore::load(MemoryStorage::new(), &AppConfig::default()).unwrap();
        Controller::new(store, NaiveDate::from_ymd_opt(2024, 4, 1).unwrap())
    }

    #[test]
    fn opening_a_task_modal_populates_it() {
        let mut c = controller();
        c.open_add_task().unwrap();
        assert_eq!(c.open_modal(), Some(ModalKind::Task));
        let form = c.task_form_mut().unwrap();
        assert_eq!(form.project.options.len(), 4);
        assert_eq!(form.assignee.options.len(), 4);
        assert_eq!(form.dependencies.options.len(), 5);
        assert_eq!(form.debug_info, "Projects: 3, Team: 3");
    }

    #[test]
    fn opening_another_modal_cancels_the_first() {
        let mut c = controller();
        c.open_add_member().unwrap();
        c.member_form_mut().unwrap().name = "half typed".into();
        c.open_add_project().unwrap();
        assert_eq!(c.open_modal(), Some(ModalKind::Project));
        assert_eq!(c.store().members().len(), 3);
    }

    #[test]
    fn invalid_submit_keeps_modal_open_with_errors() {
        let mut c = controller();
        c.open_add_task().unwrap();
        let err = c.submit().unwrap_err();
        assert!(matches!(err, ControllerError::Invalid(_)));
        assert_eq!(c.open_modal(), Some(ModalKind::Task));
        let form = c.task_form_mut().unwrap();
        assert!(form.errors.for_field("name").is_some());
        assert!(form.errors.for_field("project").is_some());
    }

    #[test]
    fn submit_closes_after_refreshing_the_tab() {
        let mut c = controller();
        c.switch_tab(Tab::Tasks).unwrap();
        c.open_add_task_to_project(ProjectId(3)).unwrap();
        let form = c.task_form_mut().unwrap();
        form.name = "Bridge deck survey".into();
        assert!(!form.project.select("1"));
        c.submit().unwrap();

        assert_eq!(c.modal().phase(), ModalPhase::Hidden);
        let Some(View::TaskList(list)) = c.current_view() else {
            panic!("tasks tab not mounted");
        };
        let last = list.rows.last().unwrap();
        assert_eq!(last.name, "Bridge deck survey");
        assert_eq!(last.project.as_deref(), Some("Highway Infrastructure Upgrade"));
    }

    #[test]
    fn submit_and_cancel_need_a_visible_modal() {
        let mut c = controller();
        assert!(matches!(c.submit(), Err(ControllerError::Modal(ModalError::NotOpen))));
        assert!(matches!(c.cancel(), Err(ControllerError::Modal(ModalError::NotOpen))));
    }

    #[test]
    fn details_tab_follows_the_project() {
        let mut c = controller();
        assert!(c.show_project_details(ProjectId(9)).is_err());
        c.show_project_details(ProjectId(2)).unwrap();
        // the tab plus the notification bell
        assert_eq!(c.views().len(), 2);
        c.delete_project(ProjectId(2)).unwrap();
        assert_eq!(c.tab(), Tab::Projects);
        let Some(View::ProjectList(list)) = c.current_view() else {
            panic!("projects tab not mounted");
        };
        assert_eq!(list.rows.len(), 2);
    }

    #[test]
    fn row_actions_refresh_the_dashboard() {
        let mut c = controller();
        c.complete_task(TaskId(2)).unwrap();
        let Some(View::Dashboard(dash)) = c.current_view() else {
            panic!("dashboard not mounted");
        };
        assert_eq!(dash.stats.completed_tasks, 3);
        assert_eq!(dash.stats.overdue_tasks, 0);
    }

    #[test]
    fn task_filter_rerenders_the_list() {
        let mut c = controller();
        c.set_task_filter(TaskFilter {
            search: Some("utility".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(c.tab(), Tab::Tasks);
        let Some(View::TaskList(list)) = c.current_view() else {
            panic!("tasks tab not mounted");
        };
        assert_eq!(list.rows.len(), 1);
    }

    #[test]
    fn report_modal_flow() {
        let mut c = controller();
        c.switch_tab(Tab::Reports).unwrap();
        c.open_add_report().unwrap();
        let form = c.report_form_mut().unwrap();
        assert_eq!(form.date, "2024-04-01");
        assert_eq!(form.project.labels()[0], "Select Project");
        assert!(form.project.select("1"));
        form.workers = "8".into();
        c.submit().unwrap();

        c.submit_report_for_review(ReportId(1)).unwrap();
        c.approve_report(ReportId(1)).unwrap();
        let Some(View::Reports(list)) = c.current_view() else {
            panic!("reports tab not mounted");
        };
        assert_eq!(list.rows[0].status, ReportStatus::Approved);
        assert_eq!(list.rows[0].approved_by.as_deref(), Some("Supervisor"));

        c.open_edit_report(ReportId(1)).unwrap();
        c.report_form_mut().unwrap().hours_worked = "lots".into();
        assert!(matches!(c.submit(), Err(ControllerError::Invalid(_))));
        assert_eq!(c.open_modal(), Some(ModalKind::Report));
    }

    #[test]
    fn report_filter_needs_a_real_project() {
        let mut c = controller();
        let bad = ReportFilter {
            project: Some(ProjectId(9)),
            ..Default::default()
        };
        assert!(c.set_report_filter(bad).is_err());
        c.set_report_filter(ReportFilter {
            status: Some(ReportStatus::Submitted),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(c.tab(), Tab::Reports);
    }

    #[test]
    fn bell_follows_notification_changes() {
        let mut c = controller();
        assert_eq!(c.notifications_view().unwrap().unread, 2);

        // completion raises a notice that reaches the bell
        c.complete_task(TaskId(4)).unwrap();
        assert_eq!(c.notifications_view().unwrap().unread, 3);

        c.mark_notification_read(NotificationId(1)).unwrap();
        assert_eq!(c.notifications_view().unwrap().unread, 2);
        c.mark_all_notifications_read().unwrap();
        assert_eq!(c.notifications_view().unwrap().unread, 0);
    }

    #[test]
    fn due_check_uses_the_controller_date() {
        let mut c = controller();
        let changes = c.check_due_tasks().unwrap();
        // on 2024-04-01 only Steel Framework is late, and it is already flagged
        assert!(changes.is_empty());
        c.mark_all_notifications_read().unwrap();
        let changes = c.check_due_tasks().unwrap();
        assert_eq!(changes.changes.len(), 1);
        assert_eq!(c.notifications_view().unwrap().unread, 1);
    }

    #[test]
    fn calendar_tab_shows_the_week() {
        let mut c = controller();
        let date = NaiveDate::from_ymd_opt(2024, 3, 27).unwrap();
        c.switch_tab(Tab::Calendar {
            date,
            project: None,
        })
        .unwrap();
        let Some(View::Calendar(cal)) = c.current_view() else {
            panic!("calendar not mounted");
        };
        assert_eq!(cal.week_start, NaiveDate::from_ymd_opt(2024, 3, 24).unwrap());
        let due: Vec<&str> = cal
            .days
            .iter()
            .flat_map(|(_, rows)| rows.iter().map(|r| r.name.as_str()))
            .collect();
        assert_eq!(due, vec!["Steel Framework Installation"]);
    }
}

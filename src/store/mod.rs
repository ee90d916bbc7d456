//! The canonical in-memory store of projects, team members, tasks,
//! notifications, and daily reports.
//!
//! Every mutation validates against the current state, writes the full
//! snapshot to durable storage, and only then becomes visible in memory. A
//! failed write leaves the store exactly as it was.

pub mod seed;
pub mod snapshot;

use chrono::{DateTime, NaiveDate, Utc};
use log::{debug, info, warn};

use crate::io::storage::{Storage, StorageError, WriteOp};
use crate::model::config::AppConfig;
use crate::model::{
    APPROVER, DailyReport, MemberId, NewNotification, Notification, NotificationId,
    NotificationKind, Priority, Project, ProjectId, ReportId, ReportStatus, Task, TaskId,
    TaskStatus, TeamMember,
};

use snapshot::{Snapshot, SnapshotError, StoreData};

/// Source of timestamps for notifications and reports
pub type Clock = fn() -> DateTime<Utc>;

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("project not found: {0}")]
    UnknownProject(ProjectId),
    #[error("team member not found: {0}")]
    UnknownMember(MemberId),
    #[error("task not found: {0}")]
    UnknownTask(TaskId),
    #[error("notification not found: {0}")]
    UnknownNotification(NotificationId),
    #[error("report not found: {0}")]
    UnknownReport(ReportId),
    #[error("{entity} {id} was deleted and its id cannot be reused")]
    RetiredId { entity: &'static str, id: u64 },
    #[error("no {entity} ids are left")]
    IdExhausted { entity: &'static str },
    #[error("{entity} name cannot be empty")]
    EmptyName { entity: &'static str },
    #[error("progress must be between 0 and 100, got {0}")]
    InvalidProgress(u8),
    #[error("hours worked must be zero or more, got {0}")]
    InvalidHours(f64),
    #[error("report {id} is {} and cannot become {}", .from.as_str(), .to.as_str())]
    ReportTransition {
        id: ReportId,
        from: ReportStatus,
        to: ReportStatus,
    },
    #[error("task {0} cannot depend on itself")]
    SelfDependency(TaskId),
    #[error("dependency on task {dep} would create a cycle")]
    DependencyCycle { task: TaskId, dep: TaskId },
    #[error("built-in sample data is invalid: {0}")]
    InvalidSeed(SnapshotError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("could not serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Which collection an entity belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Projects,
    Team,
    Tasks,
    Notifications,
    Reports,
}

/// A reference to one stored entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityRef {
    Project(ProjectId),
    Member(MemberId),
    Task(TaskId),
    Notification(NotificationId),
    Report(ReportId),
}

impl EntityRef {
    pub fn collection(self) -> Collection {
        match self {
            EntityRef::Project(_) => Collection::Projects,
            EntityRef::Member(_) => Collection::Team,
            EntityRef::Task(_) => Collection::Tasks,
            EntityRef::Notification(_) => Collection::Notifications,
            EntityRef::Report(_) => Collection::Reports,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Change {
    pub entity: EntityRef,
    pub kind: ChangeKind,
}

/// Every entity touched by one mutation, in the order it was touched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub changes: Vec<Change>,
}

impl ChangeSet {
    fn push(&mut self, entity: EntityRef, kind: ChangeKind) {
        self.changes.push(Change { entity, kind });
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn touches(&self, entity: EntityRef) -> bool {
        self.changes.iter().any(|c| c.entity == entity)
    }

    pub fn touches_collection(&self, collection: Collection) -> bool {
        self.changes
            .iter()
            .any(|c| c.entity.collection() == collection)
    }
}

/// How the store came to hold its current contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// An existing snapshot was restored
    Restored,
    /// No snapshot existed; sample data was written
    Seeded,
    /// No snapshot existed and seeding is disabled; an empty store was written
    Initialized,
    /// The snapshot was unusable; it was set aside and sample data written
    Recovered { reason: String },
}

/// The data store, bound to the storage it persists into.
pub struct DataStore<S: Storage> {
    storage: S,
    key: String,
    data: StoreData,
    outcome: LoadOutcome,
    clock: Clock,
}

impl<S: Storage> DataStore<S> {
    /// Load the store from `storage`, seeding on first run.
    ///
    /// A missing, empty, or corrupt snapshot is never an error: the first two
    /// are the normal first-run condition, and a corrupt one is kept verbatim
    /// under `"<key>.corrupt"` before reseeding. The copy and the fresh
    /// snapshot are written as one batch, so the unreadable text is never
    /// replaced without being kept. Only storage failures are returned.
    pub fn load(mut storage: S, config: &AppConfig) -> Result<Self, StoreError> {
        let key = config.storage.key.clone();
        let raw = storage.get(&key)?;

        let restored = match raw {
            None => None,
            Some(text) if text.trim().is_empty() => None,
            Some(text) => match snapshot::decode(text.trim()) {
                Ok(data) => Some(Ok(data)),
                Err(e) => Some(Err((e, text))),
            },
        };

        let mut corrupt = None;
        let (data, outcome) = match restored {
            Some(Ok(data)) => {
                info!(
                    "restored snapshot {}: {} projects, {} members, {} tasks, {} reports",
                    key,
                    data.projects.len(),
                    data.members.len(),
                    data.tasks.len(),
                    data.reports.len()
                );
                (data, LoadOutcome::Restored)
            }
            Some(Err((e, text))) => {
                warn!("snapshot {} is unusable ({}); reseeding", key, e);
                corrupt = Some(text);
                let data = initial_data(config)?;
                (
                    data,
                    LoadOutcome::Recovered {
                        reason: e.to_string(),
                    },
                )
            }
            None => {
                let data = initial_data(config)?;
                let outcome = if config.seed.enabled {
                    LoadOutcome::Seeded
                } else {
                    LoadOutcome::Initialized
                };
                (data, outcome)
            }
        };

        if outcome != LoadOutcome::Restored {
            let json = snapshot::encode(&data)?;
            let corrupt_key = format!("{}.corrupt", key);
            let mut ops = Vec::with_capacity(2);
            if let Some(text) = corrupt.as_deref() {
                ops.push(WriteOp::Set {
                    key: &corrupt_key,
                    value: text,
                });
            }
            ops.push(WriteOp::Set {
                key: &key,
                value: &json,
            });
            storage.apply(&ops)?;
            info!("wrote initial snapshot {}", key);
        }

        Ok(DataStore {
            storage,
            key,
            data,
            outcome,
            clock: Utc::now,
        })
    }

    /// Use `clock` for every timestamp the store records from now on
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Delete the durable snapshot so the next load starts over.
    pub fn clear(storage: &mut S, config: &AppConfig) -> Result<(), StorageError> {
        storage.remove(&config.storage.key)
    }

    pub fn load_outcome(&self) -> &LoadOutcome {
        &self.outcome
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Projects in insertion order
    pub fn projects(&self) -> impl ExactSizeIterator<Item = &Project> {
        self.data.projects.values()
    }

    /// Team members in insertion order
    pub fn members(&self) -> impl ExactSizeIterator<Item = &TeamMember> {
        self.data.members.values()
    }

    /// Tasks in insertion order
    pub fn tasks(&self) -> impl ExactSizeIterator<Item = &Task> {
        self.data.tasks.values()
    }

    /// Notifications in the order they were raised
    pub fn notifications(&self) -> impl ExactSizeIterator<Item = &Notification> {
        self.data.notifications.values()
    }

    /// Daily reports in the order they were filed
    pub fn reports(&self) -> impl ExactSizeIterator<Item = &DailyReport> {
        self.data.reports.values()
    }

    pub fn project(&self, id: ProjectId) -> Option<&Project> {
        self.data.projects.get(&id)
    }

    pub fn member(&self, id: MemberId) -> Option<&TeamMember> {
        self.data.members.get(&id)
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.data.tasks.get(&id)
    }

    pub fn notification(&self, id: NotificationId) -> Option<&Notification> {
        self.data.notifications.get(&id)
    }

    pub fn report(&self, id: ReportId) -> Option<&DailyReport> {
        self.data.reports.get(&id)
    }

    /// Tasks attached to a project, in insertion order
    pub fn tasks_for_project(&self, id: ProjectId) -> impl Iterator<Item = &Task> {
        self.tasks().filter(move |t| t.project_id == Some(id))
    }

    /// The id the next created project will get
    pub fn next_project_id(&self) -> ProjectId {
        ProjectId(self.data.next_ids.project)
    }

    pub fn next_member_id(&self) -> MemberId {
        MemberId(self.data.next_ids.member)
    }

    pub fn next_task_id(&self) -> TaskId {
        TaskId(self.data.next_ids.task)
    }

    pub fn next_report_id(&self) -> ReportId {
        ReportId(self.data.next_ids.report)
    }

    /// Serializable copy of the whole store
    pub fn snapshot(&self) -> Snapshot {
        self.data.to_snapshot()
    }

    /// The exact text that is (or would be) written to storage
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        snapshot::encode(&self.data)
    }

    // -----------------------------------------------------------------------
    // Upserts
    // -----------------------------------------------------------------------

    /// Replace the project with the same id, or append it.
    pub fn upsert_project(&mut self, project: Project) -> Result<ChangeSet, StoreError> {
        if project.name.trim().is_empty() {
            return Err(StoreError::EmptyName { entity: "project" });
        }
        if project.progress > 100 {
            return Err(StoreError::InvalidProgress(project.progress));
        }
        let id = project.id;
        let exists = self.data.projects.contains_key(&id);
        if !exists && id.0 < self.data.next_ids.project {
            return Err(StoreError::RetiredId {
                entity: "project",
                id: id.0,
            });
        }

        let mut next = self.data.clone();
        next.projects.insert(id, project);
        if !exists {
            claim(&mut next.next_ids.project, id.0, "project")?;
        }

        let mut changes = ChangeSet::default();
        changes.push(EntityRef::Project(id), created_or_updated(exists));
        self.commit(next, changes)
    }

    /// Replace the team member with the same id, or append it.
    pub fn upsert_member(&mut self, member: TeamMember) -> Result<ChangeSet, StoreError> {
        if member.name.trim().is_empty() {
            return Err(StoreError::EmptyName {
                entity: "team member",
            });
        }
        let id = member.id;
        let exists = self.data.members.contains_key(&id);
        if !exists && id.0 < self.data.next_ids.member {
            return Err(StoreError::RetiredId {
                entity: "team member",
                id: id.0,
            });
        }

        let mut next = self.data.clone();
        next.members.insert(id, member);
        if !exists {
            claim(&mut next.next_ids.member, id.0, "team member")?;
        }

        let mut changes = ChangeSet::default();
        changes.push(EntityRef::Member(id), created_or_updated(exists));
        self.commit(next, changes)
    }

    /// Replace the task with the same id, or append it. Its project,
    /// assignee, and dependencies must all exist. An existing task that
    /// becomes completed raises a "task-completed" notification in the same
    /// write.
    pub fn upsert_task(&mut self, task: Task) -> Result<ChangeSet, StoreError> {
        if task.name.trim().is_empty() {
            return Err(StoreError::EmptyName { entity: "task" });
        }
        let id = task.id;
        let previous = self.data.tasks.get(&id);
        let exists = previous.is_some();
        if !exists && id.0 < self.data.next_ids.task {
            return Err(StoreError::RetiredId {
                entity: "task",
                id: id.0,
            });
        }
        self.validate_task_refs(&task)?;
        let completed_now = task.status == TaskStatus::Completed
            && previous.is_some_and(|old| old.status != TaskStatus::Completed);

        let mut next = self.data.clone();
        let mut changes = ChangeSet::default();
        let completion = completed_now.then(|| {
            let mut n = NewNotification::new(
                NotificationKind::TaskCompleted,
                format!("{} has been completed", task.name),
            );
            n.task_id = Some(id);
            n.project_id = task.project_id;
            n
        });
        next.tasks.insert(id, task);
        if !exists {
            claim(&mut next.next_ids.task, id.0, "task")?;
        }
        changes.push(EntityRef::Task(id), created_or_updated(exists));
        if let Some(draft) = completion {
            raise(&mut next, &mut changes, draft, self.now())?;
        }
        self.commit(next, changes)
    }

    /// Change only a task's status
    pub fn set_task_status(
        &mut self,
        id: TaskId,
        status: TaskStatus,
    ) -> Result<ChangeSet, StoreError> {
        let mut task = self.task(id).cloned().ok_or(StoreError::UnknownTask(id))?;
        task.status = status;
        self.upsert_task(task)
    }

    fn validate_task_refs(&self, task: &Task) -> Result<(), StoreError> {
        if let Some(pid) = task.project_id
            && !self.data.projects.contains_key(&pid)
        {
            return Err(StoreError::UnknownProject(pid));
        }
        if let Some(mid) = task.assignee
            && !self.data.members.contains_key(&mid)
        {
            return Err(StoreError::UnknownMember(mid));
        }
        for dep in &task.dependencies {
            if *dep == task.id {
                return Err(StoreError::SelfDependency(task.id));
            }
            if !self.data.tasks.contains_key(dep) {
                return Err(StoreError::UnknownTask(*dep));
            }
            if self.data.dependency_reaches(&[*dep], task.id) {
                return Err(StoreError::DependencyCycle {
                    task: task.id,
                    dep: *dep,
                });
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Daily reports
    // -----------------------------------------------------------------------

    /// Replace the report with the same id, or append it. An edit keeps the
    /// stored review state; status only changes through
    /// [`set_report_status`](Self::set_report_status).
    pub fn upsert_report(&mut self, mut report: DailyReport) -> Result<ChangeSet, StoreError> {
        let hours = report.crew_details.hours_worked;
        if !hours.is_finite() || hours < 0.0 {
            return Err(StoreError::InvalidHours(hours));
        }
        if let Some(pid) = report.project_id
            && !self.data.projects.contains_key(&pid)
        {
            return Err(StoreError::UnknownProject(pid));
        }
        let id = report.id;
        let previous = self.data.reports.get(&id);
        let exists = previous.is_some();
        if !exists && id.0 < self.data.next_ids.report {
            return Err(StoreError::RetiredId {
                entity: "report",
                id: id.0,
            });
        }
        if let Some(old) = previous {
            report.status = old.status;
            report.created_at = old.created_at;
            report.created_by = old.created_by.clone();
            report.approved_by = old.approved_by.clone();
            report.approved_at = old.approved_at;
            report.updated_at = Some(self.now());
        }

        let mut next = self.data.clone();
        next.reports.insert(id, report);
        if !exists {
            claim(&mut next.next_ids.report, id.0, "report")?;
        }

        let mut changes = ChangeSet::default();
        changes.push(EntityRef::Report(id), created_or_updated(exists));
        self.commit(next, changes)
    }

    /// Move a report forward in review. Approval records the approver and
    /// the time.
    pub fn set_report_status(
        &mut self,
        id: ReportId,
        status: ReportStatus,
    ) -> Result<ChangeSet, StoreError> {
        let current = self.report(id).ok_or(StoreError::UnknownReport(id))?.status;
        if !current.can_move_to(status) {
            return Err(StoreError::ReportTransition {
                id,
                from: current,
                to: status,
            });
        }
        let at = self.now();
        let mut next = self.data.clone();
        if let Some(report) = next.reports.get_mut(&id) {
            report.status = status;
            if status == ReportStatus::Approved {
                report.approved_by = Some(APPROVER.to_string());
                report.approved_at = Some(at);
            }
        }
        let mut changes = ChangeSet::default();
        changes.push(EntityRef::Report(id), ChangeKind::Updated);
        self.commit(next, changes)
    }

    // -----------------------------------------------------------------------
    // Notifications
    // -----------------------------------------------------------------------

    /// Record a new unread notification, stamped with the store's clock
    pub fn add_notification(&mut self, draft: NewNotification) -> Result<ChangeSet, StoreError> {
        if let Some(tid) = draft.task_id
            && !self.data.tasks.contains_key(&tid)
        {
            return Err(StoreError::UnknownTask(tid));
        }
        if let Some(pid) = draft.project_id
            && !self.data.projects.contains_key(&pid)
        {
            return Err(StoreError::UnknownProject(pid));
        }
        let mut next = self.data.clone();
        let mut changes = ChangeSet::default();
        raise(&mut next, &mut changes, draft, self.now())?;
        self.commit(next, changes)
    }

    /// Mark one notification read. Reading a read notification changes
    /// nothing and writes nothing.
    pub fn mark_notification_read(&mut self, id: NotificationId) -> Result<ChangeSet, StoreError> {
        let n = self
            .notification(id)
            .ok_or(StoreError::UnknownNotification(id))?;
        if n.read {
            return Ok(ChangeSet::default());
        }
        let mut next = self.data.clone();
        if let Some(n) = next.notifications.get_mut(&id) {
            n.read = true;
        }
        let mut changes = ChangeSet::default();
        changes.push(EntityRef::Notification(id), ChangeKind::Updated);
        self.commit(next, changes)
    }

    pub fn mark_all_notifications_read(&mut self) -> Result<ChangeSet, StoreError> {
        let mut next = self.data.clone();
        let mut changes = ChangeSet::default();
        for n in next.notifications.values_mut().filter(|n| !n.read) {
            n.read = true;
            changes.push(EntityRef::Notification(n.id), ChangeKind::Updated);
        }
        if changes.is_empty() {
            return Ok(changes);
        }
        self.commit(next, changes)
    }

    /// Raise a "task-due" notification for every unfinished task due on or
    /// before `today`, unless that task already has an unread one.
    pub fn notify_due_tasks(&mut self, today: NaiveDate) -> Result<ChangeSet, StoreError> {
        let already: Vec<TaskId> = self
            .notifications()
            .filter(|n| !n.read && n.kind == NotificationKind::TaskDue)
            .filter_map(|n| n.task_id)
            .collect();
        let drafts: Vec<NewNotification> = self
            .tasks()
            .filter(|t| t.status != TaskStatus::Completed && !already.contains(&t.id))
            .filter_map(|t| {
                let due = t.due_date?;
                let message = if due == today {
                    format!("{} is due today", t.name)
                } else if due < today {
                    format!("{} is overdue", t.name)
                } else {
                    return None;
                };
                let mut n = NewNotification::new(NotificationKind::TaskDue, message);
                n.task_id = Some(t.id);
                n.project_id = t.project_id;
                n.priority = Priority::High;
                Some(n)
            })
            .collect();
        if drafts.is_empty() {
            return Ok(ChangeSet::default());
        }

        let at = self.now();
        let mut next = self.data.clone();
        let mut changes = ChangeSet::default();
        for draft in drafts {
            raise(&mut next, &mut changes, draft, at)?;
        }
        self.commit(next, changes)
    }

    // -----------------------------------------------------------------------
    // Deletes
    // -----------------------------------------------------------------------

    /// Delete a project. Its tasks, notifications, and reports stay,
    /// detached from any project.
    pub fn delete_project(&mut self, id: ProjectId) -> Result<ChangeSet, StoreError> {
        if !self.data.projects.contains_key(&id) {
            return Err(StoreError::UnknownProject(id));
        }
        let mut next = self.data.clone();
        let mut changes = ChangeSet::default();
        next.projects.shift_remove(&id);
        changes.push(EntityRef::Project(id), ChangeKind::Deleted);
        for task in next.tasks.values_mut() {
            if task.project_id == Some(id) {
                task.project_id = None;
                changes.push(EntityRef::Task(task.id), ChangeKind::Updated);
            }
        }
        for n in next.notifications.values_mut() {
            if n.project_id == Some(id) {
                n.project_id = None;
                changes.push(EntityRef::Notification(n.id), ChangeKind::Updated);
            }
        }
        for report in next.reports.values_mut() {
            if report.project_id == Some(id) {
                report.project_id = None;
                changes.push(EntityRef::Report(report.id), ChangeKind::Updated);
            }
        }
        self.commit(next, changes)
    }

    /// Delete a team member. Their tasks become unassigned.
    pub fn delete_member(&mut self, id: MemberId) -> Result<ChangeSet, StoreError> {
        if !self.data.members.contains_key(&id) {
            return Err(StoreError::UnknownMember(id));
        }
        let mut next = self.data.clone();
        let mut changes = ChangeSet::default();
        next.members.shift_remove(&id);
        changes.push(EntityRef::Member(id), ChangeKind::Deleted);
        for task in next.tasks.values_mut() {
            if task.assignee == Some(id) {
                task.assignee = None;
                changes.push(EntityRef::Task(task.id), ChangeKind::Updated);
            }
        }
        self.commit(next, changes)
    }

    /// Delete a task, drop it from every other task's dependencies, and
    /// detach the notifications that point at it.
    pub fn delete_task(&mut self, id: TaskId) -> Result<ChangeSet, StoreError> {
        if !self.data.tasks.contains_key(&id) {
            return Err(StoreError::UnknownTask(id));
        }
        let mut next = self.data.clone();
        let mut changes = ChangeSet::default();
        next.tasks.shift_remove(&id);
        changes.push(EntityRef::Task(id), ChangeKind::Deleted);
        for task in next.tasks.values_mut() {
            let before = task.dependencies.len();
            task.dependencies.retain(|dep| *dep != id);
            if task.dependencies.len() != before {
                changes.push(EntityRef::Task(task.id), ChangeKind::Updated);
            }
        }
        for n in next.notifications.values_mut() {
            if n.task_id == Some(id) {
                n.task_id = None;
                changes.push(EntityRef::Notification(n.id), ChangeKind::Updated);
            }
        }
        self.commit(next, changes)
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Write `next` to storage, then adopt it. On failure nothing changes.
    fn commit(&mut self, next: StoreData, changes: ChangeSet) -> Result<ChangeSet, StoreError> {
        let json = snapshot::encode(&next)?;
        self.storage.set(&self.key, &json)?;
        self.data = next;
        debug!("persisted {} ({} changes)", self.key, changes.changes.len());
        Ok(changes)
    }
}

/// Move `counter` past `id`, the id just handed out
fn claim(counter: &mut u64, id: u64, entity: &'static str) -> Result<(), StoreError> {
    *counter = id
        .checked_add(1)
        .ok_or(StoreError::IdExhausted { entity })?;
    Ok(())
}

/// Append `draft` to `next` under the next notification id
fn raise(
    next: &mut StoreData,
    changes: &mut ChangeSet,
    draft: NewNotification,
    at: DateTime<Utc>,
) -> Result<(), StoreError> {
    let id = NotificationId(next.next_ids.notification);
    claim(&mut next.next_ids.notification, id.0, "notification")?;
    next.notifications.insert(id, draft.into_notification(id, at));
    changes.push(EntityRef::Notification(id), ChangeKind::Created);
    Ok(())
}

fn created_or_updated(exists: bool) -> ChangeKind {
    if exists {
        ChangeKind::Updated
    } else {
        ChangeKind::Created
    }
}

fn initial_data(config: &AppConfig) -> Result<StoreData, StoreError> {
    let snapshot = if config.seed.enabled {
        info!("no usable snapshot; seeding sample data");
        seed::sample_snapshot()
    } else {
        seed::empty_snapshot()
    };
    StoreData::from_snapshot(snapshot).map_err(StoreError::InvalidSeed)
}

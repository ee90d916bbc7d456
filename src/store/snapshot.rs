use std::collections::HashSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::model::{
    DailyReport, MemberId, NextIds, Notification, NotificationId, Project, ProjectId, ReportId,
    Task, TaskId, TeamMember,
};

/// Schema version written into every snapshot
pub const SNAPSHOT_VERSION: u32 = 1;

/// Full serialized copy of the store, as written to durable storage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub version: u32,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub team: Vec<TeamMember>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub notifications: Vec<Notification>,
    #[serde(default)]
    pub daily_reports: Vec<DailyReport>,
    /// Absent in hand-written snapshots; derived from the largest ids then
    #[serde(default)]
    pub next_ids: Option<NextIds>,
}

/// Why a stored snapshot could not be used
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("snapshot is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unsupported snapshot version {0}")]
    UnsupportedVersion(u32),
    #[error("duplicate {collection} id {id}")]
    DuplicateId { collection: &'static str, id: u64 },
    #[error("{owner} references missing {target}")]
    DanglingReference { owner: String, target: String },
    #[error("{collection} id {id} leaves no room for another id")]
    IdOverflow { collection: &'static str, id: u64 },
}

/// The in-memory collections, keyed by id, in insertion order
#[derive(Debug, Clone, Default)]
pub(crate) struct StoreData {
    pub projects: IndexMap<ProjectId, Project>,
    pub members: IndexMap<MemberId, TeamMember>,
    pub tasks: IndexMap<TaskId, Task>,
    pub notifications: IndexMap<NotificationId, Notification>,
    pub reports: IndexMap<ReportId, DailyReport>,
    pub next_ids: NextIds,
}

/// Insert every item by id, failing on the first repeated id
fn collect_unique<K, V>(
    collection: &'static str,
    items: Vec<V>,
    id_of: impl Fn(&V) -> K,
    raw: impl Fn(K) -> u64,
) -> Result<IndexMap<K, V>, SnapshotError>
where
    K: std::hash::Hash + Eq + Copy,
{
    let mut map = IndexMap::with_capacity(items.len());
    for item in items {
        let id = id_of(&item);
        if map.insert(id, item).is_some() {
            return Err(SnapshotError::DuplicateId {
                collection,
                id: raw(id),
            });
        }
    }
    Ok(map)
}

/// One past the largest id, or 1 for an empty collection
fn next_after(
    collection: &'static str,
    ids: impl Iterator<Item = u64>,
) -> Result<u64, SnapshotError> {
    ids.map(|id| {
        id.checked_add(1)
            .ok_or(SnapshotError::IdOverflow { collection, id })
    })
    .try_fold(1, |next, id| id.map(|id| next.max(id)))
}

impl StoreData {
    /// Build collections from a snapshot, rejecting duplicate ids, dangling
    /// references, and ids at the top of the id range.
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self, SnapshotError> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion(snapshot.version));
        }

        let mut data = StoreData {
            projects: collect_unique("project", snapshot.projects, |p| p.id, |id| id.0)?,
            members: collect_unique("team member", snapshot.team, |m| m.id, |id| id.0)?,
            tasks: collect_unique("task", snapshot.tasks, |t| t.id, |id| id.0)?,
            notifications: collect_unique(
                "notification",
                snapshot.notifications,
                |n| n.id,
                |id| id.0,
            )?,
            reports: collect_unique("report", snapshot.daily_reports, |r| r.id, |id| id.0)?,
            next_ids: NextIds::default(),
        };
        data.check_references()?;

        // Counters never move below what the collections already use
        let derived = data.derived_next_ids()?;
        let stored = snapshot.next_ids.unwrap_or(derived);
        data.next_ids = NextIds {
            project: stored.project.max(derived.project),
            member: stored.member.max(derived.member),
            task: stored.task.max(derived.task),
            notification: stored.notification.max(derived.notification),
            report: stored.report.max(derived.report),
        };

        Ok(data)
    }

    fn check_references(&self) -> Result<(), SnapshotError> {
        let dangling = |owner: String, target: String| {
            Err(SnapshotError::DanglingReference { owner, target })
        };

        for task in self.tasks.values() {
            if let Some(pid) = task.project_id
                && !self.projects.contains_key(&pid)
            {
                return dangling(format!("task {}", task.id), format!("project {}", pid));
            }
            if let Some(mid) = task.assignee
                && !self.members.contains_key(&mid)
            {
                return dangling(format!("task {}", task.id), format!("team member {}", mid));
            }
            if let Some(dep) = task
                .dependencies
                .iter()
                .find(|dep| **dep == task.id || !self.tasks.contains_key(*dep))
            {
                return dangling(format!("task {}", task.id), format!("task {}", dep));
            }
        }
        for n in self.notifications.values() {
            if let Some(tid) = n.task_id
                && !self.tasks.contains_key(&tid)
            {
                return dangling(format!("notification {}", n.id), format!("task {}", tid));
            }
            if let Some(pid) = n.project_id
                && !self.projects.contains_key(&pid)
            {
                return dangling(format!("notification {}", n.id), format!("project {}", pid));
            }
        }
        for r in self.reports.values() {
            if let Some(pid) = r.project_id
                && !self.projects.contains_key(&pid)
            {
                return dangling(format!("report {}", r.id), format!("project {}", pid));
            }
        }
        Ok(())
    }

    pub fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            version: SNAPSHOT_VERSION,
            projects: self.projects.values().cloned().collect(),
            team: self.members.values().cloned().collect(),
            tasks: self.tasks.values().cloned().collect(),
            notifications: self.notifications.values().cloned().collect(),
            daily_reports: self.reports.values().cloned().collect(),
            next_ids: Some(self.next_ids),
        }
    }

    fn derived_next_ids(&self) -> Result<NextIds, SnapshotError> {
        Ok(NextIds {
            project: next_after("project", self.projects.keys().map(|id| id.0))?,
            member: next_after("team member", self.members.keys().map(|id| id.0))?,
            task: next_after("task", self.tasks.keys().map(|id| id.0))?,
            notification: next_after("notification", self.notifications.keys().map(|id| id.0))?,
            report: next_after("report", self.reports.keys().map(|id| id.0))?,
        })
    }

    /// Whether following dependencies from `start` leads back to `target`
    pub fn dependency_reaches(&self, start: &[TaskId], target: TaskId) -> bool {
        let mut seen = HashSet::new();
        let mut stack: Vec<TaskId> = start.to_vec();
        while let Some(id) = stack.pop() {
            if id == target {
                return true;
            }
            if !seen.insert(id) {
                continue;
            }
            if let Some(task) = self.tasks.get(&id) {
                stack.extend(task.dependencies.iter().copied());
            }
        }
        false
    }
}

/// Serialize the store as snapshot JSON
pub(crate) fn encode(data: &StoreData) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&data.to_snapshot())
}

/// Parse snapshot JSON into validated collections
pub(crate) fn decode(text: &str) -> Result<StoreData, SnapshotError> {
    let snapshot: Snapshot = serde_json::from_str(text)?;
    StoreData::from_snapshot(snapshot)
}

//! Sample data used to fill an empty store on first run.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::model::{
    MemberId, Notification, NotificationId, NotificationKind, Priority, Project, ProjectId,
    ProjectStatus, Role, Task, TaskId, TaskStatus, TeamMember,
};

use super::snapshot::{SNAPSHOT_VERSION, Snapshot};

fn date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

fn project(
    id: u64,
    name: &str,
    description: &str,
    dates: (&str, &str),
    status: ProjectStatus,
    progress: u8,
) -> Project {
    Project {
        id: ProjectId(id),
        name: name.to_string(),
        description: description.to_string(),
        start_date: date(dates.0),
        end_date: date(dates.1),
        status,
        progress,
    }
}

fn member(id: u64, name: &str, email: &str, role: Role, phone: &str) -> TeamMember {
    TeamMember {
        id: MemberId(id),
        name: name.to_string(),
        email: email.to_string(),
        role,
        phone: phone.to_string(),
    }
}

#[allow(clippy::too_many_arguments)]
fn task(
    id: u64,
    project: u64,
    name: &str,
    description: &str,
    due: &str,
    priority: Priority,
    status: TaskStatus,
    assignee: Option<u64>,
    dependencies: &[u64],
) -> Task {
    Task {
        id: TaskId(id),
        project_id: Some(ProjectId(project)),
        name: name.to_string(),
        description: description.to_string(),
        due_date: date(due),
        priority,
        status,
        assignee: assignee.map(MemberId),
        dependencies: dependencies.iter().copied().map(TaskId).collect(),
    }
}

fn morning_of(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, day, 8, 0, 0)
        .single()
        .unwrap_or_default()
}

fn notification(
    id: u64,
    kind: NotificationKind,
    message: &str,
    (task, project): (u64, u64),
    priority: Priority,
    timestamp: DateTime<Utc>,
) -> Notification {
    Notification {
        id: NotificationId(id),
        kind,
        message: message.to_string(),
        task_id: Some(TaskId(task)),
        project_id: Some(ProjectId(project)),
        priority,
        read: false,
        timestamp,
    }
}

/// The fixed first-run data set: 3 projects, 3 team members, 4 tasks, and
/// 2 unread notifications.
pub fn sample_snapshot() -> Snapshot {
    let projects = vec![
        project(
            1,
            "Downtown Office Complex",
            "15-story commercial office building in downtown area",
            ("2024-01-15", "2024-12-31"),
            ProjectStatus::Active,
            65,
        ),
        project(
            2,
            "Residential Housing Development",
            "40-unit apartment complex with underground parking",
            ("2024-02-01", "2024-11-30"),
            ProjectStatus::Active,
            45,
        ),
        project(
            3,
            "Highway Infrastructure Upgrade",
            "Major highway expansion and bridge construction",
            ("2023-10-01", "2024-08-31"),
            ProjectStatus::OnHold,
            78,
        ),
    ];

    let team = vec![
        member(
            1,
            "John Smith",
            "john.smith@company.com",
            Role::ProjectManager,
            "+1 (555) 123-4567",
        ),
        member(
            2,
            "Maria Garcia",
            "maria.garcia@company.com",
            Role::SiteSupervisor,
            "+1 (555) 234-5678",
        ),
        member(
            3,
            "David Johnson",
            "david.johnson@company.com",
            Role::Engineer,
            "+1 (555) 345-6789",
        ),
    ];

    let tasks = vec![
        task(
            1,
            1,
            "Foundation Excavation",
            "Excavate foundation for main building structure",
            "2024-02-15",
            Priority::High,
            TaskStatus::Completed,
            Some(1),
            &[],
        ),
        task(
            2,
            1,
            "Steel Framework Installation",
            "Install steel framework for floors 1-5",
            "2024-03-30",
            Priority::Critical,
            TaskStatus::InProgress,
            Some(2),
            &[1],
        ),
        task(
            3,
            2,
            "Site Preparation",
            "Clear and grade construction site",
            "2024-02-28",
            Priority::Medium,
            TaskStatus::Completed,
            Some(3),
            &[],
        ),
        task(
            4,
            2,
            "Utility Connections",
            "Install water, sewer, and electrical connections",
            "2024-04-15",
            Priority::High,
            TaskStatus::Pending,
            None,
            &[3],
        ),
    ];

    let notifications = vec![
        notification(
            1,
            NotificationKind::TaskDue,
            "Steel Framework Installation is due today",
            (2, 1),
            Priority::High,
            morning_of(30),
        ),
        notification(
            2,
            NotificationKind::TaskCompleted,
            "Site Preparation has been completed",
            (3, 2),
            Priority::Medium,
            morning_of(1),
        ),
    ];

    Snapshot {
        version: SNAPSHOT_VERSION,
        projects,
        team,
        tasks,
        notifications,
        daily_reports: Vec::new(),
        next_ids: None,
    }
}

/// An empty snapshot, used when seeding is disabled
pub fn empty_snapshot() -> Snapshot {
    Snapshot {
        version: SNAPSHOT_VERSION,
        projects: Vec::new(),
        team: Vec::new(),
        tasks: Vec::new(),
        notifications: Vec::new(),
        daily_reports: Vec::new(),
        next_ids: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::snapshot::StoreData;

    #[test]
    fn sample_data_is_consistent() {
        let data = StoreData::from_snapshot(sample_snapshot()).unwrap();
        assert_eq!(data.projects.len(), 3);
        assert_eq!(data.members.len(), 3);
        assert_eq!(data.tasks.len(), 4);
        assert_eq!(data.next_ids.project, 4);
        assert_eq!(data.next_ids.task, 5);
        assert_eq!(data.notifications.len(), 2);
        assert_eq!(data.next_ids.notification, 3);
        assert_eq!(data.next_ids.report, 1);
    }

    #[test]
    fn sample_dates_parse() {
        let snapshot = sample_snapshot();
        assert!(snapshot.projects.iter().all(|p| p.start_date.is_some()));
        assert!(snapshot.tasks.iter().all(|t| t.due_date.is_some()));
    }

    #[test]
    fn utility_connections_starts_unassigned() {
        let snapshot = sample_snapshot();
        let utility = snapshot
            .tasks
            .iter()
            .find(|t| t.name == "Utility Connections")
            .unwrap();
        assert_eq!(utility.assignee, None);
        assert_eq!(utility.dependencies, vec![TaskId(3)]);
    }
}

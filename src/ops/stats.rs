use chrono::NaiveDate;

use crate::io::storage::Storage;
use crate::model::{MemberId, ProjectId, TaskStatus};
use crate::store::DataStore;

/// The four dashboard counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DashboardStats {
    pub total_projects: usize,
    pub completed_tasks: usize,
    pub overdue_tasks: usize,
    pub team_members: usize,
}

pub fn dashboard_stats<S: Storage>(store: &DataStore<S>, today: NaiveDate) -> DashboardStats {
    DashboardStats {
        total_projects: store.projects().len(),
        completed_tasks: store
            .tasks()
            .filter(|t| t.status == TaskStatus::Completed)
            .count(),
        overdue_tasks: store.tasks().filter(|t| t.is_overdue(today)).count(),
        team_members: store.members().len(),
    }
}

/// Task counts for one project
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectStats {
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub pending: usize,
    /// Members assigned to at least one task, in team order
    pub assigned: Vec<MemberId>,
}

impl ProjectStats {
    /// Whole-percent share of completed tasks; 0 with no tasks
    pub fn completion_rate(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        ((self.completed * 100 + self.total / 2) / self.total) as u8
    }
}

pub fn project_stats<S: Storage>(store: &DataStore<S>, project: ProjectId) -> ProjectStats {
    let mut stats = ProjectStats::default();
    for task in store.tasks_for_project(project) {
        stats.total += 1;
        match task.status {
            TaskStatus::Completed => stats.completed += 1,
            TaskStatus::InProgress => stats.in_progress += 1,
            TaskStatus::Pending => stats.pending += 1,
        }
    }
    stats.assigned = store
        .members()
        .map(|m| m.id)
        .filter(|id| {
            store
                .tasks_for_project(project)
                .any(|t| t.assignee == Some(*id))
        })
        .collect();
    stats
}

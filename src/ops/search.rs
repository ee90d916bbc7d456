use regex::Regex;

use crate::io::storage::Storage;
use crate::model::{ProjectId, Task, TaskStatus};
use crate::store::DataStore;

/// Compile a user-typed search pattern, case-insensitively.
///
/// A pattern that is not a valid regex is matched literally instead.
pub fn build_search_re(pattern: &str) -> Option<Regex> {
    if pattern.is_empty() {
        return None;
    }
    Regex::new(&format!("(?i){}", pattern))
        .or_else(|_| Regex::new(&format!("(?i){}", regex::escape(pattern))))
        .ok()
}

// ---------------------------------------------------------------------------
// Task list filter
// ---------------------------------------------------------------------------

/// The filters above the task list. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub project: Option<ProjectId>,
    pub status: Option<TaskStatus>,
    /// Matched against name and description
    pub search: Option<String>,
}

impl TaskFilter {
    pub fn is_empty(&self) -> bool {
        self.project.is_none() && self.status.is_none() && self.search.is_none()
    }

    fn matches(&self, task: &Task, re: Option<&Regex>) -> bool {
        if let Some(pid) = self.project
            && task.project_id != Some(pid)
        {
            return false;
        }
        if let Some(status) = self.status
            && task.status != status
        {
            return false;
        }
        match re {
            Some(re) => re.is_match(&task.name) || re.is_match(&task.description),
            None => true,
        }
    }
}

/// Tasks passing `filter`, in store order
pub fn filter_tasks<'a, S: Storage>(store: &'a DataStore<S>, filter: &TaskFilter) -> Vec<&'a Task> {
    if filter.is_empty() {
        return store.tasks().collect();
    }
    let re = filter.search.as_deref().and_then(build_search_re);
    store
        .tasks()
        .filter(|t| filter.matches(t, re.as_ref()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::storage::MemoryStorage;
    use crate::model::config::AppConfig;
    use pretty_assertions::assert_eq;

    fn store() -> DataStore<MemoryStorage> {
        DataStore::load(MemoryStorage::new(), &AppConfig::default()).unwrap()
    }

    fn ids(tasks: &[&Task]) -> Vec<u64> {
        tasks.iter().map(|t| t.id.0).collect()
    }

    #[test]
    fn test_invalid_regex_falls_back_to_literal() {
        let re = build_search_re("floors 1-5 (").unwrap();
        assert!(re.is_match("Install steel framework for floors 1-5 ("));
        assert!(build_search_re("").is_none());
    }

    #[test]
    fn test_empty_filter_keeps_everything() {
        let store = store();
        let filter = TaskFilter::default();
        assert!(filter.is_empty());
        assert_eq!(ids(&filter_tasks(&store, &filter)), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_filters_combine() {
        let store = store();
        let filter = TaskFilter {
            project: Some(ProjectId(2)),
            status: Some(TaskStatus::Completed),
            search: None,
        };
        assert_eq!(ids(&filter_tasks(&store, &filter)), vec![3]);

        let filter = TaskFilter {
            search: Some("SITE".into()),
            ..Default::default()
        };
        assert_eq!(ids(&filter_tasks(&store, &filter)), vec![3]);
    }

    #[test]
    fn test_search_regex_alternation() {
        let store = store();
        let filter = TaskFilter {
            search: Some("excavat|grade".into()),
            ..Default::default()
        };
        assert_eq!(ids(&filter_tasks(&store, &filter)), vec![1, 3]);
    }
}

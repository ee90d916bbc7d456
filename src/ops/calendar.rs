use chrono::{Datelike, Days, NaiveDate};

use crate::io::storage::Storage;
use crate::model::{ProjectId, Task};
use crate::store::DataStore;

/// Tasks due on `date`, optionally limited to one project, in store order
pub fn tasks_for_date<'a, S: Storage>(
    store: &'a DataStore<S>,
    date: NaiveDate,
    project: Option<ProjectId>,
) -> Vec<&'a Task> {
    store
        .tasks()
        .filter(|t| t.due_date == Some(date))
        .filter(|t| project.is_none_or(|p| t.project_id == Some(p)))
        .collect()
}

/// The Sunday on or before `date`
pub fn start_of_week(date: NaiveDate) -> NaiveDate {
    let back = u64::from(date.weekday().num_days_from_sunday());
    date.checked_sub_days(Days::new(back)).unwrap_or(date)
}

/// The seven days of the week holding `date`, Sunday first, each with the
/// tasks due that day.
pub fn week<'a, S: Storage>(
    store: &'a DataStore<S>,
    date: NaiveDate,
    project: Option<ProjectId>,
) -> Vec<(NaiveDate, Vec<&'a Task>)> {
    start_of_week(date)
        .iter_days()
        .take(7)
        .map(|day| (day, tasks_for_date(store, day, project)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::storage::MemoryStorage;
    use crate::model::config::AppConfig;
    use crate::model::TaskId;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn weeks_start_on_sunday() {
        // 2024-04-03 is a Wednesday
        assert_eq!(start_of_week(ymd(2024, 4, 3)), ymd(2024, 3, 31));
        assert_eq!(start_of_week(ymd(2024, 3, 31)), ymd(2024, 3, 31));
        assert_eq!(start_of_week(ymd(2024, 4, 6)), ymd(2024, 3, 31));
    }

    #[test]
    fn week_places_tasks_on_their_due_day() {
        let store = DataStore::load(MemoryStorage::new(), &AppConfig::default()).unwrap();
        let days = week(&store, ymd(2024, 4, 17), None);
        assert_eq!(days.len(), 7);
        assert_eq!(days[0].0, ymd(2024, 4, 14));
        let due: Vec<(NaiveDate, TaskId)> = days
            .iter()
            .flat_map(|(d, tasks)| tasks.iter().map(move |t| (*d, t.id)))
            .collect();
        assert_eq!(due, vec![(ymd(2024, 4, 15), TaskId(4))]);

        let other_project = week(&store, ymd(2024, 4, 17), Some(ProjectId(1)));
        assert!(other_project.iter().all(|(_, tasks)| tasks.is_empty()));
    }
}

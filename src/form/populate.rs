//! Rebuild the dependent selection controls of a form from the store.
//!
//! Each populator clears its control, writes the placeholder, then one option
//! per entity in store order. Selections that no longer match an option are
//! dropped.

use log::debug;

use crate::io::storage::Storage;
use crate::model::TaskId;
use crate::store::DataStore;

use super::select::SelectControl;

pub const PROJECT_PLACEHOLDER: &str = "Select Project";
pub const ASSIGNEE_PLACEHOLDER: &str = "Unassigned";
pub const DEPENDENCY_PLACEHOLDER: &str = "No dependencies";
pub const ALL_PROJECTS: &str = "All Projects";

/// Placeholder (disabled) followed by every project
pub fn populate_project_options<S: Storage>(control: &mut SelectControl, store: &DataStore<S>) {
    control.clear_options();
    control.push_placeholder(PROJECT_PLACEHOLDER, true);
    for project in store.projects() {
        control.push_option(project.id.to_string(), project.name.clone());
    }
    control.retain_valid_selection();
    debug!("populated project selector with {} options", control.options.len());
}

/// "All Projects" (choosable, meaning no filter) followed by every project
pub fn populate_project_filter_options<S: Storage>(
    control: &mut SelectControl,
    store: &DataStore<S>,
) {
    control.clear_options();
    control.push_placeholder(ALL_PROJECTS, false);
    for project in store.projects() {
        control.push_option(project.id.to_string(), project.name.clone());
    }
    control.retain_valid_selection();
}

/// "Unassigned" followed by every team member
pub fn populate_assignee_options<S: Storage>(control: &mut SelectControl, store: &DataStore<S>) {
    control.clear_options();
    control.push_placeholder(ASSIGNEE_PLACEHOLDER, false);
    for member in store.members() {
        control.push_option(member.id.to_string(), member.name.clone());
    }
    control.retain_valid_selection();
    debug!("populated assignee selector with {} options", control.options.len());
}

/// "No dependencies" followed by every task other than `editing`
pub fn populate_dependency_options<S: Storage>(
    control: &mut SelectControl,
    store: &DataStore<S>,
    editing: Option<TaskId>,
) {
    control.clear_options();
    control.push_placeholder(DEPENDENCY_PLACEHOLDER, false);
    for task in store.tasks().filter(|t| Some(t.id) != editing) {
        control.push_option(task.id.to_string(), format!("{} (#{})", task.name, task.id));
    }
    control.retain_valid_selection();
    debug!("populated dependency selector with {} options", control.options.len());
}

/// The diagnostic line shown on the task form
pub fn debug_info<S: Storage>(store: &DataStore<S>) -> String {
    format!(
        "Projects: {}, Team: {}",
        store.projects().len(),
        store.members().len()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::storage::MemoryStorage;
    use crate::model::config::AppConfig;
    use crate::model::{MemberId, ProjectId, TeamMember};
    use pretty_assertions::assert_eq;

    fn seeded() -> DataStore<MemoryStorage> {
        DataStore::load(MemoryStorage::new(), &AppConfig::default()).unwrap()
    }

    #[test]
    fn project_options_follow_store_order() {
        let store = seeded();
        let mut control = SelectControl::new();
        populate_project_options(&mut control, &store);
        assert_eq!(
            control.labels(),
            vec![
                "Select Project",
                "Downtown Office Complex",
                "Residential Housing Development",
                "Highway Infrastructure Upgrade",
            ]
        );
        assert!(control.options[0].disabled);
        assert_eq!(control.options[0].value, "");
        assert_eq!(&control.values()[1..], &["1", "2", "3"]);
    }

    #[test]
    fn assignee_options_start_with_unassigned() {
        let store = seeded();
        let mut control = SelectControl::new();
        populate_assignee_options(&mut control, &store);
        assert_eq!(
            control.labels(),
            vec!["Unassigned", "John Smith", "Maria Garcia", "David Johnson"]
        );
        assert!(!control.options[0].disabled);
    }

    #[test]
    fn repopulating_does_not_duplicate() {
        let mut store = seeded();
        let mut control = SelectControl::new();
        populate_assignee_options(&mut control, &store);
        let id = store.next_member_id();
        store.upsert_member(TeamMember::new(id, "Lena Park")).unwrap();
        populate_assignee_options(&mut control, &store);
        assert_eq!(control.options.len(), 5);
        assert_eq!(control.labels().last(), Some(&"Lena Park"));
    }

    #[test]
    fn dependency_options_skip_the_task_being_edited() {
        let store = seeded();
        let mut control = SelectControl::new_multiple();
        populate_dependency_options(&mut control, &store, Some(TaskId(2)));
        assert_eq!(
            control.labels(),
            vec![
                "No dependencies",
                "Foundation Excavation (#1)",
                "Site Preparation (#3)",
                "Utility Connections (#4)",
            ]
        );
    }

    #[test]
    fn removed_entities_drop_out_of_the_selection() {
        let mut store = seeded();
        let mut control = SelectControl::new();
        control.preselect([ProjectId(2).to_string()]);
        populate_project_options(&mut control, &store);
        assert_eq!(control.selected_value(), Some("2"));

        store.delete_project(ProjectId(2)).unwrap();
        populate_project_options(&mut control, &store);
        assert_eq!(control.selected_value(), None);

        let mut assignee = SelectControl::new();
        assignee.preselect([MemberId(3).to_string()]);
        populate_assignee_options(&mut assignee, &store);
        assert_eq!(assignee.selected_value(), Some("3"));
    }

    #[test]
    fn filter_options_allow_no_project() {
        let store = seeded();
        let mut control = SelectControl::new();
        populate_project_filter_options(&mut control, &store);
        assert_eq!(control.labels()[0], "All Projects");
        assert!(control.select(""));
        assert_eq!(control.selected_value(), None);
        assert!(control.select("3"));
        assert_eq!(control.selected_value(), Some("3"));
    }

    #[test]
    fn debug_line_counts_entities() {
        assert_eq!(debug_info(&seeded()), "Projects: 3, Team: 3");
    }
}

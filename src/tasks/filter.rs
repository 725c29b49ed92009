//! Search and category filtering for the "My Tasks" list.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo::{Task, TaskListItem, TaskPriority};

/// Mutually exclusive task categories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskFilter {
    #[default]
    All,
    CreatedByMe,
    AssignedToMe,
    Pending,
    Completed,
    HighPriority,
}

impl TaskFilter {
    pub fn matches(self, task: &Task, me: Uuid) -> bool {
        match self {
            TaskFilter::All => true,
            TaskFilter::CreatedByMe => task.created_by == me,
            TaskFilter::AssignedToMe => task.assigned_to == Some(me),
            TaskFilter::Pending => !task.completed,
            TaskFilter::Completed => task.completed,
            TaskFilter::HighPriority => task.priority == TaskPriority::High,
        }
    }
}

/// Case-insensitive substring match over title, description and household name.
/// An empty or blank query matches everything.
pub fn matches_search(item: &TaskListItem, query: &str) -> bool {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    let hit = |s: &str| s.to_lowercase().contains(&needle);
    hit(&item.task.title)
        || item.task.description.as_deref().is_some_and(hit)
        || hit(&item.household_name)
}

pub fn apply(items: Vec<TaskListItem>, query: Option<&str>, filter: TaskFilter, me: Uuid) -> Vec<TaskListItem> {
    let query = query.unwrap_or("");
    items
        .into_iter()
        .filter(|item| matches_search(item, query))
        .filter(|item| filter.matches(&item.task, me))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::repo::fixtures::task;

    struct Fixture {
        me: Uuid,
        items: Vec<TaskListItem>,
    }

    fn item(t: Task, household: &str) -> TaskListItem {
        TaskListItem { task: t, household_name: household.into() }
    }

    /// Six tasks, each with a distinct shape.
    fn fixture() -> Fixture {
        let me = Uuid::new_v4();
        let other = Uuid::new_v4();

        let mut mine = task("Vacuum lounge");
        mine.created_by = me;

        let mut assigned = task("Buy milk");
        assigned.created_by = other;
        assigned.assigned_to = Some(me);
        assigned.description = Some("Oat, two litres".into());

        let mut done = task("Pay rent");
        done.created_by = other;
        done.completed = true;

        let mut urgent = task("Fix boiler");
        urgent.created_by = other;
        urgent.priority = TaskPriority::High;

        let mut urgent_done_mine = task("Call landlord");
        urgent_done_mine.created_by = me;
        urgent_done_mine.assigned_to = Some(me);
        urgent_done_mine.priority = TaskPriority::High;
        urgent_done_mine.completed = true;

        let mut someone_else = task("Walk dog");
        someone_else.created_by = other;
        someone_else.assigned_to = Some(other);
        someone_else.priority = TaskPriority::Low;

        Fixture {
            me,
            items: vec![
                item(mine, "Flat 4B"),
                item(assigned, "Flat 4B"),
                item(done, "Beach House"),
                item(urgent, "Beach House"),
                item(urgent_done_mine, "Flat 4B"),
                item(someone_else, "Parents"),
            ],
        }
    }

    fn titles(items: &[TaskListItem]) -> Vec<&str> {
        items.iter().map(|i| i.task.title.as_str()).collect()
    }

    fn run(filter: TaskFilter, query: Option<&str>) -> Vec<String> {
        let f = fixture();
        titles(&apply(f.items, query, filter, f.me))
            .into_iter()
            .map(String::from)
            .collect()
    }

    #[test]
    fn all_keeps_everything() {
        assert_eq!(run(TaskFilter::All, None).len(), 6);
    }

    #[test]
    fn created_by_me() {
        assert_eq!(run(TaskFilter::CreatedByMe, None), ["Vacuum lounge", "Call landlord"]);
    }

    #[test]
    fn assigned_to_me() {
        assert_eq!(run(TaskFilter::AssignedToMe, None), ["Buy milk", "Call landlord"]);
    }

    #[test]
    fn pending_and_completed_split_the_set() {
        let pending = run(TaskFilter::Pending, None);
        let completed = run(TaskFilter::Completed, None);
        assert_eq!(completed, ["Pay rent", "Call landlord"]);
        assert_eq!(pending.len() + completed.len(), 6);
        assert!(pending.iter().all(|t| !completed.contains(t)));
    }

    #[test]
    fn high_priority() {
        assert_eq!(run(TaskFilter::HighPriority, None), ["Fix boiler", "Call landlord"]);
    }

    #[test]
    fn search_is_case_insensitive_over_title() {
        assert_eq!(run(TaskFilter::All, Some("BOILER")), ["Fix boiler"]);
    }

    #[test]
    fn search_covers_description() {
        assert_eq!(run(TaskFilter::All, Some("oat")), ["Buy milk"]);
    }

    #[test]
    fn search_covers_household_name() {
        assert_eq!(run(TaskFilter::All, Some("beach")), ["Pay rent", "Fix boiler"]);
    }

    #[test]
    fn blank_search_matches_all() {
        assert_eq!(run(TaskFilter::All, Some("   ")).len(), 6);
        assert_eq!(run(TaskFilter::All, Some("")).len(), 6);
    }

    #[test]
    fn search_and_filter_combine() {
        assert_eq!(run(TaskFilter::Completed, Some("flat")), ["Call landlord"]);
        assert!(run(TaskFilter::HighPriority, Some("dog")).is_empty());
    }

    #[test]
    fn filter_names_parse_from_snake_case() {
        let parsed: Vec<TaskFilter> = [
            "\"all\"",
            "\"created_by_me\"",
            "\"assigned_to_me\"",
            "\"pending\"",
            "\"completed\"",
            "\"high_priority\"",
        ]
        .iter()
        .map(|s| serde_json::from_str(s).unwrap())
        .collect();
        assert_eq!(
            parsed,
            [
                TaskFilter::All,
                TaskFilter::CreatedByMe,
                TaskFilter::AssignedToMe,
                TaskFilter::Pending,
                TaskFilter::Completed,
                TaskFilter::HighPriority,
            ]
        );
    }
}

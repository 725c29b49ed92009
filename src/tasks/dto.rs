use serde::Deserialize;
use time::Date;
use uuid::Uuid;

use super::filter::TaskFilter;
use super::repo::{NewTask, Task, TaskPriority};
use crate::error::ApiError;
use crate::patch::{double_option, trimmed};

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    pub assigned_to: Option<Uuid>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<Date>,
}

impl CreateTaskRequest {
    pub fn into_new_task(self, household_id: Uuid, created_by: Uuid) -> Result<NewTask, ApiError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ApiError::bad_request("Task title is required"));
        }
        Ok(NewTask {
            household_id,
            title: title.to_string(),
            description: trimmed(self.description),
            assigned_to: self.assigned_to,
            created_by,
            priority: self.priority.unwrap_or_default(),
            due_date: self.due_date,
        })
    }
}

/// Partial edit. For nullable fields, `null` clears and absence keeps.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub assigned_to: Option<Option<Uuid>>,
    pub priority: Option<TaskPriority>,
    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<Date>>,
}

impl UpdateTaskRequest {
    pub fn apply_to(self, task: &mut Task) -> Result<(), ApiError> {
        if let Some(title) = self.title {
            let title = title.trim();
            if title.is_empty() {
                return Err(ApiError::bad_request("Task title cannot be empty"));
            }
            task.title = title.to_string();
        }
        if let Some(description) = self.description {
            task.description = trimmed(description);
        }
        if let Some(assigned_to) = self.assigned_to {
            task.assigned_to = assigned_to;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
        Ok(())
    }

    /// New assignee when the edit sets one.
    pub fn new_assignee(&self) -> Option<Uuid> {
        self.assigned_to.flatten()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct TaskQuery {
    pub q: Option<String>,
    #[serde(default)]
    pub filter: TaskFilter,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::repo::fixtures::task;

    #[test]
    fn create_requires_title() {
        let req: CreateTaskRequest = serde_json::from_str(r#"{"title":"  "}"#).unwrap();
        assert!(req.into_new_task(Uuid::new_v4(), Uuid::new_v4()).is_err());
    }

    #[test]
    fn create_defaults_priority_and_parses_due_date() {
        let req: CreateTaskRequest =
            serde_json::from_str(r#"{"title":"Defrost freezer","due_date":"2024-03-09"}"#).unwrap();
        let new = req.into_new_task(Uuid::new_v4(), Uuid::new_v4()).unwrap();
        assert_eq!(new.priority, TaskPriority::Medium);
        assert_eq!(new.due_date, Some(time::macros::date!(2024 - 03 - 09)));
    }

    #[test]
    fn update_distinguishes_null_from_absent() {
        let mut t = task("Mop");
        let someone = Uuid::new_v4();
        t.assigned_to = Some(someone);
        t.description = Some("kitchen".into());

        let keep: UpdateTaskRequest = serde_json::from_str(r#"{"title":"Mop floors"}"#).unwrap();
        keep.apply_to(&mut t).unwrap();
        assert_eq!(t.title, "Mop floors");
        assert_eq!(t.assigned_to, Some(someone));
        assert_eq!(t.description.as_deref(), Some("kitchen"));

        let clear: UpdateTaskRequest =
            serde_json::from_str(r#"{"assigned_to":null,"description":null}"#).unwrap();
        clear.apply_to(&mut t).unwrap();
        assert_eq!(t.assigned_to, None);
        assert_eq!(t.description, None);
    }

    #[test]
    fn update_leaves_completion_alone() {
        let mut t = task("Bins");
        t.completed = true;
        let req: UpdateTaskRequest = serde_json::from_str(r#"{"priority":"high"}"#).unwrap();
        req.apply_to(&mut t).unwrap();
        assert!(t.completed);
        assert_eq!(t.priority, TaskPriority::High);
    }

    #[test]
    fn update_rejects_blank_title() {
        let mut t = task("Bins");
        let req = UpdateTaskRequest { title: Some(" ".into()), ..Default::default() };
        assert!(req.apply_to(&mut t).is_err());
        assert_eq!(t.title, "Bins");
    }
}

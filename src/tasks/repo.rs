use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Task {
    pub id: Uuid,
    pub household_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub assigned_to: Option<Uuid>,
    pub created_by: Uuid,
    pub priority: TaskPriority,
    pub due_date: Option<Date>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Task joined with the name of its household, as shown in "My Tasks".
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TaskListItem {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub task: Task,
    pub household_name: String,
}

/// Fields of a task insert.
#[derive(Debug)]
pub struct NewTask {
    pub household_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub assigned_to: Option<Uuid>,
    pub created_by: Uuid,
    pub priority: TaskPriority,
    pub due_date: Option<Date>,
}

const TASK_COLUMNS: &str = "id, household_id, title, description, completed, assigned_to, \
     created_by, priority, due_date, created_at, updated_at";

pub async fn insert_task(db: &PgPool, t: &NewTask) -> anyhow::Result<Task> {
    let sql = format!(
        r#"
        INSERT INTO tasks (household_id, title, description, assigned_to, created_by, priority, due_date)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {TASK_COLUMNS}
        "#
    );
    let row = sqlx::query_as::<_, Task>(&sql)
        .bind(t.household_id)
        .bind(&t.title)
        .bind(t.description.as_deref())
        .bind(t.assigned_to)
        .bind(t.created_by)
        .bind(t.priority)
        .bind(t.due_date)
        .fetch_one(db)
        .await?;
    Ok(row)
}

pub async fn find_task(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Task>> {
    let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1");
    let row = sqlx::query_as::<_, Task>(&sql)
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(row)
}

pub async fn tasks_for_household(db: &PgPool, household_id: Uuid) -> anyhow::Result<Vec<Task>> {
    let sql = format!(
        "SELECT {TASK_COLUMNS} FROM tasks WHERE household_id = $1 ORDER BY created_at DESC"
    );
    let rows = sqlx::query_as::<_, Task>(&sql)
        .bind(household_id)
        .fetch_all(db)
        .await?;
    Ok(rows)
}

/// Every task in every household the user is an active member of.
pub async fn tasks_for_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<TaskListItem>> {
    let rows = sqlx::query_as::<_, TaskListItem>(
        r#"
        SELECT t.id, t.household_id, t.title, t.description, t.completed, t.assigned_to,
               t.created_by, t.priority, t.due_date, t.created_at, t.updated_at,
               h.name AS household_name
        FROM tasks t
        JOIN households h ON h.id = t.household_id
        JOIN household_members m ON m.household_id = t.household_id
        WHERE m.user_id = $1 AND m.is_active
        ORDER BY t.created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Writes every editable field of `task` back.
pub async fn save_task(db: &PgPool, task: &Task) -> anyhow::Result<Task> {
    let sql = format!(
        r#"
        UPDATE tasks
        SET title = $2, description = $3, completed = $4, assigned_to = $5,
            priority = $6, due_date = $7
        WHERE id = $1
        RETURNING {TASK_COLUMNS}
        "#
    );
    let row = sqlx::query_as::<_, Task>(&sql)
        .bind(task.id)
        .bind(&task.title)
        .bind(task.description.as_deref())
        .bind(task.completed)
        .bind(task.assigned_to)
        .bind(task.priority)
        .bind(task.due_date)
        .fetch_one(db)
        .await?;
    Ok(row)
}

fn toggle_sql() -> String {
    format!("UPDATE tasks SET completed = NOT completed WHERE id = $1 RETURNING {TASK_COLUMNS}")
}

/// Flips `completed` in place. Other columns are never written, so edits made
/// since the caller loaded the task survive. `None` when the task is gone.
pub async fn toggle_completed(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Task>> {
    let row = sqlx::query_as::<_, Task>(&toggle_sql())
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(row)
}

pub async fn delete_task(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query("DELETE FROM tasks WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(res.rows_affected() == 1)
}

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use sqlx::PgPool;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    dto::{CreateTaskRequest, TaskQuery, UpdateTaskRequest},
    filter,
    repo::{self, Task, TaskListItem},
};
use crate::{
    auth::AuthUser,
    error::{ApiError, ApiResult},
    households::{
        access::{require_editor, require_member},
        repo as households_repo,
    },
    state::AppState,
};

pub fn task_routes() -> Router<AppState> {
    Router::new()
        .route("/tasks", get(my_tasks))
        .route(
            "/tasks/:id",
            get(get_task).patch(update_task).delete(delete_task),
        )
        .route("/tasks/:id/toggle", post(toggle_task))
        .route(
            "/households/:id/tasks",
            get(household_tasks).post(create_task),
        )
}

/// Assignees must be active members of the task's household.
async fn ensure_assignable(db: &PgPool, household_id: Uuid, assignee: Option<Uuid>) -> ApiResult<()> {
    let Some(assignee) = assignee else {
        return Ok(());
    };
    match households_repo::find_membership(db, household_id, assignee).await? {
        Some(m) if m.is_active => Ok(()),
        _ => Err(ApiError::bad_request("Assignee is not a member of this household")),
    }
}

/// Loads a task the caller can see.
async fn load_visible(db: &PgPool, task_id: Uuid, user_id: Uuid) -> ApiResult<Task> {
    let task = repo::find_task(db, task_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Task not found"))?;
    require_member(db, task.household_id, user_id).await?;
    Ok(task)
}

/// Loads a task the caller can change.
async fn load_editable(db: &PgPool, task_id: Uuid, user_id: Uuid) -> ApiResult<Task> {
    let task = repo::find_task(db, task_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Task not found"))?;
    require_editor(db, task.household_id, user_id).await?;
    Ok(task)
}

/// GET /tasks?q=&filter= across every household of the caller.
#[instrument(skip(state))]
pub async fn my_tasks(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(query): Query<TaskQuery>,
) -> ApiResult<Json<Vec<TaskListItem>>> {
    let all = repo::tasks_for_user(&state.db, user_id).await?;
    let items = filter::apply(all, query.q.as_deref(), query.filter, user_id);
    Ok(Json(items))
}

#[instrument(skip(state))]
pub async fn household_tasks(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(household_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Task>>> {
    require_member(&state.db, household_id, user_id).await?;
    Ok(Json(repo::tasks_for_household(&state.db, household_id).await?))
}

#[instrument(skip(state, body))]
pub async fn create_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(household_id): Path<Uuid>,
    Json(body): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let new = body.into_new_task(household_id, user_id)?;
    require_editor(&state.db, household_id, user_id).await?;
    ensure_assignable(&state.db, household_id, new.assigned_to).await?;

    let task = repo::insert_task(&state.db, &new).await?;
    info!(task_id = %task.id, household_id = %household_id, user_id = %user_id, "task created");
    Ok((StatusCode::CREATED, Json(task)))
}

#[instrument(skip(state))]
pub async fn get_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Task>> {
    Ok(Json(load_visible(&state.db, id, user_id).await?))
}

#[instrument(skip(state, body))]
pub async fn update_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateTaskRequest>,
) -> ApiResult<Json<Task>> {
    let mut task = load_editable(&state.db, id, user_id).await?;
    ensure_assignable(&state.db, task.household_id, body.new_assignee()).await?;
    body.apply_to(&mut task)?;
    Ok(Json(repo::save_task(&state.db, &task).await?))
}

#[instrument(skip(state))]
pub async fn toggle_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Task>> {
    load_editable(&state.db, id, user_id).await?;
    let saved = repo::toggle_completed(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Task not found"))?;
    info!(task_id = %id, completed = saved.completed, "task toggled");
    Ok(Json(saved))
}

#[instrument(skip(state))]
pub async fn delete_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    load_editable(&state.db, id, user_id).await?;
    if !repo::delete_task(&state.db, id).await? {
        return Err(ApiError::not_found("Task not found"));
    }
    info!(task_id = %id, user_id = %user_id, "task deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Task endpoints
///
/// Tasks live in a column at a dense position. A column or position change
/// (via `PUT /tasks/:id` or `POST /tasks/:id/move`) is a move and may cross
/// columns of the same board only.

use crate::{
    app::AppState,
    error::{ApiResult, ValidJson},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use taskboard_shared::{
    auth::middleware::AuthContext,
    models::task::{present_or_null, Task, TaskDetails},
    service::{NewTaskInput, TaskUpdate, TaskView},
};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    pub column_id: Uuid,
    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,

    /// Insert position; appended when absent
    #[serde(default)]
    pub position: Option<i32>,
}

/// Partial task update
///
/// `due_date: null` clears the due date; leaving the key out keeps it.
/// Giving only `column_id` appends the task to that column.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "present_or_null")]
    pub due_date: Option<Option<DateTime<Utc>>>,

    #[serde(default)]
    pub column_id: Option<Uuid>,

    #[serde(default)]
    pub position: Option<i32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct MoveTaskRequest {
    pub column_id: Uuid,
    pub position: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AssignTaskRequest {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize, Validate)]
pub struct DueDateRequest {
    /// `null` clears the due date
    pub due_date: Option<DateTime<Utc>>,
}

pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidJson(req): ValidJson<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let input = NewTaskInput {
        column_id: req.column_id,
        title: req.title,
        description: req.description,
        due_date: req.due_date,
        position: req.position,
    };
    let task = state.kanban.create_task(auth.user_id, input).await?;

    Ok((StatusCode::CREATED, Json(task)))
}

/// A task with its labels
pub async fn get_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<TaskView>> {
    Ok(Json(state.kanban.get_task(auth.user_id, task_id).await?))
}

/// Tasks of a column in position order, each with its labels
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(column_id): Path<Uuid>,
) -> ApiResult<Json<Vec<TaskView>>> {
    Ok(Json(state.kanban.list_tasks(auth.user_id, column_id).await?))
}

pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
    ValidJson(req): ValidJson<UpdateTaskRequest>,
) -> ApiResult<Json<Task>> {
    let update = TaskUpdate {
        details: TaskDetails {
            title: req.title,
            description: req.description,
            due_date: req.due_date,
        },
        column_id: req.column_id,
        position: req.position,
    };

    Ok(Json(state.kanban.update_task(auth.user_id, task_id, update).await?))
}

/// Editors may delete any task; the creator may delete their own while
/// they still have access to the board
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.kanban.delete_task(auth.user_id, task_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn move_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
    ValidJson(req): ValidJson<MoveTaskRequest>,
) -> ApiResult<Json<Task>> {
    let task = state
        .kanban
        .move_task(auth.user_id, task_id, req.column_id, req.position)
        .await?;

    Ok(Json(task))
}

pub async fn assign_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
    ValidJson(req): ValidJson<AssignTaskRequest>,
) -> ApiResult<Json<Task>> {
    Ok(Json(state.kanban.assign_task(auth.user_id, task_id, req.user_id).await?))
}

pub async fn unassign_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<Task>> {
    Ok(Json(state.kanban.unassign_task(auth.user_id, task_id).await?))
}

pub async fn set_due_date(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
    ValidJson(req): ValidJson<DueDateRequest>,
) -> ApiResult<Json<Task>> {
    Ok(Json(state.kanban.set_due_date(auth.user_id, task_id, req.due_date).await?))
}

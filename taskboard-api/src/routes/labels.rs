/// Label endpoints
///
/// Labels belong to one board and can be attached to any task on that
/// board. Attaching and detaching are idempotent.

use crate::{
    app::AppState,
    error::{ApiResult, ValidJson},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use taskboard_shared::{
    auth::middleware::AuthContext,
    models::{
        label::{Label, UpdateLabel},
        task::Task,
    },
};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateLabelRequest {
    pub board_id: Uuid,

    /// 1 to 50 characters
    pub name: String,

    /// `#RRGGBB`
    pub color: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateLabelRequest {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub color: Option<String>,
}

pub async fn create_label(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidJson(req): ValidJson<CreateLabelRequest>,
) -> ApiResult<(StatusCode, Json<Label>)> {
    let label = state
        .kanban
        .create_label(auth.user_id, req.board_id, &req.name, &req.color)
        .await?;

    Ok((StatusCode::CREATED, Json(label)))
}

pub async fn get_label(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(label_id): Path<Uuid>,
) -> ApiResult<Json<Label>> {
    Ok(Json(state.kanban.get_label(auth.user_id, label_id).await?))
}

pub async fn list_labels(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(board_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Label>>> {
    Ok(Json(state.kanban.list_labels(auth.user_id, board_id).await?))
}

pub async fn update_label(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(label_id): Path<Uuid>,
    ValidJson(req): ValidJson<UpdateLabelRequest>,
) -> ApiResult<Json<Label>> {
    let changes = UpdateLabel {
        name: req.name,
        color: req.color,
    };

    Ok(Json(state.kanban.update_label(auth.user_id, label_id, changes).await?))
}

/// Deletes the label and detaches it from every task
pub async fn delete_label(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(label_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.kanban.delete_label(auth.user_id, label_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn tasks_with_label(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(label_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Task>>> {
    Ok(Json(state.kanban.tasks_with_label(auth.user_id, label_id).await?))
}

pub async fn task_labels(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Label>>> {
    Ok(Json(state.kanban.task_labels(auth.user_id, task_id).await?))
}

pub async fn attach_label(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((task_id, label_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    state.kanban.attach_label(auth.user_id, task_id, label_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn detach_label(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((task_id, label_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    state.kanban.detach_label(auth.user_id, task_id, label_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

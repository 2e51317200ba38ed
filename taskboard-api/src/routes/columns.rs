/// Column endpoints
///
/// Columns keep dense positions `0..n` within their board. Creating with a
/// position inserts there, and a position change on update moves the column.

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
use taskboard_shared::{auth::middleware::AuthContext, models::column::Column};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateColumnRequest {
    pub board_id: Uuid,
    pub title: String,

    /// Insert position; appended when absent
    #[serde(default)]
    pub position: Option<i32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateColumnRequest {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub position: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct ColumnPosition {
    pub id: Uuid,
    pub position: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReorderColumnsRequest {
    pub columns: Vec<ColumnPosition>,
}

pub async fn create_column(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidJson(req): ValidJson<CreateColumnRequest>,
) -> ApiResult<(StatusCode, Json<Column>)> {
    let column = state
        .kanban
        .create_column(auth.user_id, req.board_id, &req.title, req.position)
        .await?;

    Ok((StatusCode::CREATED, Json(column)))
}

/// Columns of a board in position order
pub async fn list_columns(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(board_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Column>>> {
    Ok(Json(state.kanban.list_columns(auth.user_id, board_id).await?))
}

pub async fn get_column(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(column_id): Path<Uuid>,
) -> ApiResult<Json<Column>> {
    Ok(Json(state.kanban.get_column(auth.user_id, column_id).await?))
}

pub async fn update_column(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(column_id): Path<Uuid>,
    ValidJson(req): ValidJson<UpdateColumnRequest>,
) -> ApiResult<Json<Column>> {
    let column = state
        .kanban
        .update_column(auth.user_id, column_id, req.title.as_deref(), req.position)
        .await?;

    Ok(Json(column))
}

/// Deletes the column with its tasks
pub async fn delete_column(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(column_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.kanban.delete_column(auth.user_id, column_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Bulk reorder
///
/// Must list every column of the board once, with positions forming
/// `0..n`. Returns the columns in their new order.
pub async fn reorder_columns(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(board_id): Path<Uuid>,
    ValidJson(req): ValidJson<ReorderColumnsRequest>,
) -> ApiResult<Json<Vec<Column>>> {
    let order: Vec<(Uuid, i32)> = req.columns.iter().map(|c| (c.id, c.position)).collect();
    let columns = state.kanban.reorder_columns(auth.user_id, board_id, &order).await?;

    Ok(Json(columns))
}

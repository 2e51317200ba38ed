/// Board endpoints
///
/// - `POST /boards` - Create a board (at most five per owner)
/// - `GET /boards` - Boards the caller owns, then boards shared with them
/// - `GET /boards/:id` - Viewer access
/// - `PUT /boards/:id` - Partial update, editor access
/// - `DELETE /boards/:id` - Owner only; removes everything on the board

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
    models::board::{Board, UpdateBoard},
};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateBoardRequest {
    pub title: String,

    #[serde(default)]
    pub description: Option<String>,
}

/// Absent fields are left unchanged
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateBoardRequest {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub description: Option<String>,
}

pub async fn create_board(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidJson(req): ValidJson<CreateBoardRequest>,
) -> ApiResult<(StatusCode, Json<Board>)> {
    let board = state
        .kanban
        .create_board(auth.user_id, &req.title, req.description.as_deref())
        .await?;

    Ok((StatusCode::CREATED, Json(board)))
}

pub async fn list_boards(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Board>>> {
    Ok(Json(state.kanban.list_boards(auth.user_id).await?))
}

pub async fn get_board(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(board_id): Path<Uuid>,
) -> ApiResult<Json<Board>> {
    Ok(Json(state.kanban.get_board(auth.user_id, board_id).await?))
}

pub async fn update_board(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(board_id): Path<Uuid>,
    ValidJson(req): ValidJson<UpdateBoardRequest>,
) -> ApiResult<Json<Board>> {
    let changes = UpdateBoard {
        title: req.title,
        description: req.description,
    };

    Ok(Json(state.kanban.update_board(auth.user_id, board_id, changes).await?))
}

pub async fn delete_board(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(board_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.kanban.delete_board(auth.user_id, board_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Board sharing endpoints
///
/// - `POST /boards/:id/share` - Grant or change a role (owner only)
/// - `DELETE /boards/:id/share/:user_id` - Revoke a share (owner only)
/// - `GET /boards/:id/share` - Owner followed by collaborators
/// - `GET /shared-boards` - Boards other users shared with the caller

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
        board::Board,
        share::{BoardShare, Collaborator, ShareRole},
    },
};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct ShareBoardRequest {
    /// Email of a registered user
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// `viewer` or `editor`
    pub role: ShareRole,
}

/// Creates the share, or changes the role of an existing one
///
/// Sharing with the owner is a 400; an unregistered email is a 404.
pub async fn share_board(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(board_id): Path<Uuid>,
    ValidJson(req): ValidJson<ShareBoardRequest>,
) -> ApiResult<Json<BoardShare>> {
    let share = state
        .kanban
        .share_board(auth.user_id, board_id, &req.email, req.role)
        .await?;

    Ok(Json(share))
}

pub async fn unshare_board(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((board_id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    state.kanban.unshare_board(auth.user_id, board_id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_collaborators(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(board_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Collaborator>>> {
    Ok(Json(state.kanban.collaborators(auth.user_id, board_id).await?))
}

pub async fn shared_boards(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Board>>> {
    Ok(Json(state.kanban.shared_boards(auth.user_id).await?))
}

/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /register` - Create an account
/// - `POST /login` - Exchange credentials for a bearer token

use crate::{
    app::AppState,
    error::{ApiResult, ValidJson},
};
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Email address, stored lowercased
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Display name, at least two characters once trimmed
    pub name: String,

    /// Password, at least six characters
    pub password: String,
}

/// Register response
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Bearer token for the `Authorization` header
    pub token: String,
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /register
/// Content-Type: application/json
///
/// {
///   "email": "user@example.com",
///   "name": "Jane Doe",
///   "password": "secret123"
/// }
/// ```
///
/// # Response
///
/// `201 Created` with `{ "id", "email", "name" }`.
///
/// # Errors
///
/// - `400 Bad Request`: name or password too short
/// - `409 Conflict`: Email already registered
/// - `422 Unprocessable Entity`: malformed email or body
pub async fn register(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    let user = state.kanban.register(&req.email, &req.name, &req.password).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            id: user.id,
            email: user.email,
            name: user.name,
        }),
    ))
}

/// Login with email and password
///
/// Unknown emails and wrong passwords both return the same `401`.
pub async fn login(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let token = state.kanban.login(&state.tokens, &req.email, &req.password).await?;

    Ok(Json(LoginResponse { token }))
}

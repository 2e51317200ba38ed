/// Bearer token authentication for axum
///
/// [`authenticate`] turns an `Authorization: Bearer <token>` header into an
/// [`AuthContext`]. The API's middleware layer stores that context in the
/// request extensions, and handlers read the principal only from there:
///
/// ```ignore
/// async fn handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("Hello, user {}", auth.user_id)
/// }
/// ```

use axum::{
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::{JwtError, TokenIssuer};

/// The authenticated principal for one request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: Uuid,
}

#[derive(Debug, PartialEq, Eq)]
pub enum AuthError {
    /// No Authorization header
    MissingCredentials,

    /// Header present but not a Bearer credential
    InvalidFormat(String),

    /// Token failed verification
    InvalidToken(String),
}

impl AuthError {
    pub fn message(&self) -> &str {
        match self {
            AuthError::MissingCredentials => "Missing credentials",
            AuthError::InvalidFormat(msg) | AuthError::InvalidToken(msg) => msg,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({
            "error": "unauthorized",
            "message": self.message(),
        }));

        (StatusCode::UNAUTHORIZED, body).into_response()
    }
}

/// Extracts the token from an `Authorization: Bearer` header
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))
}

/// Resolves the request's principal from its bearer token
pub fn authenticate(tokens: &TokenIssuer, headers: &HeaderMap) -> Result<AuthContext, AuthError> {
    let token = bearer_token(headers)?;

    let user_id = tokens.verify(token).map_err(|e| match e {
        JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
        JwtError::InvalidIssuer { .. } => AuthError::InvalidToken("Invalid issuer".to_string()),
        other => AuthError::InvalidToken(format!("Invalid token: {}", other)),
    })?;

    Ok(AuthContext { user_id })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::JwtConfig;
    use axum::http::HeaderValue;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(JwtConfig::new("test-secret-key-at-least-32-bytes-long"))
    }

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_missing_header() {
        assert_eq!(
            authenticate(&issuer(), &HeaderMap::new()),
            Err(AuthError::MissingCredentials)
        );
    }

    #[test]
    fn test_non_bearer_scheme() {
        assert!(matches!(
            authenticate(&issuer(), &headers_with("Basic dXNlcjpwYXNz")),
            Err(AuthError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_valid_token_yields_principal() {
        let tokens = issuer();
        let user_id = Uuid::new_v4();
        let token = tokens.issue(user_id).unwrap();

        let ctx = authenticate(&tokens, &headers_with(&format!("Bearer {}", token))).unwrap();
        assert_eq!(ctx.user_id, user_id);
    }

    #[test]
    fn test_expired_token() {
        let tokens = issuer();
        let token = tokens
            .issue_with_ttl(Uuid::new_v4(), chrono::Duration::hours(-1))
            .unwrap();

        assert_eq!(
            authenticate(&tokens, &headers_with(&format!("Bearer {}", token))),
            Err(AuthError::InvalidToken("Token expired".to_string()))
        );
    }
}

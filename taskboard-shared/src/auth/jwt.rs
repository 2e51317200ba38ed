/// Bearer token issuance and verification
///
/// Tokens are HS256-signed JWTs carrying the user ID in `sub`. The signing
/// secret, issuer, and lifetime come from a [`JwtConfig`] handed to
/// [`TokenIssuer::new`]; there is no process-wide key.
///
/// # Token Structure
///
/// ```json
/// {
///   "sub": "user-uuid",
///   "iss": "taskboard",
///   "iat": 1704067200,
///   "nbf": 1704067200,
///   "exp": 1704153600
/// }
/// ```
///
/// # Example
///
/// ```
/// use taskboard_shared::auth::jwt::{JwtConfig, TokenIssuer};
/// use uuid::Uuid;
///
/// let issuer = TokenIssuer::new(JwtConfig::new("a-secret-of-at-least-thirty-two-bytes!"));
/// let user_id = Uuid::new_v4();
///
/// let token = issuer.issue(user_id).unwrap();
/// assert_eq!(issuer.verify(&token).unwrap(), user_id);
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Issuer claim written into and required on every token
pub const DEFAULT_ISSUER: &str = "taskboard";

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("Failed to create token: {0}")]
    CreateError(String),

    #[error("Token has expired")]
    Expired,

    #[error("Token is not valid yet")]
    Immature,

    #[error("Invalid issuer: expected {expected}")]
    InvalidIssuer { expected: String },

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Invalid token format: {0}")]
    InvalidFormat(String),
}

/// Token signing settings
#[derive(Clone)]
pub struct JwtConfig {
    /// HMAC secret; the API refuses to start with fewer than 32 bytes
    pub secret: String,

    pub issuer: String,

    /// Lifetime of issued tokens
    pub ttl: Duration,
}

impl JwtConfig {
    /// Config with the default issuer and a 24 hour lifetime
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            issuer: DEFAULT_ISSUER.to_string(),
            ttl: Duration::hours(24),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("ttl", &self.ttl)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: Uuid,
    pub iss: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
}

/// Signs and verifies bearer tokens with one configured secret
pub struct TokenIssuer {
    config: JwtConfig,
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenIssuer {
    pub fn new(config: JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.validate_exp = true;
        validation.validate_nbf = true;

        Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            config,
        }
    }

    pub fn config(&self) -> &JwtConfig {
        &self.config
    }

    /// Issues a token for `user_id` with the configured lifetime
    pub fn issue(&self, user_id: Uuid) -> Result<String, JwtError> {
        self.issue_with_ttl(user_id, self.config.ttl)
    }

    /// Issues a token with an explicit lifetime (negative lifetimes produce
    /// already-expired tokens)
    pub fn issue_with_ttl(&self, user_id: Uuid, ttl: Duration) -> Result<String, JwtError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            iss: self.config.issuer.clone(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| JwtError::CreateError(e.to_string()))
    }

    /// Verifies a token and returns its claims
    ///
    /// # Errors
    ///
    /// Expired, not-yet-valid, wrongly issued, wrongly signed, and malformed
    /// tokens are all rejected.
    pub fn decode(&self, token: &str) -> Result<Claims, JwtError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::Expired,
                ErrorKind::ImmatureSignature => JwtError::Immature,
                ErrorKind::InvalidIssuer => JwtError::InvalidIssuer {
                    expected: self.config.issuer.clone(),
                },
                ErrorKind::InvalidSignature => JwtError::InvalidSignature,
                _ => JwtError::InvalidFormat(e.to_string()),
            })
    }

    /// Verifies a token and returns the user ID it was issued for
    pub fn verify(&self, token: &str) -> Result<Uuid, JwtError> {
        self.decode(token).map(|claims| claims.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[test]
    fn test_issue_and_verify() {
        let issuer = TokenIssuer::new(JwtConfig::new(SECRET));
        let user_id = Uuid::new_v4();

        let token = issuer.issue(user_id).expect("Should create token");
        let claims = issuer.decode(&token).expect("Should validate token");

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.iss, DEFAULT_ISSUER);
        assert_eq!(claims.exp - claims.iat, Duration::hours(24).num_seconds());
    }

    #[test]
    fn test_configured_ttl_is_used() {
        let issuer = TokenIssuer::new(JwtConfig::new(SECRET).with_ttl(Duration::hours(2)));
        let claims = issuer.decode(&issuer.issue(Uuid::new_v4()).unwrap()).unwrap();

        assert_eq!(claims.exp - claims.iat, 7200);
    }

    #[test]
    fn test_rejects_wrong_secret() {
        let issuer = TokenIssuer::new(JwtConfig::new(SECRET));
        let other = TokenIssuer::new(JwtConfig::new("another-secret-that-is-long-enough!!"));

        let token = other.issue(Uuid::new_v4()).unwrap();
        assert!(matches!(issuer.verify(&token), Err(JwtError::InvalidSignature)));
    }

    #[test]
    fn test_rejects_expired_token() {
        let issuer = TokenIssuer::new(JwtConfig::new(SECRET));
        let token = issuer
            .issue_with_ttl(Uuid::new_v4(), Duration::hours(-2))
            .unwrap();

        assert!(matches!(issuer.verify(&token), Err(JwtError::Expired)));
    }

    #[test]
    fn test_rejects_foreign_issuer() {
        let mut config = JwtConfig::new(SECRET);
        config.issuer = "someone-else".to_string();
        let foreign = TokenIssuer::new(config);
        let issuer = TokenIssuer::new(JwtConfig::new(SECRET));

        let token = foreign.issue(Uuid::new_v4()).unwrap();
        assert!(matches!(
            issuer.verify(&token),
            Err(JwtError::InvalidIssuer { .. })
        ));
    }

    #[test]
    fn test_rejects_garbage() {
        let issuer = TokenIssuer::new(JwtConfig::new(SECRET));
        assert!(matches!(
            issuer.verify("not.a.token"),
            Err(JwtError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let rendered = format!("{:?}", JwtConfig::new(SECRET));
        assert!(!rendered.contains(SECRET));
    }
}

/// Authentication primitives
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: bearer token issuance and verification
/// - [`middleware`]: turning a bearer header into an [`middleware::AuthContext`]
///
/// Authorization (who may do what on a board) lives in [`crate::access`].
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::auth::password::{hash_password, verify_password};
/// use taskboard_shared::auth::jwt::{JwtConfig, TokenIssuer};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let tokens = TokenIssuer::new(JwtConfig::new(std::env::var("JWT_SECRET")?));
/// let token = tokens.issue(uuid::Uuid::new_v4())?;
/// # Ok(())
/// # }
/// ```

pub mod jwt;
pub mod middleware;
pub mod password;

use tracing::{info, warn};

use super::Kanban;
use crate::auth::jwt::TokenIssuer;
use crate::auth::password::{hash_password, verify_password, MIN_PASSWORD_LEN};
use crate::error::{KanbanError, KanbanResult};
use crate::models::user::{normalize_email, CreateUser, User};
use crate::store::{Store, StoreError};

pub const MIN_NAME_LEN: usize = 2;

/// Argon2 is deliberately slow; keep it off the async workers.
async fn blocking<T, F>(work: F) -> KanbanResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> KanbanResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| KanbanError::Internal(format!("password worker failed: {}", e)))?
}

impl<S> Kanban<S>
where
    S: Store + ?Sized,
{
    /// Registers an account
    ///
    /// The email is stored lowercased. A taken email is a `Conflict`.
    pub async fn register(&self, email: &str, name: &str, password: &str) -> KanbanResult<User> {
        let email = normalize_email(email);
        if !email.contains('@') {
            return Err(KanbanError::validation("email is not valid"));
        }
        let name = name.trim();
        if name.chars().count() < MIN_NAME_LEN {
            return Err(KanbanError::validation(format!(
                "name must be at least {} characters",
                MIN_NAME_LEN
            )));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(KanbanError::validation(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        let plain = password.to_string();
        let password_hash = blocking(move || {
            hash_password(&plain).map_err(|e| KanbanError::Internal(e.to_string()))
        })
        .await?;

        let data = CreateUser {
            email,
            name: name.to_string(),
            password_hash,
        };
        let user = self.store.insert_user(&data).await.map_err(|e| match e {
            StoreError::Conflict(_) => KanbanError::Conflict("email is already registered".to_string()),
            other => other.into(),
        })?;

        info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Checks credentials and issues a bearer token
    ///
    /// Unknown emails and wrong passwords fail identically.
    pub async fn login(&self, tokens: &TokenIssuer, email: &str, password: &str) -> KanbanResult<String> {
        let Some(user) = self.store.find_user_by_email(&normalize_email(email)).await? else {
            warn!("Login for unknown email");
            return Err(KanbanError::Unauthenticated);
        };

        let plain = password.to_string();
        let hash = user.password_hash.clone();
        let valid = blocking(move || {
            verify_password(&plain, &hash).map_err(|e| KanbanError::Internal(e.to_string()))
        })
        .await?;
        if !valid {
            warn!(user_id = %user.id, "Login with wrong password");
            return Err(KanbanError::Unauthenticated);
        }

        tokens
            .issue(user.id)
            .map_err(|e| KanbanError::Internal(e.to_string()))
    }
}

/// Error taxonomy for board operations
///
/// Every operation in the shared library reports failures as a
/// [`KanbanError`]. The API crate maps each variant to exactly one HTTP
/// status; nothing above this layer inspects error strings.
///
/// Persistence adapters report [`StoreError`](crate::store::StoreError),
/// which converts into `KanbanError` via `?`.

use std::fmt;

use thiserror::Error;

use crate::store::StoreError;

/// The kind of entity a lookup failed to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    User,
    Board,
    Share,
    Column,
    Task,
    Label,
}

impl Entity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Entity::User => "user",
            Entity::Board => "board",
            Entity::Share => "share",
            Entity::Column => "column",
            Entity::Task => "task",
            Entity::Label => "label",
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failures surfaced by board, share, column, task, and label operations
#[derive(Debug, Error)]
pub enum KanbanError {
    /// Entity absent, or hidden from a principal without board access
    #[error("{0} not found")]
    NotFound(Entity),

    /// The principal can see the board but lacks the required role
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// No authenticated principal
    #[error("authentication required")]
    Unauthenticated,

    /// Malformed input, out-of-range position, quota exceeded, or a
    /// cross-board reference
    #[error("validation failed: {0}")]
    Validation(String),

    /// Concurrent write collision that survived the retry budget
    #[error("conflict: {0}")]
    Conflict(String),

    /// Unexpected persistence failure
    #[error("internal error: {0}")]
    Internal(String),
}

impl KanbanError {
    pub fn forbidden(message: impl Into<String>) -> Self {
        KanbanError::Forbidden(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        KanbanError::Validation(message.into())
    }

    /// Whether re-running the whole operation may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, KanbanError::Conflict(_))
    }
}

impl From<StoreError> for KanbanError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(message) => KanbanError::Conflict(message),
            StoreError::Backend(message) => KanbanError::Internal(message),
        }
    }
}

pub type KanbanResult<T> = Result<T, KanbanError>;

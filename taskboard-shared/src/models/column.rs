/// Column model and database operations
///
/// Columns are ordered within their board: positions form the dense range
/// `0..N-1`. Only the ordering engine writes positions; this module offers
/// reads, renames, and the raw insert the engine calls once it has made room.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE columns (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     board_id UUID NOT NULL REFERENCES boards(id),
///     title VARCHAR(255) NOT NULL,
///     position INTEGER NOT NULL CHECK (position >= 0),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT columns_board_position_key UNIQUE (board_id, position)
///         DEFERRABLE INITIALLY DEFERRED
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Column {
    pub id: Uuid,
    pub board_id: Uuid,
    pub title: String,
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for a new column; its position is chosen by the ordering engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewColumn {
    pub board_id: Uuid,
    pub title: String,
}

impl Column {
    pub async fn insert<'e, E: PgExecutor<'e>>(
        executor: E,
        data: &NewColumn,
        position: i32,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Column>(
            r#"
            INSERT INTO columns (board_id, title, position)
            VALUES ($1, $2, $3)
            RETURNING id, board_id, title, position, created_at, updated_at
            "#,
        )
        .bind(data.board_id)
        .bind(&data.title)
        .bind(position)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Column>(
            r#"
            SELECT id, board_id, title, position, created_at, updated_at
            FROM columns
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// Lists a board's columns in position order
    pub async fn list_for_board<'e, E: PgExecutor<'e>>(
        executor: E,
        board_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Column>(
            r#"
            SELECT id, board_id, title, position, created_at, updated_at
            FROM columns
            WHERE board_id = $1
            ORDER BY position
            "#,
        )
        .bind(board_id)
        .fetch_all(executor)
        .await
    }

    pub async fn rename<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
        title: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Column>(
            r#"
            UPDATE columns
            SET title = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, board_id, title, position, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(title)
        .fetch_optional(executor)
        .await
    }
}

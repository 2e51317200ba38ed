/// Board model and database operations
///
/// A board is the top-level container. It has exactly one owner and holds
/// an ordered list of columns plus a set of labels. Each owner may hold at
/// most [`MAX_BOARDS_PER_USER`] boards.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE boards (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     owner_id UUID NOT NULL REFERENCES users(id),
///     title VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgExecutor};
use uuid::Uuid;

/// Maximum number of boards a single user may own
pub const MAX_BOARDS_PER_USER: i64 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Board {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a board
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBoard {
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
}

/// Partial board update; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateBoard {
    pub title: Option<String>,
    pub description: Option<String>,
}

impl UpdateBoard {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none()
    }
}

impl Board {
    /// Inserts a board without checking the owner's cap
    ///
    /// Callers enforce [`MAX_BOARDS_PER_USER`] inside the same transaction
    /// after locking the owner with [`User::lock`](crate::models::user::User::lock).
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        data: &CreateBoard,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Board>(
            r#"
            INSERT INTO boards (owner_id, title, description)
            VALUES ($1, $2, $3)
            RETURNING id, owner_id, title, description, created_at, updated_at
            "#,
        )
        .bind(data.owner_id)
        .bind(&data.title)
        .bind(&data.description)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Board>(
            r#"
            SELECT id, owner_id, title, description, created_at, updated_at
            FROM boards
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// Lists boards owned by a user, oldest first
    pub async fn list_owned<'e, E: PgExecutor<'e>>(
        executor: E,
        owner_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Board>(
            r#"
            SELECT id, owner_id, title, description, created_at, updated_at
            FROM boards
            WHERE owner_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(owner_id)
        .fetch_all(executor)
        .await
    }

    /// Lists boards shared with a user (excluding boards they own)
    pub async fn list_shared_with<'e, E: PgExecutor<'e>>(
        executor: E,
        user_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Board>(
            r#"
            SELECT b.id, b.owner_id, b.title, b.description, b.created_at, b.updated_at
            FROM boards b
            JOIN board_shares s ON s.board_id = b.id
            WHERE s.user_id = $1 AND b.owner_id <> $1
            ORDER BY b.created_at, b.id
            "#,
        )
        .bind(user_id)
        .fetch_all(executor)
        .await
    }

    pub async fn count_owned<'e, E: PgExecutor<'e>>(
        executor: E,
        owner_id: Uuid,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM boards WHERE owner_id = $1")
            .bind(owner_id)
            .fetch_one(executor)
            .await
    }

    /// Applies a partial update, returning None if the board doesn't exist
    pub async fn update<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
        data: &UpdateBoard,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Board>(
            r#"
            UPDATE boards
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, owner_id, title, description, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(data.title.as_deref())
        .bind(data.description.as_deref())
        .fetch_optional(executor)
        .await
    }

    /// Deletes a board and everything scoped to it
    ///
    /// Dependents are removed explicitly, leaves first: label links, tasks,
    /// columns, labels, shares, then the board row. Must run inside a
    /// transaction. The board row is locked first, then its columns,
    /// tasks, and labels, so task inserts, moves, and label links made
    /// through those rows wait for the delete.
    pub async fn delete_cascade(conn: &mut PgConnection, id: Uuid) -> Result<bool, sqlx::Error> {
        let locked: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM boards WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        if locked.is_none() {
            return Ok(false);
        }

        for statement in [
            "SELECT id FROM columns WHERE board_id = $1 ORDER BY id FOR UPDATE",
            "SELECT t.id FROM tasks t JOIN columns c ON c.id = t.column_id \
             WHERE c.board_id = $1 ORDER BY t.id FOR UPDATE OF t",
            "SELECT id FROM labels WHERE board_id = $1 ORDER BY id FOR UPDATE",
        ] {
            sqlx::query(statement).bind(id).execute(&mut *conn).await?;
        }

        sqlx::query(
            r#"
            DELETE FROM task_labels
            WHERE task_id IN (
                SELECT t.id FROM tasks t
                JOIN columns c ON c.id = t.column_id
                WHERE c.board_id = $1
            )
            OR label_id IN (SELECT id FROM labels WHERE board_id = $1)
            "#,
        )
        .bind(id)
        .execute(&mut *conn)
        .await?;

        sqlx::query("DELETE FROM tasks WHERE column_id IN (SELECT id FROM columns WHERE board_id = $1)")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        for statement in [
            "DELETE FROM columns WHERE board_id = $1",
            "DELETE FROM labels WHERE board_id = $1",
            "DELETE FROM board_shares WHERE board_id = $1",
        ] {
            sqlx::query(statement).bind(id).execute(&mut *conn).await?;
        }

        let result = sqlx::query("DELETE FROM boards WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_board_is_empty() {
        assert!(UpdateBoard::default().is_empty());
        assert!(!UpdateBoard {
            description: Some(String::new()),
            ..Default::default()
        }
        .is_empty());
    }
}

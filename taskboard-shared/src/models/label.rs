/// Label model and database operations
///
/// Labels are board-scoped tags. A task may carry a label only if both
/// belong to the same board, and carries each label at most once.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE labels (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     board_id UUID NOT NULL REFERENCES boards(id),
///     name VARCHAR(50) NOT NULL,
///     color CHAR(7) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE task_labels (
///     task_id UUID NOT NULL REFERENCES tasks(id),
///     label_id UUID NOT NULL REFERENCES labels(id),
///     PRIMARY KEY (task_id, label_id)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgExecutor};
use uuid::Uuid;

/// Maximum label name length, in characters
pub const MAX_LABEL_NAME_LEN: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Label {
    pub id: Uuid,
    pub board_id: Uuid,
    pub name: String,

    /// `#RRGGBB`
    pub color: String,

    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLabel {
    pub board_id: Uuid,
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateLabel {
    pub name: Option<String>,
    pub color: Option<String>,
}

#[derive(sqlx::FromRow)]
struct TaskLabelRow {
    task_id: Uuid,
    id: Uuid,
    board_id: Uuid,
    name: String,
    color: String,
    created_at: DateTime<Utc>,
}

/// Whether `color` is a `#RRGGBB` hex color
pub fn is_hex_color(color: &str) -> bool {
    let bytes = color.as_bytes();
    bytes.len() == 7 && bytes[0] == b'#' && bytes[1..].iter().all(u8::is_ascii_hexdigit)
}

impl Label {
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        data: &NewLabel,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Label>(
            r#"
            INSERT INTO labels (board_id, name, color)
            VALUES ($1, $2, $3)
            RETURNING id, board_id, name, color, created_at
            "#,
        )
        .bind(data.board_id)
        .bind(&data.name)
        .bind(&data.color)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Label>(
            "SELECT id, board_id, name, color, created_at FROM labels WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    pub async fn list_for_board<'e, E: PgExecutor<'e>>(
        executor: E,
        board_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Label>(
            r#"
            SELECT id, board_id, name, color, created_at
            FROM labels
            WHERE board_id = $1
            ORDER BY name, id
            "#,
        )
        .bind(board_id)
        .fetch_all(executor)
        .await
    }

    pub async fn update<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
        data: &UpdateLabel,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Label>(
            r#"
            UPDATE labels
            SET name = COALESCE($2, name),
                color = COALESCE($3, color)
            WHERE id = $1
            RETURNING id, board_id, name, color, created_at
            "#,
        )
        .bind(id)
        .bind(data.name.as_deref())
        .bind(data.color.as_deref())
        .fetch_optional(executor)
        .await
    }

    /// Detaches a label from every task, then deletes it
    ///
    /// Must run inside a transaction.
    pub async fn delete(conn: &mut PgConnection, id: Uuid) -> Result<bool, sqlx::Error> {
        // Concurrent links wait on this lock, then fail their foreign key
        sqlx::query("SELECT id FROM labels WHERE id = $1 FOR UPDATE")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        sqlx::query("DELETE FROM task_labels WHERE label_id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        let result = sqlx::query("DELETE FROM labels WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Links a label to a task; linking twice is a no-op
    pub async fn attach<'e, E: PgExecutor<'e>>(
        executor: E,
        task_id: Uuid,
        label_id: Uuid,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO task_labels (task_id, label_id)
            VALUES ($1, $2)
            ON CONFLICT (task_id, label_id) DO NOTHING
            "#,
        )
        .bind(task_id)
        .bind(label_id)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Unlinks a label from a task; unlinking an absent link is a no-op
    pub async fn detach<'e, E: PgExecutor<'e>>(
        executor: E,
        task_id: Uuid,
        label_id: Uuid,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM task_labels WHERE task_id = $1 AND label_id = $2")
            .bind(task_id)
            .bind(label_id)
            .execute(executor)
            .await?;

        Ok(())
    }

    /// Labels attached to any of `task_ids`, as `(task_id, label)` pairs
    pub async fn list_for_tasks<'e, E: PgExecutor<'e>>(
        executor: E,
        task_ids: &[Uuid],
    ) -> Result<Vec<(Uuid, Self)>, sqlx::Error> {
        let rows = sqlx::query_as::<_, TaskLabelRow>(
            r#"
            SELECT tl.task_id, l.id, l.board_id, l.name, l.color, l.created_at
            FROM task_labels tl
            JOIN labels l ON l.id = tl.label_id
            WHERE tl.task_id = ANY($1)
            ORDER BY l.name, l.id
            "#,
        )
        .bind(task_ids)
        .fetch_all(executor)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                (
                    row.task_id,
                    Label {
                        id: row.id,
                        board_id: row.board_id,
                        name: row.name,
                        color: row.color,
                        created_at: row.created_at,
                    },
                )
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_hex_color() {
        assert!(is_hex_color("#FF8800"));
        assert!(is_hex_color("#a1b2c3"));
        assert!(!is_hex_color("FF8800"));
        assert!(!is_hex_color("#FF880"));
        assert!(!is_hex_color("#GG8800"));
        assert!(!is_hex_color("#FF88001"));
    }
}

/// Task model and database operations
///
/// Tasks live in a column and are ordered within it by a dense `position`.
/// Position changes go through the ordering engine; this module covers the
/// content fields (title, description, due date, assignee).
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     column_id UUID NOT NULL REFERENCES columns(id),
///     title VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     assigned_to UUID REFERENCES users(id) ON DELETE SET NULL,
///     created_by UUID NOT NULL REFERENCES users(id),
///     due_date TIMESTAMPTZ,
///     position INTEGER NOT NULL CHECK (position >= 0),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT tasks_column_position_key UNIQUE (column_id, position)
///         DEFERRABLE INITIALLY DEFERRED
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: Uuid,
    pub column_id: Uuid,
    pub title: String,
    pub description: String,

    /// Assignee; always the board owner or a share holder when set
    pub assigned_to: Option<Uuid>,

    pub created_by: Uuid,
    pub due_date: Option<DateTime<Utc>>,
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for a new task; its position is chosen by the ordering engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTask {
    pub column_id: Uuid,
    pub title: String,
    pub description: String,
    pub created_by: Uuid,
    pub due_date: Option<DateTime<Utc>>,
}

/// Partial update of a task's content fields
///
/// `due_date` distinguishes "leave unchanged" (`None`) from "clear"
/// (`Some(None)`); in JSON that is an absent key versus `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDetails {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "present_or_null")]
    pub due_date: Option<Option<DateTime<Utc>>>,
}

impl TaskDetails {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.due_date.is_none()
    }
}

/// Deserializes a field that may be absent (outer `None`, via
/// `#[serde(default)]`), explicitly `null` (`Some(None)`), or a value.
pub fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

const TASK_COLUMNS: &str = "id, column_id, title, description, assigned_to, created_by, due_date, position, created_at, updated_at";

impl Task {
    pub async fn insert<'e, E: PgExecutor<'e>>(
        executor: E,
        data: &NewTask,
        position: i32,
    ) -> Result<Self, sqlx::Error> {
        let sql = format!(
            "INSERT INTO tasks (column_id, title, description, created_by, due_date, position) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            TASK_COLUMNS
        );

        sqlx::query_as::<_, Task>(&sql)
            .bind(data.column_id)
            .bind(&data.title)
            .bind(&data.description)
            .bind(data.created_by)
            .bind(data.due_date)
            .bind(position)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!("SELECT {} FROM tasks WHERE id = $1", TASK_COLUMNS);

        sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Lists a column's tasks in position order
    pub async fn list_for_column<'e, E: PgExecutor<'e>>(
        executor: E,
        column_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM tasks WHERE column_id = $1 ORDER BY position",
            TASK_COLUMNS
        );

        sqlx::query_as::<_, Task>(&sql)
            .bind(column_id)
            .fetch_all(executor)
            .await
    }

    /// Lists tasks carrying a label, grouped by column then position
    pub async fn list_with_label<'e, E: PgExecutor<'e>>(
        executor: E,
        label_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM tasks WHERE id IN (SELECT task_id FROM task_labels WHERE label_id = $1) \
             ORDER BY column_id, position",
            TASK_COLUMNS
        );

        sqlx::query_as::<_, Task>(&sql)
            .bind(label_id)
            .fetch_all(executor)
            .await
    }

    pub async fn update_details<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
        data: &TaskDetails,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!(
            "UPDATE tasks SET \
                 title = COALESCE($2, title), \
                 description = COALESCE($3, description), \
                 due_date = CASE WHEN $4 THEN $5 ELSE due_date END, \
                 updated_at = NOW() \
             WHERE id = $1 RETURNING {}",
            TASK_COLUMNS
        );

        sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .bind(data.title.as_deref())
            .bind(data.description.as_deref())
            .bind(data.due_date.is_some())
            .bind(data.due_date.flatten())
            .fetch_optional(executor)
            .await
    }

    pub async fn set_assignee<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
        assignee: Option<Uuid>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!(
            "UPDATE tasks SET assigned_to = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            TASK_COLUMNS
        );

        sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .bind(assignee)
            .fetch_optional(executor)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_details_distinguishes_absent_from_null() {
        let absent: TaskDetails = serde_json::from_str(r#"{"title":"x"}"#).unwrap();
        assert_eq!(absent.due_date, None);

        let cleared: TaskDetails = serde_json::from_str(r#"{"due_date":null}"#).unwrap();
        assert_eq!(cleared.due_date, Some(None));

        let set: TaskDetails =
            serde_json::from_str(r#"{"due_date":"2030-01-02T03:04:05Z"}"#).unwrap();
        assert!(matches!(set.due_date, Some(Some(_))));
    }

    #[test]
    fn test_task_details_is_empty() {
        assert!(TaskDetails::default().is_empty());
        assert!(!TaskDetails {
            due_date: Some(None),
            ..Default::default()
        }
        .is_empty());
    }
}

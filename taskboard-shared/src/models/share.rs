/// Board share model and database operations
///
/// A share grants a non-owner user a role on a board. There is at most one
/// share per (board, user) pair; sharing again replaces the role.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE share_role AS ENUM ('viewer', 'editor');
///
/// CREATE TABLE board_shares (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     board_id UUID NOT NULL REFERENCES boards(id),
///     user_id UUID NOT NULL REFERENCES users(id),
///     role share_role NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT board_shares_board_user_key UNIQUE (board_id, user_id)
/// );
/// ```
///
/// # Roles
///
/// - **viewer**: read the board and everything on it
/// - **editor**: viewer rights plus every structural and content mutation
///
/// Ownership is not a share; the owner is recorded on the board itself.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::access::Access;

/// Role granted by a share
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "share_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ShareRole {
    Viewer,
    Editor,
}

impl ShareRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShareRole::Viewer => "viewer",
            ShareRole::Editor => "editor",
        }
    }
}

impl fmt::Display for ShareRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShareRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "viewer" => Ok(ShareRole::Viewer),
            "editor" => Ok(ShareRole::Editor),
            other => Err(format!("unknown share role '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct BoardShare {
    pub id: Uuid,
    pub board_id: Uuid,
    pub user_id: Uuid,
    pub role: ShareRole,
    pub created_at: DateTime<Utc>,
}

/// A member of a board as shown in its collaborator list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collaborator {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Access,
    pub is_owner: bool,
}

#[derive(sqlx::FromRow)]
struct ShareHolderRow {
    user_id: Uuid,
    email: String,
    name: String,
    role: ShareRole,
}

impl BoardShare {
    pub async fn find<'e, E: PgExecutor<'e>>(
        executor: E,
        board_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, BoardShare>(
            r#"
            SELECT id, board_id, user_id, role, created_at
            FROM board_shares
            WHERE board_id = $1 AND user_id = $2
            "#,
        )
        .bind(board_id)
        .bind(user_id)
        .fetch_optional(executor)
        .await
    }

    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        board_id: Uuid,
        user_id: Uuid,
        role: ShareRole,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, BoardShare>(
            r#"
            INSERT INTO board_shares (board_id, user_id, role)
            VALUES ($1, $2, $3)
            RETURNING id, board_id, user_id, role, created_at
            "#,
        )
        .bind(board_id)
        .bind(user_id)
        .bind(role)
        .fetch_one(executor)
        .await
    }

    pub async fn update_role<'e, E: PgExecutor<'e>>(
        executor: E,
        board_id: Uuid,
        user_id: Uuid,
        role: ShareRole,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, BoardShare>(
            r#"
            UPDATE board_shares
            SET role = $3
            WHERE board_id = $1 AND user_id = $2
            RETURNING id, board_id, user_id, role, created_at
            "#,
        )
        .bind(board_id)
        .bind(user_id)
        .bind(role)
        .fetch_optional(executor)
        .await
    }

    /// Removes a share; returns false if there was none
    pub async fn delete<'e, E: PgExecutor<'e>>(
        executor: E,
        board_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM board_shares WHERE board_id = $1 AND user_id = $2")
            .bind(board_id)
            .bind(user_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists share holders of a board with their account details, oldest
    /// share first. The owner is not included.
    pub async fn list_holders<'e, E: PgExecutor<'e>>(
        executor: E,
        board_id: Uuid,
    ) -> Result<Vec<Collaborator>, sqlx::Error> {
        let rows = sqlx::query_as::<_, ShareHolderRow>(
            r#"
            SELECT s.user_id, u.email, u.name, s.role
            FROM board_shares s
            JOIN users u ON u.id = s.user_id
            WHERE s.board_id = $1
            ORDER BY s.created_at, s.user_id
            "#,
        )
        .bind(board_id)
        .fetch_all(executor)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| Collaborator {
                user_id: row.user_id,
                email: row.email,
                name: row.name,
                role: row.role.into(),
                is_owner: false,
            })
            .collect())
    }
}

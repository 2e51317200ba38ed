/// PostgreSQL store adapter
///
/// Thin composition of the model queries into transactions. Structural
/// operations run in a [`PgSequenceTx`]: containers are locked with
/// `SELECT ... FOR UPDATE` in ID order, and the deferred
/// `UNIQUE (container, position)` constraints are checked at commit.
///
/// # Error mapping
///
/// | SQLSTATE | Meaning               | StoreError |
/// |----------|-----------------------|------------|
/// | 40001    | serialization failure | Conflict   |
/// | 40P01    | deadlock detected     | Conflict   |
/// | 23505    | unique violation      | Conflict   |
/// | 23503    | foreign key violation | Conflict   |
/// | other    |                       | Backend    |

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use tracing::debug;
use uuid::Uuid;

use super::{
    BoardStore, ColumnStore, HealthProbe, LabelStore, Sequence, SequenceStore, SequenceTx,
    ShareStore, StoreError, StoreResult, TaskStore, UserStore,
};
use crate::db::pool::health_check;
use crate::models::board::{Board, CreateBoard, UpdateBoard};
use crate::models::column::{Column, NewColumn};
use crate::models::label::{Label, NewLabel, UpdateLabel};
use crate::models::share::{BoardShare, Collaborator, ShareRole};
use crate::models::task::{NewTask, Task, TaskDetails};
use crate::models::user::{CreateUser, User};
use crate::ordering::plan::{Shift, Slot};

const CONFLICT_CODES: [&str; 4] = ["40001", "40P01", "23505", "23503"];

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if let Some(code) = db_err.code() {
                if CONFLICT_CODES.contains(&code.as_ref()) {
                    return StoreError::Conflict(db_err.message().to_string());
                }
            }
        }
        StoreError::Backend(err.to_string())
    }
}

/// (table, container column) holding a sequence's items
fn sequence_table(seq: Sequence) -> (&'static str, &'static str) {
    match seq {
        Sequence::Columns => ("columns", "board_id"),
        Sequence::Tasks => ("tasks", "column_id"),
    }
}

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

pub struct PgSequenceTx {
    tx: Option<Transaction<'static, Postgres>>,
}

impl PgSequenceTx {
    fn conn(&mut self) -> StoreResult<&mut PgConnection> {
        self.tx
            .as_deref_mut()
            .ok_or_else(|| StoreError::Backend("transaction already finished".to_string()))
    }
}

#[async_trait]
impl SequenceTx for PgSequenceTx {
    async fn lock_containers(&mut self, seq: Sequence, container_ids: &[Uuid]) -> StoreResult<()> {
        let sql = match seq {
            Sequence::Columns => "SELECT id FROM boards WHERE id = ANY($1) ORDER BY id FOR UPDATE",
            Sequence::Tasks => "SELECT id FROM columns WHERE id = ANY($1) ORDER BY id FOR UPDATE",
        };
        let locked: Vec<(Uuid,)> = sqlx::query_as(sql)
            .bind(container_ids)
            .fetch_all(self.conn()?)
            .await?;

        debug!(?seq, requested = container_ids.len(), locked = locked.len(), "Locked containers");
        Ok(())
    }

    async fn board_of_container(&mut self, seq: Sequence, container_id: Uuid) -> StoreResult<Option<Uuid>> {
        let sql = match seq {
            Sequence::Columns => "SELECT id FROM boards WHERE id = $1",
            Sequence::Tasks => "SELECT board_id FROM columns WHERE id = $1",
        };
        let board_id = sqlx::query_scalar(sql)
            .bind(container_id)
            .fetch_optional(self.conn()?)
            .await?;
        Ok(board_id)
    }

    async fn slot_of(&mut self, seq: Sequence, item_id: Uuid) -> StoreResult<Option<Slot>> {
        let (table, container) = sequence_table(seq);
        let sql = format!("SELECT {}, position FROM {} WHERE id = $1", container, table);
        let row: Option<(Uuid, i32)> = sqlx::query_as(&sql)
            .bind(item_id)
            .fetch_optional(self.conn()?)
            .await?;
        Ok(row.map(|(container_id, position)| Slot::new(container_id, position)))
    }

    async fn len(&mut self, seq: Sequence, container_id: Uuid) -> StoreResult<i32> {
        let (table, container) = sequence_table(seq);
        let sql = format!("SELECT COUNT(*) FROM {} WHERE {} = $1", table, container);
        let count: i64 = sqlx::query_scalar(&sql)
            .bind(container_id)
            .fetch_one(self.conn()?)
            .await?;
        i32::try_from(count).map_err(StoreError::backend)
    }

    async fn members(&mut self, seq: Sequence, container_id: Uuid) -> StoreResult<Vec<Uuid>> {
        let (table, container) = sequence_table(seq);
        let sql = format!("SELECT id FROM {} WHERE {} = $1 ORDER BY position", table, container);
        let ids = sqlx::query_scalar(&sql)
            .bind(container_id)
            .fetch_all(self.conn()?)
            .await?;
        Ok(ids)
    }

    async fn shift(&mut self, seq: Sequence, shift: Shift) -> StoreResult<u64> {
        let (table, container) = sequence_table(seq);
        let sql = format!(
            "UPDATE {} SET position = position + $2 \
             WHERE {} = $1 AND position >= $3 AND ($4::INTEGER IS NULL OR position < $4)",
            table, container
        );
        let result = sqlx::query(&sql)
            .bind(shift.container_id)
            .bind(shift.delta)
            .bind(shift.from)
            .bind(shift.to)
            .execute(self.conn()?)
            .await?;
        Ok(result.rows_affected())
    }

    async fn set_slot(&mut self, seq: Sequence, item_id: Uuid, slot: Slot) -> StoreResult<()> {
        let (table, container) = sequence_table(seq);
        let sql = format!(
            "UPDATE {} SET {} = $2, position = $3, updated_at = NOW() WHERE id = $1",
            table, container
        );
        sqlx::query(&sql)
            .bind(item_id)
            .bind(slot.container_id)
            .bind(slot.position)
            .execute(self.conn()?)
            .await?;
        Ok(())
    }

    async fn insert_column(&mut self, data: &NewColumn, position: i32) -> StoreResult<Column> {
        Ok(Column::insert(self.conn()?, data, position).await?)
    }

    async fn insert_task(&mut self, data: &NewTask, position: i32) -> StoreResult<Task> {
        Ok(Task::insert(self.conn()?, data, position).await?)
    }

    async fn remove(&mut self, seq: Sequence, item_id: Uuid) -> StoreResult<()> {
        let conn = self.conn()?;
        match seq {
            Sequence::Columns => {
                // Task inserts and moves lock the column, not the board
                sqlx::query("SELECT id FROM columns WHERE id = $1 FOR UPDATE")
                    .bind(item_id)
                    .execute(&mut *conn)
                    .await?;
                sqlx::query("SELECT id FROM tasks WHERE column_id = $1 ORDER BY id FOR UPDATE")
                    .bind(item_id)
                    .execute(&mut *conn)
                    .await?;
                sqlx::query(
                    "DELETE FROM task_labels WHERE task_id IN (SELECT id FROM tasks WHERE column_id = $1)",
                )
                .bind(item_id)
                .execute(&mut *conn)
                .await?;
                sqlx::query("DELETE FROM tasks WHERE column_id = $1")
                    .bind(item_id)
                    .execute(&mut *conn)
                    .await?;
                sqlx::query("DELETE FROM columns WHERE id = $1")
                    .bind(item_id)
                    .execute(&mut *conn)
                    .await?;
            }
            Sequence::Tasks => {
                sqlx::query("SELECT id FROM tasks WHERE id = $1 FOR UPDATE")
                    .bind(item_id)
                    .execute(&mut *conn)
                    .await?;
                sqlx::query("DELETE FROM task_labels WHERE task_id = $1")
                    .bind(item_id)
                    .execute(&mut *conn)
                    .await?;
                sqlx::query("DELETE FROM tasks WHERE id = $1")
                    .bind(item_id)
                    .execute(&mut *conn)
                    .await?;
            }
        }
        Ok(())
    }

    async fn commit(&mut self) -> StoreResult<()> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| StoreError::Backend("transaction already finished".to_string()))?;
        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl SequenceStore for PgStore {
    async fn begin(&self) -> StoreResult<Box<dyn SequenceTx>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgSequenceTx { tx: Some(tx) }))
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, data: &CreateUser) -> StoreResult<User> {
        Ok(User::create(&self.pool, data).await?)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(User::find_by_email(&self.pool, email).await?)
    }
}

#[async_trait]
impl BoardStore for PgStore {
    async fn find_board(&self, id: Uuid) -> StoreResult<Option<Board>> {
        Ok(Board::find_by_id(&self.pool, id).await?)
    }

    async fn insert_board_capped(&self, data: &CreateBoard, limit: i64) -> StoreResult<Option<Board>> {
        let mut tx = self.pool.begin().await?;

        if !User::lock(&mut *tx, data.owner_id).await? {
            return Err(StoreError::Backend(format!("owner {} does not exist", data.owner_id)));
        }

        let owned = Board::count_owned(&mut *tx, data.owner_id).await?;
        if owned >= limit {
            debug!(owner_id = %data.owner_id, owned, limit, "Board cap reached");
            return Ok(None);
        }

        let board = Board::create(&mut *tx, data).await?;
        tx.commit().await?;
        Ok(Some(board))
    }

    async fn update_board(&self, id: Uuid, data: &UpdateBoard) -> StoreResult<Option<Board>> {
        Ok(Board::update(&self.pool, id, data).await?)
    }

    async fn delete_board(&self, id: Uuid) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;
        let deleted = Board::delete_cascade(&mut tx, id).await?;
        tx.commit().await?;
        Ok(deleted)
    }

    async fn boards_owned_by(&self, owner_id: Uuid) -> StoreResult<Vec<Board>> {
        Ok(Board::list_owned(&self.pool, owner_id).await?)
    }
}

#[async_trait]
impl ShareStore for PgStore {
    async fn find_share(&self, board_id: Uuid, user_id: Uuid) -> StoreResult<Option<BoardShare>> {
        Ok(BoardShare::find(&self.pool, board_id, user_id).await?)
    }

    async fn upsert_share(&self, board_id: Uuid, user_id: Uuid, role: ShareRole) -> StoreResult<BoardShare> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await?;

        let share = match BoardShare::update_role(&mut *tx, board_id, user_id, role).await? {
            Some(share) => share,
            None => BoardShare::create(&mut *tx, board_id, user_id, role).await?,
        };

        tx.commit().await?;
        Ok(share)
    }

    async fn delete_share(&self, board_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        Ok(BoardShare::delete(&self.pool, board_id, user_id).await?)
    }

    async fn share_holders(&self, board_id: Uuid) -> StoreResult<Vec<Collaborator>> {
        Ok(BoardShare::list_holders(&self.pool, board_id).await?)
    }

    async fn boards_shared_with(&self, user_id: Uuid) -> StoreResult<Vec<Board>> {
        Ok(Board::list_shared_with(&self.pool, user_id).await?)
    }
}

#[async_trait]
impl ColumnStore for PgStore {
    async fn find_column(&self, id: Uuid) -> StoreResult<Option<Column>> {
        Ok(Column::find_by_id(&self.pool, id).await?)
    }

    async fn columns_of_board(&self, board_id: Uuid) -> StoreResult<Vec<Column>> {
        Ok(Column::list_for_board(&self.pool, board_id).await?)
    }

    async fn rename_column(&self, id: Uuid, title: &str) -> StoreResult<Option<Column>> {
        Ok(Column::rename(&self.pool, id, title).await?)
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        Ok(Task::find_by_id(&self.pool, id).await?)
    }

    async fn tasks_of_column(&self, column_id: Uuid) -> StoreResult<Vec<Task>> {
        Ok(Task::list_for_column(&self.pool, column_id).await?)
    }

    async fn update_task_details(&self, id: Uuid, data: &TaskDetails) -> StoreResult<Option<Task>> {
        Ok(Task::update_details(&self.pool, id, data).await?)
    }

    async fn set_task_assignee(&self, id: Uuid, assignee: Option<Uuid>) -> StoreResult<Option<Task>> {
        Ok(Task::set_assignee(&self.pool, id, assignee).await?)
    }
}

#[async_trait]
impl LabelStore for PgStore {
    async fn insert_label(&self, data: &NewLabel) -> StoreResult<Label> {
        Ok(Label::create(&self.pool, data).await?)
    }

    async fn find_label(&self, id: Uuid) -> StoreResult<Option<Label>> {
        Ok(Label::find_by_id(&self.pool, id).await?)
    }

    async fn labels_of_board(&self, board_id: Uuid) -> StoreResult<Vec<Label>> {
        Ok(Label::list_for_board(&self.pool, board_id).await?)
    }

    async fn update_label(&self, id: Uuid, data: &UpdateLabel) -> StoreResult<Option<Label>> {
        Ok(Label::update(&self.pool, id, data).await?)
    }

    async fn delete_label(&self, id: Uuid) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;
        let deleted = Label::delete(&mut tx, id).await?;
        tx.commit().await?;
        Ok(deleted)
    }

    async fn attach_label(&self, task_id: Uuid, label_id: Uuid) -> StoreResult<()> {
        Ok(Label::attach(&self.pool, task_id, label_id).await?)
    }

    async fn detach_label(&self, task_id: Uuid, label_id: Uuid) -> StoreResult<()> {
        Ok(Label::detach(&self.pool, task_id, label_id).await?)
    }

    async fn labels_of_tasks(&self, task_ids: &[Uuid]) -> StoreResult<Vec<(Uuid, Label)>> {
        Ok(Label::list_for_tasks(&self.pool, task_ids).await?)
    }

    async fn tasks_with_label(&self, label_id: Uuid) -> StoreResult<Vec<Task>> {
        Ok(Task::list_with_label(&self.pool, label_id).await?)
    }
}

#[async_trait]
impl HealthProbe for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(health_check(&self.pool).await?)
    }
}

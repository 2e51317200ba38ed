/// Persistence ports
///
/// The engines and services depend only on these traits. Two adapters
/// implement them:
///
/// - [`postgres::PgStore`]: the production adapter over a `PgPool`
/// - [`memory::MemoryStore`]: an in-process adapter with the same
///   transactional semantics, used by tests and local runs
///
/// Structural mutations of ordered collections go through a
/// [`SequenceTx`], which scopes every read and write of one operation to a
/// single all-or-nothing transaction. Dropping a `SequenceTx` without
/// calling [`SequenceTx::commit`] rolls it back.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Entity;
use crate::models::board::{Board, CreateBoard, UpdateBoard};
use crate::models::column::{Column, NewColumn};
use crate::models::label::{Label, NewLabel, UpdateLabel};
use crate::models::share::{BoardShare, Collaborator, ShareRole};
use crate::models::task::{NewTask, Task, TaskDetails};
use crate::models::user::{CreateUser, User};
use crate::ordering::plan::{Shift, Slot};

pub mod memory;
pub mod postgres;

/// Errors reported by persistence adapters
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Serialization failure, deadlock, or uniqueness collision; re-running
    /// the whole transaction may succeed
    #[error("conflicting concurrent write: {0}")]
    Conflict(String),

    /// Anything else: connectivity, constraint, or adapter failure
    #[error("persistence failure: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn backend(err: impl std::fmt::Display) -> Self {
        StoreError::Backend(err.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Which ordered collection a structural operation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sequence {
    /// Columns, contained in boards
    Columns,
    /// Tasks, contained in columns
    Tasks,
}

impl Sequence {
    /// Entity kind of the ordered items
    pub fn item(&self) -> Entity {
        match self {
            Sequence::Columns => Entity::Column,
            Sequence::Tasks => Entity::Task,
        }
    }

    /// Entity kind of the containers
    pub fn container(&self) -> Entity {
        match self {
            Sequence::Columns => Entity::Board,
            Sequence::Tasks => Entity::Column,
        }
    }
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a user; a taken email is a [`StoreError::Conflict`]
    async fn insert_user(&self, data: &CreateUser) -> StoreResult<User>;

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
}

#[async_trait]
pub trait BoardStore: Send + Sync {
    async fn find_board(&self, id: Uuid) -> StoreResult<Option<Board>>;

    /// Inserts a board unless its owner already holds `limit` boards
    ///
    /// The count and the insert are atomic per owner. Returns `None` when
    /// the cap is reached.
    async fn insert_board_capped(&self, data: &CreateBoard, limit: i64) -> StoreResult<Option<Board>>;

    async fn update_board(&self, id: Uuid, data: &UpdateBoard) -> StoreResult<Option<Board>>;

    /// Deletes a board with its columns, tasks, labels, label links, and
    /// shares in one transaction. Returns false if the board was absent.
    async fn delete_board(&self, id: Uuid) -> StoreResult<bool>;

    async fn boards_owned_by(&self, owner_id: Uuid) -> StoreResult<Vec<Board>>;
}

#[async_trait]
pub trait ShareStore: Send + Sync {
    async fn find_share(&self, board_id: Uuid, user_id: Uuid) -> StoreResult<Option<BoardShare>>;

    /// Creates the share or replaces its role, atomically
    async fn upsert_share(&self, board_id: Uuid, user_id: Uuid, role: ShareRole) -> StoreResult<BoardShare>;

    async fn delete_share(&self, board_id: Uuid, user_id: Uuid) -> StoreResult<bool>;

    /// Share holders of a board (owner excluded)
    async fn share_holders(&self, board_id: Uuid) -> StoreResult<Vec<Collaborator>>;

    async fn boards_shared_with(&self, user_id: Uuid) -> StoreResult<Vec<Board>>;
}

#[async_trait]
pub trait ColumnStore: Send + Sync {
    async fn find_column(&self, id: Uuid) -> StoreResult<Option<Column>>;

    /// Columns of a board in position order
    async fn columns_of_board(&self, board_id: Uuid) -> StoreResult<Vec<Column>>;

    async fn rename_column(&self, id: Uuid, title: &str) -> StoreResult<Option<Column>>;
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>>;

    /// Tasks of a column in position order
    async fn tasks_of_column(&self, column_id: Uuid) -> StoreResult<Vec<Task>>;

    async fn update_task_details(&self, id: Uuid, data: &TaskDetails) -> StoreResult<Option<Task>>;

    async fn set_task_assignee(&self, id: Uuid, assignee: Option<Uuid>) -> StoreResult<Option<Task>>;
}

#[async_trait]
pub trait LabelStore: Send + Sync {
    async fn insert_label(&self, data: &NewLabel) -> StoreResult<Label>;

    async fn find_label(&self, id: Uuid) -> StoreResult<Option<Label>>;

    async fn labels_of_board(&self, board_id: Uuid) -> StoreResult<Vec<Label>>;

    async fn update_label(&self, id: Uuid, data: &UpdateLabel) -> StoreResult<Option<Label>>;

    /// Detaches the label from all tasks and deletes it, atomically
    async fn delete_label(&self, id: Uuid) -> StoreResult<bool>;

    /// Idempotent link
    async fn attach_label(&self, task_id: Uuid, label_id: Uuid) -> StoreResult<()>;

    /// Idempotent unlink
    async fn detach_label(&self, task_id: Uuid, label_id: Uuid) -> StoreResult<()>;

    /// Labels on any of the given tasks, as `(task_id, label)` pairs
    async fn labels_of_tasks(&self, task_ids: &[Uuid]) -> StoreResult<Vec<(Uuid, Label)>>;

    async fn tasks_with_label(&self, label_id: Uuid) -> StoreResult<Vec<Task>>;
}

/// One all-or-nothing structural operation on an ordered collection
#[async_trait]
pub trait SequenceTx: Send {
    /// Locks the given containers for the rest of the transaction, in a
    /// deterministic order
    async fn lock_containers(&mut self, seq: Sequence, container_ids: &[Uuid]) -> StoreResult<()>;

    /// Board a container belongs to: the board itself for
    /// [`Sequence::Columns`], the column's board for [`Sequence::Tasks`].
    /// `None` if the container does not exist.
    async fn board_of_container(&mut self, seq: Sequence, container_id: Uuid) -> StoreResult<Option<Uuid>>;

    async fn slot_of(&mut self, seq: Sequence, item_id: Uuid) -> StoreResult<Option<Slot>>;

    async fn len(&mut self, seq: Sequence, container_id: Uuid) -> StoreResult<i32>;

    /// Item IDs of a container
    async fn members(&mut self, seq: Sequence, container_id: Uuid) -> StoreResult<Vec<Uuid>>;

    /// Applies a shift, returning how many items moved
    async fn shift(&mut self, seq: Sequence, shift: Shift) -> StoreResult<u64>;

    async fn set_slot(&mut self, seq: Sequence, item_id: Uuid, slot: Slot) -> StoreResult<()>;

    async fn insert_column(&mut self, data: &NewColumn, position: i32) -> StoreResult<Column>;

    async fn insert_task(&mut self, data: &NewTask, position: i32) -> StoreResult<Task>;

    /// Deletes an item and its dependents (a column's tasks and their label
    /// links; a task's label links). Positions of siblings are untouched.
    async fn remove(&mut self, seq: Sequence, item_id: Uuid) -> StoreResult<()>;

    async fn commit(&mut self) -> StoreResult<()>;
}

#[async_trait]
pub trait SequenceStore: Send + Sync {
    async fn begin(&self) -> StoreResult<Box<dyn SequenceTx>>;
}

#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn ping(&self) -> StoreResult<()>;
}

/// Everything the services need from persistence
pub trait Store:
    UserStore + BoardStore + ShareStore + ColumnStore + TaskStore + LabelStore + SequenceStore + HealthProbe
{
}

impl<T> Store for T where
    T: UserStore + BoardStore + ShareStore + ColumnStore + TaskStore + LabelStore + SequenceStore + HealthProbe
{
}

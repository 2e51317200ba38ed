//! Account and board operations
//!
//! [`Kanban`] is the single entry point the API uses. Apart from
//! registration and login, every method takes the principal's user ID
//! first, resolves the board the target entity belongs to, checks access
//! through [`AccessControl`], and only then reads or mutates. All position
//! changes are delegated to the [`Sequencer`].
//!
//! The operations are split by entity across the submodules; each adds an
//! `impl` block to `Kanban`.

mod accounts;
mod boards;
mod columns;
mod labels;
mod shares;
mod tasks;

use std::sync::Arc;

use uuid::Uuid;

pub use accounts::MIN_NAME_LEN;
pub use tasks::{NewTaskInput, TaskUpdate, TaskView};

use crate::access::{Access, AccessControl};
use crate::error::{Entity, KanbanError, KanbanResult};
use crate::models::board::Board;
use crate::models::column::Column;
use crate::models::label::Label;
use crate::models::share::ShareRole;
use crate::models::task::Task;
use crate::ordering::Sequencer;
use crate::store::Store;

/// Maximum board, column, and task title length, in characters
pub const MAX_TITLE_LEN: usize = 255;

pub struct Kanban<S: ?Sized> {
    store: Arc<S>,
    access: AccessControl<S>,
    sequencer: Sequencer<S>,
    max_retries: u32,
}

/// Trims a title and checks it is 1..=255 characters
pub(crate) fn clean_title(field: &str, value: &str) -> KanbanResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(KanbanError::validation(format!("{} must not be empty", field)));
    }
    if trimmed.chars().count() > MAX_TITLE_LEN {
        return Err(KanbanError::validation(format!(
            "{} must be at most {} characters",
            field, MAX_TITLE_LEN
        )));
    }
    Ok(trimmed.to_string())
}

impl<S> Kanban<S>
where
    S: Store + ?Sized,
{
    pub fn new(store: Arc<S>, max_retries: u32) -> Self {
        Self {
            access: AccessControl::new(store.clone()),
            sequencer: Sequencer::new(store.clone(), max_retries),
            store,
            max_retries,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn access(&self) -> &AccessControl<S> {
        &self.access
    }

    /// Resolves a column and checks the principal's role on its board.
    /// Columns on hidden boards report `NotFound(Column)`.
    async fn column_scope(
        &self,
        principal: Uuid,
        column_id: Uuid,
        required: ShareRole,
    ) -> KanbanResult<(Column, Board, Access)> {
        let column = self
            .store
            .find_column(column_id)
            .await?
            .ok_or(KanbanError::NotFound(Entity::Column))?;
        let (board, access) = self
            .access
            .require(principal, column.board_id, required, Entity::Column)
            .await?;
        Ok((column, board, access))
    }

    /// Resolves a task through its column to its board and checks the
    /// principal's role there.
    async fn task_scope(&self, principal: Uuid, task_id: Uuid, required: ShareRole) -> KanbanResult<(Task, Board, Access)> {
        let task = self
            .store
            .find_task(task_id)
            .await?
            .ok_or(KanbanError::NotFound(Entity::Task))?;
        let column = self
            .store
            .find_column(task.column_id)
            .await?
            .ok_or(KanbanError::NotFound(Entity::Task))?;
        let (board, access) = self
            .access
            .require(principal, column.board_id, required, Entity::Task)
            .await?;
        Ok((task, board, access))
    }

    async fn label_scope(&self, principal: Uuid, label_id: Uuid, required: ShareRole) -> KanbanResult<(Label, Board)> {
        let label = self
            .store
            .find_label(label_id)
            .await?
            .ok_or(KanbanError::NotFound(Entity::Label))?;
        let (board, _) = self
            .access
            .require(principal, label.board_id, required, Entity::Label)
            .await?;
        Ok((label, board))
    }
}

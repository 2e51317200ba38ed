use uuid::Uuid;

use super::{clean_title, Kanban};
use crate::error::{Entity, KanbanError, KanbanResult};
use crate::models::column::{Column, NewColumn};
use crate::models::share::ShareRole;
use crate::ordering::plan::Placement;
use crate::store::{Sequence, Store};

impl<S> Kanban<S>
where
    S: Store + ?Sized,
{
    /// Adds a column to a board (editor)
    ///
    /// Without a position the column is appended; with one it is inserted
    /// there and later columns move back by one. Positions outside
    /// `0..=column_count` are rejected.
    pub async fn create_column(
        &self,
        principal: Uuid,
        board_id: Uuid,
        title: &str,
        position: Option<i32>,
    ) -> KanbanResult<Column> {
        self.access
            .require(principal, board_id, ShareRole::Editor, Entity::Board)
            .await?;

        let data = NewColumn {
            board_id,
            title: clean_title("title", title)?,
        };
        self.sequencer.insert_column(&data, position.into()).await
    }

    /// Columns of a board in position order (viewer)
    pub async fn list_columns(&self, principal: Uuid, board_id: Uuid) -> KanbanResult<Vec<Column>> {
        self.access
            .require(principal, board_id, ShareRole::Viewer, Entity::Board)
            .await?;
        Ok(self.store.columns_of_board(board_id).await?)
    }

    pub async fn get_column(&self, principal: Uuid, column_id: Uuid) -> KanbanResult<Column> {
        let (column, _, _) = self.column_scope(principal, column_id, ShareRole::Viewer).await?;
        Ok(column)
    }

    /// Renames and/or moves a column within its board (editor)
    ///
    /// The move commits in its own ordering transaction before the rename.
    /// A rejected move leaves the title unchanged.
    pub async fn update_column(
        &self,
        principal: Uuid,
        column_id: Uuid,
        title: Option<&str>,
        position: Option<i32>,
    ) -> KanbanResult<Column> {
        let (column, board, _) = self.column_scope(principal, column_id, ShareRole::Editor).await?;
        let title = title.map(|t| clean_title("title", t)).transpose()?;

        if let Some(position) = position {
            self.sequencer
                .relocate(Sequence::Columns, column_id, board.id, Placement::At(position))
                .await?;
        }

        if let Some(title) = title {
            return self
                .store
                .rename_column(column_id, &title)
                .await?
                .ok_or(KanbanError::NotFound(Entity::Column));
        }

        if position.is_none() {
            return Ok(column);
        }
        self.store
            .find_column(column_id)
            .await?
            .ok_or(KanbanError::NotFound(Entity::Column))
    }

    /// Deletes a column with its tasks and their label links, then closes
    /// the gap in the board's ordering (editor)
    pub async fn delete_column(&self, principal: Uuid, column_id: Uuid) -> KanbanResult<()> {
        self.column_scope(principal, column_id, ShareRole::Editor).await?;
        self.sequencer.remove(Sequence::Columns, column_id).await?;
        Ok(())
    }

    /// Rewrites the order of all of a board's columns at once (editor)
    ///
    /// `order` must name every column of the board exactly once, with
    /// positions forming a permutation of `0..column_count`. Returns the
    /// columns in their new order.
    pub async fn reorder_columns(&self, principal: Uuid, board_id: Uuid, order: &[(Uuid, i32)]) -> KanbanResult<Vec<Column>> {
        self.access
            .require(principal, board_id, ShareRole::Editor, Entity::Board)
            .await?;

        self.sequencer.reorder_columns(board_id, order).await?;
        Ok(self.store.columns_of_board(board_id).await?)
    }
}

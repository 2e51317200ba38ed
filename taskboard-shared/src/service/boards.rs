use tracing::{info, warn};
use uuid::Uuid;

use super::{clean_title, Kanban};
use crate::error::{Entity, KanbanError, KanbanResult};
use crate::models::board::{Board, CreateBoard, UpdateBoard, MAX_BOARDS_PER_USER};
use crate::models::share::ShareRole;
use crate::store::Store;

impl<S> Kanban<S>
where
    S: Store + ?Sized,
{
    /// Creates a board owned by `principal`
    ///
    /// # Errors
    ///
    /// `Validation` if the title is empty or too long, or if the principal
    /// already owns [`MAX_BOARDS_PER_USER`] boards. The cap holds under
    /// concurrent creates.
    pub async fn create_board(&self, principal: Uuid, title: &str, description: Option<&str>) -> KanbanResult<Board> {
        let data = CreateBoard {
            owner_id: principal,
            title: clean_title("title", title)?,
            description: description.unwrap_or_default().to_string(),
        };

        match self.store.insert_board_capped(&data, MAX_BOARDS_PER_USER).await? {
            Some(board) => {
                info!(board_id = %board.id, owner_id = %principal, "Board created");
                Ok(board)
            }
            None => {
                warn!(owner_id = %principal, "Board limit reached");
                Err(KanbanError::validation(format!(
                    "board limit reached: a user may own at most {} boards",
                    MAX_BOARDS_PER_USER
                )))
            }
        }
    }

    /// Boards the principal owns, followed by boards shared with them
    pub async fn list_boards(&self, principal: Uuid) -> KanbanResult<Vec<Board>> {
        let mut boards = self.store.boards_owned_by(principal).await?;
        boards.extend(self.store.boards_shared_with(principal).await?);
        Ok(boards)
    }

    pub async fn get_board(&self, principal: Uuid, board_id: Uuid) -> KanbanResult<Board> {
        let (board, _) = self
            .access
            .require(principal, board_id, ShareRole::Viewer, Entity::Board)
            .await?;
        Ok(board)
    }

    /// Partially updates a board's title and description (editor)
    pub async fn update_board(&self, principal: Uuid, board_id: Uuid, changes: UpdateBoard) -> KanbanResult<Board> {
        let (board, _) = self
            .access
            .require(principal, board_id, ShareRole::Editor, Entity::Board)
            .await?;

        let changes = UpdateBoard {
            title: changes.title.as_deref().map(|t| clean_title("title", t)).transpose()?,
            description: changes.description,
        };
        if changes.is_empty() {
            return Ok(board);
        }

        self.store
            .update_board(board_id, &changes)
            .await?
            .ok_or(KanbanError::NotFound(Entity::Board))
    }

    /// Deletes a board and everything on it (owner only)
    pub async fn delete_board(&self, principal: Uuid, board_id: Uuid) -> KanbanResult<()> {
        self.access.require_owner(principal, board_id).await?;

        if !self.store.delete_board(board_id).await? {
            return Err(KanbanError::NotFound(Entity::Board));
        }

        info!(%board_id, owner_id = %principal, "Board deleted");
        Ok(())
    }
}

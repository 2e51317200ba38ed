use tracing::info;
use uuid::Uuid;

use super::Kanban;
use crate::access::Access;
use crate::error::{Entity, KanbanError, KanbanResult};
use crate::models::board::Board;
use crate::models::share::{BoardShare, Collaborator, ShareRole};
use crate::models::user::normalize_email;
use crate::retry::with_conflict_retry;
use crate::store::Store;

impl<S> Kanban<S>
where
    S: Store + ?Sized,
{
    /// Grants `role` on a board to the user registered under `email`,
    /// replacing any role they already hold (owner only)
    ///
    /// # Errors
    ///
    /// - `NotFound(User)` if nobody is registered under `email`
    /// - `Validation` when sharing with the board's owner
    pub async fn share_board(&self, principal: Uuid, board_id: Uuid, email: &str, role: ShareRole) -> KanbanResult<BoardShare> {
        let board = self.access.require_owner(principal, board_id).await?;

        let target = self
            .store
            .find_user_by_email(&normalize_email(email))
            .await?
            .ok_or(KanbanError::NotFound(Entity::User))?;
        if target.id == board.owner_id {
            return Err(KanbanError::validation("a board cannot be shared with its owner"));
        }

        let store = &self.store;
        let user_id = target.id;
        let share = with_conflict_retry("share_board", self.max_retries, move || async move {
            Ok(store.upsert_share(board_id, user_id, role).await?)
        })
        .await?;

        info!(%board_id, %user_id, %role, "Board shared");
        Ok(share)
    }

    /// Revokes a user's share (owner only)
    pub async fn unshare_board(&self, principal: Uuid, board_id: Uuid, user_id: Uuid) -> KanbanResult<()> {
        self.access.require_owner(principal, board_id).await?;

        if !self.store.delete_share(board_id, user_id).await? {
            return Err(KanbanError::NotFound(Entity::Share));
        }

        info!(%board_id, %user_id, "Board share revoked");
        Ok(())
    }

    /// Everyone with access to the board: the owner first, then share
    /// holders in the order they were added (viewer)
    pub async fn collaborators(&self, principal: Uuid, board_id: Uuid) -> KanbanResult<Vec<Collaborator>> {
        let (board, _) = self
            .access
            .require(principal, board_id, ShareRole::Viewer, Entity::Board)
            .await?;

        let owner = self
            .store
            .find_user(board.owner_id)
            .await?
            .ok_or_else(|| KanbanError::Internal(format!("owner of board {} is missing", board_id)))?;

        let mut members = vec![Collaborator {
            user_id: owner.id,
            email: owner.email,
            name: owner.name,
            role: Access::Owner,
            is_owner: true,
        }];
        members.extend(self.store.share_holders(board_id).await?);
        Ok(members)
    }

    /// Boards other users have shared with the principal
    pub async fn shared_boards(&self, principal: Uuid) -> KanbanResult<Vec<Board>> {
        Ok(self.store.boards_shared_with(principal).await?)
    }
}

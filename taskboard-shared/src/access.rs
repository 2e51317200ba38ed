/// Board-scoped access control
///
/// Every board-scoped operation funnels through [`AccessControl`]. A
/// principal's effective [`Access`] on a board is:
///
/// - `Owner` when they own it, which satisfies every requirement
/// - the role of their share, if they hold one
/// - nothing otherwise
///
/// `Viewer` is satisfied by either share role; `Editor` only by an editor
/// share (or ownership).
///
/// # Existence hiding
///
/// Callers that act on behalf of a user use [`AccessControl::require`],
/// which reports a board the principal cannot see at all as *not found*,
/// so board IDs cannot be probed. A principal who can see the board but
/// lacks the role gets *forbidden*.
///
/// # Example
///
/// ```no_run
/// # use std::sync::Arc;
/// # use taskboard_shared::access::AccessControl;
/// # use taskboard_shared::error::{Entity, KanbanError};
/// # use taskboard_shared::models::share::ShareRole;
/// # use taskboard_shared::store::memory::MemoryStore;
/// # async fn example(user: uuid::Uuid, board: uuid::Uuid) -> Result<(), KanbanError> {
/// let access = AccessControl::new(Arc::new(MemoryStore::new()));
/// let (board, role) = access.require(user, board, ShareRole::Editor, Entity::Board).await?;
/// # Ok(())
/// # }
/// ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::{Entity, KanbanError, KanbanResult};
use crate::models::board::Board;
use crate::models::share::ShareRole;
use crate::store::{BoardStore, ShareStore};

/// Effective access level of a principal on a board
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    Viewer,
    Editor,
    Owner,
}

impl Access {
    pub fn satisfies(self, required: ShareRole) -> bool {
        self >= Access::from(required)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Access::Viewer => "viewer",
            Access::Editor => "editor",
            Access::Owner => "owner",
        }
    }
}

impl From<ShareRole> for Access {
    fn from(role: ShareRole) -> Self {
        match role {
            ShareRole::Viewer => Access::Viewer,
            ShareRole::Editor => Access::Editor,
        }
    }
}

/// Outcome of an access check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// The board does not exist
    Missing,
    /// The principal neither owns the board nor holds a share
    Hidden,
    /// The principal can see the board but their role is too low
    Denied { access: Access },
    Granted { board: Board, access: Access },
}

pub struct AccessControl<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ?Sized> Clone for AccessControl<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S> AccessControl<S>
where
    S: BoardStore + ShareStore + ?Sized,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Effective access of `principal` on `board`, or `None`
    pub async fn access_of(&self, principal: Uuid, board: &Board) -> KanbanResult<Option<Access>> {
        if board.owner_id == principal {
            return Ok(Some(Access::Owner));
        }

        let share = self.store.find_share(board.id, principal).await?;
        Ok(share.map(|s| Access::from(s.role)))
    }

    /// Decides whether `principal` holds at least `required` on a board
    pub async fn decide(&self, principal: Uuid, board_id: Uuid, required: ShareRole) -> KanbanResult<Decision> {
        let Some(board) = self.store.find_board(board_id).await? else {
            return Ok(Decision::Missing);
        };

        let decision = match self.access_of(principal, &board).await? {
            None => Decision::Hidden,
            Some(access) if access.satisfies(required) => Decision::Granted { board, access },
            Some(access) => Decision::Denied { access },
        };

        debug!(%principal, %board_id, ?required, ?decision, "Access decision");
        Ok(decision)
    }

    /// Whether `principal` holds at least `required` on the board
    ///
    /// # Errors
    ///
    /// [`KanbanError::NotFound`] if the board does not exist, and
    /// [`KanbanError::Internal`] on persistence failure. Lack of access is
    /// `Ok(false)`, never an error.
    pub async fn authorize(&self, principal: Uuid, board_id: Uuid, required: ShareRole) -> KanbanResult<bool> {
        match self.decide(principal, board_id, required).await? {
            Decision::Missing => Err(KanbanError::NotFound(Entity::Board)),
            Decision::Granted { .. } => Ok(true),
            Decision::Hidden | Decision::Denied { .. } => Ok(false),
        }
    }

    /// Requires at least `required` on the board, hiding its existence
    ///
    /// Missing boards and boards the principal cannot see report
    /// `NotFound(subject)`, where `subject` is the entity the caller was
    /// asked about (a task ID that resolves to a hidden board reports a
    /// missing task).
    pub async fn require(
        &self,
        principal: Uuid,
        board_id: Uuid,
        required: ShareRole,
        subject: Entity,
    ) -> KanbanResult<(Board, Access)> {
        match self.decide(principal, board_id, required).await? {
            Decision::Granted { board, access } => Ok((board, access)),
            Decision::Denied { access } => Err(KanbanError::forbidden(format!(
                "{} access is required, you have {}",
                required,
                access.as_str()
            ))),
            Decision::Missing | Decision::Hidden => Err(KanbanError::NotFound(subject)),
        }
    }

    /// Requires ownership of the board, hiding its existence from
    /// principals without any access
    pub async fn require_owner(&self, principal: Uuid, board_id: Uuid) -> KanbanResult<Board> {
        let (board, access) = self
            .require(principal, board_id, ShareRole::Viewer, Entity::Board)
            .await?;

        if access == Access::Owner {
            Ok(board)
        } else {
            Err(KanbanError::forbidden("only the board owner can do this"))
        }
    }
}

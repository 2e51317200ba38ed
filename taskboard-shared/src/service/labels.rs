use uuid::Uuid;

use super::Kanban;
use crate::error::{Entity, KanbanError, KanbanResult};
use crate::models::label::{is_hex_color, Label, NewLabel, UpdateLabel, MAX_LABEL_NAME_LEN};
use crate::models::share::ShareRole;
use crate::models::task::Task;
use crate::store::Store;

fn clean_name(name: &str) -> KanbanResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.chars().count() > MAX_LABEL_NAME_LEN {
        return Err(KanbanError::validation(format!(
            "label name must be 1 to {} characters",
            MAX_LABEL_NAME_LEN
        )));
    }
    Ok(trimmed.to_string())
}

fn check_color(color: &str) -> KanbanResult<String> {
    if is_hex_color(color) {
        Ok(color.to_string())
    } else {
        Err(KanbanError::validation(format!("color '{}' is not #RRGGBB", color)))
    }
}

impl<S> Kanban<S>
where
    S: Store + ?Sized,
{
    pub async fn create_label(&self, principal: Uuid, board_id: Uuid, name: &str, color: &str) -> KanbanResult<Label> {
        self.access
            .require(principal, board_id, ShareRole::Editor, Entity::Board)
            .await?;

        let data = NewLabel {
            board_id,
            name: clean_name(name)?,
            color: check_color(color)?,
        };
        Ok(self.store.insert_label(&data).await?)
    }

    pub async fn get_label(&self, principal: Uuid, label_id: Uuid) -> KanbanResult<Label> {
        let (label, _) = self.label_scope(principal, label_id, ShareRole::Viewer).await?;
        Ok(label)
    }

    pub async fn list_labels(&self, principal: Uuid, board_id: Uuid) -> KanbanResult<Vec<Label>> {
        self.access
            .require(principal, board_id, ShareRole::Viewer, Entity::Board)
            .await?;
        Ok(self.store.labels_of_board(board_id).await?)
    }

    pub async fn update_label(&self, principal: Uuid, label_id: Uuid, changes: UpdateLabel) -> KanbanResult<Label> {
        let (label, _) = self.label_scope(principal, label_id, ShareRole::Editor).await?;

        let changes = UpdateLabel {
            name: changes.name.as_deref().map(clean_name).transpose()?,
            color: changes.color.as_deref().map(check_color).transpose()?,
        };
        if changes.name.is_none() && changes.color.is_none() {
            return Ok(label);
        }

        self.store
            .update_label(label_id, &changes)
            .await?
            .ok_or(KanbanError::NotFound(Entity::Label))
    }

    /// Deletes a label after detaching it from every task (editor)
    pub async fn delete_label(&self, principal: Uuid, label_id: Uuid) -> KanbanResult<()> {
        self.label_scope(principal, label_id, ShareRole::Editor).await?;

        if !self.store.delete_label(label_id).await? {
            return Err(KanbanError::NotFound(Entity::Label));
        }
        Ok(())
    }

    /// Tasks carrying the label (viewer)
    pub async fn tasks_with_label(&self, principal: Uuid, label_id: Uuid) -> KanbanResult<Vec<Task>> {
        self.label_scope(principal, label_id, ShareRole::Viewer).await?;
        Ok(self.store.tasks_with_label(label_id).await?)
    }

    /// Attaches a label of the task's board to the task; idempotent (editor)
    pub async fn attach_label(&self, principal: Uuid, task_id: Uuid, label_id: Uuid) -> KanbanResult<()> {
        self.check_label_link(principal, task_id, label_id).await?;
        Ok(self.store.attach_label(task_id, label_id).await?)
    }

    /// Detaches a label from a task; idempotent (editor)
    pub async fn detach_label(&self, principal: Uuid, task_id: Uuid, label_id: Uuid) -> KanbanResult<()> {
        self.check_label_link(principal, task_id, label_id).await?;
        Ok(self.store.detach_label(task_id, label_id).await?)
    }

    /// Labels attached to a task (viewer)
    pub async fn task_labels(&self, principal: Uuid, task_id: Uuid) -> KanbanResult<Vec<Label>> {
        Ok(self.get_task(principal, task_id).await?.labels)
    }

    async fn check_label_link(&self, principal: Uuid, task_id: Uuid, label_id: Uuid) -> KanbanResult<()> {
        let (_, board, _) = self.task_scope(principal, task_id, ShareRole::Editor).await?;

        let label = self
            .store
            .find_label(label_id)
            .await?
            .ok_or(KanbanError::NotFound(Entity::Label))?;
        if label.board_id != board.id {
            return Err(KanbanError::validation("label belongs to another board"));
        }
        Ok(())
    }
}

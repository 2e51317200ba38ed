use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::{clean_title, Kanban};
use crate::access::Access;
use crate::error::{Entity, KanbanError, KanbanResult};
use crate::models::label::Label;
use crate::models::share::ShareRole;
use crate::models::task::{NewTask, Task, TaskDetails};
use crate::ordering::plan::Placement;
use crate::store::{Sequence, Store};

/// A task together with the labels attached to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskView {
    #[serde(flatten)]
    pub task: Task,
    pub labels: Vec<Label>,
}

#[derive(Debug, Clone, Default)]
pub struct NewTaskInput {
    pub column_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub position: Option<i32>,
}

/// Content changes plus an optional move, applied in one call
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    pub details: TaskDetails,

    /// Target column; defaults to the task's current column
    pub column_id: Option<Uuid>,

    /// Target position; defaults to the end of the target column
    pub position: Option<i32>,
}

impl<S> Kanban<S>
where
    S: Store + ?Sized,
{
    /// Creates a task in a column (editor)
    pub async fn create_task(&self, principal: Uuid, input: NewTaskInput) -> KanbanResult<Task> {
        self.column_scope(principal, input.column_id, ShareRole::Editor).await?;

        let data = NewTask {
            column_id: input.column_id,
            title: clean_title("title", &input.title)?,
            description: input.description.unwrap_or_default(),
            created_by: principal,
            due_date: input.due_date,
        };
        self.sequencer.insert_task(&data, input.position.into()).await
    }

    pub async fn get_task(&self, principal: Uuid, task_id: Uuid) -> KanbanResult<TaskView> {
        let (task, _, _) = self.task_scope(principal, task_id, ShareRole::Viewer).await?;
        let labels = self
            .store
            .labels_of_tasks(&[task_id])
            .await?
            .into_iter()
            .map(|(_, label)| label)
            .collect();
        Ok(TaskView { task, labels })
    }

    /// Tasks of a column in position order, each with its labels (viewer)
    pub async fn list_tasks(&self, principal: Uuid, column_id: Uuid) -> KanbanResult<Vec<TaskView>> {
        self.column_scope(principal, column_id, ShareRole::Viewer).await?;

        let tasks = self.store.tasks_of_column(column_id).await?;
        let ids: Vec<Uuid> = tasks.iter().map(|t| t.id).collect();

        let mut labels: HashMap<Uuid, Vec<Label>> = HashMap::new();
        for (task_id, label) in self.store.labels_of_tasks(&ids).await? {
            labels.entry(task_id).or_default().push(label);
        }

        Ok(tasks
            .into_iter()
            .map(|task| TaskView {
                labels: labels.remove(&task.id).unwrap_or_default(),
                task,
            })
            .collect())
    }

    /// Updates a task's content and optionally moves it (editor)
    ///
    /// The move, if any, runs first as its own ordering transaction and
    /// commits before the content update. A rejected move leaves the task
    /// untouched; a content update failing after a committed move leaves
    /// the task in its new place. Passing the task's current column without
    /// a position is not a move.
    pub async fn update_task(&self, principal: Uuid, task_id: Uuid, update: TaskUpdate) -> KanbanResult<Task> {
        let (task, _, _) = self.task_scope(principal, task_id, ShareRole::Editor).await?;

        let details = TaskDetails {
            title: update.details.title.as_deref().map(|t| clean_title("title", t)).transpose()?,
            ..update.details
        };

        let changes_column = update.column_id.is_some_and(|c| c != task.column_id);
        if changes_column || update.position.is_some() {
            let column_id = update.column_id.unwrap_or(task.column_id);
            self.sequencer
                .relocate(Sequence::Tasks, task_id, column_id, update.position.into())
                .await?;
        }

        if details.is_empty() {
            return self.reload_task(task_id).await;
        }
        self.store
            .update_task_details(task_id, &details)
            .await?
            .ok_or(KanbanError::NotFound(Entity::Task))
    }

    /// Deletes a task and closes the gap in its column
    ///
    /// Editors may delete any task; a viewer may delete tasks they created.
    pub async fn delete_task(&self, principal: Uuid, task_id: Uuid) -> KanbanResult<()> {
        let (task, _, access) = self.task_scope(principal, task_id, ShareRole::Viewer).await?;

        if access < Access::Editor && task.created_by != principal {
            return Err(KanbanError::forbidden("editor access or task authorship is required"));
        }

        self.sequencer.remove(Sequence::Tasks, task_id).await?;
        Ok(())
    }

    /// Moves a task within its column or to another column of the same
    /// board (editor)
    pub async fn move_task(&self, principal: Uuid, task_id: Uuid, column_id: Uuid, position: i32) -> KanbanResult<Task> {
        self.task_scope(principal, task_id, ShareRole::Editor).await?;
        self.sequencer
            .relocate(Sequence::Tasks, task_id, column_id, Placement::At(position))
            .await?;
        self.reload_task(task_id).await
    }

    /// Assigns a task to the board owner or a share holder (editor)
    pub async fn assign_task(&self, principal: Uuid, task_id: Uuid, assignee: Uuid) -> KanbanResult<Task> {
        let (_, board, _) = self.task_scope(principal, task_id, ShareRole::Editor).await?;

        if self.access.access_of(assignee, &board).await?.is_none() {
            return Err(KanbanError::validation(
                "assignee must be the board owner or a collaborator",
            ));
        }

        let task = self
            .store
            .set_task_assignee(task_id, Some(assignee))
            .await?
            .ok_or(KanbanError::NotFound(Entity::Task))?;

        info!(%task_id, %assignee, "Task assigned");
        Ok(task)
    }

    pub async fn unassign_task(&self, principal: Uuid, task_id: Uuid) -> KanbanResult<Task> {
        self.task_scope(principal, task_id, ShareRole::Editor).await?;
        self.store
            .set_task_assignee(task_id, None)
            .await?
            .ok_or(KanbanError::NotFound(Entity::Task))
    }

    /// Sets or clears a task's due date (editor)
    pub async fn set_due_date(&self, principal: Uuid, task_id: Uuid, due_date: Option<DateTime<Utc>>) -> KanbanResult<Task> {
        self.task_scope(principal, task_id, ShareRole::Editor).await?;

        let details = TaskDetails {
            due_date: Some(due_date),
            ..Default::default()
        };
        self.store
            .update_task_details(task_id, &details)
            .await?
            .ok_or(KanbanError::NotFound(Entity::Task))
    }

    async fn reload_task(&self, task_id: Uuid) -> KanbanResult<Task> {
        self.store
            .find_task(task_id)
            .await?
            .ok_or(KanbanError::NotFound(Entity::Task))
    }
}

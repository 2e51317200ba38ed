//! In-process store adapter.
//!
//! All state sits behind one async mutex. A [`SequenceTx`] holds the lock
//! for its whole lifetime and works on a private copy of the state, which
//! replaces the shared state only on commit; dropping the transaction
//! discards the copy. This gives the same all-or-nothing and serialized
//! behavior the PostgreSQL adapter gets from row locks and transactions.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::{
    BoardStore, ColumnStore, HealthProbe, LabelStore, Sequence, SequenceStore, SequenceTx,
    ShareStore, StoreError, StoreResult, TaskStore, UserStore,
};
use crate::models::board::{Board, CreateBoard, UpdateBoard};
use crate::models::column::{Column, NewColumn};
use crate::models::label::{Label, NewLabel, UpdateLabel};
use crate::models::share::{BoardShare, Collaborator, ShareRole};
use crate::models::task::{NewTask, Task, TaskDetails};
use crate::models::user::{CreateUser, User};
use crate::ordering::plan::{Shift, Slot};

const NO_FAULT: i64 = -1;

#[derive(Debug, Default, Clone)]
struct State {
    users: HashMap<Uuid, User>,
    boards: HashMap<Uuid, Board>,
    shares: HashMap<(Uuid, Uuid), BoardShare>,
    columns: HashMap<Uuid, Column>,
    tasks: HashMap<Uuid, Task>,
    labels: HashMap<Uuid, Label>,
    /// (task_id, label_id)
    task_labels: BTreeSet<(Uuid, Uuid)>,
}

impl State {
    fn remove_task(&mut self, task_id: Uuid) {
        self.task_labels.retain(|(task, _)| *task != task_id);
        self.tasks.remove(&task_id);
    }

    fn remove_column(&mut self, column_id: Uuid) {
        let task_ids: Vec<Uuid> = self
            .tasks
            .values()
            .filter(|t| t.column_id == column_id)
            .map(|t| t.id)
            .collect();
        for task_id in task_ids {
            self.remove_task(task_id);
        }
        self.columns.remove(&column_id);
    }

    fn slot_of(&self, seq: Sequence, item_id: Uuid) -> Option<Slot> {
        match seq {
            Sequence::Columns => self
                .columns
                .get(&item_id)
                .map(|c| Slot::new(c.board_id, c.position)),
            Sequence::Tasks => self
                .tasks
                .get(&item_id)
                .map(|t| Slot::new(t.column_id, t.position)),
        }
    }

    /// (item_id, position) pairs of one container
    fn positions(&self, seq: Sequence, container_id: Uuid) -> Vec<(Uuid, i32)> {
        let mut items: Vec<(Uuid, i32)> = match seq {
            Sequence::Columns => self
                .columns
                .values()
                .filter(|c| c.board_id == container_id)
                .map(|c| (c.id, c.position))
                .collect(),
            Sequence::Tasks => self
                .tasks
                .values()
                .filter(|t| t.column_id == container_id)
                .map(|t| (t.id, t.position))
                .collect(),
        };
        items.sort_by_key(|(_, position)| *position);
        items
    }

    /// Rejects two items holding one slot, like the deferred unique
    /// constraints do at commit.
    fn check_unique_slots(&self) -> StoreResult<()> {
        let mut seen = HashSet::new();
        let slots = self
            .columns
            .values()
            .map(|c| (c.board_id, c.position))
            .chain(self.tasks.values().map(|t| (t.column_id, t.position)));
        for slot in slots {
            if !seen.insert(slot) {
                return Err(StoreError::Conflict(format!(
                    "duplicate position {} in container {}",
                    slot.1, slot.0
                )));
            }
        }
        Ok(())
    }
}

/// Shared in-memory store; clones share state
#[derive(Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
    shift_fault: Arc<AtomicI64>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
            shift_fault: Arc::new(AtomicI64::new(NO_FAULT)),
        }
    }

    /// Lets `shifts` more shifts succeed, then fails the next one (once).
    /// Used to exercise rollback.
    pub fn fail_shift_after(&self, shifts: u32) {
        self.shift_fault.store(i64::from(shifts), Ordering::SeqCst);
    }
}

pub struct MemoryTx {
    guard: OwnedMutexGuard<State>,
    work: State,
    shift_fault: Arc<AtomicI64>,
    finished: bool,
}

impl MemoryTx {
    fn trip_fault(&self) -> StoreResult<()> {
        match self.shift_fault.load(Ordering::SeqCst) {
            NO_FAULT => Ok(()),
            0 => {
                self.shift_fault.store(NO_FAULT, Ordering::SeqCst);
                Err(StoreError::Backend("injected shift failure".to_string()))
            }
            remaining => {
                self.shift_fault.store(remaining - 1, Ordering::SeqCst);
                Ok(())
            }
        }
    }
}

#[async_trait]
impl SequenceTx for MemoryTx {
    async fn lock_containers(&mut self, _seq: Sequence, _container_ids: &[Uuid]) -> StoreResult<()> {
        // The whole store is already held.
        Ok(())
    }

    async fn board_of_container(&mut self, seq: Sequence, container_id: Uuid) -> StoreResult<Option<Uuid>> {
        Ok(match seq {
            Sequence::Columns => self
                .work
                .boards
                .contains_key(&container_id)
                .then_some(container_id),
            Sequence::Tasks => self.work.columns.get(&container_id).map(|c| c.board_id),
        })
    }

    async fn slot_of(&mut self, seq: Sequence, item_id: Uuid) -> StoreResult<Option<Slot>> {
        Ok(self.work.slot_of(seq, item_id))
    }

    async fn len(&mut self, seq: Sequence, container_id: Uuid) -> StoreResult<i32> {
        i32::try_from(self.work.positions(seq, container_id).len()).map_err(StoreError::backend)
    }

    async fn members(&mut self, seq: Sequence, container_id: Uuid) -> StoreResult<Vec<Uuid>> {
        Ok(self
            .work
            .positions(seq, container_id)
            .into_iter()
            .map(|(id, _)| id)
            .collect())
    }

    async fn shift(&mut self, seq: Sequence, shift: Shift) -> StoreResult<u64> {
        self.trip_fault()?;

        let mut moved = 0;
        match seq {
            Sequence::Columns => {
                for column in self.work.columns.values_mut() {
                    let position = shift.apply(column.board_id, column.position);
                    if position != column.position {
                        column.position = position;
                        moved += 1;
                    }
                }
            }
            Sequence::Tasks => {
                for task in self.work.tasks.values_mut() {
                    let position = shift.apply(task.column_id, task.position);
                    if position != task.position {
                        task.position = position;
                        moved += 1;
                    }
                }
            }
        }
        Ok(moved)
    }

    async fn set_slot(&mut self, seq: Sequence, item_id: Uuid, slot: Slot) -> StoreResult<()> {
        let now = Utc::now();
        match seq {
            Sequence::Columns => {
                let column = self
                    .work
                    .columns
                    .get_mut(&item_id)
                    .ok_or_else(|| StoreError::Backend(format!("column {} vanished", item_id)))?;
                column.position = slot.position;
                column.updated_at = now;
            }
            Sequence::Tasks => {
                let task = self
                    .work
                    .tasks
                    .get_mut(&item_id)
                    .ok_or_else(|| StoreError::Backend(format!("task {} vanished", item_id)))?;
                task.column_id = slot.container_id;
                task.position = slot.position;
                task.updated_at = now;
            }
        }
        Ok(())
    }

    async fn insert_column(&mut self, data: &NewColumn, position: i32) -> StoreResult<Column> {
        let now = Utc::now();
        let column = Column {
            id: Uuid::new_v4(),
            board_id: data.board_id,
            title: data.title.clone(),
            position,
            created_at: now,
            updated_at: now,
        };
        self.work.columns.insert(column.id, column.clone());
        Ok(column)
    }

    async fn insert_task(&mut self, data: &NewTask, position: i32) -> StoreResult<Task> {
        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4(),
            column_id: data.column_id,
            title: data.title.clone(),
            description: data.description.clone(),
            assigned_to: None,
            created_by: data.created_by,
            due_date: data.due_date,
            position,
            created_at: now,
            updated_at: now,
        };
        self.work.tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn remove(&mut self, seq: Sequence, item_id: Uuid) -> StoreResult<()> {
        match seq {
            Sequence::Columns => self.work.remove_column(item_id),
            Sequence::Tasks => self.work.remove_task(item_id),
        }
        Ok(())
    }

    async fn commit(&mut self) -> StoreResult<()> {
        if self.finished {
            return Err(StoreError::Backend("transaction already finished".to_string()));
        }
        self.work.check_unique_slots()?;
        *self.guard = std::mem::take(&mut self.work);
        self.finished = true;
        Ok(())
    }
}

#[async_trait]
impl SequenceStore for MemoryStore {
    async fn begin(&self) -> StoreResult<Box<dyn SequenceTx>> {
        let guard = self.state.clone().lock_owned().await;
        let work = guard.clone();
        Ok(Box::new(MemoryTx {
            guard,
            work,
            shift_fault: self.shift_fault.clone(),
            finished: false,
        }))
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, data: &CreateUser) -> StoreResult<User> {
        let mut state = self.state.lock().await;
        if state.users.values().any(|u| u.email == data.email) {
            return Err(StoreError::Conflict(format!("email {} already registered", data.email)));
        }

        let user = User {
            id: Uuid::new_v4(),
            email: data.email.clone(),
            name: data.name.clone(),
            password_hash: data.password_hash.clone(),
            created_at: Utc::now(),
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.state.lock().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self
            .state
            .lock()
            .await
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }
}

fn sorted_boards<'a>(boards: impl Iterator<Item = &'a Board>) -> Vec<Board> {
    let mut boards: Vec<Board> = boards.cloned().collect();
    boards.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
    boards
}

#[async_trait]
impl BoardStore for MemoryStore {
    async fn find_board(&self, id: Uuid) -> StoreResult<Option<Board>> {
        Ok(self.state.lock().await.boards.get(&id).cloned())
    }

    async fn insert_board_capped(&self, data: &CreateBoard, limit: i64) -> StoreResult<Option<Board>> {
        let mut state = self.state.lock().await;
        let owned = state
            .boards
            .values()
            .filter(|b| b.owner_id == data.owner_id)
            .count() as i64;
        if owned >= limit {
            return Ok(None);
        }

        let now = Utc::now();
        let board = Board {
            id: Uuid::new_v4(),
            owner_id: data.owner_id,
            title: data.title.clone(),
            description: data.description.clone(),
            created_at: now,
            updated_at: now,
        };
        state.boards.insert(board.id, board.clone());
        Ok(Some(board))
    }

    async fn update_board(&self, id: Uuid, data: &UpdateBoard) -> StoreResult<Option<Board>> {
        let mut state = self.state.lock().await;
        Ok(state.boards.get_mut(&id).map(|board| {
            if let Some(title) = &data.title {
                board.title = title.clone();
            }
            if let Some(description) = &data.description {
                board.description = description.clone();
            }
            board.updated_at = Utc::now();
            board.clone()
        }))
    }

    async fn delete_board(&self, id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        if !state.boards.contains_key(&id) {
            return Ok(false);
        }

        let column_ids: Vec<Uuid> = state
            .columns
            .values()
            .filter(|c| c.board_id == id)
            .map(|c| c.id)
            .collect();
        for column_id in column_ids {
            state.remove_column(column_id);
        }

        let label_ids: HashSet<Uuid> = state
            .labels
            .values()
            .filter(|l| l.board_id == id)
            .map(|l| l.id)
            .collect();
        state.task_labels.retain(|(_, label)| !label_ids.contains(label));
        state.labels.retain(|_, l| l.board_id != id);
        state.shares.retain(|(board, _), _| *board != id);
        state.boards.remove(&id);
        Ok(true)
    }

    async fn boards_owned_by(&self, owner_id: Uuid) -> StoreResult<Vec<Board>> {
        let state = self.state.lock().await;
        Ok(sorted_boards(state.boards.values().filter(|b| b.owner_id == owner_id)))
    }
}

#[async_trait]
impl ShareStore for MemoryStore {
    async fn find_share(&self, board_id: Uuid, user_id: Uuid) -> StoreResult<Option<BoardShare>> {
        Ok(self.state.lock().await.shares.get(&(board_id, user_id)).cloned())
    }

    async fn upsert_share(&self, board_id: Uuid, user_id: Uuid, role: ShareRole) -> StoreResult<BoardShare> {
        let mut state = self.state.lock().await;
        let share = state
            .shares
            .entry((board_id, user_id))
            .and_modify(|share| share.role = role)
            .or_insert_with(|| BoardShare {
                id: Uuid::new_v4(),
                board_id,
                user_id,
                role,
                created_at: Utc::now(),
            });
        Ok(share.clone())
    }

    async fn delete_share(&self, board_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        Ok(self
            .state
            .lock()
            .await
            .shares
            .remove(&(board_id, user_id))
            .is_some())
    }

    async fn share_holders(&self, board_id: Uuid) -> StoreResult<Vec<Collaborator>> {
        let state = self.state.lock().await;
        let mut shares: Vec<&BoardShare> = state
            .shares
            .values()
            .filter(|s| s.board_id == board_id)
            .collect();
        shares.sort_by(|a, b| (a.created_at, a.user_id).cmp(&(b.created_at, b.user_id)));

        Ok(shares
            .into_iter()
            .filter_map(|share| {
                state.users.get(&share.user_id).map(|user| Collaborator {
                    user_id: user.id,
                    email: user.email.clone(),
                    name: user.name.clone(),
                    role: share.role.into(),
                    is_owner: false,
                })
            })
            .collect())
    }

    async fn boards_shared_with(&self, user_id: Uuid) -> StoreResult<Vec<Board>> {
        let state = self.state.lock().await;
        let boards = state
            .shares
            .values()
            .filter(|s| s.user_id == user_id)
            .filter_map(|s| state.boards.get(&s.board_id))
            .filter(|b| b.owner_id != user_id);
        Ok(sorted_boards(boards))
    }
}

#[async_trait]
impl ColumnStore for MemoryStore {
    async fn find_column(&self, id: Uuid) -> StoreResult<Option<Column>> {
        Ok(self.state.lock().await.columns.get(&id).cloned())
    }

    async fn columns_of_board(&self, board_id: Uuid) -> StoreResult<Vec<Column>> {
        let state = self.state.lock().await;
        let mut columns: Vec<Column> = state
            .columns
            .values()
            .filter(|c| c.board_id == board_id)
            .cloned()
            .collect();
        columns.sort_by_key(|c| c.position);
        Ok(columns)
    }

    async fn rename_column(&self, id: Uuid, title: &str) -> StoreResult<Option<Column>> {
        let mut state = self.state.lock().await;
        Ok(state.columns.get_mut(&id).map(|column| {
            column.title = title.to_string();
            column.updated_at = Utc::now();
            column.clone()
        }))
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        Ok(self.state.lock().await.tasks.get(&id).cloned())
    }

    async fn tasks_of_column(&self, column_id: Uuid) -> StoreResult<Vec<Task>> {
        let state = self.state.lock().await;
        let mut tasks: Vec<Task> = state
            .tasks
            .values()
            .filter(|t| t.column_id == column_id)
            .cloned()
            .collect();
        tasks.sort_by_key(|t| t.position);
        Ok(tasks)
    }

    async fn update_task_details(&self, id: Uuid, data: &TaskDetails) -> StoreResult<Option<Task>> {
        let mut state = self.state.lock().await;
        Ok(state.tasks.get_mut(&id).map(|task| {
            if let Some(title) = &data.title {
                task.title = title.clone();
            }
            if let Some(description) = &data.description {
                task.description = description.clone();
            }
            if let Some(due_date) = data.due_date {
                task.due_date = due_date;
            }
            task.updated_at = Utc::now();
            task.clone()
        }))
    }

    async fn set_task_assignee(&self, id: Uuid, assignee: Option<Uuid>) -> StoreResult<Option<Task>> {
        let mut state = self.state.lock().await;
        Ok(state.tasks.get_mut(&id).map(|task| {
            task.assigned_to = assignee;
            task.updated_at = Utc::now();
            task.clone()
        }))
    }
}

#[async_trait]
impl LabelStore for MemoryStore {
    async fn insert_label(&self, data: &NewLabel) -> StoreResult<Label> {
        let label = Label {
            id: Uuid::new_v4(),
            board_id: data.board_id,
            name: data.name.clone(),
            color: data.color.clone(),
            created_at: Utc::now(),
        };
        self.state.lock().await.labels.insert(label.id, label.clone());
        Ok(label)
    }

    async fn find_label(&self, id: Uuid) -> StoreResult<Option<Label>> {
        Ok(self.state.lock().await.labels.get(&id).cloned())
    }

    async fn labels_of_board(&self, board_id: Uuid) -> StoreResult<Vec<Label>> {
        let state = self.state.lock().await;
        let mut labels: Vec<Label> = state
            .labels
            .values()
            .filter(|l| l.board_id == board_id)
            .cloned()
            .collect();
        labels.sort_by(|a, b| (&a.name, a.id).cmp(&(&b.name, b.id)));
        Ok(labels)
    }

    async fn update_label(&self, id: Uuid, data: &UpdateLabel) -> StoreResult<Option<Label>> {
        let mut state = self.state.lock().await;
        Ok(state.labels.get_mut(&id).map(|label| {
            if let Some(name) = &data.name {
                label.name = name.clone();
            }
            if let Some(color) = &data.color {
                label.color = color.clone();
            }
            label.clone()
        }))
    }

    async fn delete_label(&self, id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        state.task_labels.retain(|(_, label)| *label != id);
        Ok(state.labels.remove(&id).is_some())
    }

    async fn attach_label(&self, task_id: Uuid, label_id: Uuid) -> StoreResult<()> {
        self.state.lock().await.task_labels.insert((task_id, label_id));
        Ok(())
    }

    async fn detach_label(&self, task_id: Uuid, label_id: Uuid) -> StoreResult<()> {
        self.state.lock().await.task_labels.remove(&(task_id, label_id));
        Ok(())
    }

    async fn labels_of_tasks(&self, task_ids: &[Uuid]) -> StoreResult<Vec<(Uuid, Label)>> {
        let state = self.state.lock().await;
        let wanted: HashSet<&Uuid> = task_ids.iter().collect();
        let mut pairs: Vec<(Uuid, Label)> = state
            .task_labels
            .iter()
            .filter(|(task, _)| wanted.contains(task))
            .filter_map(|(task, label)| state.labels.get(label).map(|l| (*task, l.clone())))
            .collect();
        pairs.sort_by(|a, b| (&a.1.name, a.1.id).cmp(&(&b.1.name, b.1.id)));
        Ok(pairs)
    }

    async fn tasks_with_label(&self, label_id: Uuid) -> StoreResult<Vec<Task>> {
        let state = self.state.lock().await;
        let mut tasks: Vec<Task> = state
            .task_labels
            .iter()
            .filter(|(_, label)| *label == label_id)
            .filter_map(|(task, _)| state.tasks.get(task).cloned())
            .collect();
        tasks.sort_by_key(|t| (t.column_id, t.position));
        Ok(tasks)
    }
}

#[async_trait]
impl HealthProbe for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

/// Ordered collection management
///
/// Columns within a board and tasks within a column are kept in a dense
/// `0..N-1` ordering. [`Sequencer`] is the only writer of positions. Each
/// structural mutation runs as one store transaction that:
///
/// 1. locks the affected container(s) in ID order
/// 2. re-reads current positions under the lock
/// 3. validates the request against them
/// 4. applies the [`plan`] shifts and writes the item's slot
/// 5. commits, or rolls back entirely on any error
///
/// Transactions that lose a race (serialization failure, deadlock, or a
/// slot collision at commit) are re-run up to the configured retry budget.
///
/// # Example
///
/// ```no_run
/// # use std::sync::Arc;
/// # use taskboard_shared::ordering::{Sequencer, plan::Placement};
/// # use taskboard_shared::store::{memory::MemoryStore, Sequence};
/// # use taskboard_shared::models::column::NewColumn;
/// # async fn example(board_id: uuid::Uuid) -> Result<(), taskboard_shared::error::KanbanError> {
/// let sequencer = Sequencer::new(Arc::new(MemoryStore::new()), 3);
///
/// let todo = sequencer
///     .insert_column(&NewColumn { board_id, title: "Todo".into() }, Placement::Append)
///     .await?;
/// let done = sequencer
///     .insert_column(&NewColumn { board_id, title: "Done".into() }, Placement::At(0))
///     .await?;
///
/// // Put "Done" back at the end
/// sequencer.relocate(Sequence::Columns, done.id, board_id, Placement::Append).await?;
/// # Ok(())
/// # }
/// ```

pub mod plan;

use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use self::plan::{Placement, Slot};
use crate::error::{KanbanError, KanbanResult};
use crate::models::column::{Column, NewColumn};
use crate::models::task::{NewTask, Task};
use crate::retry::with_conflict_retry;
use crate::store::{Sequence, SequenceStore, SequenceTx};

pub struct Sequencer<S: ?Sized> {
    store: Arc<S>,
    max_retries: u32,
}

impl<S: ?Sized> Clone for Sequencer<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            max_retries: self.max_retries,
        }
    }
}

/// Makes room for an insert and returns the position the item takes.
async fn make_room(tx: &mut dyn SequenceTx, seq: Sequence, container_id: Uuid, placement: Placement) -> KanbanResult<i32> {
    let len = tx.len(seq, container_id).await?;
    let position = plan::insertion_point(placement, len)?;
    if let Some(shift) = plan::open_gap(container_id, position, len) {
        tx.shift(seq, shift).await?;
    }
    Ok(position)
}

/// Locks a container after checking it exists.
async fn lock_existing(tx: &mut dyn SequenceTx, seq: Sequence, container_id: Uuid) -> KanbanResult<()> {
    tx.lock_containers(seq, &[container_id]).await?;
    if tx.board_of_container(seq, container_id).await?.is_none() {
        return Err(KanbanError::NotFound(seq.container()));
    }
    Ok(())
}

/// Finds an item and locks its container, re-reading the slot under the
/// lock. An item that changed containers in between is a conflict.
async fn lock_item(tx: &mut dyn SequenceTx, seq: Sequence, item_id: Uuid, also: Option<Uuid>) -> KanbanResult<Slot> {
    let seen = tx
        .slot_of(seq, item_id)
        .await?
        .ok_or(KanbanError::NotFound(seq.item()))?;

    let mut containers = vec![seen.container_id];
    if let Some(other) = also {
        containers.push(other);
    }
    containers.sort();
    containers.dedup();
    tx.lock_containers(seq, &containers).await?;

    let current = tx
        .slot_of(seq, item_id)
        .await?
        .ok_or(KanbanError::NotFound(seq.item()))?;
    if current.container_id != seen.container_id {
        return Err(KanbanError::Conflict(format!("{} {} moved concurrently", seq.item(), item_id)));
    }
    Ok(current)
}

impl<S> Sequencer<S>
where
    S: SequenceStore + ?Sized,
{
    pub fn new(store: Arc<S>, max_retries: u32) -> Self {
        Self { store, max_retries }
    }

    /// Creates a column in its board at `placement`
    pub async fn insert_column(&self, data: &NewColumn, placement: Placement) -> KanbanResult<Column> {
        let column = with_conflict_retry("insert_column", self.max_retries, move || {
            self.try_insert_column(data, placement)
        })
        .await?;

        info!(column_id = %column.id, board_id = %column.board_id, position = column.position, "Column created");
        Ok(column)
    }

    async fn try_insert_column(&self, data: &NewColumn, placement: Placement) -> KanbanResult<Column> {
        let mut tx = self.store.begin().await?;
        lock_existing(tx.as_mut(), Sequence::Columns, data.board_id).await?;
        let position = make_room(tx.as_mut(), Sequence::Columns, data.board_id, placement).await?;
        let column = tx.insert_column(data, position).await?;
        tx.commit().await?;
        Ok(column)
    }

    /// Creates a task in its column at `placement`
    pub async fn insert_task(&self, data: &NewTask, placement: Placement) -> KanbanResult<Task> {
        let task = with_conflict_retry("insert_task", self.max_retries, move || {
            self.try_insert_task(data, placement)
        })
        .await?;

        info!(task_id = %task.id, column_id = %task.column_id, position = task.position, "Task created");
        Ok(task)
    }

    async fn try_insert_task(&self, data: &NewTask, placement: Placement) -> KanbanResult<Task> {
        let mut tx = self.store.begin().await?;
        lock_existing(tx.as_mut(), Sequence::Tasks, data.column_id).await?;
        let position = make_room(tx.as_mut(), Sequence::Tasks, data.column_id, placement).await?;
        let task = tx.insert_task(data, position).await?;
        tx.commit().await?;
        Ok(task)
    }

    /// Deletes an item (with its dependents) and closes the gap it leaves
    ///
    /// Returns the slot the item occupied.
    pub async fn remove(&self, seq: Sequence, item_id: Uuid) -> KanbanResult<Slot> {
        let slot = with_conflict_retry("remove", self.max_retries, move || self.try_remove(seq, item_id)).await?;

        info!(?seq, %item_id, container_id = %slot.container_id, position = slot.position, "Item removed");
        Ok(slot)
    }

    async fn try_remove(&self, seq: Sequence, item_id: Uuid) -> KanbanResult<Slot> {
        let mut tx = self.store.begin().await?;
        let slot = lock_item(tx.as_mut(), seq, item_id, None).await?;
        tx.remove(seq, item_id).await?;
        let shifted = tx.shift(seq, plan::close_gap(slot)).await?;
        tx.commit().await?;

        debug!(?seq, %item_id, shifted, "Closed gap");
        Ok(slot)
    }

    /// Moves an item into `container_id` at `placement`, within its current
    /// container or into another container of the same board
    ///
    /// `Placement::Append` means the last slot of the target container.
    /// Returns the slot the item now occupies.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the item or target container does not exist
    /// - `Validation` if the target is on another board or out of range
    pub async fn relocate(
        &self,
        seq: Sequence,
        item_id: Uuid,
        container_id: Uuid,
        placement: Placement,
    ) -> KanbanResult<Slot> {
        let (from, to) = with_conflict_retry("relocate", self.max_retries, move || {
            self.try_relocate(seq, item_id, container_id, placement)
        })
        .await?;

        info!(
            ?seq,
            %item_id,
            from_container = %from.container_id,
            from_position = from.position,
            to_container = %to.container_id,
            to_position = to.position,
            "Item moved"
        );
        Ok(to)
    }

    async fn try_relocate(
        &self,
        seq: Sequence,
        item_id: Uuid,
        container_id: Uuid,
        placement: Placement,
    ) -> KanbanResult<(Slot, Slot)> {
        let mut tx = self.store.begin().await?;
        let current = lock_item(tx.as_mut(), seq, item_id, Some(container_id)).await?;
        let same_container = current.container_id == container_id;

        if !same_container {
            let source_board = tx.board_of_container(seq, current.container_id).await?;
            let target_board = tx
                .board_of_container(seq, container_id)
                .await?
                .ok_or(KanbanError::NotFound(seq.container()))?;
            if source_board != Some(target_board) {
                return Err(KanbanError::validation(format!(
                    "a {} cannot move to a {} on another board",
                    seq.item(),
                    seq.container()
                )));
            }
        }

        let target_len = tx.len(seq, container_id).await?;
        let position = match placement {
            Placement::At(position) => position,
            Placement::Append if same_container => target_len - 1,
            Placement::Append => target_len,
        };
        let target = Slot::new(container_id, position);
        plan::check_move_target(current, target, target_len)?;

        if current == target {
            return Ok((current, target));
        }

        for shift in plan::relocation(current, target) {
            tx.shift(seq, shift).await?;
        }
        tx.set_slot(seq, item_id, target).await?;
        tx.commit().await?;
        Ok((current, target))
    }

    /// Rewrites every column position of a board in one transaction
    ///
    /// `order` must list each column of the board exactly once with
    /// positions forming a permutation of `0..N-1`.
    pub async fn reorder_columns(&self, board_id: Uuid, order: &[(Uuid, i32)]) -> KanbanResult<()> {
        with_conflict_retry("reorder_columns", self.max_retries, move || {
            self.try_reorder_columns(board_id, order)
        })
        .await?;

        info!(%board_id, columns = order.len(), "Columns reordered");
        Ok(())
    }

    async fn try_reorder_columns(&self, board_id: Uuid, order: &[(Uuid, i32)]) -> KanbanResult<()> {
        let mut tx = self.store.begin().await?;
        lock_existing(tx.as_mut(), Sequence::Columns, board_id).await?;

        let members = tx.members(Sequence::Columns, board_id).await?;
        plan::check_reorder(&members, order)?;

        for (column_id, position) in order {
            tx.set_slot(Sequence::Columns, *column_id, Slot::new(board_id, *position))
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

//! Turn a manual move inside the displayed list into a sort-order batch.

use vibe_tasks_core::{SortEntry, Task};

/// Array-move: remove the item at `old_index` and reinsert it at `new_index`.
///
/// Returns `false` (leaving `items` untouched) when either index is out of range.
pub fn move_item<T>(items: &mut Vec<T>, old_index: usize, new_index: usize) -> bool {
    if old_index >= items.len() || new_index >= items.len() {
        return false;
    }
    let item = items.remove(old_index);
    items.insert(new_index, item);
    true
}

/// Plan the batch that persists moving `displayed[old_index]` to `new_index`.
///
/// Every item of the resulting sequence gets its 0-based position as
/// `sort_order`. Tasks outside `displayed` keep their values, so a move made
/// under an active filter can interleave with hidden tasks.
///
/// Returns `None` when `old_index == new_index` or either index is out of range.
#[must_use]
pub fn plan_move(displayed: &[Task], old_index: usize, new_index: usize) -> Option<Vec<SortEntry>> {
    if old_index == new_index {
        return None;
    }
    let mut order: Vec<&Task> = displayed.iter().collect();
    if !move_item(&mut order, old_index, new_index) {
        return None;
    }
    Some(
        order
            .into_iter()
            .zip(0_i64..)
            .map(|(task, sort_order)| SortEntry {
                id: task.id,
                sort_order,
            })
            .collect(),
    )
}

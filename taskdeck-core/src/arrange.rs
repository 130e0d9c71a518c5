//! Dependency-respecting arrangement of a user's participated tasks.
//!
//! Produces a suggested working order: a task never appears before its
//! predecessor (when the predecessor is part of the same list), and among
//! released tasks the earlier deadline wins, with `cost / (priority rank +
//! 1)` as the tie-breaker so cheap high-priority work surfaces first.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use crate::task::{Task, TaskId};

/// Heap entry ordered so that the most schedulable task pops first:
/// smallest deadline, then smallest weight, then smallest id.
struct HeapEntry {
    deadline: u64,
    weight: u32,
    id: TaskId,
    task: Task,
    finished: bool,
}

impl HeapEntry {
    fn new(task: Task, finished: bool) -> Self {
        Self {
            deadline: task.info.deadline,
            weight: task.info.cost / (task.info.priority.rank() + 1),
            id: task.id,
            task,
            finished,
        }
    }
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.weight == other.weight && self.id == other.id
    }
}

impl Eq for HeapEntry {}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse so the smallest key pops first.
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.weight.cmp(&self.weight))
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Orders `(task, finished)` pairs into a suggested working sequence.
///
/// A predecessor edge is only honored when the predecessor itself is part
/// of the input; tasks depending on something outside the list are treated
/// as roots rather than dropped. The result is a permutation of the input
/// and deterministic for a given input.
#[must_use]
pub fn arrange(list: Vec<(Task, bool)>) -> Vec<(Task, bool)> {
    let in_list: std::collections::HashSet<TaskId> =
        list.iter().map(|(task, _)| task.id).collect();

    let mut dependents: HashMap<TaskId, Vec<TaskId>> = HashMap::new();
    let mut in_degree: HashMap<TaskId, u32> = HashMap::new();
    let mut pending: HashMap<TaskId, (Task, bool)> = HashMap::new();
    let mut heap = BinaryHeap::new();

    for (task, finished) in list {
        match task.predecessor.filter(|prev| in_list.contains(prev)) {
            Some(prev) => {
                dependents.entry(prev).or_default().push(task.id);
                *in_degree.entry(task.id).or_insert(0) += 1;
                pending.insert(task.id, (task, finished));
            }
            None => heap.push(HeapEntry::new(task, finished)),
        }
    }

    let mut ordered = Vec::with_capacity(pending.len() + heap.len());
    while let Some(entry) = heap.pop() {
        if let Some(next_ids) = dependents.get(&entry.id) {
            for next_id in next_ids {
                if let Some(deg) = in_degree.get_mut(next_id) {
                    *deg -= 1;
                    if *deg == 0
                        && let Some((task, finished)) = pending.remove(next_id)
                    {
                        heap.push(HeapEntry::new(task, finished));
                    }
                }
            }
        }
        ordered.push((entry.task, entry.finished));
    }
    ordered
}

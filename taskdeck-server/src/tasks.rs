//! In-memory task store with dependency-safe deletion.
//!
//! Holds every task record together with its description and member
//! groups. The predecessor relation is set once at creation — and only to
//! a task of the same publisher — so the dependency graph is a forest by
//! construction and no cycle detection is ever needed. Deletion refuses to
//! remove a task that other tasks depend on and reports the complete
//! blocking set instead.
//!
//! Mutations take the write lock for their whole read-modify-write
//! sequence; reads run against the latest committed state and may be
//! momentarily stale with respect to concurrent writers.

use std::collections::HashMap;

use tokio::sync::RwLock;

use taskdeck_core::arrange::arrange;
use taskdeck_core::caller::Caller;
use taskdeck_core::task::{Group, GroupId, MAX_TITLE_LENGTH, Task, TaskId, TaskInfo};

use crate::error::EngineError;

/// A stored task: the public entity plus description and group rosters.
///
/// Every task owns at least one group from the moment it is created: the
/// default roster that tracks participants of non-group tasks. Group-kind
/// tasks may grow and shrink additional groups.
#[derive(Debug, Clone)]
pub(crate) struct TaskRecord {
    pub(crate) task: Task,
    pub(crate) description: String,
    pub(crate) groups: Vec<Group>,
}

impl TaskRecord {
    /// Returns the caller's membership as `(group, member index)`.
    pub(crate) fn membership(&self, user: &str) -> Option<(GroupId, bool)> {
        self.groups.iter().find_map(|g| {
            g.member(user).map(|m| (g.id, m.finished))
        })
    }
}

/// Outcome of a delete request.
///
/// A blocked delete is an expected, actionable result rather than a
/// failure: the task is left untouched and the caller receives the full
/// set of tasks that still depend on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The task and everything it owned are gone.
    Deleted,
    /// Deletion refused; these tasks still name it as predecessor.
    Blocked(Vec<Task>),
}

/// Returns true when the caller may mutate a task published by `publisher`.
pub(crate) fn can_manage(caller: &Caller, publisher: &str) -> bool {
    caller.is(publisher) || caller.capabilities.manage_all_tasks()
}

fn validate_info(info: &TaskInfo) -> Result<(), EngineError> {
    if info.title.is_empty() {
        return Err(EngineError::TitleEmpty);
    }
    if info.title.chars().count() > MAX_TITLE_LENGTH {
        return Err(EngineError::TitleTooLong);
    }
    if info.cost == 0 {
        return Err(EngineError::CostZero);
    }
    if info.deadline == 0 {
        return Err(EngineError::DeadlineInvalid);
    }
    Ok(())
}

/// Thread-safe task registry.
pub struct TaskStore {
    pub(crate) records: RwLock<HashMap<TaskId, TaskRecord>>,
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskStore {
    /// Creates a new, empty task store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Publishes a new task and returns its id.
    ///
    /// The predecessor, when given, must be an existing task of the same
    /// publisher — the picker only ever offers the caller's own tasks, and
    /// the store re-checks it here. The record starts with its default
    /// roster group.
    ///
    /// # Errors
    ///
    /// `Validation` failures for malformed info or a bad predecessor
    /// reference.
    pub async fn create(
        &self,
        caller: &Caller,
        info: TaskInfo,
        predecessor: Option<TaskId>,
        description: String,
    ) -> Result<TaskId, EngineError> {
        validate_info(&info)?;

        let mut records = self.records.write().await;
        if let Some(prev) = predecessor {
            let prev_record = records.get(&prev).ok_or(EngineError::PredecessorMissing)?;
            if prev_record.task.publisher != caller.user {
                return Err(EngineError::PredecessorNotOwned);
            }
        }

        let task = Task {
            id: TaskId::new(),
            info,
            publisher: caller.user.clone(),
            predecessor,
        };
        let id = task.id;
        records.insert(
            id,
            TaskRecord {
                task,
                description,
                groups: vec![Group::new()],
            },
        );
        drop(records);

        tracing::info!(task_id = %id, publisher = %caller.user, "task created");
        Ok(id)
    }

    /// Replaces a task's info and description.
    ///
    /// The kind is immutable: submitting a different kind is rejected
    /// rather than silently ignored.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown task, `Permission` when the caller is
    /// neither publisher nor manager, `Validation` for malformed info or a
    /// kind change.
    pub async fn update(
        &self,
        caller: &Caller,
        id: TaskId,
        info: TaskInfo,
        description: String,
    ) -> Result<(), EngineError> {
        validate_info(&info)?;

        let mut records = self.records.write().await;
        let record = records.get_mut(&id).ok_or(EngineError::TaskNotFound)?;
        if !can_manage(caller, &record.task.publisher) {
            return Err(EngineError::NotTaskManager);
        }
        if info.kind != record.task.info.kind {
            return Err(EngineError::KindImmutable);
        }
        record.task.info = info;
        record.description = description;
        drop(records);

        tracing::debug!(task_id = %id, "task updated");
        Ok(())
    }

    /// Deletes a task unless other tasks depend on it.
    ///
    /// The dependency check and the removal happen under one write guard,
    /// so a concurrent create naming this task as predecessor can never
    /// slip between them. Groups die with the record; the caller is
    /// responsible for purging owned resources afterwards.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown task, `Permission` when the caller is
    /// neither publisher nor manager.
    pub async fn delete(&self, caller: &Caller, id: TaskId) -> Result<DeleteOutcome, EngineError> {
        let mut records = self.records.write().await;
        let record = records.get(&id).ok_or(EngineError::TaskNotFound)?;
        if !can_manage(caller, &record.task.publisher) {
            return Err(EngineError::NotTaskManager);
        }

        let mut dependents: Vec<Task> = records
            .values()
            .filter(|r| r.task.predecessor == Some(id))
            .map(|r| r.task.clone())
            .collect();
        if !dependents.is_empty() {
            dependents.sort_by_key(|t| t.id);
            return Ok(DeleteOutcome::Blocked(dependents));
        }

        records.remove(&id);
        drop(records);

        tracing::info!(task_id = %id, "task deleted");
        Ok(DeleteOutcome::Deleted)
    }

    /// Marks the task finished for the calling participant.
    ///
    /// `now` is the current instant in milliseconds since epoch.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown task; `State` when the caller is not a
    /// participant, has already finished, the deadline has passed, or the
    /// caller's predecessor participation is still unfinished.
    pub async fn finish(&self, caller: &Caller, id: TaskId, now: u64) -> Result<(), EngineError> {
        let mut records = self.records.write().await;
        let record = records.get(&id).ok_or(EngineError::TaskNotFound)?;

        let (group_id, finished) = record
            .membership(&caller.user)
            .ok_or(EngineError::NotJoined)?;
        if finished {
            return Err(EngineError::AlreadyFinished);
        }
        if record.task.info.deadline <= now {
            return Err(EngineError::TaskExpired);
        }
        if let Some(prev) = record.task.predecessor
            && let Some(prev_record) = records.get(&prev)
            && let Some((_, prev_finished)) = prev_record.membership(&caller.user)
            && !prev_finished
        {
            return Err(EngineError::PredecessorUnfinished);
        }

        // Membership was established above; re-borrow mutably to flip it.
        if let Some(record) = records.get_mut(&id)
            && let Some(group) = record.groups.iter_mut().find(|g| g.id == group_id)
            && let Some(member) = group.members.iter_mut().find(|m| m.user == caller.user)
        {
            member.finished = true;
        }
        drop(records);

        tracing::info!(task_id = %id, user = %caller.user, "task finished");
        Ok(())
    }

    /// Returns the task entity, if present.
    pub async fn get(&self, id: TaskId) -> Option<Task> {
        let records = self.records.read().await;
        records.get(&id).map(|r| r.task.clone())
    }

    /// Returns a task's description.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown task.
    pub async fn description(&self, id: TaskId) -> Result<String, EngineError> {
        let records = self.records.read().await;
        records
            .get(&id)
            .map(|r| r.description.clone())
            .ok_or(EngineError::TaskNotFound)
    }

    /// Returns a task's groups in creation order.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown task.
    pub async fn groups(&self, id: TaskId) -> Result<Vec<Group>, EngineError> {
        let records = self.records.read().await;
        records
            .get(&id)
            .map(|r| r.groups.clone())
            .ok_or(EngineError::TaskNotFound)
    }

    /// Returns the user's `(group id, finished)` state on a task, or `None`
    /// when the task is unknown or the user does not participate.
    pub async fn participation(&self, id: TaskId, user: &str) -> Option<(GroupId, bool)> {
        let records = self.records.read().await;
        records.get(&id).and_then(|r| r.membership(user))
    }

    /// Lists tasks created by the caller — or every task for a holder of
    /// `manage_all_tasks` — in creation order.
    pub async fn list_created(&self, caller: &Caller) -> Vec<Task> {
        let records = self.records.read().await;
        let mut tasks: Vec<Task> = records
            .values()
            .filter(|r| caller.capabilities.manage_all_tasks() || r.task.publisher == caller.user)
            .map(|r| r.task.clone())
            .collect();
        drop(records);
        tasks.sort_by_key(|t| t.id);
        tasks
    }

    /// Lists `(task, finished)` pairs the user participates in, in the
    /// dependency-respecting arrangement order.
    pub async fn list_participated(&self, user: &str) -> Vec<(Task, bool)> {
        let records = self.records.read().await;
        let participated: Vec<(Task, bool)> = records
            .values()
            .filter_map(|r| {
                r.membership(user)
                    .map(|(_, finished)| (r.task.clone(), finished))
            })
            .collect();
        drop(records);
        arrange(participated)
    }
}

//! Group assignment operations on the task store.
//!
//! Groups fan a single task out to independently tracked sub-teams. A user
//! belongs to at most one group per task; membership is additionally
//! coupled to the dependency graph — joining a task requires already
//! participating in its predecessor, and leaving one is refused while the
//! user participates in a dependent.
//!
//! All mutations require the task's publisher or the `manage_all_tasks`
//! capability; touching a user other than yourself also requires
//! `assign_tasks`.

use taskdeck_core::caller::Caller;
use taskdeck_core::task::{Group, GroupId, GroupMember, TaskId, TaskKind};

use crate::error::EngineError;
use crate::tasks::{TaskStore, can_manage};

impl TaskStore {
    /// Creates an empty group on a group-kind task and returns its id.
    ///
    /// Group ids are generated and never reused within the task's
    /// lifetime, so a stale id can never alias a later group.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown task, `State` for a non-group task,
    /// `Permission` when the caller may not manage the task.
    pub async fn create_group(&self, caller: &Caller, task_id: TaskId) -> Result<GroupId, EngineError> {
        let mut records = self.records.write().await;
        let record = records.get_mut(&task_id).ok_or(EngineError::TaskNotFound)?;
        if record.task.info.kind != TaskKind::Group {
            return Err(EngineError::NotGroupTask);
        }
        if !can_manage(caller, &record.task.publisher) {
            return Err(EngineError::NotTaskManager);
        }

        let group = Group::new();
        let group_id = group.id;
        record.groups.push(group);
        drop(records);

        tracing::info!(task_id = %task_id, group_id = %group_id, "group created");
        Ok(group_id)
    }

    /// Deletes a group, dropping all of its members' assignment to the task.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown task or group, `State` for a non-group
    /// task, `Permission` when the caller may not manage the task.
    pub async fn delete_group(
        &self,
        caller: &Caller,
        task_id: TaskId,
        group_id: GroupId,
    ) -> Result<(), EngineError> {
        let mut records = self.records.write().await;
        let record = records.get_mut(&task_id).ok_or(EngineError::TaskNotFound)?;
        if record.task.info.kind != TaskKind::Group {
            return Err(EngineError::NotGroupTask);
        }
        if !can_manage(caller, &record.task.publisher) {
            return Err(EngineError::NotTaskManager);
        }
        let idx = record
            .groups
            .iter()
            .position(|g| g.id == group_id)
            .ok_or(EngineError::GroupNotFound)?;
        record.groups.remove(idx);
        drop(records);

        tracing::info!(task_id = %task_id, group_id = %group_id, "group deleted");
        Ok(())
    }

    /// Adds a user to a group, starting unfinished.
    ///
    /// # Errors
    ///
    /// `Permission` failures for a non-manager caller or a missing
    /// `assign_tasks` capability when adding someone else; `Conflict` when
    /// the user already belongs to any group on this task; `State` when
    /// the user has not joined the task's still-existing predecessor.
    pub async fn add_member(
        &self,
        caller: &Caller,
        task_id: TaskId,
        group_id: GroupId,
        user: &str,
    ) -> Result<(), EngineError> {
        let mut records = self.records.write().await;
        let record = records.get(&task_id).ok_or(EngineError::TaskNotFound)?;
        if !can_manage(caller, &record.task.publisher) {
            return Err(EngineError::NotTaskManager);
        }
        if !caller.is(user) && !caller.capabilities.assign_tasks() {
            return Err(EngineError::AssignRequired);
        }
        if !record.groups.iter().any(|g| g.id == group_id) {
            return Err(EngineError::GroupNotFound);
        }
        if record.membership(user).is_some() {
            return Err(EngineError::AlreadyMember);
        }
        if let Some(prev) = record.task.predecessor
            && let Some(prev_record) = records.get(&prev)
            && prev_record.membership(user).is_none()
        {
            return Err(EngineError::PredecessorNotJoined);
        }

        if let Some(record) = records.get_mut(&task_id)
            && let Some(group) = record.groups.iter_mut().find(|g| g.id == group_id)
        {
            group.members.push(GroupMember {
                user: user.to_string(),
                finished: false,
            });
        }
        drop(records);

        tracing::info!(task_id = %task_id, group_id = %group_id, user = %user, "member added");
        Ok(())
    }

    /// Removes a user from a group.
    ///
    /// # Errors
    ///
    /// `NotFound` when the task, group, or membership is absent;
    /// `Permission` as for [`Self::add_member`]; `State` while the user
    /// participates in a task depending on this one.
    pub async fn remove_member(
        &self,
        caller: &Caller,
        task_id: TaskId,
        group_id: GroupId,
        user: &str,
    ) -> Result<(), EngineError> {
        let mut records = self.records.write().await;
        let record = records.get(&task_id).ok_or(EngineError::TaskNotFound)?;
        if !can_manage(caller, &record.task.publisher) {
            return Err(EngineError::NotTaskManager);
        }
        if !caller.is(user) && !caller.capabilities.assign_tasks() {
            return Err(EngineError::AssignRequired);
        }
        let group = record
            .groups
            .iter()
            .find(|g| g.id == group_id)
            .ok_or(EngineError::GroupNotFound)?;
        if !group.contains(user) {
            return Err(EngineError::MemberNotFound);
        }
        let blocked = records.values().any(|r| {
            r.task.predecessor == Some(task_id) && r.membership(user).is_some()
        });
        if blocked {
            return Err(EngineError::DependentParticipation);
        }

        if let Some(record) = records.get_mut(&task_id)
            && let Some(group) = record.groups.iter_mut().find(|g| g.id == group_id)
        {
            group.members.retain(|m| m.user != user);
        }
        drop(records);

        tracing::info!(task_id = %task_id, group_id = %group_id, user = %user, "member removed");
        Ok(())
    }
}

//! Engine facade: every operation of the request/response boundary.
//!
//! Combines the task store and the resource ledger, performs the
//! authorization decisions (given an already-resolved [`Caller`] — the
//! engine never authenticates), and derives presentation status at read
//! time. The HTTP layer in `api.rs` is a thin adapter over these methods,
//! and tests drive them directly.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use taskdeck_core::caller::Caller;
use taskdeck_core::classify::{Classification, Quadrant, Tier, classify};
use taskdeck_core::resource::{
    Attitude, Comment, CommentId, ResourceId, ResourceKind, ResourceSummary,
};
use taskdeck_core::task::{Group, GroupId, Task, TaskId, TaskInfo, TaskKind};

use crate::error::EngineError;
use crate::resources::ResourceLedger;
use crate::tasks::{DeleteOutcome, TaskStore, can_manage};

/// Returns the current timestamp in milliseconds since epoch.
fn now_ms() -> u64 {
    u64::try_from(
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis(),
    )
    .unwrap_or(u64::MAX)
}

/// Everything a caller sees on a task's detail page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDetail {
    /// The task itself.
    pub task: Task,
    /// Its predecessor, when one is set and still exists.
    pub predecessor: Option<Task>,
    /// Free-text description.
    pub description: String,
    /// Live urgency classification, derived at read time and never stored.
    pub status: Classification,
    /// Resources attached to the task.
    pub resources: Vec<ResourceSummary>,
    /// The caller's own completion flag; `None` for non-participants.
    pub finished: Option<bool>,
    /// The caller's group on a group-kind task, when participating.
    pub my_group: Option<Group>,
    /// Every group roster; publishers and managers only.
    pub all_groups: Option<Vec<Group>>,
}

/// A task the caller participates in, with their completion flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipatedTask {
    pub task: Task,
    pub finished: bool,
}

/// The caller's unfinished, unexpired tasks bucketed by importance and
/// urgency.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuadrantOverview {
    pub important_and_urgent: Vec<Task>,
    pub important_but_not_urgent: Vec<Task>,
    pub urgent_but_not_important: Vec<Task>,
    pub not_important_and_not_urgent: Vec<Task>,
}

/// Everything a caller sees on a resource's detail page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDetail {
    /// Aggregate resource view.
    pub resource: ResourceSummary,
    /// Comments in creation order.
    pub comments: Vec<Comment>,
    /// The caller's own reaction state.
    pub attitude: Attitude,
    /// The owning task.
    pub task: Task,
}

/// The Taskdeck engine: task graph, group assignment, and resources.
pub struct Engine {
    /// Task records, groups, and the dependency relation.
    pub tasks: TaskStore,
    /// Resources, tags, comments, and reactions.
    pub resources: ResourceLedger,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Creates an engine with empty stores.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tasks: TaskStore::new(),
            resources: ResourceLedger::new(),
        }
    }

    // -----------------------------------------------------------------
    // Tasks
    // -----------------------------------------------------------------

    /// Publishes a task. See [`TaskStore::create`].
    ///
    /// # Errors
    ///
    /// Propagates store validation failures.
    pub async fn create_task(
        &self,
        caller: &Caller,
        info: TaskInfo,
        predecessor: Option<TaskId>,
        description: String,
    ) -> Result<TaskId, EngineError> {
        self.tasks.create(caller, info, predecessor, description).await
    }

    /// Updates a task's info and description. See [`TaskStore::update`].
    ///
    /// # Errors
    ///
    /// Propagates store validation and permission failures.
    pub async fn update_task(
        &self,
        caller: &Caller,
        id: TaskId,
        info: TaskInfo,
        description: String,
    ) -> Result<(), EngineError> {
        self.tasks.update(caller, id, info, description).await
    }

    /// Deletes a task, cascading to its resources, comments, and
    /// reactions — unless dependents block it, in which case they are
    /// returned and nothing changes.
    ///
    /// # Errors
    ///
    /// `NotFound` or `Permission` from the store.
    pub async fn delete_task(
        &self,
        caller: &Caller,
        id: TaskId,
    ) -> Result<DeleteOutcome, EngineError> {
        let outcome = self.tasks.delete(caller, id).await?;
        if outcome == DeleteOutcome::Deleted {
            self.resources.purge_task(id).await;
        }
        Ok(outcome)
    }

    /// Marks the task finished for the caller. See [`TaskStore::finish`].
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn finish_task(&self, caller: &Caller, id: TaskId) -> Result<(), EngineError> {
        self.tasks.finish(caller, id, now_ms()).await
    }

    /// Assembles the detail view of a task.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown task; `Permission` when the caller is
    /// neither publisher, manager, nor participant.
    pub async fn task_detail(&self, caller: &Caller, id: TaskId) -> Result<TaskDetail, EngineError> {
        let task = self.tasks.get(id).await.ok_or(EngineError::TaskNotFound)?;
        let participation = self.tasks.participation(id, &caller.user).await;
        let manages = can_manage(caller, &task.publisher);
        if !manages && participation.is_none() {
            return Err(EngineError::TaskNotVisible);
        }

        let predecessor = match task.predecessor {
            Some(prev) => self.tasks.get(prev).await,
            None => None,
        };
        let description = self.tasks.description(id).await?;
        let groups = self.tasks.groups(id).await?;
        let resources = self.resources.list_for_task(id).await;
        let status = classify(task.info.deadline, task.info.priority, now_ms());

        let my_group = if task.info.kind == TaskKind::Group && participation.is_some() {
            groups.iter().find(|g| g.contains(&caller.user)).cloned()
        } else {
            None
        };

        Ok(TaskDetail {
            predecessor,
            description,
            status,
            resources,
            finished: participation.map(|(_, finished)| finished),
            my_group,
            all_groups: manages.then_some(groups),
            task,
        })
    }

    /// Lists tasks the caller created (or all tasks for managers).
    pub async fn list_created(&self, caller: &Caller) -> Vec<Task> {
        self.tasks.list_created(caller).await
    }

    /// Lists tasks the caller participates in, in arrangement order.
    pub async fn list_participated(&self, caller: &Caller) -> Vec<ParticipatedTask> {
        self.tasks
            .list_participated(&caller.user)
            .await
            .into_iter()
            .map(|(task, finished)| ParticipatedTask { task, finished })
            .collect()
    }

    /// Buckets the caller's unfinished, unexpired participated tasks into
    /// the four importance/urgency quadrants.
    pub async fn quadrant_overview(&self, caller: &Caller) -> QuadrantOverview {
        let now = now_ms();
        let mut overview = QuadrantOverview::default();
        for (task, finished) in self.tasks.list_participated(&caller.user).await {
            if finished {
                continue;
            }
            let status = classify(task.info.deadline, task.info.priority, now);
            if status.tier == Tier::Expired {
                continue;
            }
            match status.quadrant {
                Some(Quadrant::ImportantAndUrgent) => overview.important_and_urgent.push(task),
                Some(Quadrant::ImportantButNotUrgent) => {
                    overview.important_but_not_urgent.push(task);
                }
                Some(Quadrant::UrgentButNotImportant) => {
                    overview.urgent_but_not_important.push(task);
                }
                Some(Quadrant::NotImportantAndNotUrgent) => {
                    overview.not_important_and_not_urgent.push(task);
                }
                None => {}
            }
        }
        overview
    }

    // -----------------------------------------------------------------
    // Groups
    // -----------------------------------------------------------------

    /// Creates a group on a group-kind task. See [`TaskStore::create_group`].
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn create_group(&self, caller: &Caller, task_id: TaskId) -> Result<GroupId, EngineError> {
        self.tasks.create_group(caller, task_id).await
    }

    /// Deletes a group. See [`TaskStore::delete_group`].
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn delete_group(
        &self,
        caller: &Caller,
        task_id: TaskId,
        group_id: GroupId,
    ) -> Result<(), EngineError> {
        self.tasks.delete_group(caller, task_id, group_id).await
    }

    /// Adds a user to a group. See [`TaskStore::add_member`].
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn add_group_member(
        &self,
        caller: &Caller,
        task_id: TaskId,
        group_id: GroupId,
        user: &str,
    ) -> Result<(), EngineError> {
        self.tasks.add_member(caller, task_id, group_id, user).await
    }

    /// Removes a user from a group. See [`TaskStore::remove_member`].
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn remove_group_member(
        &self,
        caller: &Caller,
        task_id: TaskId,
        group_id: GroupId,
        user: &str,
    ) -> Result<(), EngineError> {
        self.tasks.remove_member(caller, task_id, group_id, user).await
    }

    // -----------------------------------------------------------------
    // Resources
    // -----------------------------------------------------------------

    /// Attaches a resource to a task the caller manages.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown task, `Permission` for non-managers.
    pub async fn create_resource(
        &self,
        caller: &Caller,
        task_id: TaskId,
        kind: ResourceKind,
        name: String,
        content: String,
        tags: Vec<String>,
    ) -> Result<ResourceId, EngineError> {
        self.managed_task(caller, task_id).await?;
        Ok(self.resources.add(task_id, kind, name, content, tags).await)
    }

    /// Renames a resource on a task the caller manages.
    ///
    /// # Errors
    ///
    /// `NotFound` or `Permission` as for [`Self::create_resource`].
    pub async fn rename_resource(
        &self,
        caller: &Caller,
        id: ResourceId,
        name: String,
    ) -> Result<(), EngineError> {
        self.managed_owner(caller, id).await?;
        self.resources.rename(id, name).await
    }

    /// Deletes a resource together with its comments and reactions.
    ///
    /// # Errors
    ///
    /// `NotFound` or `Permission` as for [`Self::create_resource`].
    pub async fn delete_resource(&self, caller: &Caller, id: ResourceId) -> Result<(), EngineError> {
        self.managed_owner(caller, id).await?;
        self.resources.remove(id).await
    }

    /// Attaches a tag to a resource the caller manages.
    ///
    /// # Errors
    ///
    /// `Conflict` for a duplicate tag; `NotFound`/`Permission` as above.
    pub async fn add_resource_tag(
        &self,
        caller: &Caller,
        id: ResourceId,
        tag: String,
    ) -> Result<(), EngineError> {
        self.managed_owner(caller, id).await?;
        self.resources.add_tag(id, tag).await
    }

    /// Detaches a tag from a resource the caller manages.
    ///
    /// # Errors
    ///
    /// `NotFound` for a missing tag; `NotFound`/`Permission` as above.
    pub async fn remove_resource_tag(
        &self,
        caller: &Caller,
        id: ResourceId,
        tag: &str,
    ) -> Result<(), EngineError> {
        self.managed_owner(caller, id).await?;
        self.resources.remove_tag(id, tag).await
    }

    /// Assembles the detail view of a resource.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown resource; `Permission` when the caller
    /// neither manages nor participates in the owning task.
    pub async fn resource_detail(
        &self,
        caller: &Caller,
        id: ResourceId,
    ) -> Result<ResourceDetail, EngineError> {
        let task = self.visible_owner(caller, id).await?;
        Ok(ResourceDetail {
            resource: self.resources.summary(id).await?,
            comments: self.resources.comments(id).await?,
            attitude: self.resources.attitude_of(id, &caller.user).await?,
            task,
        })
    }

    /// Sets the caller's reaction toward a resource. Participants of the
    /// owning task only.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown resource, `Permission` for
    /// non-participants.
    pub async fn set_attitude(
        &self,
        caller: &Caller,
        id: ResourceId,
        attitude: Attitude,
    ) -> Result<(), EngineError> {
        let task_id = self.resources.task_of(id).await?;
        if self.tasks.participation(task_id, &caller.user).await.is_none() {
            return Err(EngineError::ReactionNotAllowed);
        }
        self.resources.set_attitude(id, &caller.user, attitude).await?;
        Ok(())
    }

    /// Adds a comment to a resource the caller can see.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown resource; `Permission` when the caller
    /// neither manages nor participates in the owning task.
    pub async fn add_comment(
        &self,
        caller: &Caller,
        id: ResourceId,
        content: String,
    ) -> Result<CommentId, EngineError> {
        self.visible_owner(caller, id).await?;
        self.resources
            .add_comment(id, &caller.user, content, now_ms())
            .await
    }

    /// Deletes a comment. Allowed for the comment author, the owning
    /// task's publisher, and managers.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown comment, `Permission` otherwise.
    pub async fn delete_comment(
        &self,
        caller: &Caller,
        comment_id: CommentId,
    ) -> Result<(), EngineError> {
        let comment = self.resources.comment(comment_id).await?;
        if !caller.is(&comment.user) {
            let task_id = self.resources.task_of(comment.resource_id).await?;
            let task = self.tasks.get(task_id).await.ok_or(EngineError::TaskNotFound)?;
            if !can_manage(caller, &task.publisher) {
                return Err(EngineError::CommentNotDeletable);
            }
        }
        self.resources.remove_comment(comment_id).await
    }

    // -----------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------

    /// The task, provided the caller may manage it.
    async fn managed_task(&self, caller: &Caller, task_id: TaskId) -> Result<Task, EngineError> {
        let task = self.tasks.get(task_id).await.ok_or(EngineError::TaskNotFound)?;
        if !can_manage(caller, &task.publisher) {
            return Err(EngineError::NotTaskManager);
        }
        Ok(task)
    }

    /// The owning task of a resource, provided the caller may manage it.
    async fn managed_owner(&self, caller: &Caller, id: ResourceId) -> Result<Task, EngineError> {
        let task_id = self.resources.task_of(id).await?;
        self.managed_task(caller, task_id).await
    }

    /// The owning task of a resource, provided the caller may see it
    /// (manager, publisher, or participant).
    async fn visible_owner(&self, caller: &Caller, id: ResourceId) -> Result<Task, EngineError> {
        let task_id = self.resources.task_of(id).await?;
        let task = self.tasks.get(task_id).await.ok_or(EngineError::TaskNotFound)?;
        if !can_manage(caller, &task.publisher)
            && self.tasks.participation(task_id, &caller.user).await.is_none()
        {
            return Err(EngineError::TaskNotVisible);
        }
        Ok(task)
    }
}

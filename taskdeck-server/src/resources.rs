//! In-memory resource ledger: attachments, tags, comments, reactions.
//!
//! Each resource is owned by exactly one task and carries case-sensitive
//! unique tags, a comment list, and the per-user attitude states with
//! their aggregate counters (maintained in `attitude.rs`). The ledger does
//! not decide permissions — the engine resolves the owning task and checks
//! the caller before calling in.

use std::collections::HashMap;

use tokio::sync::RwLock;

use taskdeck_core::resource::{
    Attitude, Comment, CommentId, ResourceId, ResourceKind, ResourceSummary,
};
use taskdeck_core::task::TaskId;

use crate::error::EngineError;

/// A stored resource with everything hanging off it.
#[derive(Debug, Clone)]
pub(crate) struct ResourceRecord {
    pub(crate) task_id: TaskId,
    pub(crate) kind: ResourceKind,
    pub(crate) name: String,
    pub(crate) content: String,
    pub(crate) tags: Vec<String>,
    pub(crate) comments: Vec<Comment>,
    /// Per-user reaction state; absence means [`Attitude::None`].
    pub(crate) attitudes: HashMap<String, Attitude>,
    pub(crate) up: u32,
    pub(crate) down: u32,
}

impl ResourceRecord {
    #[allow(clippy::cast_possible_truncation)]
    pub(crate) fn summary(&self, id: ResourceId) -> ResourceSummary {
        ResourceSummary {
            id,
            kind: self.kind,
            name: self.name.clone(),
            content: self.content.clone(),
            tags: self.tags.clone(),
            up: self.up,
            down: self.down,
            // Comment lists are small; counts stay well within u32.
            comment_count: self.comments.len() as u32,
        }
    }
}

/// Thread-safe resource registry.
pub struct ResourceLedger {
    pub(crate) records: RwLock<HashMap<ResourceId, ResourceRecord>>,
}

impl Default for ResourceLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceLedger {
    /// Creates a new, empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Attaches a new resource to a task and returns its id.
    ///
    /// Duplicate tags in the request collapse to one, preserving first
    /// occurrence order.
    pub async fn add(
        &self,
        task_id: TaskId,
        kind: ResourceKind,
        name: String,
        content: String,
        tags: Vec<String>,
    ) -> ResourceId {
        let mut unique_tags: Vec<String> = Vec::with_capacity(tags.len());
        for tag in tags {
            if !unique_tags.contains(&tag) {
                unique_tags.push(tag);
            }
        }

        let id = ResourceId::new();
        let mut records = self.records.write().await;
        records.insert(
            id,
            ResourceRecord {
                task_id,
                kind,
                name,
                content,
                tags: unique_tags,
                comments: Vec::new(),
                attitudes: HashMap::new(),
                up: 0,
                down: 0,
            },
        );
        drop(records);

        tracing::info!(resource_id = %id, task_id = %task_id, "resource added");
        id
    }

    /// Renames a resource.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown resource.
    pub async fn rename(&self, id: ResourceId, name: String) -> Result<(), EngineError> {
        let mut records = self.records.write().await;
        let record = records.get_mut(&id).ok_or(EngineError::ResourceNotFound)?;
        record.name = name;
        Ok(())
    }

    /// Removes a resource along with its tags, comments, and reactions.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown resource.
    pub async fn remove(&self, id: ResourceId) -> Result<(), EngineError> {
        let mut records = self.records.write().await;
        records
            .remove(&id)
            .map(|_| ())
            .ok_or(EngineError::ResourceNotFound)?;
        drop(records);

        tracing::info!(resource_id = %id, "resource removed");
        Ok(())
    }

    /// Removes every resource owned by a task. Part of task deletion.
    pub async fn purge_task(&self, task_id: TaskId) {
        let mut records = self.records.write().await;
        records.retain(|_, r| r.task_id != task_id);
    }

    /// Returns the id of the task owning this resource.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown resource.
    pub async fn task_of(&self, id: ResourceId) -> Result<TaskId, EngineError> {
        let records = self.records.read().await;
        records
            .get(&id)
            .map(|r| r.task_id)
            .ok_or(EngineError::ResourceNotFound)
    }

    /// Returns the aggregate view of a resource.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown resource.
    pub async fn summary(&self, id: ResourceId) -> Result<ResourceSummary, EngineError> {
        let records = self.records.read().await;
        records
            .get(&id)
            .map(|r| r.summary(id))
            .ok_or(EngineError::ResourceNotFound)
    }

    /// Lists the resources of a task in creation order.
    pub async fn list_for_task(&self, task_id: TaskId) -> Vec<ResourceSummary> {
        let records = self.records.read().await;
        let mut summaries: Vec<ResourceSummary> = records
            .iter()
            .filter(|(_, r)| r.task_id == task_id)
            .map(|(id, r)| r.summary(*id))
            .collect();
        drop(records);
        summaries.sort_by_key(|s| s.id);
        summaries
    }

    /// Attaches a tag to a resource. Tags are case-sensitive.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown resource, `Conflict` when the tag is
    /// already attached.
    pub async fn add_tag(&self, id: ResourceId, tag: String) -> Result<(), EngineError> {
        let mut records = self.records.write().await;
        let record = records.get_mut(&id).ok_or(EngineError::ResourceNotFound)?;
        if record.tags.contains(&tag) {
            return Err(EngineError::TagExists);
        }
        record.tags.push(tag);
        Ok(())
    }

    /// Detaches a tag from a resource.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown resource or a tag that is not attached.
    pub async fn remove_tag(&self, id: ResourceId, tag: &str) -> Result<(), EngineError> {
        let mut records = self.records.write().await;
        let record = records.get_mut(&id).ok_or(EngineError::ResourceNotFound)?;
        let idx = record
            .tags
            .iter()
            .position(|t| t == tag)
            .ok_or(EngineError::TagNotFound)?;
        record.tags.remove(idx);
        Ok(())
    }

    /// Returns a resource's comments in creation order.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown resource.
    pub async fn comments(&self, id: ResourceId) -> Result<Vec<Comment>, EngineError> {
        let records = self.records.read().await;
        records
            .get(&id)
            .map(|r| r.comments.clone())
            .ok_or(EngineError::ResourceNotFound)
    }

    /// Appends a comment and returns its id.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown resource.
    pub async fn add_comment(
        &self,
        id: ResourceId,
        user: &str,
        content: String,
        now: u64,
    ) -> Result<CommentId, EngineError> {
        let mut records = self.records.write().await;
        let record = records.get_mut(&id).ok_or(EngineError::ResourceNotFound)?;
        let comment = Comment {
            id: CommentId::new(),
            resource_id: id,
            user: user.to_string(),
            content,
            time: now,
        };
        let comment_id = comment.id;
        record.comments.push(comment);
        Ok(comment_id)
    }

    /// Looks up a comment by id.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown comment.
    pub async fn comment(&self, comment_id: CommentId) -> Result<Comment, EngineError> {
        let records = self.records.read().await;
        records
            .values()
            .flat_map(|r| r.comments.iter())
            .find(|c| c.id == comment_id)
            .cloned()
            .ok_or(EngineError::CommentNotFound)
    }

    /// Deletes a comment by id.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown comment.
    pub async fn remove_comment(&self, comment_id: CommentId) -> Result<(), EngineError> {
        let mut records = self.records.write().await;
        for record in records.values_mut() {
            if let Some(idx) = record.comments.iter().position(|c| c.id == comment_id) {
                record.comments.remove(idx);
                return Ok(());
            }
        }
        Err(EngineError::CommentNotFound)
    }
}

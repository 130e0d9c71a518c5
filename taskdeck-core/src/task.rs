//! Task domain types for Taskdeck.
//!
//! A task is published by one user, optionally depends on a single
//! predecessor task of the same publisher, and carries scheduling metadata
//! (priority, cost, deadline) that the classifier and the arrangement
//! algorithm consume. Group-kind tasks fan out to sub-teams of members
//! whose completion is tracked individually.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum allowed task title length in characters.
pub const MAX_TITLE_LENGTH: usize = 256;

/// Unique identifier for a task, based on UUID v7 for time-ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Creates a new time-ordered task identifier (UUID v7).
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `TaskId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID value.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a group within a task (UUID v7, never reused).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupId(Uuid);

impl GroupId {
    /// Creates a new time-ordered group identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `GroupId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID value.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for GroupId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for GroupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Task priority. Ordering matters: `Low < Medium < High`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Can wait.
    Low,
    /// Normal.
    Medium,
    /// Important; drives the quadrant classification.
    High,
}

impl Priority {
    /// Numeric rank (0 = low, 2 = high), used by the arrangement weight.
    #[must_use]
    pub const fn rank(self) -> u32 {
        match self {
            Self::Low => 0,
            Self::Medium => 1,
            Self::High => 2,
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

/// The category of a task. Immutable after creation.
///
/// Only `Group` tasks may have additional member groups created or deleted;
/// every other kind keeps a single implicit roster of participants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Homework,
    Review,
    Discussion,
    Extra,
    Group,
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Homework => write!(f, "homework"),
            Self::Review => write!(f, "review"),
            Self::Discussion => write!(f, "discussion"),
            Self::Extra => write!(f, "extra"),
            Self::Group => write!(f, "group"),
        }
    }
}

/// User-editable task metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskInfo {
    /// Task title (non-empty, at most [`MAX_TITLE_LENGTH`] characters).
    pub title: String,
    /// Task category. Immutable after creation.
    pub kind: TaskKind,
    /// Priority bucket.
    pub priority: Priority,
    /// Estimated cost in minutes (at least 1).
    pub cost: u32,
    /// Deadline in milliseconds since epoch.
    pub deadline: u64,
}

/// A published task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Unique task identifier.
    pub id: TaskId,
    /// Editable metadata.
    pub info: TaskInfo,
    /// User id of the publisher. Immutable after creation.
    pub publisher: String,
    /// The task this one depends on, if any. Set once at creation and
    /// never reassigned, which keeps the dependency relation a forest.
    pub predecessor: Option<TaskId>,
}

/// A member of a task group together with their completion flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMember {
    /// User id of the member.
    pub user: String,
    /// Whether this member has finished the task.
    pub finished: bool,
}

/// A sub-team assigned to a task. Members are insertion-ordered and unique
/// within the group; the store additionally enforces uniqueness across all
/// groups of the same task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Identifier unique within the owning task's lifetime.
    pub id: GroupId,
    /// Ordered member roster.
    pub members: Vec<GroupMember>,
}

impl Group {
    /// Creates an empty group with a fresh identifier.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: GroupId::new(),
            members: Vec::new(),
        }
    }

    /// Returns the member entry for `user`, if present.
    #[must_use]
    pub fn member(&self, user: &str) -> Option<&GroupMember> {
        self.members.iter().find(|m| m.user == user)
    }

    /// Returns true when `user` belongs to this group.
    #[must_use]
    pub fn contains(&self, user: &str) -> bool {
        self.member(user).is_some()
    }
}

impl Default for Group {
    fn default() -> Self {
        Self::new()
    }
}

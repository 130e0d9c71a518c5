//! Engine error taxonomy.
//!
//! Every failure carries a specific variant with a fixed message and maps
//! onto one of five kinds the HTTP layer translates to status codes.
//! Errors are always propagated to the caller immediately; nothing is
//! retried or swallowed inside the engine. A delete blocked by dependents
//! is deliberately *not* an error — see [`crate::tasks::DeleteOutcome`].

use serde::Serialize;

/// Coarse classification of an [`EngineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed or out-of-range input.
    Validation,
    /// Caller lacks the required ownership or capability.
    Permission,
    /// Referenced task, group, member, resource, or comment is absent.
    NotFound,
    /// The request contradicts existing state the caller can resolve.
    Conflict,
    /// The operation is invalid for the entity's current state.
    State,
}

/// Errors produced by engine operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EngineError {
    /// Task title is empty.
    #[error("task title must not be empty")]
    TitleEmpty,
    /// Task title exceeds the maximum length.
    #[error("task title exceeds {} characters", taskdeck_core::task::MAX_TITLE_LENGTH)]
    TitleTooLong,
    /// Task cost must be a positive number of minutes.
    #[error("task cost must be at least one minute")]
    CostZero,
    /// Deadline is not a valid instant.
    #[error("task deadline is not a valid instant")]
    DeadlineInvalid,
    /// The referenced predecessor task does not exist.
    #[error("predecessor task does not exist")]
    PredecessorMissing,
    /// A task may only depend on a task of the same publisher.
    #[error("predecessor task belongs to a different publisher")]
    PredecessorNotOwned,
    /// The task kind cannot change after creation.
    #[error("task kind is immutable after creation")]
    KindImmutable,

    /// Caller is neither the publisher nor a holder of `manage_all_tasks`.
    #[error("caller is neither the task's publisher nor a task manager")]
    NotTaskManager,
    /// Assigning users other than yourself requires `assign_tasks`.
    #[error("assigning other users requires the assign_tasks capability")]
    AssignRequired,
    /// Caller may not view this task.
    #[error("task is not visible to the caller")]
    TaskNotVisible,
    /// Only participants of the owning task may react to a resource.
    #[error("only participants of the owning task may react")]
    ReactionNotAllowed,
    /// Only the author, the task publisher, or a manager may delete a comment.
    #[error("caller may not delete this comment")]
    CommentNotDeletable,

    /// The referenced task does not exist.
    #[error("task not found")]
    TaskNotFound,
    /// The referenced group does not exist on this task.
    #[error("group not found")]
    GroupNotFound,
    /// The user is not a member of the referenced group.
    #[error("user is not a member of this group")]
    MemberNotFound,
    /// The referenced resource does not exist.
    #[error("resource not found")]
    ResourceNotFound,
    /// The referenced comment does not exist.
    #[error("comment not found")]
    CommentNotFound,
    /// The referenced tag is not attached to the resource.
    #[error("tag not found")]
    TagNotFound,

    /// The user already belongs to a group on this task.
    #[error("user already belongs to a group on this task")]
    AlreadyMember,
    /// The tag is already attached to the resource.
    #[error("tag already exists on this resource")]
    TagExists,

    /// Groups can only be managed on group-kind tasks.
    #[error("task is not a group task")]
    NotGroupTask,
    /// The caller does not participate in the task.
    #[error("caller has not joined this task")]
    NotJoined,
    /// The caller has already finished the task.
    #[error("task is already finished")]
    AlreadyFinished,
    /// The task deadline has passed.
    #[error("task deadline has passed")]
    TaskExpired,
    /// The user must join the predecessor task first.
    #[error("user does not participate in the predecessor task")]
    PredecessorNotJoined,
    /// The caller must finish the predecessor task first.
    #[error("predecessor task is not finished yet")]
    PredecessorUnfinished,
    /// The user still participates in a task depending on this one.
    #[error("user participates in a task depending on this one")]
    DependentParticipation,
}

impl EngineError {
    /// The taxonomy bucket this error belongs to.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::TitleEmpty
            | Self::TitleTooLong
            | Self::CostZero
            | Self::DeadlineInvalid
            | Self::PredecessorMissing
            | Self::PredecessorNotOwned
            | Self::KindImmutable => ErrorKind::Validation,
            Self::NotTaskManager
            | Self::AssignRequired
            | Self::TaskNotVisible
            | Self::ReactionNotAllowed
            | Self::CommentNotDeletable => ErrorKind::Permission,
            Self::TaskNotFound
            | Self::GroupNotFound
            | Self::MemberNotFound
            | Self::ResourceNotFound
            | Self::CommentNotFound
            | Self::TagNotFound => ErrorKind::NotFound,
            Self::AlreadyMember | Self::TagExists => ErrorKind::Conflict,
            Self::NotGroupTask
            | Self::NotJoined
            | Self::AlreadyFinished
            | Self::TaskExpired
            | Self::PredecessorNotJoined
            | Self::PredecessorUnfinished
            | Self::DependentParticipation => ErrorKind::State,
        }
    }
}

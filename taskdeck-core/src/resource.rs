//! Resource and comment types.
//!
//! A resource is an attachment (file key or link) owned by exactly one
//! task. Users react to resources with a tri-state attitude; the engine
//! keeps the aggregate up/down counters consistent with the per-user
//! states.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a resource (UUID v7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceId(Uuid);

impl ResourceId {
    /// Creates a new time-ordered resource identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `ResourceId` from an existing UUID.
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

impl Default for ResourceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a comment (UUID v7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CommentId(Uuid);

impl CommentId {
    /// Creates a new time-ordered comment identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `CommentId` from an existing UUID.
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

impl Default for CommentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CommentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a resource points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// An uploaded file; `content` holds the storage key.
    File,
    /// An external link; `content` holds the URL.
    Link,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File => write!(f, "file"),
            Self::Link => write!(f, "link"),
        }
    }
}

/// A user's reaction state toward a resource.
///
/// `None` is the default/absence state; at most one of `Up`/`Down` is ever
/// attributed to a user at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Attitude {
    Up,
    Down,
    #[default]
    None,
}

impl std::fmt::Display for Attitude {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Up => write!(f, "up"),
            Self::Down => write!(f, "down"),
            Self::None => write!(f, "none"),
        }
    }
}

/// Aggregate view of a resource, as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSummary {
    /// Unique resource identifier.
    pub id: ResourceId,
    /// File or link.
    pub kind: ResourceKind,
    /// Display name.
    pub name: String,
    /// Storage key or URL, depending on `kind`.
    pub content: String,
    /// Case-sensitive tags, unique per resource, insertion-ordered.
    pub tags: Vec<String>,
    /// Number of users currently reacting `up`.
    pub up: u32,
    /// Number of users currently reacting `down`.
    pub down: u32,
    /// Number of comments attached to the resource.
    pub comment_count: u32,
}

/// A comment on a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Unique comment identifier.
    pub id: CommentId,
    /// The resource this comment belongs to.
    pub resource_id: ResourceId,
    /// User id of the author.
    pub user: String,
    /// Comment body.
    pub content: String,
    /// Creation time in milliseconds since epoch.
    pub time: u64,
}

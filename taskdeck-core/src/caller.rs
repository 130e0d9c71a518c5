//! Caller identity and capabilities.
//!
//! The engine never authenticates anyone. An external collaborator resolves
//! the request to a user id and a capability set, and every operation takes
//! the resulting [`Caller`] explicitly — there is no ambient session state.

use serde::{Deserialize, Serialize};

/// A named permission granted to a user by the external authorization
/// collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// May mutate and inspect every task, not just own publications.
    ManageAllTasks,
    /// May add or remove users other than themself to/from task groups.
    AssignTasks,
}

impl Capability {
    /// Parses a capability from its wire name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "manage_all_tasks" => Some(Self::ManageAllTasks),
            "assign_tasks" => Some(Self::AssignTasks),
            _ => None,
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ManageAllTasks => write!(f, "manage_all_tasks"),
            Self::AssignTasks => write!(f, "assign_tasks"),
        }
    }
}

/// The set of capabilities attached to a caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitySet(Vec<Capability>);

impl CapabilitySet {
    /// Creates an empty capability set.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Parses a comma-separated capability list, ignoring unknown names
    /// and surrounding whitespace.
    #[must_use]
    pub fn parse(list: &str) -> Self {
        let mut caps = Vec::new();
        for name in list.split(',') {
            if let Some(cap) = Capability::parse(name.trim())
                && !caps.contains(&cap)
            {
                caps.push(cap);
            }
        }
        Self(caps)
    }

    /// Returns true when the set contains `cap`.
    #[must_use]
    pub fn contains(&self, cap: Capability) -> bool {
        self.0.contains(&cap)
    }

    /// Whether the holder may manage every task.
    #[must_use]
    pub fn manage_all_tasks(&self) -> bool {
        self.contains(Capability::ManageAllTasks)
    }

    /// Whether the holder may assign tasks to other users.
    #[must_use]
    pub fn assign_tasks(&self) -> bool {
        self.contains(Capability::AssignTasks)
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        let mut caps = Vec::new();
        for cap in iter {
            if !caps.contains(&cap) {
                caps.push(cap);
            }
        }
        Self(caps)
    }
}

/// An authenticated caller: resolved identity plus granted capabilities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    /// User id resolved by the external authentication collaborator.
    pub user: String,
    /// Capabilities granted to this user.
    pub capabilities: CapabilitySet,
}

impl Caller {
    /// Creates a caller with no capabilities.
    #[must_use]
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            capabilities: CapabilitySet::new(),
        }
    }

    /// Creates a caller with the given capabilities.
    #[must_use]
    pub fn with_capabilities(
        user: impl Into<String>,
        caps: impl IntoIterator<Item = Capability>,
    ) -> Self {
        Self {
            user: user.into(),
            capabilities: caps.into_iter().collect(),
        }
    }

    /// Returns true when the caller is the given user.
    #[must_use]
    pub fn is(&self, user: &str) -> bool {
        self.user == user
    }
}

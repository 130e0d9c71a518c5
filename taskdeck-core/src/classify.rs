//! Deadline classification.
//!
//! Maps a task's deadline and priority to an urgency tier and an
//! importance/urgency quadrant for presentation. Pure and cheap: callers
//! re-derive the classification on every read (e.g. once per second for a
//! live countdown); nothing here is ever persisted.

use serde::{Deserialize, Serialize};

use crate::task::Priority;

/// Remaining time at or below which a task is `Red` (3 hours).
pub const RED_LIMIT_MS: u64 = 1000 * 60 * 60 * 3;
/// Remaining time at or below which a task is `Orange` (1 day).
pub const ORANGE_LIMIT_MS: u64 = 1000 * 60 * 60 * 24;
/// Remaining time at or below which a task is `Lime` (3 days).
pub const LIME_LIMIT_MS: u64 = 1000 * 60 * 60 * 24 * 3;

/// Deadline-proximity bucket, most urgent first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// The deadline has passed.
    Expired,
    /// Due within 3 hours.
    Red,
    /// Due within 24 hours.
    Orange,
    /// Due within 72 hours.
    Lime,
    /// More than 72 hours remain.
    Green,
}

impl Tier {
    /// Whether this tier counts as urgent for quadrant classification.
    #[must_use]
    pub const fn is_urgent(self) -> bool {
        matches!(self, Self::Red | Self::Orange)
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Expired => write!(f, "expired"),
            Self::Red => write!(f, "red"),
            Self::Orange => write!(f, "orange"),
            Self::Lime => write!(f, "lime"),
            Self::Green => write!(f, "green"),
        }
    }
}

/// Importance x urgency bucket for active tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quadrant {
    ImportantAndUrgent,
    ImportantButNotUrgent,
    UrgentButNotImportant,
    NotImportantAndNotUrgent,
}

impl Quadrant {
    /// All quadrants in display order.
    pub const ALL: [Self; 4] = [
        Self::ImportantAndUrgent,
        Self::ImportantButNotUrgent,
        Self::UrgentButNotImportant,
        Self::NotImportantAndNotUrgent,
    ];

    const fn from_flags(important: bool, urgent: bool) -> Self {
        match (important, urgent) {
            (true, true) => Self::ImportantAndUrgent,
            (true, false) => Self::ImportantButNotUrgent,
            (false, true) => Self::UrgentButNotImportant,
            (false, false) => Self::NotImportantAndNotUrgent,
        }
    }
}

/// Derived presentation status of a task at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    /// Deadline-proximity tier.
    pub tier: Tier,
    /// Importance x urgency bucket; `None` once the task is expired.
    pub quadrant: Option<Quadrant>,
}

/// Returns the urgency tier for a deadline as seen at `now`.
///
/// Both values are milliseconds since epoch. Thresholds are evaluated in
/// order against `remaining = deadline - now`.
#[must_use]
pub const fn tier(deadline: u64, now: u64) -> Tier {
    if deadline <= now {
        return Tier::Expired;
    }
    let remaining = deadline - now;
    if remaining <= RED_LIMIT_MS {
        Tier::Red
    } else if remaining <= ORANGE_LIMIT_MS {
        Tier::Orange
    } else if remaining <= LIME_LIMIT_MS {
        Tier::Lime
    } else {
        Tier::Green
    }
}

/// Classifies a deadline and priority into a tier and quadrant at `now`.
///
/// The quadrant is only meaningful for unexpired tasks; expired tasks get
/// `quadrant = None`. Whether a task is additionally excluded because the
/// caller already finished it is the reader's concern.
#[must_use]
pub const fn classify(deadline: u64, priority: Priority, now: u64) -> Classification {
    let tier = tier(deadline, now);
    let quadrant = match tier {
        Tier::Expired => None,
        _ => Some(Quadrant::from_flags(
            matches!(priority, Priority::High),
            tier.is_urgent(),
        )),
    };
    Classification { tier, quadrant }
}

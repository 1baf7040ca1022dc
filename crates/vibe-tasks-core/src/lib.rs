//! Domain types & filter predicates for vibe-tasks.

/// Filter criteria and the per-field predicate engine.
pub mod filter;
/// Identifier types.
pub mod id;
/// Case-insensitive free-text search.
pub mod text_matcher;

pub use filter::{ALL_SENTINELS, DeadlineWindow, FilterCriteria, ParseDeadlineWindowError, Selection, is_all_sentinel};
pub use text_matcher::TextMatcher;

use crate::id::TaskId;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use time::OffsetDateTime;

/// Category assigned by a store when a task is created without one.
pub const DEFAULT_CATEGORY: &str = "日常";

fn default_category() -> String {
    DEFAULT_CATEGORY.to_owned()
}

/// Urgency ordinal of a task (`1` = low, `2` = medium, `3` = high).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    /// Ordinary task.
    #[default]
    Low = 1,
    /// Important task.
    Medium = 2,
    /// Urgent task.
    High = 3,
}

impl Priority {
    /// All priorities in ascending order.
    pub const ALL: [Self; 3] = [Self::Low, Self::Medium, Self::High];

    /// Wire representation of the priority.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Map a wire ordinal back to a priority.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Low),
            2 => Some(Self::Medium),
            3 => Some(Self::High),
            _ => None,
        }
    }

    /// Short human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "普通",
            Self::Medium => "重要",
            Self::High => "紧急",
        }
    }
}

/// Error raised when a priority token cannot be understood.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid priority: {token} (expected 1, 2 or 3)")]
pub struct ParsePriorityError {
    /// Offending input.
    pub token: String,
}

impl FromStr for Priority {
    type Err = ParsePriorityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1" | "low" | "普通" => Ok(Self::Low),
            "2" | "medium" | "重要" => Ok(Self::Medium),
            "3" | "high" | "紧急" => Ok(Self::High),
            _ => Err(ParsePriorityError { token: s.to_owned() }),
        }
    }
}

impl TryFrom<u8> for Priority {
    type Error = ParsePriorityError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_u8(value).ok_or_else(|| ParsePriorityError {
            token: value.to_string(),
        })
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

impl Serialize for Priority {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.serialize_u8(self.as_u8())
    }
}

impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D>(d: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = u8::deserialize(d)?;
        Self::try_from(raw).map_err(serde::de::Error::custom)
    }
}

/// Task as last reported by the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Server-assigned identifier.
    pub id: TaskId,
    /// Non-empty task text.
    pub content: String,
    /// Completion flag.
    #[serde(default)]
    pub is_done: bool,
    /// Category label.
    #[serde(default = "default_category")]
    pub category: String,
    /// Urgency ordinal.
    #[serde(default)]
    pub priority: Priority,
    /// Optional due timestamp.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub deadline: Option<OffsetDateTime>,
    /// Display rank; ties are broken by id.
    #[serde(default)]
    pub sort_order: i64,
}

impl Task {
    /// Total display ordering: `sort_order` ascending, then id.
    #[must_use]
    pub fn display_cmp(&self, other: &Self) -> Ordering {
        self.sort_order
            .cmp(&other.sort_order)
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// Fields accepted by a create call. Unset fields are defaulted by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTask {
    /// Task text.
    pub content: String,
    /// Requested category.
    pub category: Option<String>,
    /// Requested priority.
    pub priority: Option<Priority>,
    /// Requested deadline.
    pub deadline: Option<OffsetDateTime>,
}

impl NewTask {
    /// Start a create payload from its content.
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    /// Set the category.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Set the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Set the deadline.
    #[must_use]
    pub const fn with_deadline(mut self, deadline: OffsetDateTime) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// Patch for the deadline field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlinePatch {
    /// Overwrite the deadline.
    Set(OffsetDateTime),
    /// Remove the deadline.
    Clear,
}

/// Partial update of a task; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    /// Replace the content.
    pub content: Option<String>,
    /// Replace the completion flag.
    pub is_done: Option<bool>,
    /// Replace the category.
    pub category: Option<String>,
    /// Replace the priority.
    pub priority: Option<Priority>,
    /// Patch the deadline.
    pub deadline: Option<DeadlinePatch>,
}

impl TaskPatch {
    /// Patch that only flips the completion flag.
    #[must_use]
    pub fn done(is_done: bool) -> Self {
        Self {
            is_done: Some(is_done),
            ..Self::default()
        }
    }

    /// Returns true when the patch would not change anything.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.content.is_none()
            && self.is_done.is_none()
            && self.category.is_none()
            && self.priority.is_none()
            && self.deadline.is_none()
    }

    /// Apply every set field to `task`.
    pub fn apply_to(self, task: &mut Task) {
        if let Some(content) = self.content {
            task.content = content;
        }
        if let Some(is_done) = self.is_done {
            task.is_done = is_done;
        }
        if let Some(category) = self.category {
            task.category = category;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        match self.deadline {
            Some(DeadlinePatch::Set(deadline)) => task.deadline = Some(deadline),
            Some(DeadlinePatch::Clear) => task.deadline = None,
            None => {}
        }
    }
}

/// One `{id, sort_order}` pair of a reorder batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortEntry {
    /// Task to move.
    pub id: TaskId,
    /// New display rank.
    pub sort_order: i64,
}

use std::fmt::{self, Display};
use std::str::FromStr;

use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, Time, UtcOffset};
use vibe_tasks_core::{DeadlineWindow, FilterCriteria, Priority, Selection, TextMatcher, is_all_sentinel};

/// Error type returned while constructing filter criteria from user-facing inputs.
#[derive(Debug, Error)]
pub enum FilterBuildError {
    #[error("invalid priority: {token}")]
    InvalidPriority { token: String },
    #[error("invalid deadline window: {token}")]
    InvalidDeadlineWindow { token: String },
    #[error("invalid {field} timestamp: {source}")]
    InvalidTimestamp {
        field: &'static str,
        #[source]
        source: time::error::Parse,
    },
}

/// Result alias for filter construction helpers.
pub type FilterBuildResult<T> = Result<T, FilterBuildError>;

/// Builder that accepts user-facing strings and normalizes them into [`FilterCriteria`].
///
/// Missing, blank and "all" tokens (`all`, `全部`) leave a field unrestricted.
#[derive(Debug, Clone, Default)]
pub struct FilterCriteriaBuilder {
    category: Option<String>,
    priority: Option<Priority>,
    deadline: Option<DeadlineWindow>,
    text: Option<String>,
}

impl FilterCriteriaBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to a category (exact or substring match).
    #[must_use]
    pub fn with_category(mut self, category: Option<String>) -> Self {
        self.category = non_sentinel(category.as_deref()).map(str::to_owned);
        self
    }

    /// Restrict to a priority given as `1`..`3` or its name.
    ///
    /// # Errors
    /// Returns an error if the token is not a known priority.
    pub fn with_priority(mut self, priority: Option<&str>) -> FilterBuildResult<Self> {
        self.priority = non_sentinel(priority)
            .map(|token| {
                Priority::from_str(token).map_err(|_| FilterBuildError::InvalidPriority {
                    token: token.to_owned(),
                })
            })
            .transpose()?;
        Ok(self)
    }

    /// Restrict to a deadline window (`today`, `tomorrow`, `this_week`, `this_month`
    /// or their Chinese names).
    ///
    /// # Errors
    /// Returns an error if the token is not a known window.
    pub fn with_deadline(mut self, window: Option<&str>) -> FilterBuildResult<Self> {
        self.deadline = non_sentinel(window)
            .map(|token| {
                DeadlineWindow::from_str(token).map_err(|_| FilterBuildError::InvalidDeadlineWindow {
                    token: token.to_owned(),
                })
            })
            .transpose()?;
        Ok(self)
    }

    /// Configure the optional search text (whitespace-only inputs become `None`).
    #[must_use]
    pub fn with_text(mut self, text: Option<String>) -> Self {
        self.text = text.and_then(|raw| {
            let trimmed = raw.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        });
        self
    }

    /// Build the final [`FilterCriteria`].
    #[must_use]
    pub fn build(self) -> FilterCriteria {
        FilterCriteria {
            category: self.category.map_or(Selection::All, Selection::Only),
            priority: self.priority.map_or(Selection::All, Selection::Only),
            deadline: self.deadline.map_or(Selection::All, Selection::Only),
            text: self.text.as_deref().and_then(TextMatcher::new),
        }
    }
}

fn non_sentinel(token: Option<&str>) -> Option<&str> {
    token
        .map(str::trim)
        .filter(|token| !token.is_empty() && !is_all_sentinel(token))
}

/// Parse a deadline given as RFC3339 or as a `YYYY-MM-DD` date.
///
/// A bare date means the start of that day at `offset`.
///
/// # Errors
/// Returns an error if the input matches neither format.
pub fn parse_deadline(input: &str, offset: UtcOffset) -> FilterBuildResult<OffsetDateTime> {
    let trimmed = input.trim();
    if let Ok(parsed) = OffsetDateTime::parse(trimmed, &Rfc3339) {
        return Ok(parsed);
    }
    let date = Date::parse(trimmed, format_description!("[year]-[month]-[day]"))
        .map_err(|source| FilterBuildError::InvalidTimestamp {
            field: "deadline",
            source,
        })?;
    Ok(date.with_time(Time::MIDNIGHT).assume_offset(offset))
}

/// Serde adapter for optional deadlines produced by other tools.
///
/// Reads what [`parse_deadline`] accepts, with bare dates at UTC midnight.
/// Unparseable or non-string values read as no deadline. Writes RFC3339.
pub(crate) mod lenient_deadline {
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;
    use time::{OffsetDateTime, UtcOffset};

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(
        value: &Option<OffsetDateTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        time::serde::rfc3339::option::serialize(value, serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<OffsetDateTime>, D::Error> {
        let raw = Option::<Value>::deserialize(deserializer)?;
        Ok(match raw {
            Some(Value::String(text)) => super::parse_deadline(&text, UtcOffset::UTC).ok(),
            _ => None,
        })
    }
}

impl FilterBuildError {
    /// Convert the error into a message that is friendly for end-users.
    #[must_use]
    pub fn describe_user_facing(&self) -> String {
        match self {
            Self::InvalidPriority { token } => format!("优先级无效: {token} (可选 1、2、3)"),
            Self::InvalidDeadlineWindow { token } => {
                format!("截止时间范围无效: {token} (可选 今天、明天、本周、本月)")
            }
            Self::InvalidTimestamp { field, .. } => {
                format!("{field} 的时间格式无效 (需要 RFC3339 或 YYYY-MM-DD)")
            }
        }
    }
}

impl Display for FilterCriteriaBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterCriteriaBuilder")
            .field("category", &self.category)
            .field("priority", &self.priority)
            .field("deadline", &self.deadline)
            .field("text", &self.text)
            .finish()
    }
}

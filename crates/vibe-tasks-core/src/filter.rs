use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use time::{Date, Duration, OffsetDateTime, Time};

use crate::{Priority, Task, TextMatcher};

/// Tokens that select every value of a filter field.
///
/// They are reserved and never valid as category labels.
pub const ALL_SENTINELS: [&str; 2] = ["all", "全部"];

/// Returns true when `token` is one of the [`ALL_SENTINELS`].
#[must_use]
pub fn is_all_sentinel(token: &str) -> bool {
    let trimmed = token.trim();
    ALL_SENTINELS
        .iter()
        .any(|sentinel| sentinel.eq_ignore_ascii_case(trimmed))
}

/// A filter field that is either unrestricted or pinned to one value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection<T> {
    /// Every value passes.
    #[default]
    All,
    /// Only the given value passes.
    Only(T),
}

impl<T> Selection<T> {
    /// Returns true for [`Selection::All`].
    #[must_use]
    pub const fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    /// Borrow the pinned value, if any.
    #[must_use]
    pub const fn value(&self) -> Option<&T> {
        match self {
            Self::All => None,
            Self::Only(value) => Some(value),
        }
    }
}

/// Relative deadline windows, anchored on the local calendar day of "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeadlineWindow {
    /// `[startOfToday, startOfTomorrow)`
    Today,
    /// `[startOfTomorrow, startOfDayAfter)`
    Tomorrow,
    /// `[startOfToday, startOfToday + 7d)`
    ThisWeek,
    /// `[startOfToday, startOfToday + 1 calendar month)`
    ThisMonth,
}

impl DeadlineWindow {
    /// Half-open `[start, end)` bounds of the window relative to `now`.
    ///
    /// The offset carried by `now` defines what "local day" means.
    #[must_use]
    pub fn bounds(self, now: OffsetDateTime) -> (OffsetDateTime, OffsetDateTime) {
        let start_of_today = now.replace_time(Time::MIDNIGHT);
        match self {
            Self::Today => (start_of_today, start_of_today + Duration::days(1)),
            Self::Tomorrow => (
                start_of_today + Duration::days(1),
                start_of_today + Duration::days(2),
            ),
            Self::ThisWeek => (start_of_today, start_of_today + Duration::days(7)),
            Self::ThisMonth => (start_of_today, add_calendar_month(start_of_today)),
        }
    }

    /// Returns true when `deadline` falls inside the window.
    #[must_use]
    pub fn contains(self, now: OffsetDateTime, deadline: OffsetDateTime) -> bool {
        let (start, end) = self.bounds(now);
        start <= deadline && deadline < end
    }

    /// Canonical token used in user-facing inputs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Tomorrow => "tomorrow",
            Self::ThisWeek => "this_week",
            Self::ThisMonth => "this_month",
        }
    }
}

/// Move to the same day of the next month, clamping to that month's last day.
fn add_calendar_month(start: OffsetDateTime) -> OffsetDateTime {
    let date = start.date();
    let month = date.month().next();
    let year = if month == time::Month::January {
        date.year() + 1
    } else {
        date.year()
    };
    let day = date.day();
    (day.min(28)..=day)
        .rev()
        .find_map(|day| Date::from_calendar_date(year, month, day).ok())
        .map_or_else(|| start + Duration::days(31), |next| start.replace_date(next))
}

impl fmt::Display for DeadlineWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error raised when a deadline window token cannot be understood.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid deadline window: {token}")]
pub struct ParseDeadlineWindowError {
    /// Offending input.
    pub token: String,
}

impl FromStr for DeadlineWindow {
    type Err = ParseDeadlineWindowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "today" | "今天" => Ok(Self::Today),
            "tomorrow" | "明天" => Ok(Self::Tomorrow),
            "this_week" | "thisweek" | "week" | "本周" => Ok(Self::ThisWeek),
            "this_month" | "thismonth" | "month" | "本月" => Ok(Self::ThisMonth),
            _ => Err(ParseDeadlineWindowError { token: s.to_owned() }),
        }
    }
}

/// User-selected constraints narrowing the displayed task set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    /// Category constraint (exact or substring match).
    pub category: Selection<String>,
    /// Priority constraint (exact match).
    pub priority: Selection<Priority>,
    /// Deadline window constraint.
    pub deadline: Selection<DeadlineWindow>,
    /// Optional free-text search.
    pub text: Option<TextMatcher>,
}

impl FilterCriteria {
    /// Returns true when no predicate is active.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.category.is_all()
            && self.priority.is_all()
            && self.deadline.is_all()
            && self.text.is_none()
    }

    /// Evaluate every predicate against `task`.
    #[must_use]
    pub fn matches(&self, task: &Task, now: OffsetDateTime) -> bool {
        self.matches_category(task)
            && self.matches_priority(task)
            && self.matches_deadline(task, now)
            && self.matches_text(task)
    }

    /// Category predicate.
    ///
    /// Categories are loosely tagged (stores may decorate labels, e.g. `"🛒 购物"`),
    /// so a task also matches when its category merely contains the filter value.
    /// This also means a filter value that is a substring of another label matches both.
    #[must_use]
    pub fn matches_category(&self, task: &Task) -> bool {
        match &self.category {
            Selection::All => true,
            Selection::Only(wanted) => task.category == *wanted || task.category.contains(wanted.as_str()),
        }
    }

    /// Priority predicate.
    #[must_use]
    pub fn matches_priority(&self, task: &Task) -> bool {
        match self.priority {
            Selection::All => true,
            Selection::Only(wanted) => task.priority == wanted,
        }
    }

    /// Deadline predicate; tasks without a deadline never match a concrete window.
    #[must_use]
    pub fn matches_deadline(&self, task: &Task, now: OffsetDateTime) -> bool {
        match self.deadline {
            Selection::All => true,
            Selection::Only(window) => task
                .deadline
                .is_some_and(|deadline| window.contains(now, deadline)),
        }
    }

    /// Free-text predicate.
    #[must_use]
    pub fn matches_text(&self, task: &Task) -> bool {
        self.text.as_ref().is_none_or(|matcher| matcher.matches(task))
    }
}

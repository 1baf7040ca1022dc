use crate::Task;

/// Case-insensitive substring matcher for task text fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMatcher {
    needle: String,
}

impl TextMatcher {
    /// Normalize a query string into a matcher. Returns `None` for blank inputs.
    #[must_use]
    pub fn new(query: &str) -> Option<Self> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self {
            needle: trimmed.to_lowercase(),
        })
    }

    /// Normalized query text.
    #[must_use]
    pub fn needle(&self) -> &str {
        &self.needle
    }

    /// Determine whether the content or category of the task contains the query.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        self.matches_field(&task.content) || self.matches_field(&task.category)
    }

    fn matches_field(&self, value: &str) -> bool {
        value.to_lowercase().contains(&self.needle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::TaskId;
    use crate::{DEFAULT_CATEGORY, Priority};

    fn task(content: &str, category: &str) -> Task {
        Task {
            id: TaskId::new(),
            content: content.into(),
            is_done: false,
            category: category.into(),
            priority: Priority::Low,
            deadline: None,
            sort_order: 0,
        }
    }

    #[test]
    fn matcher_skips_blank_queries() {
        assert!(TextMatcher::new("").is_none());
        assert!(TextMatcher::new("   ").is_none());
        assert!(TextMatcher::new("\n").is_none());
    }

    #[test]
    fn matcher_finds_text_across_fields() {
        let snapshot = task("Send Weekly Report", "💻 学习");

        let matcher = TextMatcher::new(" weekly ")
            .unwrap_or_else(|| panic!("matcher must exist for queries with content"));
        assert!(matcher.matches(&snapshot));
        assert_eq!(matcher.needle(), "weekly");

        let matcher = TextMatcher::new("学习")
            .unwrap_or_else(|| panic!("matcher must exist for queries with content"));
        assert!(matcher.matches(&snapshot));

        let matcher = TextMatcher::new("groceries")
            .unwrap_or_else(|| panic!("matcher must exist for queries with content"));
        assert!(!matcher.matches(&task("walk the dog", DEFAULT_CATEGORY)));
    }
}

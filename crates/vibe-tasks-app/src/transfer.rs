//! Bulk export/import documents.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use vibe_tasks_core::id::TaskId;
use vibe_tasks_core::{DEFAULT_CATEGORY, Priority, Task};

use crate::error::ValidationError;
use crate::filter_util::lenient_deadline;

/// Full collection as returned by an export call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskExport {
    /// Every task known to the store.
    pub tasks: Vec<Task>,
}

impl TaskExport {
    /// Render the export as pretty-printed JSON.
    ///
    /// # Errors
    /// Returns an error if a task cannot be serialized.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Outcome reported by an import call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    /// Human-readable status message.
    pub message: String,
    /// Number of tasks the store accepted.
    #[serde(rename = "importedCount", alias = "imported_count")]
    pub imported_count: usize,
}

/// One entry of an import document.
///
/// The store assigns ids on import, so an incoming `id` is ignored whatever
/// its type.
#[derive(Debug, Deserialize)]
struct ImportEntry {
    content: String,
    #[serde(default)]
    is_done: bool,
    #[serde(default = "default_category")]
    category: String,
    #[serde(default)]
    priority: Priority,
    #[serde(default, deserialize_with = "lenient_deadline::deserialize")]
    deadline: Option<OffsetDateTime>,
    #[serde(default)]
    sort_order: i64,
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_owned()
}

impl From<ImportEntry> for Task {
    fn from(entry: ImportEntry) -> Self {
        Self {
            id: TaskId::new(),
            content: entry.content,
            is_done: entry.is_done,
            category: entry.category,
            priority: entry.priority,
            deadline: entry.deadline,
            sort_order: entry.sort_order,
        }
    }
}

/// Validate an import document and extract its tasks.
///
/// The document must be a JSON object holding an array under `tasks`. Each
/// entry needs `content`; ids are replaced with placeholders.
///
/// # Errors
/// Returns [`ValidationError::InvalidImport`] when the text is not JSON, the
/// `tasks` array is missing, or an entry lacks usable task fields.
pub fn parse_import_document(raw: &str) -> Result<Vec<Task>, ValidationError> {
    let document: Value = serde_json::from_str(raw)
        .map_err(|err| ValidationError::InvalidImport(format!("not valid JSON: {err}")))?;
    let Some(Value::Array(entries)) = document.get("tasks") else {
        return Err(ValidationError::InvalidImport(
            "expected an array under `tasks`".to_owned(),
        ));
    };
    entries
        .iter()
        .enumerate()
        .map(|(idx, entry)| {
            ImportEntry::deserialize(entry)
                .map(Task::from)
                .map_err(|err| ValidationError::InvalidImport(format!("task #{idx}: {err}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_document_with_tasks_array() {
        let raw = r#"{"tasks":[{"id":"019a6ff3-119f-7661-869e-2a6c4fca5c4f","content":"buy milk","category":"购物","priority":2}]}"#;
        let tasks = parse_import_document(raw).unwrap_or_else(|err| panic!("must parse: {err}"));
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].category, "购物");
    }

    #[test]
    fn rejects_documents_without_tasks_array() {
        for raw in ["[]", r#"{"items":[]}"#, r#"{"tasks":{}}"#, "not json"] {
            assert!(
                matches!(parse_import_document(raw), Err(ValidationError::InvalidImport(_))),
                "{raw} must be rejected"
            );
        }
    }

    #[test]
    fn ignores_integer_and_missing_ids() {
        let raw = r#"{"tasks":[
            {"id":7,"content":"walk dog","is_done":true,"category":"📌 日常"},
            {"content":"no id","deadline":"2025-05-01"}
        ]}"#;
        let tasks = parse_import_document(raw).unwrap_or_else(|err| panic!("must parse: {err}"));
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].content, "walk dog");
        assert!(tasks[0].is_done);
        assert_eq!(tasks[0].category, "📌 日常");
        assert_eq!(tasks[1].category, DEFAULT_CATEGORY);
        assert_eq!(tasks[1].priority, Priority::default());
        assert!(tasks[1].deadline.is_some());
        assert_ne!(tasks[0].id, tasks[1].id);
    }

    #[test]
    fn reports_index_of_entry_without_content() {
        let raw = r#"{"tasks":[{"content":"fine"},{"id":3}]}"#;
        let Err(ValidationError::InvalidImport(message)) = parse_import_document(raw) else {
            panic!("entry without content must be rejected");
        };
        assert!(message.starts_with("task #1"), "{message}");
    }

    #[test]
    fn summary_uses_camel_case_count() {
        let summary: ImportSummary = serde_json::from_str(r#"{"message":"ok","importedCount":3}"#)
            .unwrap_or_else(|err| panic!("must parse: {err}"));
        assert_eq!(summary.imported_count, 3);
    }
}

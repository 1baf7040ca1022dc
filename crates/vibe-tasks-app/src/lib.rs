//! Application layer logic for vibe-tasks.
//!
//! This crate keeps a local view of a remote task collection consistent after
//! every mutation, manages the exclusive inline-edit draft, evaluates filters
//! for display, and turns manual moves into reorder batches.

pub mod autofill;
pub mod config;
pub mod draft;
pub mod error;
pub mod filter_util;
pub mod reorder;
pub mod session;
pub mod sync;
pub mod task_cache;
pub mod task_store;
pub mod transfer;

// Re-exports for convenience
pub use autofill::{Analysis, NewTaskDraft, TaskComposer};
pub use config::{CategoryConfig, ClientConfig, StoreConfig};
pub use draft::{Draft, DraftEditor, DraftField};
pub use error::{RemoteError, SyncError, SyncResult, ValidationError};
pub use filter_util::{FilterBuildError, FilterCriteriaBuilder, parse_deadline};
pub use reorder::{move_item, plan_move};
pub use session::{Credential, Session};
pub use sync::SyncController;
pub use task_cache::TaskCache;
pub use task_store::{RemoteTaskStore, TextAnalyzer};
pub use transfer::{ImportSummary, TaskExport, parse_import_document};

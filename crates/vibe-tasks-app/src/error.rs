//! Error taxonomy shared by the sync engine.

use thiserror::Error;
use vibe_tasks_core::id::TaskId;

/// Input rejected locally, before any remote call is made.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Task content was empty or whitespace-only.
    #[error("task content must not be empty")]
    EmptyContent,
    /// Text handed to the analyzer was empty or whitespace-only.
    #[error("analysis prompt must not be empty")]
    EmptyPrompt,
    /// Category outside the configured label set.
    #[error("category '{0}' is not allowed")]
    UnknownCategory(String),
    /// Import document did not have the expected shape.
    #[error("invalid import document: {0}")]
    InvalidImport(String),
}

/// Failure reported by a remote collaborator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteError {
    /// The credential was rejected (401-equivalent).
    #[error("session is no longer authorized")]
    Unauthorized,
    /// The referenced task does not exist on the remote side.
    #[error("task {0} not found")]
    NotFound(TaskId),
    /// Any other non-success response.
    #[error("remote store responded with status {code}: {message}")]
    Status {
        /// Response status code.
        code: u16,
        /// Response body or reason.
        message: String,
    },
    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(String),
}

impl RemoteError {
    /// Classify a non-success status code.
    #[must_use]
    pub fn from_status(code: u16, message: impl Into<String>) -> Self {
        match code {
            401 => Self::Unauthorized,
            _ => Self::Status {
                code,
                message: message.into(),
            },
        }
    }
}

/// Error returned by every engine operation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SyncError {
    /// Rejected before reaching the network.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Rejected by the remote store; local state is unchanged.
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

impl SyncError {
    /// Returns true when the session must be torn down.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Remote(RemoteError::Unauthorized))
    }

    /// Convert the error into a message that is friendly for end-users.
    #[must_use]
    pub fn describe_user_facing(&self) -> String {
        match self {
            Self::Validation(ValidationError::EmptyContent) => "任务内容不能为空".to_owned(),
            Self::Validation(ValidationError::EmptyPrompt) => "请先输入一句话".to_owned(),
            Self::Validation(ValidationError::UnknownCategory(category)) => {
                format!("不支持的分类: {category}")
            }
            Self::Validation(ValidationError::InvalidImport(_)) => "文件格式错误或数据无效".to_owned(),
            Self::Remote(RemoteError::Unauthorized) => "登录已失效，请重新登录".to_owned(),
            Self::Remote(RemoteError::NotFound(_)) => "任务不存在".to_owned(),
            Self::Remote(RemoteError::Status { code, .. }) => format!("请求错误：{code}"),
            Self::Remote(RemoteError::Transport(_)) => "网络错误，请检查网络连接".to_owned(),
        }
    }
}

/// Result alias for engine operations.
pub type SyncResult<T> = Result<T, SyncError>;

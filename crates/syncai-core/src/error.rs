use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("backend error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("storage error: {0}")]
    Storage(String),

    #[error("{0}")]
    Unknown(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SyncError {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Whether a failed backend call is worth another attempt.
    ///
    /// Timeouts, transport failures, HTTP 408 and 5xx are transient; auth
    /// rejections and other 4xx are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::Network(_) => true,
            Self::Api { status, .. } => *status == 408 || *status >= 500,
            _ => false,
        }
    }

    /// Stable tag surfaced to the caller in `SendResult::error`.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network(_) => ErrorKind::NetworkError,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::Auth(_) => ErrorKind::AuthError,
            Self::Api { .. } => ErrorKind::ApiError,
            Self::Storage(_) | Self::Io(_) => ErrorKind::StorageError,
            Self::Unknown(_) | Self::Json(_) => ErrorKind::UnknownError,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    NetworkError,
    Timeout,
    AuthError,
    ApiError,
    StorageError,
    UnknownError,
}

pub type Result<T> = std::result::Result<T, SyncError>;

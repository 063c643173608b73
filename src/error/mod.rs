use serde::Serialize;
use thiserror::Error;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Completion error: {0}")]
    Completion(#[from] CompletionError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Machine-readable classification of an [`AppError`].
///
/// Tool results carry this next to the human-readable message so callers can
/// branch on the kind instead of matching message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Config,
    Validation,
    Storage,
    Completion,
    Fetch,
    Internal,
}

impl AppError {
    /// The machine-readable kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Config { .. } => ErrorKind::Config,
            AppError::Validation(_) => ErrorKind::Validation,
            AppError::Storage(_) => ErrorKind::Storage,
            AppError::Completion(_) => ErrorKind::Completion,
            AppError::Fetch(_) => ErrorKind::Fetch,
            AppError::Internal { .. } => ErrorKind::Internal,
        }
    }
}

/// Input validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("URL cannot be empty")]
    EmptyUrl,

    #[error("URL must start with http:// or https://: {url}")]
    UnsupportedScheme { url: String },

    #[error("Malformed bookmark document: {reason}")]
    MalformedDocument { reason: String },

    #[error("Invalid arguments for {tool_name}: {message}")]
    InvalidArguments { tool_name: String, message: String },
}

/// Storage layer errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database connection failed: {message}")]
    Connection { message: String },

    #[error("Query failed: {message}")]
    Query { message: String },

    #[error("Migration failed: {message}")]
    Migration { message: String },

    #[error("Embedding failed: {message}")]
    Embedding { message: String },

    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

/// Completion endpoint errors
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("Completion endpoint unavailable: {message} (retries: {retries})")]
    Unavailable { message: String, retries: u32 },

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Web page fetch errors
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Fetching {url} timed out after {timeout_ms}ms")]
    Timeout { url: String, timeout_ms: u64 },
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type alias for completion endpoint operations
pub type CompletionResult<T> = Result<T, CompletionError>;

/// Result type alias for page fetches
pub type FetchResult<T> = Result<T, FetchError>;

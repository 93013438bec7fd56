//! Error types for the offline to-do store.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - Category-based exit codes (2=storage, 4=validation, 6=export, etc.)
//! - Retryability flags
//! - Context-aware recovery hints
//! - Structured JSON output for piped / non-TTY consumers

use std::path::PathBuf;
use thiserror::Error;

use crate::export::ExportError;
use crate::storage::ConnectionState;

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
///
/// Each code maps to a SCREAMING_SNAKE string and a category-based
/// exit code. Scripts match on the string or on the exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Storage (exit 2)
    NotInitialized,
    AlreadyInitialized,
    StorageInitFailed,
    DatabaseError,
    WriteFailed,
    ConnectionClosed,
    IntegrityCheckFailed,

    // Validation (exit 4)
    InvalidArgument,

    // Export (exit 6)
    ExportEmpty,
    ExportSourceNotFound,
    ExportCopyFailed,
    ExportSharingUnsupported,
    ExportFailed,

    // Config (exit 7)
    ConfigError,

    // I/O (exit 8)
    IoError,
    JsonError,

    // Remote (exit 9)
    FetchError,

    // Internal (exit 1)
    InternalError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::AlreadyInitialized => "ALREADY_INITIALIZED",
            Self::StorageInitFailed => "STORAGE_INIT_FAILED",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::WriteFailed => "WRITE_FAILED",
            Self::ConnectionClosed => "CONNECTION_CLOSED",
            Self::IntegrityCheckFailed => "INTEGRITY_CHECK_FAILED",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::ExportEmpty => "EXPORT_EMPTY",
            Self::ExportSourceNotFound => "EXPORT_SOURCE_NOT_FOUND",
            Self::ExportCopyFailed => "EXPORT_COPY_FAILED",
            Self::ExportSharingUnsupported => "EXPORT_SHARING_UNSUPPORTED",
            Self::ExportFailed => "EXPORT_FAILED",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::FetchError => "FETCH_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Category-based exit code (1-9).
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::InternalError => 1,
            Self::NotInitialized
            | Self::AlreadyInitialized
            | Self::StorageInitFailed
            | Self::DatabaseError
            | Self::WriteFailed
            | Self::ConnectionClosed
            | Self::IntegrityCheckFailed => 2,
            Self::InvalidArgument => 4,
            Self::ExportEmpty
            | Self::ExportSourceNotFound
            | Self::ExportCopyFailed
            | Self::ExportSharingUnsupported
            | Self::ExportFailed => 6,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError => 8,
            Self::FetchError => 9,
        }
    }

    /// Whether retrying the same call (possibly with corrected input) can succeed.
    ///
    /// True for validation errors, transient database contention, export
    /// attempts that failed on the filesystem, and network fetches.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgument
                | Self::DatabaseError
                | Self::StorageInitFailed
                | Self::ExportSourceNotFound
                | Self::ExportCopyFailed
                | Self::FetchError
        )
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur in store, export and CLI operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Not initialized: run `todos init` first")]
    NotInitialized,

    #[error("Already initialized at {path}")]
    AlreadyInitialized { path: PathBuf },

    /// The database file could not be opened or the schema statement failed.
    #[error("Failed to initialize storage at {}: {reason}", .path.display())]
    StorageInit { path: PathBuf, reason: String },

    /// A single insert/update/delete failed. Store state is unchanged.
    #[error("Write failed: {0}")]
    Write(#[source] rusqlite::Error),

    /// The id generator has no id larger than the stored maximum.
    #[error("No task id left after {max}")]
    IdsExhausted { max: i64 },

    #[error("Database connection is not available (state: {state})")]
    ConnectionClosed { state: ConnectionState },

    #[error("Integrity check failed: {0}")]
    IntegrityCheck(String),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::NotInitialized => ErrorCode::NotInitialized,
            Self::AlreadyInitialized { .. } => ErrorCode::AlreadyInitialized,
            Self::StorageInit { .. } => ErrorCode::StorageInitFailed,
            Self::Write(_) | Self::IdsExhausted { .. } => ErrorCode::WriteFailed,
            Self::ConnectionClosed { .. } => ErrorCode::ConnectionClosed,
            Self::IntegrityCheck(_) => ErrorCode::IntegrityCheckFailed,
            Self::Export(e) => match e {
                ExportError::Empty => ErrorCode::ExportEmpty,
                ExportError::SourceNotFound { .. } => ErrorCode::ExportSourceNotFound,
                ExportError::CopyFailed { .. } => ErrorCode::ExportCopyFailed,
                ExportError::SharingUnsupported { .. } => ErrorCode::ExportSharingUnsupported,
                _ => ErrorCode::ExportFailed,
            },
            Self::Database(_) => ErrorCode::DatabaseError,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::JsonError,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::Fetch(_) => ErrorCode::FetchError,
            Self::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// Context-aware recovery hint.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::NotInitialized => Some("Run `todos init` to create the database".to_string()),

            Self::AlreadyInitialized { path } => Some(format!(
                "Database already exists at {}. Use `--force` to recreate it.",
                path.display()
            )),

            Self::StorageInit { path, .. } => Some(format!(
                "Check that {} is writable, then retry. Use `todos debug` to inspect storage paths.",
                path.display()
            )),

            Self::ConnectionClosed { .. } => Some(
                "The connection was not restored after an export. Retry the command to reopen it."
                    .to_string(),
            ),

            Self::IntegrityCheck(_) => Some(
                "Export a snapshot with `todos export` and inspect it with a SQLite tool."
                    .to_string(),
            ),

            Self::Export(e) => e.hint(),

            Self::IdsExhausted { .. } => Some(
                "Delete or renumber the task with the largest id, then retry.".to_string(),
            ),

            Self::InvalidArgument(msg) => {
                if msg.contains("title") {
                    Some("Titles must contain at least one visible character.".to_string())
                } else {
                    None
                }
            }

            Self::Fetch(_) => {
                Some("Check the API URL (`--url` or TODOS_API_URL) and your network.".to_string())
            }

            Self::Config(_) => Some(
                "Fix or remove the config file (see TODOS_CONFIG), then retry.".to_string(),
            ),

            Self::Write(_) | Self::Database(_) | Self::Io(_) | Self::Json(_) | Self::Other(_) => {
                None
            }
        }
    }

    /// Structured JSON representation for machine consumption.
    ///
    /// Includes error code, message, retryability, exit code, and
    /// optional recovery hint.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "error": {
                "code": code.as_str(),
                "message": self.to_string(),
                "retryable": code.is_retryable(),
                "exit_code": code.exit_code(),
            }
        });

        if let Self::Export(e) = self {
            obj["error"]["reason"] = serde_json::Value::String(e.reason().to_string());
        }

        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }

        obj
    }
}

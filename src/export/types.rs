//! Type definitions for snapshot export.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Why an export attempt stopped.
///
/// Every variant is returned only after the store connection has been
/// restored (or a restore was attempted and logged).
#[derive(Debug, Error)]
pub enum ExportError {
    /// The store has no rows. Nothing was checkpointed or copied.
    #[error("Nothing to export: the store has no tasks")]
    Empty,

    #[error("Checkpoint failed: {0}")]
    Checkpoint(String),

    #[error("Could not close the connection: {0}")]
    Close(String),

    /// No candidate location held a non-empty database file.
    #[error("Database file not found (searched: {})", display_paths(.searched))]
    SourceNotFound { searched: Vec<PathBuf> },

    #[error("Copy failed for {}: {reason}", .path.display())]
    CopyFailed { path: PathBuf, reason: String },

    /// The snapshot was written but no share mechanism is available.
    #[error("Sharing is not available; snapshot left at {}", .path.display())]
    SharingUnsupported { path: PathBuf },

    #[error("Sharing {} failed: {reason}", .path.display())]
    ShareFailed { path: PathBuf, reason: String },

    #[error("Could not reopen the connection: {0}")]
    Reopen(String),

    #[error("Store error: {0}")]
    Store(String),
}

impl ExportError {
    /// Stable short tag for the failure.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Checkpoint(_) => "checkpoint_failed",
            Self::Close(_) => "close_failed",
            Self::SourceNotFound { .. } => "source_not_found",
            Self::CopyFailed { .. } => "copy_failed",
            Self::SharingUnsupported { .. } => "sharing_unsupported",
            Self::ShareFailed { .. } => "share_failed",
            Self::Reopen(_) => "reopen_failed",
            Self::Store(_) => "store",
        }
    }

    /// Snapshot path when the copy already exists on disk.
    #[must_use]
    pub fn snapshot_path(&self) -> Option<&Path> {
        match self {
            Self::SharingUnsupported { path } | Self::ShareFailed { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Recovery hint shown next to the message.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::Empty => Some("Add at least one task first: todos add \"...\"".to_string()),
            Self::SourceNotFound { .. } => {
                Some("Run `todos debug` to see which storage locations exist.".to_string())
            }
            Self::CopyFailed { .. } => {
                Some("Check free space and permissions of the cache directory.".to_string())
            }
            Self::SharingUnsupported { .. } => Some(
                "Pass --share-dir or --share-command, or --no-share to only write the snapshot."
                    .to_string(),
            ),
            Self::Reopen(_) => {
                Some("Run any command again; the database is reopened on start.".to_string())
            }
            Self::Checkpoint(_) => Some(
                "Close other programs that have the database open, then retry.".to_string(),
            ),
            Self::Close(_) | Self::ShareFailed { .. } | Self::Store(_) => None,
        }
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type for export operations.
pub type ExportResult<T> = std::result::Result<T, ExportError>;

/// Metadata of a successful export.
#[derive(Debug, Clone, Serialize)]
pub struct ExportReport {
    /// Snapshot file name (`todos_backup_<timestamp>.db`).
    pub file_name: String,
    /// Full path of the snapshot in the cache directory.
    pub path: PathBuf,
    /// Snapshot size in bytes.
    pub file_size: u64,
    /// Number of tasks in the store at export time.
    pub row_count: usize,
    /// Hex SHA256 of the snapshot contents.
    pub sha256: String,
    /// Database file the snapshot was copied from.
    pub source: PathBuf,
    /// Whether the snapshot was handed to a share target.
    pub shared: bool,
    pub exported_at: DateTime<Utc>,
}

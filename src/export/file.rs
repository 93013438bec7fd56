//! Snapshot file naming, copying and hashing.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

/// File name prefix of every snapshot.
pub const SNAPSHOT_PREFIX: &str = "todos_backup_";

/// File extension of every snapshot.
pub const SNAPSHOT_EXTENSION: &str = "db";

/// ISO 8601 UTC timestamp with `:` and `.` replaced by `-`.
///
/// `2025-03-14T09:26:53.589Z` becomes `2025-03-14T09-26-53-589Z`.
#[must_use]
pub fn snapshot_timestamp(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%dT%H-%M-%S-%3fZ").to_string()
}

/// `todos_backup_<timestamp>.db`.
#[must_use]
pub fn snapshot_file_name(now: DateTime<Utc>) -> String {
    format!(
        "{SNAPSHOT_PREFIX}{}.{SNAPSHOT_EXTENSION}",
        snapshot_timestamp(now)
    )
}

/// A snapshot path in `dir` that does not exist yet.
///
/// Falls back to `-1`, `-2`, ... suffixes when an export in the same
/// millisecond already claimed the name.
#[must_use]
pub fn unique_snapshot_path(dir: &Path, now: DateTime<Utc>) -> (String, PathBuf) {
    let stamp = snapshot_timestamp(now);
    let mut file_name = snapshot_file_name(now);
    let mut suffix = 1_u32;

    while dir.join(&file_name).exists() {
        file_name = format!("{SNAPSHOT_PREFIX}{stamp}-{suffix}.{SNAPSHOT_EXTENSION}");
        suffix += 1;
    }

    let path = dir.join(&file_name);
    (file_name, path)
}

/// Whether `name` looks like a snapshot produced by the exporter.
#[must_use]
pub fn is_snapshot_name(name: &str) -> bool {
    name.starts_with(SNAPSHOT_PREFIX)
        && Path::new(name)
            .extension()
            .is_some_and(|ext| ext == SNAPSHOT_EXTENSION)
}

/// Hex SHA256 of a file's contents.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn file_sha256(path: &Path) -> io::Result<String> {
    let bytes = fs::read(path)?;
    Ok(format!("{:x}", Sha256::digest(&bytes)))
}

/// Get the size of a file in bytes.
///
/// Returns 0 if the file doesn't exist.
#[must_use]
pub fn file_size(path: &Path) -> u64 {
    fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

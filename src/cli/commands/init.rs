//! Create the database.
//!
//! `todos init` creates the document directory and the database file and
//! applies the schema. The cache directory is created lazily by the first
//! export.

use super::{print_json, Workspace};
use crate::error::{Error, Result};
use crate::storage::TodoStore;
use colored::Colorize;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Serialize)]
struct InitOutput {
    database: PathBuf,
    document_dir: PathBuf,
    cache_dir: PathBuf,
    task_count: usize,
}

/// Execute the init command.
///
/// # Errors
///
/// Returns `Error::AlreadyInitialized` if the database exists and `force`
/// is not set, or a storage error if it cannot be created.
pub fn execute(db: Option<&Path>, cache_dir: Option<&Path>, force: bool, json: bool) -> Result<()> {
    let workspace = Workspace::resolve(db, cache_dir)?;
    let db_path = &workspace.paths.database;

    if db_path.exists() {
        if !force {
            return Err(Error::AlreadyInitialized {
                path: db_path.clone(),
            });
        }
        remove_database(db_path)?;
    }

    let mut store = TodoStore::open(db_path)?;
    let task_count = store.count()?;
    info!(path = %db_path.display(), "Database initialized");

    if json {
        print_json(&InitOutput {
            database: db_path.clone(),
            document_dir: workspace.paths.document_dir.clone(),
            cache_dir: workspace.paths.cache_dir.clone(),
            task_count,
        })?;
    } else {
        println!("{} {}", "Initialized".green().bold(), db_path.display());
        println!("  Snapshots: {}", workspace.paths.cache_dir.display());
        println!();
        println!("Next: todos add \"<title>\"");
    }

    Ok(())
}

/// Remove the database together with its WAL and shared-memory files.
fn remove_database(db_path: &Path) -> Result<()> {
    for suffix in ["", "-wal", "-shm"] {
        let mut name = db_path.as_os_str().to_owned();
        name.push(suffix);
        let path = PathBuf::from(name);
        if path.exists() {
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_remove_database_removes_sidecars() {
        let dir = TempDir::new().unwrap();
        let db = dir.path().join("todos.db");
        for name in ["todos.db", "todos.db-wal", "todos.db-shm", "other.db"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }

        remove_database(&db).unwrap();

        assert!(!db.exists());
        assert!(!dir.path().join("todos.db-wal").exists());
        assert!(!dir.path().join("todos.db-shm").exists());
        assert!(dir.path().join("other.db").exists());
    }
}

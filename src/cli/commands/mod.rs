//! Command implementations.

pub mod check;
pub mod completions;
pub mod debug;
pub mod export;
pub mod fetch;
pub mod init;
pub mod task;
pub mod version;

use crate::config::{load_config, resolve_paths, AppPaths, TodosConfig};
use crate::error::{Error, Result};
use crate::storage::TodoStore;
use std::path::Path;

/// Config and resolved paths shared by every command that touches storage.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub config: TodosConfig,
    pub paths: AppPaths,
}

impl Workspace {
    /// Load the config file and resolve paths, letting flags win.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the config file is invalid or no location
    /// can be determined.
    pub fn resolve(db: Option<&Path>, cache_dir: Option<&Path>) -> Result<Self> {
        let config = load_config()?;
        let paths = resolve_paths(db, cache_dir, &config)?;
        Ok(Self { config, paths })
    }

    /// Open the existing database.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotInitialized` if `todos init` has not been run, or
    /// `Error::StorageInit` if the file cannot be opened.
    pub fn open_store(&self) -> Result<TodoStore> {
        if !self.paths.database.exists() {
            return Err(Error::NotInitialized);
        }
        TodoStore::open(&self.paths.database)
    }
}

/// Print a value as a single JSON line.
pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let payload = serde_json::to_string(value)?;
    println!("{payload}");
    Ok(())
}

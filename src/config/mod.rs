//! Configuration management.
//!
//! Resolves where the database and snapshots live and loads the optional
//! `config.json`.
//!
//! # Locations
//!
//! - **Document directory**: holds `todos.db` (platform data dir by default)
//! - **Cache directory**: receives `todos_backup_<timestamp>.db` snapshots
//!   (platform cache dir by default)
//!
//! Every location can be overridden by a CLI flag (or its environment
//! variable) or by the config file.

use crate::error::{Error, Result};
use crate::export::{CommandShare, DirectoryShare, SettlePolicy, ShareTarget, SourceLocator};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File name of the database inside the document directory.
pub const DB_FILE_NAME: &str = "todos.db";

/// Base URL of the remote list.
pub const DEFAULT_API_URL: &str = "https://jsonplaceholder.typicode.com";

/// Contents of `config.json`. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TodosConfig {
    /// Database file path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<PathBuf>,

    /// Snapshot directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,

    /// Remote list base URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Outbox directory snapshots are shared into.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_dir: Option<PathBuf>,

    /// Program (plus arguments) invoked with the snapshot path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_command: Option<String>,

    /// Settle interval in milliseconds (default 200).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settle_ms: Option<u64>,

    /// Poll the file until it stops changing instead of sleeping a fixed
    /// interval; `settle_ms` becomes the upper bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settle_until_stable: Option<bool>,
}

impl TodosConfig {
    /// Settle policy described by this config.
    #[must_use]
    pub fn settle_policy(&self) -> SettlePolicy {
        let interval = self
            .settle_ms
            .map_or(crate::export::DEFAULT_SETTLE, Duration::from_millis);

        if self.settle_until_stable.unwrap_or(false) {
            SettlePolicy::UntilStable {
                poll: Duration::from_millis(25),
                max_wait: interval,
            }
        } else {
            SettlePolicy::Fixed(interval)
        }
    }

    /// Share target described by this config, if any.
    ///
    /// A share directory wins over a share command.
    #[must_use]
    pub fn share_target(&self) -> Option<Box<dyn ShareTarget>> {
        if let Some(dir) = &self.share_dir {
            return Some(Box::new(DirectoryShare::new(dir)));
        }
        self.share_command
            .as_deref()
            .and_then(CommandShare::parse)
            .map(|cmd| Box::new(cmd) as Box<dyn ShareTarget>)
    }
}

/// Platform directories for this application.
#[must_use]
pub fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("dev", "todos", "todos")
}

/// Location of `config.json`.
///
/// Priority:
/// 1. `TODOS_CONFIG` environment variable
/// 2. Platform config directory
#[must_use]
pub fn config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("TODOS_CONFIG") {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    project_dirs().map(|dirs| dirs.config_dir().join("config.json"))
}

/// Load the config file, or defaults if there is none.
///
/// # Errors
///
/// Returns `Error::Config` if the file exists but cannot be read or parsed.
pub fn load_config() -> Result<TodosConfig> {
    match config_path() {
        Some(path) => load_config_from(&path),
        None => Ok(TodosConfig::default()),
    }
}

/// Load a specific config file; a missing file yields defaults.
///
/// # Errors
///
/// Returns `Error::Config` if the file exists but cannot be read or parsed.
pub fn load_config_from(path: &Path) -> Result<TodosConfig> {
    if !path.exists() {
        return Ok(TodosConfig::default());
    }

    let content = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read {}: {e}", path.display())))?;

    serde_json::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse {}: {e}", path.display())))
}

/// Where the database and snapshots live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppPaths {
    /// Directory holding the database file.
    pub document_dir: PathBuf,
    /// Directory receiving snapshots.
    pub cache_dir: PathBuf,
    /// Database file.
    pub database: PathBuf,
}

impl AppPaths {
    /// File name of the database (normally `todos.db`).
    #[must_use]
    pub fn db_file_name(&self) -> String {
        self.database
            .file_name()
            .map_or_else(|| DB_FILE_NAME.to_string(), |n| n.to_string_lossy().into_owned())
    }

    /// Candidate locations of the database file, in search order.
    #[must_use]
    pub fn locator(&self) -> SourceLocator {
        SourceLocator::standard(&self.document_dir, &self.db_file_name())
    }
}

/// Resolve the database and cache locations.
///
/// Priority for each:
/// 1. Explicit path (CLI flag or its environment variable)
/// 2. Config file
/// 3. Platform default (`data_dir/todos.db`, `cache_dir`)
///
/// # Errors
///
/// Returns `Error::Config` if no platform directory can be determined and
/// nothing was configured.
pub fn resolve_paths(
    explicit_db: Option<&Path>,
    explicit_cache: Option<&Path>,
    config: &TodosConfig,
) -> Result<AppPaths> {
    let dirs = project_dirs();

    let database = explicit_db
        .map(Path::to_path_buf)
        .or_else(|| config.database.clone())
        .or_else(|| dirs.as_ref().map(|d| d.data_dir().join(DB_FILE_NAME)))
        .ok_or_else(|| Error::Config("Could not determine the data directory".to_string()))?;

    let document_dir = database
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);

    let cache_dir = explicit_cache
        .map(Path::to_path_buf)
        .or_else(|| config.cache_dir.clone())
        .or_else(|| dirs.as_ref().map(|d| d.cache_dir().to_path_buf()))
        .unwrap_or_else(|| document_dir.join("cache"));

    Ok(AppPaths {
        document_dir,
        cache_dir,
        database,
    })
}

/// Resolve the remote list base URL.
///
/// Priority: explicit (flag / `TODOS_API_URL`) → config → default.
#[must_use]
pub fn resolve_api_url(explicit: Option<&str>, config: &TodosConfig) -> String {
    explicit
        .filter(|u| !u.trim().is_empty())
        .map(String::from)
        .or_else(|| config.api_url.clone())
        .unwrap_or_else(|| DEFAULT_API_URL.to_string())
}

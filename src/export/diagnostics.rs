//! Read-only storage diagnostics.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::export::file::is_snapshot_name;
use crate::export::locate::{PathProbe, SourceLocator};
use crate::model::Task;
use crate::storage::{ConnectionState, TodoStore};

/// Everything `debug_paths` found.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticsReport {
    pub document_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub database: PathBuf,
    /// Candidate database locations, in search order.
    pub candidates: Vec<PathProbe>,
    /// Snapshots already present in the cache directory.
    pub snapshots: Vec<PathProbe>,
    pub task_count: usize,
    pub tasks: Vec<Task>,
    pub connection: ConnectionState,
}

/// Describe the storage locations and the store contents.
///
/// # Errors
///
/// Returns an error if the tasks cannot be loaded.
pub fn debug_paths(
    store: &mut TodoStore,
    locator: &SourceLocator,
    document_dir: &Path,
    cache_dir: &Path,
) -> Result<DiagnosticsReport> {
    let candidates = locator.probe(store.path());
    for probe in &candidates {
        debug!(label = %probe.label, path = %probe.path.display(), exists = probe.exists, size = ?probe.size, "Candidate");
    }

    let tasks = store.list_all()?;

    Ok(DiagnosticsReport {
        document_dir: document_dir.to_path_buf(),
        cache_dir: cache_dir.to_path_buf(),
        database: store.path().to_path_buf(),
        candidates,
        snapshots: list_snapshots(cache_dir),
        task_count: tasks.len(),
        tasks,
        connection: store.state(),
    })
}

/// Snapshots in `cache_dir`, oldest name first.
#[must_use]
pub fn list_snapshots(cache_dir: &Path) -> Vec<PathProbe> {
    let Ok(entries) = fs::read_dir(cache_dir) else {
        return Vec::new();
    };

    let mut names: Vec<String> = entries
        .filter_map(std::result::Result::ok)
        .filter_map(|e| e.file_name().into_string().ok())
        .filter(|name| is_snapshot_name(name))
        .collect();
    names.sort();

    names
        .into_iter()
        .map(|name| {
            let path = cache_dir.join(&name);
            PathProbe::of(name, &path)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::{SettlePolicy, SnapshotExporter};
    use crate::storage::SequentialIds;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_report_describes_store() {
        let dir = TempDir::new().unwrap();
        let docs = dir.path().join("docs");
        let cache = dir.path().join("cache");
        let mut store = TodoStore::open_with(&docs.join("todos.db"), SequentialIds::default()).unwrap();
        store.add("inspect me").unwrap();

        let locator = SourceLocator::standard(&docs, "todos.db");
        let report = debug_paths(&mut store, &locator, &docs, &cache).unwrap();

        assert_eq!(report.task_count, 1);
        assert_eq!(report.tasks[0].title, "inspect me");
        assert_eq!(report.connection, ConnectionState::Open);
        assert_eq!(report.candidates.len(), 2);
        assert!(report.candidates[0].exists);
        assert!(!report.candidates[1].exists);
        assert!(report.snapshots.is_empty());
    }

    #[test]
    fn test_lists_snapshots_after_export() {
        let dir = TempDir::new().unwrap();
        let docs = dir.path().join("docs");
        let cache = dir.path().join("cache");
        let mut store = TodoStore::open_with(&docs.join("todos.db"), SequentialIds::default()).unwrap();
        store.add("x").unwrap();

        let exporter = SnapshotExporter::new(&cache, SourceLocator::standard(&docs, "todos.db"))
            .with_settle(SettlePolicy::Fixed(Duration::ZERO))
            .without_share();
        let export = exporter.export(&mut store).unwrap();
        fs::write(cache.join("unrelated.txt"), b"").unwrap();

        let snapshots = list_snapshots(&cache);
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].label, export.file_name);
        assert_eq!(snapshots[0].size, Some(export.file_size));
    }

    #[test]
    fn test_missing_cache_dir_has_no_snapshots() {
        assert!(list_snapshots(Path::new("/no/such/cache")).is_empty());
    }
}

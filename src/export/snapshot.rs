//! Consistent snapshot export of a live store.
//!
//! # Protocol
//!
//! 1. Refuse an empty store (no filesystem work at all)
//! 2. `PRAGMA wal_checkpoint(FULL)`; anything short of a complete
//!    checkpoint aborts before the connection is closed
//! 3. Close the connection (`TodoStore::detach`)
//! 4. Settle
//! 5. Locate the database file among the candidates
//! 6. Copy it to `<cache>/todos_backup_<timestamp>.db` and verify the copy
//! 7. Reopen the connection
//! 8. Share the copy unless sharing was turned off
//!
//! Steps 3-7 run inside a [`DetachedStore`](crate::storage::DetachedStore)
//! guard: an early return at any point drops the guard, which reopens the
//! connection.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::export::file::{file_sha256, file_size, unique_snapshot_path};
use crate::export::locate::{LocatedFile, SourceLocator};
use crate::export::settle::SettlePolicy;
use crate::export::share::{NoShare, ShareRequest, ShareTarget};
use crate::export::types::{ExportError, ExportReport, ExportResult};
use crate::storage::TodoStore;

/// A verified copy in the cache directory.
#[derive(Debug)]
struct Snapshot {
    file_name: String,
    path: PathBuf,
    size: u64,
    sha256: String,
}

/// Produces standalone copies of the store's database file.
#[derive(Debug)]
pub struct SnapshotExporter {
    cache_dir: PathBuf,
    locator: SourceLocator,
    settle: SettlePolicy,
    share: Option<Box<dyn ShareTarget>>,
}

impl SnapshotExporter {
    /// Exporter writing into `cache_dir` with the default settle policy.
    ///
    /// The default share target is [`NoShare`], so exports report
    /// `SharingUnsupported` until a target is set or
    /// [`without_share`](Self::without_share) opts out.
    #[must_use]
    pub fn new(cache_dir: impl Into<PathBuf>, locator: SourceLocator) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            locator,
            settle: SettlePolicy::default(),
            share: Some(Box::new(NoShare)),
        }
    }

    #[must_use]
    pub fn with_settle(mut self, settle: SettlePolicy) -> Self {
        self.settle = settle;
        self
    }

    /// Hand every snapshot to `target` after it is written.
    #[must_use]
    pub fn with_share(mut self, target: impl ShareTarget + 'static) -> Self {
        self.share = Some(Box::new(target));
        self
    }

    /// Set or clear the share target from an already boxed value.
    #[must_use]
    pub fn with_share_target(mut self, target: Option<Box<dyn ShareTarget>>) -> Self {
        self.share = target;
        self
    }

    /// Only write the snapshot; the report says `shared: false`.
    #[must_use]
    pub fn without_share(mut self) -> Self {
        self.share = None;
        self
    }

    /// Directory snapshots are written to.
    #[must_use]
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Export a snapshot of `store`.
    ///
    /// On return, success or failure, the store connection is open again
    /// unless reopening itself failed (`ExportError::Reopen`).
    ///
    /// # Errors
    ///
    /// See [`ExportError`]; nothing is retried.
    pub fn export(&self, store: &mut TodoStore) -> ExportResult<ExportReport> {
        let row_count = store
            .count()
            .map_err(|e| ExportError::Store(e.to_string()))?;
        if row_count == 0 {
            info!("Store is empty, nothing to export");
            return Err(ExportError::Empty);
        }
        info!(row_count, "Exporting tasks");

        let stats = store
            .checkpoint()
            .map_err(|e| ExportError::Checkpoint(e.to_string()))?;
        if !stats.is_complete() {
            // The main file would miss committed rows
            return Err(ExportError::Checkpoint(format!(
                "{} of {} log frames written back{}",
                stats.checkpointed_frames,
                stats.wal_frames,
                if stats.busy { ", database busy" } else { "" }
            )));
        }

        let guard = store
            .detach()
            .map_err(|e| ExportError::Close(e.to_string()))?;

        self.settle.wait(guard.path());

        let source = self.locator.locate(guard.path()).map_err(|searched| {
            warn!(?searched, "Database file not found");
            ExportError::SourceNotFound { searched }
        })?;
        info!(path = %source.path.display(), size = source.size, via = %source.label, "Found database file");

        let snapshot = self.copy_snapshot(&source)?;

        guard
            .reattach()
            .map_err(|e| ExportError::Reopen(e.to_string()))?;

        let shared = self.share_snapshot(&snapshot)?;

        info!(file = %snapshot.file_name, size = snapshot.size, row_count, shared, "Export complete");
        Ok(ExportReport {
            file_name: snapshot.file_name,
            path: snapshot.path,
            file_size: snapshot.size,
            row_count,
            sha256: snapshot.sha256,
            source: source.path,
            shared,
            exported_at: Utc::now(),
        })
    }

    /// Copy `source` into the cache directory and verify the result.
    fn copy_snapshot(&self, source: &LocatedFile) -> ExportResult<Snapshot> {
        fs::create_dir_all(&self.cache_dir).map_err(|e| ExportError::CopyFailed {
            path: self.cache_dir.clone(),
            reason: e.to_string(),
        })?;

        let (file_name, path) = unique_snapshot_path(&self.cache_dir, Utc::now());
        debug!(from = %source.path.display(), to = %path.display(), "Copying database file");

        let copy_failed = |path: &Path, reason: String| {
            // Never leave a partial snapshot behind
            let _ = fs::remove_file(path);
            ExportError::CopyFailed {
                path: path.to_path_buf(),
                reason,
            }
        };

        if let Err(e) = fs::copy(&source.path, &path) {
            return Err(copy_failed(&path, e.to_string()));
        }

        let size = file_size(&path);
        if size == 0 || size != source.size {
            return Err(copy_failed(
                &path,
                format!("copied {size} of {} bytes", source.size),
            ));
        }

        let sha256 = match file_sha256(&path) {
            Ok(hash) => hash,
            Err(e) => return Err(copy_failed(&path, e.to_string())),
        };

        Ok(Snapshot {
            file_name,
            path,
            size,
            sha256,
        })
    }

    /// Returns whether the snapshot was shared.
    fn share_snapshot(&self, snapshot: &Snapshot) -> ExportResult<bool> {
        let Some(target) = self.share.as_deref() else {
            debug!("Sharing skipped");
            return Ok(false);
        };

        if !target.is_available() {
            warn!(target = %target.name(), "Share target unavailable");
            return Err(ExportError::SharingUnsupported {
                path: snapshot.path.clone(),
            });
        }

        let request = ShareRequest::for_snapshot(&snapshot.path, &snapshot.file_name);
        target
            .share(&request)
            .map_err(|e| ExportError::ShareFailed {
                path: snapshot.path.clone(),
                reason: e.to_string(),
            })?;

        info!(target = %target.name(), "Snapshot shared");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::locate::{DocumentRoot, LocateStrategy};
    use crate::export::share::DirectoryShare;
    use crate::storage::{ConnectionState, SequentialIds};
    use rusqlite::Connection;
    use std::cell::RefCell;
    use std::io;
    use std::rc::Rc;
    use std::time::Duration;
    use tempfile::TempDir;

    struct Fixture {
        dir: TempDir,
        store: TodoStore,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let db = dir.path().join("docs").join("todos.db");
            let store = TodoStore::open_with(&db, SequentialIds::default()).unwrap();
            Self { dir, store }
        }

        fn cache(&self) -> PathBuf {
            self.dir.path().join("cache")
        }

        fn exporter(&self) -> SnapshotExporter {
            SnapshotExporter::new(
                self.cache(),
                SourceLocator::standard(&self.dir.path().join("docs"), "todos.db"),
            )
            .with_settle(SettlePolicy::Fixed(Duration::ZERO))
            .without_share()
        }

        fn cache_entries(&self) -> usize {
            fs::read_dir(self.cache()).map_or(0, Iterator::count)
        }
    }

    /// Records requests instead of sharing.
    #[derive(Debug, Clone, Default)]
    struct RecordingShare {
        requests: Rc<RefCell<Vec<ShareRequest>>>,
        fail: bool,
    }

    impl ShareTarget for RecordingShare {
        fn name(&self) -> String {
            "recording".to_string()
        }

        fn is_available(&self) -> bool {
            true
        }

        fn share(&self, request: &ShareRequest) -> io::Result<()> {
            self.requests.borrow_mut().push(request.clone());
            if self.fail {
                Err(io::Error::other("user cancelled"))
            } else {
                Ok(())
            }
        }
    }

    /// Finds the file only after moving its directory aside, leaving a
    /// plain file where the directory was so the store cannot reopen.
    #[derive(Debug)]
    struct RelocatingStrategy {
        docs: PathBuf,
        parked: PathBuf,
    }

    impl LocateStrategy for RelocatingStrategy {
        fn label(&self) -> String {
            "relocated".to_string()
        }

        fn candidate(&self, _live_path: &Path) -> PathBuf {
            if self.docs.is_dir() {
                fs::rename(&self.docs, &self.parked).unwrap();
                fs::write(&self.docs, b"").unwrap();
            }
            self.parked.join("todos.db")
        }
    }

    fn read_titles(path: &Path) -> Vec<String> {
        let conn = Connection::open(path).unwrap();
        let mut stmt = conn.prepare("SELECT title FROM todos ORDER BY id").unwrap();
        let titles = stmt
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<rusqlite::Result<Vec<String>>>()
            .unwrap();
        titles
    }

    #[test]
    fn test_empty_store_is_refused_without_copy() {
        let mut fx = Fixture::new();

        let err = fx.exporter().export(&mut fx.store).unwrap_err();
        assert_eq!(err.reason(), "empty");
        assert_eq!(fx.cache_entries(), 0);
        assert_eq!(fx.store.state(), ConnectionState::Open);
    }

    #[test]
    fn test_snapshot_contains_committed_rows() {
        let mut fx = Fixture::new();
        fx.store.add("buy milk").unwrap();

        let report = fx.exporter().export(&mut fx.store).unwrap();

        assert_eq!(report.row_count, 1);
        assert!(report.file_size > 0);
        assert!(report.file_name.starts_with("todos_backup_"));
        assert!(report.file_name.ends_with(".db"));
        assert_eq!(report.path, fx.cache().join(&report.file_name));
        assert!(!report.shared);
        assert_eq!(report.sha256.len(), 64);
        assert_eq!(read_titles(&report.path), vec!["buy milk"]);
    }

    #[test]
    fn test_store_usable_after_success() {
        let mut fx = Fixture::new();
        fx.store.add("one").unwrap();
        fx.exporter().export(&mut fx.store).unwrap();

        assert!(fx.store.is_open());
        fx.store.add("two").unwrap();
        assert_eq!(fx.store.count().unwrap(), 2);
    }

    #[test]
    fn test_two_exports_get_distinct_names() {
        let mut fx = Fixture::new();
        fx.store.add("same").unwrap();
        let exporter = fx.exporter();

        let first = exporter.export(&mut fx.store).unwrap();
        let second = exporter.export(&mut fx.store).unwrap();

        assert_ne!(first.file_name, second.file_name);
        assert!(first.path.exists());
        assert!(second.path.exists());
    }

    #[test]
    fn test_incomplete_checkpoint_aborts_before_close() {
        let mut fx = Fixture::new();
        fx.store.add("first").unwrap();

        // Another connection holds a read snapshot older than the next write
        let reader = Connection::open(fx.store.path()).unwrap();
        reader.execute_batch("BEGIN").unwrap();
        let _: i64 = reader
            .query_row("SELECT COUNT(*) FROM todos", [], |row| row.get(0))
            .unwrap();
        fx.store.add("second").unwrap();

        let err = fx.exporter().export(&mut fx.store).unwrap_err();
        assert_eq!(err.reason(), "checkpoint_failed");
        assert!(err.hint().is_some());
        assert_eq!(fx.cache_entries(), 0);
        assert!(fx.store.is_open());

        reader.execute_batch("COMMIT").unwrap();
        let report = fx.exporter().export(&mut fx.store).unwrap();
        assert_eq!(read_titles(&report.path), vec!["first", "second"]);
    }

    #[test]
    fn test_source_not_found_reopens_connection() {
        let mut fx = Fixture::new();
        fx.store.add("stranded").unwrap();

        // Only look somewhere the file is not
        let exporter = SnapshotExporter::new(
            fx.cache(),
            SourceLocator::new().with(DocumentRoot {
                document_dir: fx.dir.path().join("elsewhere"),
                file_name: "todos.db".to_string(),
            }),
        )
        .with_settle(SettlePolicy::Fixed(Duration::ZERO))
        .without_share();

        let err = exporter.export(&mut fx.store).unwrap_err();
        assert_eq!(err.reason(), "source_not_found");
        assert_eq!(fx.cache_entries(), 0);

        assert_eq!(fx.store.state(), ConnectionState::Open);
        fx.store.add("still works").unwrap();
        assert_eq!(fx.store.count().unwrap(), 2);
    }

    #[test]
    fn test_failed_reopen_is_reported_and_recoverable() {
        let mut fx = Fixture::new();
        fx.store.add("moved").unwrap();
        let docs = fx.dir.path().join("docs");
        let parked = fx.dir.path().join("parked");

        let exporter = SnapshotExporter::new(
            fx.cache(),
            SourceLocator::new().with(RelocatingStrategy {
                docs: docs.clone(),
                parked: parked.clone(),
            }),
        )
        .with_settle(SettlePolicy::Fixed(Duration::ZERO))
        .without_share();

        let err = exporter.export(&mut fx.store).unwrap_err();
        assert_eq!(err.reason(), "reopen_failed");
        assert!(err.hint().is_some());
        assert_eq!(fx.store.state(), ConnectionState::Closed);
        assert!(fx.store.count().is_err());

        fs::remove_file(&docs).unwrap();
        fs::rename(&parked, &docs).unwrap();
        fx.store.initialize().unwrap();
        assert_eq!(fx.store.count().unwrap(), 1);
    }

    #[test]
    fn test_copy_failure_reopens_connection() {
        let mut fx = Fixture::new();
        fx.store.add("blocked").unwrap();

        // A file where the cache directory should be
        fs::write(fx.cache(), b"not a directory").unwrap();

        let err = fx.exporter().export(&mut fx.store).unwrap_err();
        assert_eq!(err.reason(), "copy_failed");

        fx.store.add("after").unwrap();
        assert_eq!(fx.store.count().unwrap(), 2);
    }

    #[test]
    fn test_default_share_is_unsupported_after_reopen() {
        let mut fx = Fixture::new();
        fx.store.add("unshared").unwrap();

        let exporter = SnapshotExporter::new(
            fx.cache(),
            SourceLocator::standard(&fx.dir.path().join("docs"), "todos.db"),
        )
        .with_settle(SettlePolicy::Fixed(Duration::ZERO));
        let err = exporter.export(&mut fx.store).unwrap_err();

        assert_eq!(err.reason(), "sharing_unsupported");
        let snapshot = err.snapshot_path().unwrap();
        assert_eq!(read_titles(snapshot), vec!["unshared"]);
        assert!(fx.store.is_open());
    }

    #[test]
    fn test_share_receives_sqlite_request() {
        let mut fx = Fixture::new();
        fx.store.add("shared").unwrap();
        let share = RecordingShare::default();

        let report = fx
            .exporter()
            .with_share(share.clone())
            .export(&mut fx.store)
            .unwrap();

        assert!(report.shared);
        let requests = share.requests.borrow();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].path, report.path);
        assert_eq!(requests[0].mime_type, "application/x-sqlite3");
        assert_eq!(
            requests[0].dialog_title,
            format!("Export {}", report.file_name)
        );
    }

    #[test]
    fn test_share_failure_is_reported() {
        let mut fx = Fixture::new();
        fx.store.add("cancelled").unwrap();
        let share = RecordingShare {
            fail: true,
            ..RecordingShare::default()
        };

        let err = fx
            .exporter()
            .with_share(share)
            .export(&mut fx.store)
            .unwrap_err();
        assert_eq!(err.reason(), "share_failed");
        assert!(fx.store.is_open());
    }

    #[test]
    fn test_directory_share_end_to_end() {
        let mut fx = Fixture::new();
        fx.store.add("outbox").unwrap();
        let outbox = fx.dir.path().join("outbox");

        let report = fx
            .exporter()
            .with_share(DirectoryShare::new(&outbox))
            .export(&mut fx.store)
            .unwrap();

        assert_eq!(read_titles(&outbox.join(&report.file_name)), vec!["outbox"]);
    }
}

//! Snapshot export of the local database.
//!
//! Produces a standalone, timestamped copy of the live SQLite file that any
//! SQLite tool can open, then hands it to a share mechanism unless sharing is turned off.
//!
//! # Consistency
//!
//! The store runs in WAL mode, so committed rows may live only in the
//! write-ahead log. The exporter checkpoints, closes the connection, waits
//! for the filesystem to settle, copies the main file and reopens. See
//! [`SnapshotExporter::export`] for the full protocol.
//!
//! # Example
//!
//! ```ignore
//! use todos::export::{SnapshotExporter, SourceLocator, DirectoryShare};
//!
//! let exporter = SnapshotExporter::new(cache_dir, SourceLocator::standard(&docs, "todos.db"))
//!     .with_share(DirectoryShare::new(outbox));
//! let report = exporter.export(&mut store)?;
//! println!("{} ({} bytes)", report.file_name, report.file_size);
//! ```

mod diagnostics;
mod file;
mod locate;
mod settle;
mod share;
mod snapshot;
mod types;

pub use diagnostics::{debug_paths, list_snapshots, DiagnosticsReport};
pub use file::{
    file_sha256, file_size, is_snapshot_name, snapshot_file_name, snapshot_timestamp,
    unique_snapshot_path, SNAPSHOT_PREFIX,
};
pub use locate::{
    DocumentRoot, EngineSubdirectory, LiveDatabasePath, LocateStrategy, LocatedFile, PathProbe,
    SourceLocator, ENGINE_SUBDIRECTORY,
};
pub use settle::{SettlePolicy, DEFAULT_SETTLE};
pub use share::{
    platform_share, CommandShare, DirectoryShare, NoShare, ShareRequest, ShareTarget,
    SQLITE_MIME_TYPE, SQLITE_UTI,
};
pub use snapshot::SnapshotExporter;
pub use types::{ExportError, ExportReport, ExportResult};

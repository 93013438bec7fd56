//! Locating the database file on disk.
//!
//! Depending on platform and engine version the file may live in a different
//! directory than the one the store was opened with. Candidates are tried in
//! order; the first that exists with a non-zero size wins.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

/// Subdirectory some SQLite bindings place databases under.
pub const ENGINE_SUBDIRECTORY: &str = "SQLite";

/// One way of guessing where the database file is.
pub trait LocateStrategy: fmt::Debug {
    /// Short label for diagnostics.
    fn label(&self) -> String;

    /// Candidate path, given the path the store was opened with.
    fn candidate(&self, live_path: &Path) -> PathBuf;
}

/// The exact path the store opened.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiveDatabasePath;

impl LocateStrategy for LiveDatabasePath {
    fn label(&self) -> String {
        "store path".to_string()
    }

    fn candidate(&self, live_path: &Path) -> PathBuf {
        live_path.to_path_buf()
    }
}

/// `<document_dir>/<subdirectory>/<file_name>`.
#[derive(Debug, Clone)]
pub struct EngineSubdirectory {
    pub document_dir: PathBuf,
    pub subdirectory: String,
    pub file_name: String,
}

impl LocateStrategy for EngineSubdirectory {
    fn label(&self) -> String {
        format!("{}/{}", self.subdirectory, self.file_name)
    }

    fn candidate(&self, _live_path: &Path) -> PathBuf {
        self.document_dir
            .join(&self.subdirectory)
            .join(&self.file_name)
    }
}

/// `<document_dir>/<file_name>`.
#[derive(Debug, Clone)]
pub struct DocumentRoot {
    pub document_dir: PathBuf,
    pub file_name: String,
}

impl LocateStrategy for DocumentRoot {
    fn label(&self) -> String {
        self.file_name.clone()
    }

    fn candidate(&self, _live_path: &Path) -> PathBuf {
        self.document_dir.join(&self.file_name)
    }
}

/// A candidate that passed the existence and size checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedFile {
    pub label: String,
    pub path: PathBuf,
    pub size: u64,
}

/// Filesystem metadata of one path, for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct PathProbe {
    pub label: String,
    pub path: PathBuf,
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,
}

impl PathProbe {
    /// Stat `path` without failing.
    #[must_use]
    pub fn of(label: impl Into<String>, path: &Path) -> Self {
        let meta = fs::metadata(path).ok().filter(fs::Metadata::is_file);
        Self {
            label: label.into(),
            path: path.to_path_buf(),
            exists: meta.is_some(),
            size: meta.as_ref().map(fs::Metadata::len),
            modified: meta
                .and_then(|m| m.modified().ok())
                .map(DateTime::<Utc>::from),
        }
    }
}

/// Ordered list of locate strategies.
#[derive(Debug, Default)]
pub struct SourceLocator {
    strategies: Vec<Box<dyn LocateStrategy>>,
}

impl SourceLocator {
    /// An empty locator; add strategies with [`with`](Self::with).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The usual search order: the store path, the engine subdirectory,
    /// then the document directory itself.
    #[must_use]
    pub fn standard(document_dir: &Path, file_name: &str) -> Self {
        Self::new()
            .with(LiveDatabasePath)
            .with(EngineSubdirectory {
                document_dir: document_dir.to_path_buf(),
                subdirectory: ENGINE_SUBDIRECTORY.to_string(),
                file_name: file_name.to_string(),
            })
            .with(DocumentRoot {
                document_dir: document_dir.to_path_buf(),
                file_name: file_name.to_string(),
            })
    }

    /// Append a strategy (tried after the existing ones).
    #[must_use]
    pub fn with(mut self, strategy: impl LocateStrategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    /// Candidate paths in order, without duplicates.
    #[must_use]
    pub fn candidates(&self, live_path: &Path) -> Vec<(String, PathBuf)> {
        let mut seen: Vec<(String, PathBuf)> = Vec::with_capacity(self.strategies.len());
        for strategy in &self.strategies {
            let path = strategy.candidate(live_path);
            if !seen.iter().any(|(_, p)| *p == path) {
                seen.push((strategy.label(), path));
            }
        }
        seen
    }

    /// First candidate that exists with a non-zero size.
    ///
    /// # Errors
    ///
    /// Returns every searched path when nothing matched.
    pub fn locate(&self, live_path: &Path) -> Result<LocatedFile, Vec<PathBuf>> {
        let candidates = self.candidates(live_path);

        for (label, path) in &candidates {
            let size = fs::metadata(path)
                .ok()
                .filter(fs::Metadata::is_file)
                .map_or(0, |m| m.len());
            debug!(path = %path.display(), size, "Probing database location");

            if size > 0 {
                return Ok(LocatedFile {
                    label: label.clone(),
                    path: path.clone(),
                    size,
                });
            }
        }

        Err(candidates.into_iter().map(|(_, p)| p).collect())
    }

    /// Metadata for every candidate.
    #[must_use]
    pub fn probe(&self, live_path: &Path) -> Vec<PathProbe> {
        self.candidates(live_path)
            .into_iter()
            .map(|(label, path)| PathProbe::of(label, &path))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_standard_order() {
        let locator = SourceLocator::standard(Path::new("/docs"), "todos.db");
        let paths: Vec<PathBuf> = locator
            .candidates(Path::new("/elsewhere/todos.db"))
            .into_iter()
            .map(|(_, p)| p)
            .collect();

        assert_eq!(
            paths,
            vec![
                PathBuf::from("/elsewhere/todos.db"),
                PathBuf::from("/docs/SQLite/todos.db"),
                PathBuf::from("/docs/todos.db"),
            ]
        );
    }

    #[test]
    fn test_duplicate_candidates_are_collapsed() {
        let locator = SourceLocator::standard(Path::new("/docs"), "todos.db");
        let candidates = locator.candidates(Path::new("/docs/todos.db"));
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].0, "store path");
    }

    #[test]
    fn test_first_non_empty_candidate_wins() {
        let dir = TempDir::new().unwrap();
        let docs = dir.path();
        fs::create_dir_all(docs.join("SQLite")).unwrap();

        // Empty file in the engine subdirectory is skipped
        fs::write(docs.join("SQLite").join("todos.db"), b"").unwrap();
        fs::write(docs.join("todos.db"), b"SQLite format 3\0").unwrap();

        let locator = SourceLocator::standard(docs, "todos.db");
        let found = locator.locate(&docs.join("missing.db")).unwrap();

        assert_eq!(found.path, docs.join("todos.db"));
        assert_eq!(found.size, 16);
        assert_eq!(found.label, "todos.db");
    }

    #[test]
    fn test_nothing_found_reports_all_searched() {
        let dir = TempDir::new().unwrap();
        let locator = SourceLocator::standard(dir.path(), "todos.db");

        let searched = locator.locate(&dir.path().join("gone.db")).unwrap_err();
        assert_eq!(searched.len(), 3);
    }

    #[test]
    fn test_directories_are_not_candidates() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("todos.db")).unwrap();

        let locator = SourceLocator::new().with(DocumentRoot {
            document_dir: dir.path().to_path_buf(),
            file_name: "todos.db".to_string(),
        });
        assert!(locator.locate(Path::new("/unused")).is_err());
    }

    #[test]
    fn test_probe_reports_metadata() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("todos.db"), b"12345").unwrap();

        let probes = SourceLocator::standard(dir.path(), "todos.db")
            .probe(&dir.path().join("todos.db"));

        assert!(probes[0].exists);
        assert_eq!(probes[0].size, Some(5));
        assert!(probes[0].modified.is_some());
        assert!(!probes[1].exists);
        assert_eq!(probes[1].size, None);
    }
}

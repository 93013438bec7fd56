//! Handing a snapshot to a share mechanism.
//!
//! A share target is probed with `is_available` before it is invoked.

use std::env;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Serialize;
use tracing::{debug, info};

/// MIME type announced for database snapshots.
pub const SQLITE_MIME_TYPE: &str = "application/x-sqlite3";

/// Uniform type identifier announced for database snapshots.
pub const SQLITE_UTI: &str = "public.database";

/// What is being shared.
#[derive(Debug, Clone, Serialize)]
pub struct ShareRequest {
    pub path: PathBuf,
    pub mime_type: &'static str,
    pub dialog_title: String,
    pub uti: &'static str,
}

impl ShareRequest {
    /// Request for a database snapshot called `file_name`.
    #[must_use]
    pub fn for_snapshot(path: &Path, file_name: &str) -> Self {
        Self {
            path: path.to_path_buf(),
            mime_type: SQLITE_MIME_TYPE,
            dialog_title: format!("Export {file_name}"),
            uti: SQLITE_UTI,
        }
    }
}

/// A share mechanism.
pub trait ShareTarget: fmt::Debug {
    /// Name for logs and output.
    fn name(&self) -> String;

    /// Whether the mechanism can be used right now.
    fn is_available(&self) -> bool;

    /// Share the file.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the mechanism fails.
    fn share(&self, request: &ShareRequest) -> io::Result<()>;
}

/// Copies snapshots into an outbox directory (synced folder, mount, ...).
#[derive(Debug, Clone)]
pub struct DirectoryShare {
    outbox: PathBuf,
}

impl DirectoryShare {
    #[must_use]
    pub fn new(outbox: impl Into<PathBuf>) -> Self {
        Self {
            outbox: outbox.into(),
        }
    }
}

impl ShareTarget for DirectoryShare {
    fn name(&self) -> String {
        format!("directory {}", self.outbox.display())
    }

    fn is_available(&self) -> bool {
        // Usable unless something other than a directory sits there
        !self.outbox.exists() || self.outbox.is_dir()
    }

    fn share(&self, request: &ShareRequest) -> io::Result<()> {
        let file_name = request
            .path
            .file_name()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "snapshot has no file name"))?;

        fs::create_dir_all(&self.outbox)?;
        let dest = self.outbox.join(file_name);
        fs::copy(&request.path, &dest)?;
        info!(dest = %dest.display(), "Snapshot shared to directory");
        Ok(())
    }
}

/// Runs an external program with the snapshot path as its last argument.
///
/// The MIME type and dialog title are passed as `TODOS_SHARE_MIME` and
/// `TODOS_SHARE_TITLE`.
#[derive(Debug, Clone)]
pub struct CommandShare {
    program: String,
    args: Vec<String>,
}

impl CommandShare {
    #[must_use]
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Split a command line on whitespace: program, then arguments.
    #[must_use]
    pub fn parse(command_line: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace().map(String::from);
        let program = parts.next()?;
        Some(Self::new(program, parts.collect()))
    }
}

impl ShareTarget for CommandShare {
    fn name(&self) -> String {
        format!("command {}", self.program)
    }

    fn is_available(&self) -> bool {
        find_program(&self.program).is_some()
    }

    fn share(&self, request: &ShareRequest) -> io::Result<()> {
        debug!(program = %self.program, path = %request.path.display(), "Running share command");
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(&request.path)
            .env("TODOS_SHARE_MIME", request.mime_type)
            .env("TODOS_SHARE_TITLE", &request.dialog_title)
            .status()?;

        if status.success() {
            Ok(())
        } else {
            Err(io::Error::other(format!("{} exited with {status}", self.program)))
        }
    }
}

/// Desktop opener of the current platform (`open` on macOS, `xdg-open`
/// elsewhere). Unavailable when the program is not on `PATH`.
#[must_use]
pub fn platform_share() -> CommandShare {
    let program = if cfg!(target_os = "macos") {
        "open"
    } else {
        "xdg-open"
    };
    CommandShare::new(program, Vec::new())
}

/// A platform without a share mechanism.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoShare;

impl ShareTarget for NoShare {
    fn name(&self) -> String {
        "none".to_string()
    }

    fn is_available(&self) -> bool {
        false
    }

    fn share(&self, _request: &ShareRequest) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::Unsupported, "sharing is not available"))
    }
}

/// Resolve `program` the way a shell would: as a path if it has a
/// separator, otherwise by searching `PATH`.
fn find_program(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }

    env::var_os("PATH").and_then(|paths| {
        env::split_paths(&paths)
            .map(|dir| dir.join(program))
            .find(|p| p.is_file())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_request_for_snapshot() {
        let req = ShareRequest::for_snapshot(Path::new("/c/todos_backup_x.db"), "todos_backup_x.db");
        assert_eq!(req.mime_type, "application/x-sqlite3");
        assert_eq!(req.uti, "public.database");
        assert_eq!(req.dialog_title, "Export todos_backup_x.db");
    }

    #[test]
    fn test_directory_share_copies_file() {
        let dir = TempDir::new().unwrap();
        let snapshot = dir.path().join("todos_backup_x.db");
        fs::write(&snapshot, b"data").unwrap();

        let outbox = dir.path().join("outbox");
        let target = DirectoryShare::new(&outbox);
        assert!(target.is_available());

        target
            .share(&ShareRequest::for_snapshot(&snapshot, "todos_backup_x.db"))
            .unwrap();
        assert_eq!(fs::read(outbox.join("todos_backup_x.db")).unwrap(), b"data");
    }

    #[test]
    fn test_directory_share_unavailable_over_file() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("outbox");
        fs::write(&blocker, b"").unwrap();

        assert!(!DirectoryShare::new(blocker).is_available());
    }

    #[test]
    fn test_no_share_is_unavailable() {
        assert!(!NoShare.is_available());
    }

    #[test]
    fn test_command_parse() {
        let cmd = CommandShare::parse("xdg-open --verbose").unwrap();
        assert_eq!(cmd.program, "xdg-open");
        assert_eq!(cmd.args, vec!["--verbose"]);
        assert!(CommandShare::parse("   ").is_none());
    }

    #[test]
    fn test_platform_share_names_opener() {
        let name = platform_share().name();
        assert!(name == "command open" || name == "command xdg-open", "{name}");
    }

    #[test]
    fn test_missing_program_is_unavailable() {
        let cmd = CommandShare::new("definitely-not-a-real-share-tool-42", vec![]);
        assert!(!cmd.is_available());
    }

    #[cfg(unix)]
    #[test]
    fn test_command_share_runs_program() {
        let cmd = CommandShare::new("/bin/sh", vec!["-c".into(), "test -f \"$0\"".into()]);
        assert!(cmd.is_available());

        let dir = TempDir::new().unwrap();
        let snapshot = dir.path().join("s.db");
        fs::write(&snapshot, b"x").unwrap();
        cmd.share(&ShareRequest::for_snapshot(&snapshot, "s.db")).unwrap();

        let missing = dir.path().join("missing.db");
        assert!(cmd.share(&ShareRequest::for_snapshot(&missing, "missing.db")).is_err());
    }
}

//! Integrity check command.

use super::{print_json, Workspace};
use crate::error::{Error, Result};
use colored::Colorize;
use std::path::Path;

/// Run `PRAGMA integrity_check` and report the result.
///
/// # Errors
///
/// Returns `Error::IntegrityCheck` when the database is not healthy, after
/// the report has been printed.
pub fn execute(db: Option<&Path>, cache_dir: Option<&Path>, json: bool) -> Result<()> {
    let mut store = Workspace::resolve(db, cache_dir)?.open_store()?;
    let report = store.check_integrity()?;

    if json {
        print_json(&report)?;
    } else if report.healthy {
        println!("{} {}", "ok".green().bold(), store.path().display());
    } else {
        println!("{} {}", "corrupt".red().bold(), store.path().display());
        for message in &report.messages {
            println!("  {message}");
        }
    }

    if report.healthy {
        Ok(())
    } else {
        Err(Error::IntegrityCheck(report.messages.join("; ")))
    }
}

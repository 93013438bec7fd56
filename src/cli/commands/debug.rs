//! Storage diagnostics command.

use super::{print_json, Workspace};
use crate::error::Result;
use crate::export::{debug_paths, PathProbe};
use colored::Colorize;
use std::path::Path;

/// Print storage locations, candidate files, snapshots and store contents.
///
/// # Errors
///
/// Returns an error if the store cannot be opened or read.
pub fn execute(db: Option<&Path>, cache_dir: Option<&Path>, json: bool) -> Result<()> {
    let workspace = Workspace::resolve(db, cache_dir)?;
    let mut store = workspace.open_store()?;
    let report = debug_paths(
        &mut store,
        &workspace.paths.locator(),
        &workspace.paths.document_dir,
        &workspace.paths.cache_dir,
    )?;

    if json {
        return print_json(&report);
    }

    println!("{}", "Locations".cyan().bold());
    println!("  Documents: {}", report.document_dir.display());
    println!("  Cache:     {}", report.cache_dir.display());
    println!("  Database:  {}", report.database.display());
    println!("  Connection: {}", report.connection);
    println!();

    println!("{}", "Candidates".cyan().bold());
    for probe in &report.candidates {
        print_probe(probe);
    }
    println!();

    println!("{} ({})", "Snapshots".cyan().bold(), report.snapshots.len());
    for probe in &report.snapshots {
        print_probe(probe);
    }
    println!();

    println!("{} ({})", "Tasks".cyan().bold(), report.task_count);
    for task in &report.tasks {
        println!("  {}  {}", task.id.to_string().dimmed(), task.title);
    }

    Ok(())
}

fn print_probe(probe: &PathProbe) {
    let marker = if probe.exists {
        "✓".green()
    } else {
        "✗".red()
    };
    let size = probe
        .size
        .map_or_else(String::new, |s| format!(" ({s} bytes)"));
    let modified = probe
        .modified
        .map_or_else(String::new, |m| format!(" {}", m.format("%Y-%m-%d %H:%M:%S")));

    println!(
        "  {marker} {} {}{size}{}",
        probe.label.dimmed(),
        probe.path.display(),
        modified.dimmed()
    );
}

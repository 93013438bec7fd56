//! Task commands: add, update, delete, list.

use super::{print_json, Workspace};
use crate::error::Result;
use crate::model::Task;
use crate::validate::{parse_id, validate_title};
use colored::Colorize;
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct ChangeOutput<'a> {
    id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    /// Rows changed; 0 when the id does not exist.
    changed: usize,
}

#[derive(Serialize)]
struct ListOutput<'a> {
    tasks: &'a [Task],
    count: usize,
}

/// Add a task.
///
/// # Errors
///
/// Returns `Error::InvalidArgument` for a blank title, or a storage error.
pub fn execute_add(db: Option<&Path>, cache_dir: Option<&Path>, title: &str, json: bool) -> Result<()> {
    let title = validate_title(title)?;
    let mut store = Workspace::resolve(db, cache_dir)?.open_store()?;
    let task = store.add(&title)?;

    if json {
        print_json(&task)?;
    } else {
        println!("{} {} {}", "Added".green(), task.id.to_string().dimmed(), task.title);
    }
    Ok(())
}

/// Change a task's title. An unknown id is reported, not an error.
///
/// # Errors
///
/// Returns `Error::InvalidArgument` for a bad id or blank title, or a
/// storage error.
pub fn execute_update(
    db: Option<&Path>,
    cache_dir: Option<&Path>,
    id: &str,
    title: &str,
    json: bool,
) -> Result<()> {
    let id = parse_id(id)?;
    let title = validate_title(title)?;
    let mut store = Workspace::resolve(db, cache_dir)?.open_store()?;
    let changed = store.update(id, &title)?;

    if json {
        print_json(&ChangeOutput {
            id,
            title: Some(&title),
            changed,
        })?;
    } else if changed == 0 {
        println!("{} no task with id {id}", "Unchanged:".yellow());
    } else {
        println!("{} {} {title}", "Updated".green(), id.to_string().dimmed());
    }
    Ok(())
}

/// Delete a task. An unknown id is reported, not an error.
///
/// # Errors
///
/// Returns `Error::InvalidArgument` for a bad id, or a storage error.
pub fn execute_delete(db: Option<&Path>, cache_dir: Option<&Path>, id: &str, json: bool) -> Result<()> {
    let id = parse_id(id)?;
    let mut store = Workspace::resolve(db, cache_dir)?.open_store()?;
    let changed = store.delete(id)?;

    if json {
        print_json(&ChangeOutput {
            id,
            title: None,
            changed,
        })?;
    } else if changed == 0 {
        println!("{} no task with id {id}", "Unchanged:".yellow());
    } else {
        println!("{} {}", "Deleted".green(), id.to_string().dimmed());
    }
    Ok(())
}

/// List every task.
///
/// # Errors
///
/// Returns a storage error if the tasks cannot be loaded.
pub fn execute_list(db: Option<&Path>, cache_dir: Option<&Path>, json: bool) -> Result<()> {
    let mut store = Workspace::resolve(db, cache_dir)?.open_store()?;
    let tasks = store.list_all()?;

    if json {
        return print_json(&ListOutput {
            tasks: &tasks,
            count: tasks.len(),
        });
    }

    if tasks.is_empty() {
        println!("No tasks.");
        return Ok(());
    }

    for task in &tasks {
        println!("{}  {}", task.id.to_string().dimmed(), task.title);
    }
    println!();
    println!("{} task(s)", tasks.len());
    Ok(())
}

//! Remote list command.

use super::print_json;
use crate::config::{load_config, resolve_api_url};
use crate::error::{Error, Result};
use crate::remote::RemoteClient;
use colored::Colorize;

/// Fetch and print the remote todo list. Nothing is written locally.
///
/// # Errors
///
/// Returns `Error::Fetch` if the request fails or the server answers with a
/// non-success status.
pub fn execute(url: Option<&str>, json: bool) -> Result<()> {
    let config = load_config()?;
    let client = RemoteClient::new(resolve_api_url(url, &config));

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| Error::Other(format!("Failed to create async runtime: {e}")))?;
    let todos = rt.block_on(client.fetch_todos())?;

    if json {
        return print_json(&todos);
    }

    if todos.is_empty() {
        println!("No remote todos.");
        return Ok(());
    }

    for todo in &todos {
        let mark = if todo.completed {
            "[x]".green()
        } else {
            "[ ]".normal()
        };
        println!("{mark} {}  {}", todo.id.to_string().dimmed(), todo.title);
    }
    Ok(())
}

//! CLI definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for commands.
#[derive(ValueEnum, Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text (default)
    #[default]
    Table,
    /// JSON (same as --json)
    Json,
}

pub mod commands;

/// Offline todo list with consistent SQLite snapshot export
#[derive(Parser, Debug)]
#[command(name = "todos", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database path (default: <platform data dir>/todos.db)
    #[arg(long, global = true, env = "TODOS_DB")]
    pub db: Option<PathBuf>,

    /// Snapshot directory (default: platform cache dir)
    #[arg(long, global = true, env = "TODOS_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Output format (table, json)
    #[arg(long, value_enum, global = true, default_value_t)]
    pub format: OutputFormat,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress log output (errors are still printed)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the database and apply the schema
    Init {
        /// Delete an existing database and start over
        #[arg(long)]
        force: bool,
    },

    /// Add a task
    Add {
        /// Task title
        title: String,
    },

    /// Change the title of a task
    Update {
        /// Task id
        id: String,

        /// New title
        title: String,
    },

    /// Delete a task
    Delete {
        /// Task id
        id: String,
    },

    /// List all tasks
    List,

    /// Export a standalone snapshot of the database
    ///
    /// Without a share flag the snapshot goes to the configured share
    /// target, else to the platform opener (`xdg-open` or `open`).
    Export(ExportArgs),

    /// Run the SQLite integrity check
    Check,

    /// Show storage locations, snapshots and store contents
    Debug,

    /// Show the remote todo list (read-only)
    Fetch {
        /// Base URL of the remote API
        #[arg(long, env = "TODOS_API_URL")]
        url: Option<String>,
    },

    /// Print version information
    Version,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[derive(Args, Debug, Default)]
pub struct ExportArgs {
    /// Copy the snapshot into this directory after export
    #[arg(long, conflicts_with_all = ["share_command", "no_share"])]
    pub share_dir: Option<PathBuf>,

    /// Run this command with the snapshot path as its last argument
    #[arg(long, conflicts_with = "no_share")]
    pub share_command: Option<String>,

    /// Only write the snapshot; skip sharing
    #[arg(long)]
    pub no_share: bool,
}

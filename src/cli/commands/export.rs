//! Snapshot export command.

use super::{print_json, Workspace};
use crate::cli::ExportArgs;
use crate::error::{Error, Result};
use crate::export::{platform_share, CommandShare, DirectoryShare, ShareTarget, SnapshotExporter};
use colored::Colorize;
use std::path::Path;
use tracing::debug;

/// Execute the export command.
///
/// # Errors
///
/// Returns `Error::Export` with the failure reason; the store connection is
/// restored before returning.
pub fn execute(
    db: Option<&Path>,
    cache_dir: Option<&Path>,
    args: &ExportArgs,
    json: bool,
) -> Result<()> {
    let workspace = Workspace::resolve(db, cache_dir)?;
    let mut store = workspace.open_store()?;

    let share = share_target(args, &workspace)?;
    match &share {
        Some(target) => debug!(target = %target.name(), "Share target selected"),
        None => debug!("Sharing turned off"),
    }

    let exporter = SnapshotExporter::new(&workspace.paths.cache_dir, workspace.paths.locator())
        .with_settle(workspace.config.settle_policy())
        .with_share_target(share);

    let report = exporter.export(&mut store)?;

    if json {
        return print_json(&report);
    }

    println!("{} {}", "Exported".green().bold(), report.file_name);
    println!("  Path:   {}", report.path.display());
    println!("  Size:   {} bytes", report.file_size);
    println!("  Tasks:  {}", report.row_count);
    println!("  SHA256: {}", report.sha256.dimmed());
    if report.shared {
        println!("  {}", "Shared".cyan());
    }
    Ok(())
}

/// Share target from flags, then the config file, then the platform opener.
///
/// `None` only for `--no-share`.
fn share_target(args: &ExportArgs, workspace: &Workspace) -> Result<Option<Box<dyn ShareTarget>>> {
    if args.no_share {
        return Ok(None);
    }

    if let Some(dir) = &args.share_dir {
        return Ok(Some(Box::new(DirectoryShare::new(dir))));
    }

    if let Some(command) = &args.share_command {
        let target = CommandShare::parse(command)
            .ok_or_else(|| Error::InvalidArgument("share command must not be blank".to_string()))?;
        return Ok(Some(Box::new(target)));
    }

    Ok(Some(
        workspace
            .config
            .share_target()
            .unwrap_or_else(|| Box::new(platform_share())),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{resolve_paths, TodosConfig};
    use std::path::PathBuf;

    fn workspace(config: TodosConfig) -> Workspace {
        let paths = resolve_paths(
            Some(Path::new("/docs/todos.db")),
            Some(Path::new("/cache")),
            &config,
        )
        .unwrap();
        Workspace { config, paths }
    }

    #[test]
    fn test_no_share_ignores_config() {
        let ws = workspace(TodosConfig {
            share_dir: Some(PathBuf::from("/outbox")),
            ..TodosConfig::default()
        });
        let args = ExportArgs {
            no_share: true,
            ..ExportArgs::default()
        };

        assert!(share_target(&args, &ws).unwrap().is_none());
    }

    #[test]
    fn test_flag_overrides_config() {
        let ws = workspace(TodosConfig {
            share_command: Some("xdg-open".to_string()),
            ..TodosConfig::default()
        });
        let args = ExportArgs {
            share_dir: Some(PathBuf::from("/outbox")),
            ..ExportArgs::default()
        };

        let target = share_target(&args, &ws).unwrap().unwrap();
        assert_eq!(target.name(), "directory /outbox");
    }

    #[test]
    fn test_config_target_used_by_default() {
        let ws = workspace(TodosConfig {
            share_command: Some("xdg-open".to_string()),
            ..TodosConfig::default()
        });

        let target = share_target(&ExportArgs::default(), &ws).unwrap().unwrap();
        assert_eq!(target.name(), "command xdg-open");
    }

    #[test]
    fn test_platform_opener_without_config() {
        let ws = workspace(TodosConfig::default());

        let target = share_target(&ExportArgs::default(), &ws).unwrap().unwrap();
        assert_eq!(target.name(), platform_share().name());
    }

    #[test]
    fn test_blank_share_command_rejected() {
        let ws = workspace(TodosConfig::default());
        let args = ExportArgs {
            share_command: Some("  ".to_string()),
            ..ExportArgs::default()
        };

        assert!(matches!(share_target(&args, &ws), Err(Error::InvalidArgument(_))));
    }
}

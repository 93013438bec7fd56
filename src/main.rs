//! `todos` CLI entry point.

use clap::Parser;
use std::process::ExitCode;
use todos::cli::commands;
use todos::cli::{Cli, Commands, OutputFormat};
use todos::error::Error;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    // Set up tracing based on verbosity
    init_tracing(cli.verbose, cli.quiet);

    let json = cli.json || cli.format == OutputFormat::Json;

    match run(&cli, json) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if json {
                eprintln!("{}", e.to_structured_json());
            } else if let Some(hint) = e.hint() {
                eprintln!("Error: {e}\n  Hint: {hint}");
            } else {
                eprintln!("Error: {e}");
            }
            ExitCode::from(e.exit_code())
        }
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    if quiet {
        return;
    }

    // Honor RUST_LOG if set, otherwise use verbosity flag
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug,rusqlite=info"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn run(cli: &Cli, json: bool) -> Result<(), Error> {
    let db = cli.db.as_deref();
    let cache = cli.cache_dir.as_deref();

    match &cli.command {
        Commands::Init { force } => commands::init::execute(db, cache, *force, json),

        // Tasks
        Commands::Add { title } => commands::task::execute_add(db, cache, title, json),
        Commands::Update { id, title } => {
            commands::task::execute_update(db, cache, id, title, json)
        }
        Commands::Delete { id } => commands::task::execute_delete(db, cache, id, json),
        Commands::List => commands::task::execute_list(db, cache, json),

        // Snapshot export and diagnostics
        Commands::Export(args) => commands::export::execute(db, cache, args, json),
        Commands::Check => commands::check::execute(db, cache, json),
        Commands::Debug => commands::debug::execute(db, cache, json),

        // Remote list
        Commands::Fetch { url } => commands::fetch::execute(url.as_deref(), json),

        Commands::Version => commands::version::execute(json),
        Commands::Completions { shell } => commands::completions::execute(shell),
    }
}

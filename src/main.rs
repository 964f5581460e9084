//! `tasks` - bounded task list CLI and TUI.

use std::path::Path;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tasklist::cli::Cli;
use tasklist::cmd::*;
use tasklist::db::TaskStore;
use tasklist::error::{exit_codes, StoreError};

fn main() {
    // Tracing is opt-in via RUST_LOG and writes to stderr.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("off"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let cli = Cli::parse();
    let db_path = cli.db_path();

    let result: Result<(), StoreError> = match cli.command.unwrap_or(Commands::Ui) {
        Commands::Ui => {
            cmd_ui(&db_path);
            Ok(())
        }
        Commands::Completions { shell } => {
            cmd_completions(shell);
            Ok(())
        }
        Commands::Add { title, desc, priority, due } => {
            cmd_add(&mut open_store(&db_path), title, desc, priority, due)
        }
        Commands::List { search } => {
            cmd_list(&open_store(&db_path), search);
            Ok(())
        }
        Commands::View { id } => cmd_view(&open_store(&db_path), id),
        Commands::Complete { id } => cmd_complete(&mut open_store(&db_path), id),
        Commands::Delete { id } => cmd_delete(&mut open_store(&db_path), id),
        Commands::Stats => {
            cmd_stats(&open_store(&db_path));
            Ok(())
        }
    };

    let code = match result {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            e.exit_code()
        }
    };
    std::process::exit(code);
}

/// Load the task file, reporting a damaged or unreadable file on stderr.
fn open_store(db_path: &Path) -> TaskStore {
    let (store, warning) = TaskStore::open(db_path);
    if let Some(e) = warning {
        eprintln!("warning: {e}");
        eprintln!("warning: {}", e.user_message());
    }
    store
}

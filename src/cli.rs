use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Small, file-backed task list.
/// Storage defaults to ~/.tasklist/tasks.json or a path passed via --db.
#[derive(Parser)]
#[command(name = "tasks", version, about = "Bounded task list CLI and TUI")]
pub struct Cli {
    /// Path to the JSON task file.
    #[arg(long, global = true, env = "TASKLIST_DB")]
    pub db: Option<PathBuf>,

    /// Defaults to the interactive UI when omitted.
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Resolve the task file, falling back to `$HOME/.tasklist/tasks.json`.
    pub fn db_path(&self) -> PathBuf {
        if let Some(db) = &self.db {
            return db.clone();
        }
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".tasklist").join("tasks.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_db_path_wins() {
        let cli = Cli::parse_from(["tasks", "--db", "/tmp/x.json", "list"]);
        assert_eq!(cli.db_path(), PathBuf::from("/tmp/x.json"));
        assert!(matches!(cli.command, Some(Commands::List { .. })));
    }

    #[test]
    fn test_no_subcommand_means_ui() {
        let cli = Cli::parse_from(["tasks", "--db", "t.json"]);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_default_path_under_home() {
        let cli = Cli { db: None, command: None };
        assert!(cli.db_path().ends_with(".tasklist/tasks.json"));
    }
}

//! Command implementations for the CLI interface.
//!
//! Each handler takes the already opened `TaskStore`, calls one store operation
//! and prints the outcome. Errors are returned to `main`, which reports them and
//! picks the exit code.

use std::io;
use std::path::Path;

use clap::{CommandFactory, Subcommand};
use clap_complete::{generate, Shell};

use crate::cli::Cli;
use crate::db::{parse_due_input, print_table, TaskStore, MAX_ACTIVE_TASKS};
use crate::error::{Result, StoreError};
use crate::fields::Priority;
use crate::task::NewTask;
use crate::tui::run::run_tui;

#[derive(Subcommand)]
pub enum Commands {
    /// Launch the interactive UI interface.
    Ui,

    /// Add a new task.
    Add {
        /// Short title for the task.
        title: String,
        /// Longer description.
        #[arg(long)]
        desc: Option<String>,
        /// Priority: low | medium | high.
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        /// Due date: YYYY-MM-DD, "today", "tomorrow", "friday", "next monday" or "in Nd".
        #[arg(long)]
        due: Option<String>,
    },

    /// List tasks in insertion order.
    ///
    /// The ID column is each task's position in the task file. IDs are
    /// assigned fresh on every run, so they shift after a delete.
    List {
        /// Only show tasks whose title contains this text (case-insensitive).
        #[arg(long, short)]
        search: Option<String>,
    },

    /// View a single task by ID.
    View {
        /// Task ID as shown by `list`.
        id: u64,
    },

    /// Mark a task completed.
    ///
    /// Completing an already completed task changes nothing.
    Complete {
        /// Task ID to complete.
        id: u64,
    },

    /// Delete a task by ID.
    ///
    /// Deleting a task renumbers every task listed after it. Run `list` again
    /// before deleting another task by ID.
    Delete {
        /// Task ID to delete, as shown by the latest `list`.
        id: u64,
    },

    /// Show completion progress.
    Stats,

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Launch the terminal user interface.
pub fn cmd_ui(db_path: &Path) {
    if let Err(e) = run_tui(db_path) {
        eprintln!("UI error: {e}");
        std::process::exit(1);
    }
}

/// Add a new task to the store.
pub fn cmd_add(
    store: &mut TaskStore,
    title: String,
    desc: Option<String>,
    priority: Option<Priority>,
    due: Option<String>,
) -> Result<()> {
    let due_date = match due.as_deref() {
        Some(raw) => {
            let parsed = parse_due_input(raw);
            if parsed.is_none() {
                eprintln!("Could not understand due date '{raw}'");
            }
            parsed
        }
        None => None,
    };

    let task = store.add(NewTask {
        title,
        description: desc.unwrap_or_default(),
        priority,
        due_date,
    })?;
    println!("Added task {}", task.id);
    Ok(())
}

/// List tasks, optionally filtered by title.
pub fn cmd_list(store: &TaskStore, search: Option<String>) {
    let tasks = store.filter_by_title(search.as_deref().unwrap_or(""));
    print_table(&tasks);
}

/// View detailed information about a specific task.
pub fn cmd_view(store: &TaskStore, id: u64) -> Result<()> {
    let task = store.get(id).ok_or(StoreError::NotFound(id))?;
    println!("ID: {}\n", task.id);
    println!("{}", task.detail());
    Ok(())
}

/// Mark a task completed and echo its title.
pub fn cmd_complete(store: &mut TaskStore, id: u64) -> Result<()> {
    let task = store.complete(id)?;
    println!("Completed task {}: {}", task.id, task.title);
    Ok(())
}

/// Delete a task and echo its title, so a stale ID is easy to spot.
pub fn cmd_delete(store: &mut TaskStore, id: u64) -> Result<()> {
    let task = store.delete(id)?;
    println!("Deleted task {}: {}", task.id, task.title);
    Ok(())
}

/// Print completion counts and remaining room for active tasks.
pub fn cmd_stats(store: &TaskStore) {
    let stats = store.completion_stats();
    println!(
        "Completed: {}/{} ({:.0}%)",
        stats.completed,
        stats.total,
        stats.ratio() * 100.0
    );
    println!("Active:    {}/{}", store.active_count(), MAX_ACTIVE_TASKS);
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
}

//! # tasklist
//!
//! A small, file-backed task list with a scriptable CLI and an interactive
//! terminal user interface (TUI).
//!
//! ## Key Features
//!
//! - **Bounded Focus**: at most five tasks can be open at once; finish one to add more
//! - **Plain JSON Storage**: the whole list lives in one `tasks.json` file, rewritten
//!   after every change
//! - **Two Views**: full CLI for automation + interactive TUI with search and progress
//!
//! ## Quick Start
//!
//! ```bash
//! # Launch the TUI
//! tasks
//!
//! # Add a task via CLI
//! tasks add "Write report" --desc "Q3 numbers" --priority low --due 2025-01-01
//!
//! # List, search, complete
//! tasks list --search report
//! tasks complete 1
//! ```
//!
//! Data is stored in `~/.tasklist/tasks.json` unless `--db` or `TASKLIST_DB` says otherwise.

pub mod cli;
pub mod cmd;
pub mod db;
pub mod error;
pub mod fields;
pub mod task;
pub mod tui {
    pub mod app;
    pub mod colors;
    pub mod enums;
    pub mod input;
    pub mod run;
    pub mod task_form;
    pub mod utils;
}

pub use db::{CompletionStats, TaskStore, MAX_ACTIVE_TASKS};
pub use error::{Result, StoreError};
pub use fields::Priority;
pub use task::{NewTask, Task};

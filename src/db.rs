//! Task store and persistence, plus date and formatting utilities.
//!
//! This module provides the `TaskStore` struct, which owns the ordered task list,
//! enforces the active-task limit and writes the full list back to its JSON file
//! after every mutation. It also holds the date parsing and table helpers shared
//! by the CLI and the TUI.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{Datelike, Duration, Local, NaiveDate};
use tracing::{debug, info, warn};

use crate::error::{Result, StoreError};
use crate::task::{NewTask, Task};

/// Maximum number of tasks that may be incomplete at the same time.
pub const MAX_ACTIVE_TASKS: usize = 5;

/// Completed vs total counts, used for the progress indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompletionStats {
    pub completed: usize,
    pub total: usize,
}

impl CompletionStats {
    /// Fraction of tasks completed, 0.0 for an empty list.
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

/// In-memory task list bound to its backing file.
#[derive(Debug)]
pub struct TaskStore {
    tasks: Vec<Task>,
    path: PathBuf,
    next_id: u64,
    /// Set when the backing file exists but could not be loaded; the file is
    /// copied aside before the first write replaces it, and the write is
    /// refused if the copy fails.
    corrupt_pending: bool,
}

impl TaskStore {
    /// Create an empty store that will persist to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        TaskStore {
            tasks: Vec::new(),
            path: path.into(),
            next_id: 1,
            corrupt_pending: false,
        }
    }

    /// Load the store from `path`.
    ///
    /// A missing file yields an empty store. Any other load failure also yields an
    /// empty store and is handed back alongside it; the file on disk is not touched
    /// until the first save, which keeps a copy of it first.
    pub fn open(path: impl Into<PathBuf>) -> (Self, Option<StoreError>) {
        let mut store = TaskStore::new(path);
        match load(&store.path) {
            Ok(tasks) => {
                info!(path = %store.path.display(), count = tasks.len(), "loaded tasks");
                for mut task in tasks {
                    task.id = store.allocate_id();
                    store.tasks.push(task);
                }
                (store, None)
            }
            Err(e) => {
                warn!(path = %store.path.display(), error = %e, "starting with an empty task list");
                store.corrupt_pending = true;
                (store, Some(e))
            }
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Create a task and append it to the end of the list.
    ///
    /// The active-task limit is checked before the fields are validated. On a
    /// persistence failure the task stays in memory and the error is returned.
    pub fn add(&mut self, new: NewTask) -> Result<Task> {
        if self.active_count() >= MAX_ACTIVE_TASKS {
            debug!(active = self.active_count(), "rejecting add, active limit reached");
            return Err(StoreError::CapacityExceeded { max: MAX_ACTIVE_TASKS });
        }

        let title = new.title.trim();
        if title.is_empty() {
            return Err(StoreError::Validation { field: "title" });
        }
        let description = new.description.trim();
        if description.is_empty() {
            return Err(StoreError::Validation { field: "description" });
        }
        let priority = new.priority.ok_or(StoreError::Validation { field: "priority" })?;
        let due_date = new.due_date.ok_or(StoreError::Validation { field: "dueDate" })?;

        let task = Task {
            id: self.allocate_id(),
            title: title.to_string(),
            description: description.to_string(),
            priority,
            due_date,
            completed: false,
        };
        debug!(id = task.id, title = %task.title, "added task");
        self.tasks.push(task.clone());
        self.save()?;
        Ok(task)
    }

    /// Mark a task completed.
    ///
    /// Completing an already completed task succeeds without rewriting the file.
    pub fn complete(&mut self, id: u64) -> Result<Task> {
        let task = self.get_mut(id).ok_or(StoreError::NotFound(id))?;
        if task.completed {
            debug!(id, "task already completed");
            return Ok(task.clone());
        }
        task.completed = true;
        let task = task.clone();
        debug!(id, "completed task");
        self.save()?;
        Ok(task)
    }

    /// Remove a task, preserving the order of the rest.
    pub fn delete(&mut self, id: u64) -> Result<Task> {
        let idx = self
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or(StoreError::NotFound(id))?;
        let removed = self.tasks.remove(idx);
        debug!(id, title = %removed.title, "deleted task");
        self.save()?;
        Ok(removed)
    }

    /// All tasks in insertion order.
    pub fn all(&self) -> &[Task] {
        &self.tasks
    }

    /// Get a task by ID.
    pub fn get(&self, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    fn get_mut(&mut self, id: u64) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    /// Tasks whose title contains `query`, ignoring case. A blank query matches all.
    pub fn filter_by_title(&self, query: &str) -> Vec<&Task> {
        let query = query.trim().to_lowercase();
        self.tasks
            .iter()
            .filter(|t| query.is_empty() || t.title.to_lowercase().contains(&query))
            .collect()
    }

    /// Number of tasks not yet completed.
    pub fn active_count(&self) -> usize {
        self.tasks.iter().filter(|t| !t.completed).count()
    }

    /// How many more tasks can be added before the active limit is hit.
    pub fn remaining_capacity(&self) -> usize {
        MAX_ACTIVE_TASKS.saturating_sub(self.active_count())
    }

    pub fn completion_stats(&self) -> CompletionStats {
        CompletionStats {
            completed: self.tasks.iter().filter(|t| t.completed).count(),
            total: self.tasks.len(),
        }
    }

    fn save(&mut self) -> Result<()> {
        if self.corrupt_pending {
            preserve_corrupt_file(&self.path)?;
            self.corrupt_pending = false;
        }
        persist(&self.path, &self.tasks).inspect_err(|e| {
            warn!(error = %e, "task list changed in memory but was not saved");
        })
    }
}

/// Read the task list from `path`. A missing file is an empty list.
pub fn load(path: &Path) -> Result<Vec<Task>> {
    let buf = match fs::read(path) {
        Ok(buf) => buf,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(StoreError::Persistence { path: path.to_path_buf(), source })
        }
    };
    serde_json::from_slice(&buf).map_err(|source| StoreError::CorruptStore {
        path: path.to_path_buf(),
        source,
    })
}

/// Write the full task list to `path` using atomic write (temp file + rename).
pub fn persist(path: &Path, tasks: &[Task]) -> Result<()> {
    let io_err = |source| StoreError::Persistence { path: path.to_path_buf(), source };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let data = serde_json::to_string_pretty(tasks)
        .map_err(|e| io_err(std::io::Error::new(ErrorKind::InvalidData, e)))?;

    let tmp = path.with_extension("json.tmp");
    let mut f = File::create(&tmp).map_err(io_err)?;
    f.write_all(data.as_bytes()).map_err(io_err)?;
    f.flush().map_err(io_err)?;
    fs::rename(&tmp, path).map_err(io_err)?;
    debug!(path = %path.display(), count = tasks.len(), "saved tasks");
    Ok(())
}

/// Copy an unreadable task file to `<file>.corrupt-<timestamp>`.
fn preserve_corrupt_file(path: &Path) -> Result<PathBuf> {
    let stamp = Local::now().format("%Y%m%d%H%M%S");
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".corrupt-{stamp}"));
    let backup = path.with_file_name(name);
    fs::copy(path, &backup).map_err(|source| StoreError::Persistence {
        path: backup.clone(),
        source,
    })?;
    warn!(backup = %backup.display(), "kept a copy of the unreadable task file");
    Ok(backup)
}

/// Parse human-readable due date input.
///
/// Supports:
/// - "today", "tomorrow"
/// - "monday" .. "sunday" (and short forms), "next monday", ...
/// - "end of week", "end of month"
/// - "in 3d", "in 2w"
/// - "YYYY-MM-DD" format
pub fn parse_due_input(s: &str) -> Option<NaiveDate> {
    parse_due_input_from(s, Local::now().date_naive())
}

/// Same as [`parse_due_input`] with an explicit reference date.
pub fn parse_due_input_from(s: &str, today: NaiveDate) -> Option<NaiveDate> {
    let s = s.trim().to_lowercase();

    match s.as_str() {
        "today" => return Some(today),
        "tomorrow" => return today.succ_opt(),
        "end of week" | "eow" => {
            let (_, end) = start_end_of_this_week(today);
            return Some(end);
        }
        "end of month" | "eom" => {
            let (year, month) = if today.month() == 12 {
                (today.year() + 1, 1)
            } else {
                (today.year(), today.month() + 1)
            };
            let first_of_next = NaiveDate::from_ymd_opt(year, month, 1)?;
            return Some(first_of_next - Duration::days(1));
        }
        _ => {}
    }

    if let Some(rest) = s.strip_prefix("in ") {
        if let Some(nd) = rest.strip_suffix('d') {
            if let Ok(days) = nd.trim().parse::<i64>() {
                return Duration::try_days(days).and_then(|d| today.checked_add_signed(d));
            }
        }
        if let Some(nw) = rest.strip_suffix('w') {
            if let Ok(weeks) = nw.trim().parse::<i64>() {
                return Duration::try_weeks(weeks).and_then(|d| today.checked_add_signed(d));
            }
        }
    }

    let weekdays = [
        ("monday", 0), ("tuesday", 1), ("wednesday", 2), ("thursday", 3),
        ("friday", 4), ("saturday", 5), ("sunday", 6),
        ("mon", 0), ("tue", 1), ("wed", 2), ("thu", 3),
        ("fri", 4), ("sat", 5), ("sun", 6),
    ];
    let current_day = today.weekday().num_days_from_monday() as i64;
    for (day_name, target_day) in weekdays {
        let days_ahead = (target_day + 7 - current_day) % 7;
        if s == day_name {
            return today.checked_add_signed(Duration::days(days_ahead));
        }
        if s.strip_prefix("next ") == Some(day_name) {
            return today.checked_add_signed(Duration::days(days_ahead + 7));
        }
    }

    NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()
}

/// Calculate the start and end dates of the current ISO week (Monday to Sunday).
pub fn start_end_of_this_week(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let weekday = today.weekday().num_days_from_monday() as i64;
    let start = today - Duration::days(weekday);
    (start, start + Duration::days(6))
}

/// Format a due date relative to today ("today", "tomorrow", "in 3d", "2d late").
pub fn format_due_relative(due: NaiveDate, today: NaiveDate) -> String {
    let days = (due - today).num_days();
    match days {
        0 => "today".into(),
        1 => "tomorrow".into(),
        d if d > 1 => format!("in {d}d"),
        d => format!("{}d late", -d),
    }
}

/// Print tasks in a formatted table.
pub fn print_table(tasks: &[&Task]) {
    if tasks.is_empty() {
        println!("No task added yet");
        return;
    }
    println!("{:<4} {:<10} {:<7} {:<11} {}", "ID", "Status", "Pri", "Due", "Title");
    let today = Local::now().date_naive();
    for t in tasks {
        println!(
            "{:<4} {:<10} {:<7} {:<11} {}",
            t.id,
            t.status_label(),
            t.priority,
            format_due_relative(t.due_date, today),
            truncate(&t.title, 48)
        );
    }
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::Priority;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn scratch_store() -> (tempfile::TempDir, TaskStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = TaskStore::new(dir.path().join("tasks.json"));
        (dir, store)
    }

    fn new_task(title: &str) -> NewTask {
        NewTask::new(title, "details", Priority::Medium, date(2025, 6, 1))
    }

    #[test]
    fn test_ids_are_not_reused() {
        let (_dir, mut store) = scratch_store();
        let a = store.add(new_task("a")).unwrap();
        let b = store.add(new_task("b")).unwrap();
        store.delete(b.id).unwrap();
        let c = store.add(new_task("c")).unwrap();
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(c.id, 3);
    }

    #[test]
    fn test_add_trims_fields() {
        let (_dir, mut store) = scratch_store();
        let task = store
            .add(NewTask::new("  Plan sprint ", "\tgoals\n", Priority::Low, date(2025, 1, 1)))
            .unwrap();
        assert_eq!(task.title, "Plan sprint");
        assert_eq!(task.description, "goals");
        assert!(!task.completed);
    }

    #[test]
    fn test_validation_reports_field() {
        let (_dir, mut store) = scratch_store();
        let mut missing = new_task("x");
        missing.due_date = None;
        match store.add(missing) {
            Err(StoreError::Validation { field }) => assert_eq!(field, "dueDate"),
            other => panic!("unexpected result: {other:?}"),
        }
        let mut missing = new_task("x");
        missing.priority = None;
        assert!(matches!(store.add(missing), Err(StoreError::Validation { field: "priority" })));
        assert!(matches!(
            store.add(new_task("   ")),
            Err(StoreError::Validation { field: "title" })
        ));
        assert!(store.all().is_empty());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_capacity_checked_before_validation() {
        let (_dir, mut store) = scratch_store();
        for i in 0..MAX_ACTIVE_TASKS {
            store.add(new_task(&format!("t{i}"))).unwrap();
        }
        assert_eq!(store.remaining_capacity(), 0);
        let blank = NewTask::default();
        assert!(matches!(store.add(blank), Err(StoreError::CapacityExceeded { max: 5 })));
    }

    #[test]
    fn test_completed_tasks_free_capacity() {
        let (_dir, mut store) = scratch_store();
        for i in 0..MAX_ACTIVE_TASKS {
            store.add(new_task(&format!("t{i}"))).unwrap();
        }
        store.complete(3).unwrap();
        assert_eq!(store.remaining_capacity(), 1);
        store.add(new_task("sixth")).unwrap();
        assert_eq!(store.all().len(), 6);
        assert_eq!(store.active_count(), MAX_ACTIVE_TASKS);
    }

    #[test]
    fn test_complete_keeps_order() {
        let (_dir, mut store) = scratch_store();
        store.add(new_task("a")).unwrap();
        store.add(new_task("b")).unwrap();
        store.add(new_task("c")).unwrap();
        store.complete(2).unwrap();
        let titles: Vec<_> = store.all().iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["a", "b", "c"]);
        assert!(store.get(2).unwrap().completed);
    }

    #[test]
    fn test_complete_missing() {
        let (_dir, mut store) = scratch_store();
        assert!(matches!(store.complete(42), Err(StoreError::NotFound(42))));
    }

    #[test]
    fn test_filter_is_case_insensitive() {
        let (_dir, mut store) = scratch_store();
        store.add(new_task("Write REPORT")).unwrap();
        store.add(new_task("Review report draft")).unwrap();
        store.add(new_task("Fix bug")).unwrap();
        let hits: Vec<u64> = store.filter_by_title("Report").iter().map(|t| t.id).collect();
        assert_eq!(hits, [1, 2]);
        assert!(store.filter_by_title("deploy").is_empty());
        assert_eq!(store.filter_by_title("   ").len(), 3);
    }

    #[test]
    fn test_completion_ratio() {
        assert_eq!(CompletionStats::default().ratio(), 0.0);
        let stats = CompletionStats { completed: 1, total: 4 };
        assert!((stats.ratio() - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_persistence_failure_keeps_memory_state() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "x").unwrap();
        let mut store = TaskStore::new(blocker.join("tasks.json"));

        let err = store.add(new_task("kept")).unwrap_err();
        assert!(matches!(err, StoreError::Persistence { .. }));
        assert_eq!(store.all().len(), 1);
        assert_eq!(store.all()[0].title, "kept");
    }

    #[test]
    fn test_corrupt_file_copied_before_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        fs::write(&path, "[{ not json").unwrap();

        let (mut store, err) = TaskStore::open(&path);
        assert!(matches!(err, Some(StoreError::CorruptStore { .. })));
        store.add(new_task("fresh")).unwrap();

        let backups: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|n| n.starts_with("tasks.json.corrupt-"))
            .collect();
        assert_eq!(backups.len(), 1);
        let kept = fs::read_to_string(dir.path().join(&backups[0])).unwrap();
        assert_eq!(kept, "[{ not json");
        assert_eq!(load(&path).unwrap().len(), 1);
    }

    #[test]
    fn test_non_utf8_file_is_corrupt_and_copied() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        let original: &[u8] = b"[{\"title\":\"\xff\xfe\"}]";
        fs::write(&path, original).unwrap();

        let (mut store, err) = TaskStore::open(&path);
        assert!(matches!(err, Some(StoreError::CorruptStore { .. })));
        store.add(new_task("fresh")).unwrap();

        let backup = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .find(|e| e.file_name().to_string_lossy().starts_with("tasks.json.corrupt-"))
            .unwrap();
        assert_eq!(fs::read(backup.path()).unwrap(), original);
    }

    #[test]
    fn test_unreadable_file_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        fs::create_dir(&path).unwrap();

        let (mut store, err) = TaskStore::open(&path);
        assert!(matches!(err, Some(StoreError::Persistence { .. })));
        let err = store.add(new_task("fresh")).unwrap_err();
        assert!(matches!(err, StoreError::Persistence { .. }));
        assert!(path.is_dir());
    }

    #[test]
    fn test_parse_due_input() {
        // 2025-01-01 is a Wednesday.
        let today = date(2025, 1, 1);
        assert_eq!(parse_due_input_from("today", today), Some(today));
        assert_eq!(parse_due_input_from("Tomorrow", today), Some(date(2025, 1, 2)));
        assert_eq!(parse_due_input_from("in 3d", today), Some(date(2025, 1, 4)));
        assert_eq!(parse_due_input_from("in 2w", today), Some(date(2025, 1, 15)));
        assert_eq!(parse_due_input_from("friday", today), Some(date(2025, 1, 3)));
        assert_eq!(parse_due_input_from("wed", today), Some(today));
        assert_eq!(parse_due_input_from("next monday", today), Some(date(2025, 1, 13)));
        assert_eq!(parse_due_input_from("eow", today), Some(date(2025, 1, 5)));
        assert_eq!(parse_due_input_from("end of month", date(2024, 12, 10)), Some(date(2024, 12, 31)));
        assert_eq!(parse_due_input_from("2025-02-28", today), Some(date(2025, 2, 28)));
        assert_eq!(parse_due_input_from("someday", today), None);
    }

    #[test]
    fn test_parse_due_input_out_of_range() {
        let today = date(2025, 1, 1);
        assert_eq!(parse_due_input_from("in 99999999999d", today), None);
        assert_eq!(parse_due_input_from("in 9999999999999w", today), None);
        assert_eq!(parse_due_input_from("in -99999999999d", today), None);
        assert_eq!(parse_due_input_from("tomorrow", NaiveDate::MAX), None);
    }

    #[test]
    fn test_format_due_relative() {
        let today = date(2025, 1, 10);
        assert_eq!(format_due_relative(today, today), "today");
        assert_eq!(format_due_relative(date(2025, 1, 11), today), "tomorrow");
        assert_eq!(format_due_relative(date(2025, 1, 14), today), "in 4d");
        assert_eq!(format_due_relative(date(2025, 1, 8), today), "2d late");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
    }
}

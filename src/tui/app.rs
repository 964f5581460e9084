//! Main application logic for the terminal user interface.
//!
//! This module contains the `App` struct which holds the `TaskStore`, turns key
//! presses into store operations, and renders the list, detail pane, progress
//! gauge and dialogs. It owns no task rules; every change goes through the store
//! and the view re-queries it afterwards.

use std::io;
use std::path::Path;
use std::time::Duration;

use chrono::Local;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Gauge, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};
use tracing::debug;

use crate::{
    db::{format_due_relative, TaskStore, MAX_ACTIVE_TASKS},
    error::StoreError,
    task::Task,
    tui::{
        colors::{priority_color, DARK_GREEN, DARK_PURPLE, DARK_RED, GOLD},
        enums::{AppState, FormField},
        input::InputField,
        task_form::TaskForm,
        utils::centered_rect,
    },
};

/// Main application state for the terminal user interface.
pub struct App {
    state: AppState,
    store: TaskStore,
    task_list_state: TableState,
    filtered_tasks: Vec<u64>,
    task_form: TaskForm,
    status_message: String,
    filter_text: String,
    filter_active: bool,
    confirm_task: Option<u64>,
}

impl App {
    /// Create a new App, loading tasks from `db_path`.
    ///
    /// A task file that cannot be read leaves the list empty and shows a warning.
    pub fn new(db_path: &Path) -> Self {
        let (store, warning) = TaskStore::open(db_path);
        let mut app = Self::with_store(store);
        if let Some(e) = warning {
            app.set_status_message(e.user_message());
        }
        app
    }

    /// Create an App around an already opened store.
    pub fn with_store(store: TaskStore) -> Self {
        let mut app = App {
            state: AppState::TaskList,
            store,
            task_list_state: TableState::default(),
            filtered_tasks: Vec::new(),
            task_form: TaskForm::default(),
            status_message: String::new(),
            filter_text: String::new(),
            filter_active: false,
            confirm_task: None,
        };
        app.update_filtered_tasks();
        app
    }

    pub fn state(&self) -> AppState {
        self.state
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    /// IDs currently shown in the list, in display order.
    pub fn visible_task_ids(&self) -> &[u64] {
        &self.filtered_tasks
    }

    /// Re-run the title filter against the store, keeping the selection when possible.
    fn update_filtered_tasks(&mut self) {
        let old_selected_id = self.selected_task_id();

        self.filtered_tasks = self
            .store
            .filter_by_title(&self.filter_text)
            .into_iter()
            .map(|t| t.id)
            .collect();

        let restored = old_selected_id
            .and_then(|old_id| self.filtered_tasks.iter().position(|&id| id == old_id));
        let selection = match restored {
            Some(idx) => Some(idx),
            None if self.filtered_tasks.is_empty() => None,
            None => Some(
                self.task_list_state
                    .selected()
                    .unwrap_or(0)
                    .min(self.filtered_tasks.len() - 1),
            ),
        };
        self.task_list_state.select(selection);
    }

    /// ID of the highlighted task.
    pub fn selected_task_id(&self) -> Option<u64> {
        self.task_list_state
            .selected()
            .and_then(|idx| self.filtered_tasks.get(idx))
            .copied()
    }

    fn selected_task(&self) -> Option<&Task> {
        self.selected_task_id().and_then(|id| self.store.get(id))
    }

    fn select_task(&mut self, id: u64) {
        if let Some(idx) = self.filtered_tasks.iter().position(|&t| t == id) {
            self.task_list_state.select(Some(idx));
        }
    }

    fn set_status_message(&mut self, msg: String) {
        self.status_message = msg;
    }

    fn clear_status_message(&mut self) {
        self.status_message.clear();
    }

    /// Show a store error. Persistence failures still refresh the list because
    /// the change already happened in memory.
    fn report_error(&mut self, e: &StoreError) {
        if matches!(e, StoreError::Persistence { .. }) {
            self.update_filtered_tasks();
        }
        debug!(error = %e, "store operation rejected");
        self.set_status_message(e.user_message());
    }

    fn open_add_form(&mut self) {
        if self.store.remaining_capacity() == 0 {
            self.set_status_message(
                StoreError::CapacityExceeded { max: MAX_ACTIVE_TASKS }.user_message(),
            );
            return;
        }
        self.task_form = TaskForm::default();
        self.state = AppState::AddTask;
    }

    fn complete_selected_task(&mut self) {
        let Some(task_id) = self.selected_task_id() else {
            self.set_status_message("Select a task first.".to_string());
            return;
        };
        match self.store.complete(task_id) {
            Ok(task) => {
                self.update_filtered_tasks();
                self.set_status_message(format!("Completed '{}'", task.title));
            }
            Err(e) => self.report_error(&e),
        }
    }

    fn delete_confirmed_task(&mut self) {
        let Some(task_id) = self.confirm_task.take() else {
            return;
        };
        match self.store.delete(task_id) {
            Ok(task) => {
                self.update_filtered_tasks();
                self.set_status_message(format!("Deleted '{}'", task.title));
            }
            Err(e) => self.report_error(&e),
        }
    }

    /// Submit the add form. Returns to the list on success.
    fn create_task(&mut self) {
        if self.task_form.has_missing_fields() {
            self.set_status_message("Please fill all fields.".to_string());
            return;
        }
        let today = Local::now().date_naive();
        if self.task_form.parsed_due(today).is_none() {
            self.set_status_message(format!(
                "Could not understand due date '{}'",
                self.task_form.due.value.trim()
            ));
            return;
        }

        match self.store.add(self.task_form.to_new_task(today)) {
            Ok(task) => {
                self.state = AppState::TaskList;
                self.update_filtered_tasks();
                self.select_task(task.id);
                self.set_status_message("Task created".to_string());
            }
            Err(e @ StoreError::Persistence { .. }) => {
                self.state = AppState::TaskList;
                self.report_error(&e);
            }
            Err(e) => self.report_error(&e),
        }
    }

    /// Handle keyboard input when in the task list view.
    ///
    /// Returns true if the application should quit.
    fn handle_task_list_input(&mut self, key: KeyCode, modifiers: KeyModifiers) -> bool {
        if self.filter_active {
            match key {
                KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => return true,
                KeyCode::Esc => {
                    self.filter_active = false;
                    self.filter_text.clear();
                    self.update_filtered_tasks();
                    self.clear_status_message();
                }
                KeyCode::Enter => {
                    self.filter_active = false;
                    if self.filter_text.trim().is_empty() {
                        self.set_status_message("Filter cleared".to_string());
                    } else {
                        self.set_status_message(format!(
                            "Filter applied: '{}' ({} tasks)",
                            self.filter_text,
                            self.filtered_tasks.len()
                        ));
                    }
                }
                KeyCode::Backspace => {
                    if self.filter_text.pop().is_some() {
                        self.update_filtered_tasks();
                    }
                }
                KeyCode::Char(c) => {
                    self.filter_text.push(c);
                    self.update_filtered_tasks();
                }
                _ => {}
            }
            return false;
        }

        match key {
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => return true,
            KeyCode::Char('q') => return true,
            KeyCode::Esc => {
                if self.filter_text.is_empty() {
                    return true;
                }
                self.filter_text.clear();
                self.update_filtered_tasks();
                self.clear_status_message();
            }
            KeyCode::Up | KeyCode::Char('k') => {
                if let Some(selected) = self.task_list_state.selected() {
                    self.task_list_state.select(Some(selected.saturating_sub(1)));
                } else if !self.filtered_tasks.is_empty() {
                    self.task_list_state.select(Some(0));
                }
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if let Some(selected) = self.task_list_state.selected() {
                    if selected + 1 < self.filtered_tasks.len() {
                        self.task_list_state.select(Some(selected + 1));
                    }
                } else if !self.filtered_tasks.is_empty() {
                    self.task_list_state.select(Some(0));
                }
            }
            KeyCode::Char('a') => self.open_add_form(),
            KeyCode::Char('c') | KeyCode::Enter => self.complete_selected_task(),
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(task_id) = self.selected_task_id() {
                    self.confirm_task = Some(task_id);
                    self.state = AppState::Confirm;
                } else {
                    self.set_status_message("Select a task to delete.".to_string());
                }
            }
            KeyCode::Char('/') => {
                self.filter_active = true;
                self.set_status_message(
                    "Filter mode: type to search titles, Enter to apply, Esc to clear".to_string(),
                );
            }
            KeyCode::Char('h') | KeyCode::F(1) => self.state = AppState::Help,
            _ => {}
        }
        false
    }

    /// Handle keyboard input in the add-task form.
    fn handle_form_input(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => self.state = AppState::TaskList,
            KeyCode::Tab | KeyCode::Down => self.task_form.next_field(),
            KeyCode::BackTab | KeyCode::Up => self.task_form.prev_field(),
            KeyCode::Left => self.task_form.handle_left_right(false),
            KeyCode::Right => self.task_form.handle_left_right(true),
            KeyCode::Backspace => self.task_form.handle_backspace(),
            KeyCode::Delete => self.task_form.handle_delete(),
            KeyCode::Enter => self.create_task(),
            KeyCode::Char(c) => self.task_form.handle_char(c),
            _ => {}
        }
    }

    /// Handle keyboard input in the delete confirmation dialog.
    fn handle_confirm_input(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                self.state = AppState::TaskList;
                self.delete_confirmed_task();
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.state = AppState::TaskList;
                self.confirm_task = None;
            }
            _ => {}
        }
    }

    /// Dispatch a key event based on the current state.
    ///
    /// Returns true if the application should quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.kind != KeyEventKind::Press {
            return false;
        }
        self.clear_status_message();
        match self.state {
            AppState::TaskList => return self.handle_task_list_input(key.code, key.modifiers),
            AppState::AddTask => self.handle_form_input(key.code),
            AppState::Confirm => self.handle_confirm_input(key.code),
            AppState::Help => self.state = AppState::TaskList,
        }
        false
    }

    /// Poll for and handle keyboard events.
    ///
    /// Returns true if the application should quit.
    fn handle_input(&mut self) -> io::Result<bool> {
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                return Ok(self.handle_key(key));
            }
        }
        Ok(false)
    }

    /// Render the header with the backing file and active-task count.
    fn render_header(&self, f: &mut Frame, area: Rect) {
        let header_text = vec![Line::from(vec![
            Span::styled("TASK LIST", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled(
                format!(
                    "File: {}  Active: {}/{}",
                    self.store.path().display(),
                    self.store.active_count(),
                    MAX_ACTIVE_TASKS
                ),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
            ),
        ])];

        let header_block = Paragraph::new(header_text)
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Center);
        f.render_widget(header_block, area);
    }

    /// Render the task table, or a placeholder when there is nothing to show.
    fn render_task_list(&mut self, f: &mut Frame, area: Rect) {
        let title = if self.filter_text.is_empty() {
            format!("Tasks ({}) - Press 'h' for help", self.store.all().len())
        } else {
            format!(
                "Tasks ({}/{}) matching '{}'",
                self.filtered_tasks.len(),
                self.store.all().len(),
                self.filter_text
            )
        };
        let block = Block::default().borders(Borders::ALL).title(title);

        if self.store.all().is_empty() {
            let placeholder = Paragraph::new("No task added yet")
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center)
                .block(block);
            f.render_widget(placeholder, area);
            return;
        }

        let today = Local::now().date_naive();
        let header = Row::new(["ID", "Status", "Priority", "Due", "Title"].map(|h| {
            Cell::from(h).style(Style::default().add_modifier(Modifier::BOLD))
        }))
        .style(Style::default().bg(DARK_PURPLE).fg(Color::White))
        .height(1);

        let rows: Vec<Row> = self
            .filtered_tasks
            .iter()
            .filter_map(|&id| self.store.get(id))
            .map(|task| {
                let style = if task.completed {
                    Style::default().fg(Color::DarkGray)
                } else {
                    Style::default().fg(Color::White)
                };
                let priority_style = if task.completed {
                    style
                } else {
                    Style::default().fg(priority_color(task.priority))
                };
                Row::new(vec![
                    Cell::from(task.id.to_string()),
                    Cell::from(task.status_label()),
                    Cell::from(task.priority.as_str()).style(priority_style),
                    Cell::from(format_due_relative(task.due_date, today)),
                    Cell::from(task.to_string()),
                ])
                .style(style)
            })
            .collect();

        let widths = [
            Constraint::Length(4),  // ID
            Constraint::Length(10), // Status
            Constraint::Length(9),  // Priority
            Constraint::Length(10), // Due
            Constraint::Min(20),    // Title
        ];

        let table = Table::new(rows, widths)
            .header(header)
            .block(block)
            .row_highlight_style(Style::default().bg(Color::Gray).fg(Color::Black))
            .highlight_symbol(">> ");

        f.render_stateful_widget(table, area, &mut self.task_list_state);
    }

    /// Render the detail pane for the highlighted task.
    fn render_task_detail(&self, f: &mut Frame, area: Rect) {
        let text = self
            .selected_task()
            .map(Task::detail)
            .unwrap_or_else(|| "Select a task to see its details.".to_string());
        let detail = Paragraph::new(text)
            .block(Block::default().borders(Borders::ALL).title("Details"))
            .wrap(Wrap { trim: false });
        f.render_widget(detail, area);
    }

    /// Render the completion progress gauge.
    fn render_progress(&self, f: &mut Frame, area: Rect) {
        let stats = self.store.completion_stats();
        let gauge = Gauge::default()
            .block(Block::default().borders(Borders::ALL).title("Progress"))
            .gauge_style(Style::default().fg(DARK_GREEN).bg(Color::Black))
            .ratio(stats.ratio())
            .label(format!(
                "{}/{} completed ({:.0}%)",
                stats.completed,
                stats.total,
                stats.ratio() * 100.0
            ));
        f.render_widget(gauge, area);
    }

    fn render_input(f: &mut Frame, area: Rect, field: FormField, input: &InputField) {
        let border_style = if input.active {
            Style::default().fg(GOLD)
        } else {
            Style::default()
        };
        let widget = Paragraph::new(input.value.as_str()).block(
            Block::default()
                .borders(Borders::ALL)
                .title(field.label())
                .border_style(border_style),
        );
        f.render_widget(widget, area);
        if input.active {
            let x = area.x + 1 + input.cursor as u16;
            f.set_cursor_position((x.min(area.right().saturating_sub(2)), area.y + 1));
        }
    }

    /// Render the add-task form as a centred popup.
    fn render_task_form(&self, f: &mut Frame, area: Rect) {
        let area = centered_rect(60, 70, area);
        f.render_widget(Clear, area);
        let outer = Block::default()
            .borders(Borders::ALL)
            .title(format!(
                "Add Task ({} of {} slots free)",
                self.store.remaining_capacity(),
                MAX_ACTIVE_TASKS
            ));
        let inner = outer.inner(area);
        f.render_widget(outer, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Title
                Constraint::Length(3), // Description
                Constraint::Length(3), // Priority
                Constraint::Length(3), // Due Date
                Constraint::Min(1),    // Instructions
            ])
            .split(inner);

        let form = &self.task_form;
        let current = form.current_field;
        Self::render_input(f, chunks[0], FormField::Title, &form.title);
        Self::render_input(f, chunks[1], FormField::Description, &form.description);

        let priority_style = if current == FormField::Priority {
            Style::default().fg(GOLD)
        } else {
            Style::default()
        };
        let label_color = form.selected_priority().map_or(Color::DarkGray, priority_color);
        let priority_text = Span::styled(
            format!("< {} >", form.priority_label()),
            Style::default().fg(label_color),
        );
        let priority_selector = Paragraph::new(Line::from(priority_text)).block(
            Block::default()
                .borders(Borders::ALL)
                .title(FormField::Priority.label())
                .border_style(priority_style),
        );
        f.render_widget(priority_selector, chunks[2]);

        Self::render_input(f, chunks[3], FormField::DueDate, &form.due);

        let instructions = Paragraph::new(vec![
            Line::from("Tab/↑/↓ move between fields, ←/→ change priority"),
            Line::from("Due: YYYY-MM-DD, today, tomorrow, friday, next monday, in 3d"),
            Line::from("Enter to create, Esc to cancel"),
        ])
        .style(Style::default().fg(Color::DarkGray))
        .wrap(Wrap { trim: true });
        f.render_widget(instructions, chunks[4]);
    }

    fn render_help(&self, f: &mut Frame, area: Rect) {
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let help_text = vec![
            Line::from(vec![Span::styled("Task List Help", bold)]),
            Line::from(""),
            Line::from(vec![Span::styled("Task List:", bold)]),
            Line::from("  ↑/↓, k/j     Navigate tasks"),
            Line::from("  a            Add new task"),
            Line::from("  c/Enter      Mark selected task completed"),
            Line::from("  d/Del        Delete selected task"),
            Line::from("  /            Filter tasks by title"),
            Line::from("  h/F1         Show this help"),
            Line::from("  q/Ctrl+C/Esc Quit"),
            Line::from(""),
            Line::from(vec![Span::styled("Limits:", bold)]),
            Line::from(format!(
                "  At most {MAX_ACTIVE_TASKS} tasks can be pending. Complete one to add more."
            )),
            Line::from("  Completed tasks can be deleted but not reopened."),
        ];

        let paragraph = Paragraph::new(help_text)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Help - Press any key to return"),
            )
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
    }

    /// Render a confirmation dialog for deletion.
    fn render_confirm(&self, f: &mut Frame, area: Rect) {
        let block = Block::default()
            .title("Confirm Delete")
            .borders(Borders::ALL)
            .style(Style::default().bg(DARK_RED));

        let area = centered_rect(50, 25, area);
        f.render_widget(Clear, area);

        let target = self
            .confirm_task
            .and_then(|id| self.store.get(id))
            .map(|t| format!("Delete task #{}: {}", t.id, t.title))
            .unwrap_or_default();
        let text = vec![
            Line::from(""),
            Line::from(vec![Span::styled(
                "Are you sure you want to:",
                Style::default().add_modifier(Modifier::BOLD),
            )]),
            Line::from(target),
            Line::from(""),
            Line::from("This action cannot be undone."),
            Line::from(""),
            Line::from("Press 'y' to confirm, 'n' to cancel"),
        ];

        let paragraph = Paragraph::new(text)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
    }

    /// Render the status bar at the bottom of the screen.
    fn render_status_bar(&self, f: &mut Frame, area: Rect) {
        let status_text = if !self.status_message.is_empty() {
            self.status_message.clone()
        } else if self.filter_active {
            format!("Search: {} (Esc to clear, Enter to confirm)", self.filter_text)
        } else {
            match self.state {
                AppState::TaskList => format!(
                    "Tasks: {} | a add · c complete · d delete · / search · h help",
                    self.filtered_tasks.len()
                ),
                AppState::AddTask => "Add New Task".to_string(),
                AppState::Help => "Help".to_string(),
                AppState::Confirm => "Confirm Delete".to_string(),
            }
        };

        let status = Paragraph::new(status_text)
            .style(Style::default().bg(DARK_PURPLE).fg(Color::White))
            .alignment(Alignment::Left);
        f.render_widget(status, area);
    }

    /// Main render function that dispatches to the view renderers.
    pub fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(0),    // List + details
                Constraint::Length(3), // Progress
                Constraint::Length(1), // Status bar
            ])
            .split(f.area());

        if self.state == AppState::Help {
            self.render_help(f, chunks[0].union(chunks[2]));
            self.render_status_bar(f, chunks[3]);
            return;
        }

        self.render_header(f, chunks[0]);
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[1]);
        self.render_task_list(f, body[0]);
        self.render_task_detail(f, body[1]);
        self.render_progress(f, chunks[2]);

        match self.state {
            AppState::AddTask => self.render_task_form(f, chunks[1]),
            AppState::Confirm => self.render_confirm(f, chunks[1]),
            AppState::TaskList | AppState::Help => {}
        }

        self.render_status_bar(f, chunks[3]);
    }

    /// Main event loop for the TUI application.
    ///
    /// Handles rendering and input processing until the user exits.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.handle_input()? {
                break;
            }
        }
        Ok(())
    }
}

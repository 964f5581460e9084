//! Task form handling for the terminal user interface.
//!
//! This module provides the `TaskForm` structure used to collect the four
//! creation fields, plus field navigation and conversion into a `NewTask`.

use chrono::NaiveDate;

use crate::{
    db::parse_due_input_from,
    fields::Priority,
    task::NewTask,
    tui::{enums::FormField, input::InputField},
};

/// Add-task form state.
pub struct TaskForm {
    pub title: InputField,
    pub description: InputField,
    pub due: InputField,
    /// Index into `priorities`; 0 is "not selected".
    pub priority: usize,
    pub priorities: Vec<Option<Priority>>,
    pub current_field: FormField,
}

impl Default for TaskForm {
    /// An empty form with the title field focused.
    fn default() -> Self {
        let mut form = Self {
            title: InputField::new(),
            description: InputField::new(),
            due: InputField::new(),
            priority: 0,
            priorities: std::iter::once(None)
                .chain(Priority::ALL.into_iter().map(Some))
                .collect(),
            current_field: FormField::Title,
        };
        form.update_active_field();
        form
    }
}

impl TaskForm {
    /// The text input behind the current field, if it is a text field.
    fn current_input(&mut self) -> Option<&mut InputField> {
        match self.current_field {
            FormField::Title => Some(&mut self.title),
            FormField::Description => Some(&mut self.description),
            FormField::DueDate => Some(&mut self.due),
            FormField::Priority => None,
        }
    }

    pub fn next_field(&mut self) {
        self.current_field = self.current_field.next();
        self.update_active_field();
    }

    pub fn prev_field(&mut self) {
        self.current_field = self.current_field.prev();
        self.update_active_field();
    }

    /// Update which field is currently active for editing.
    pub fn update_active_field(&mut self) {
        self.title.active = self.current_field == FormField::Title;
        self.description.active = self.current_field == FormField::Description;
        self.due.active = self.current_field == FormField::DueDate;
    }

    pub fn handle_char(&mut self, c: char) {
        if let Some(input) = self.current_input() {
            input.handle_char(c);
        }
    }

    pub fn handle_backspace(&mut self) {
        if let Some(input) = self.current_input() {
            input.handle_backspace();
        }
    }

    pub fn handle_delete(&mut self) {
        if let Some(input) = self.current_input() {
            input.handle_delete();
        }
    }

    /// Move the cursor in text fields, or cycle the priority selector.
    pub fn handle_left_right(&mut self, right: bool) {
        if self.current_field == FormField::Priority {
            let len = self.priorities.len();
            self.priority = if right {
                (self.priority + 1) % len
            } else {
                (self.priority + len - 1) % len
            };
            return;
        }
        if let Some(input) = self.current_input() {
            if right {
                input.move_cursor_right()
            } else {
                input.move_cursor_left()
            }
        }
    }

    pub fn selected_priority(&self) -> Option<Priority> {
        self.priorities.get(self.priority).copied().flatten()
    }

    /// Label for the priority selector.
    pub fn priority_label(&self) -> &'static str {
        self.selected_priority().map_or("Select", Priority::as_str)
    }

    /// Due date typed into the form, if it can be understood.
    pub fn parsed_due(&self, today: NaiveDate) -> Option<NaiveDate> {
        if self.due.is_blank() {
            None
        } else {
            parse_due_input_from(&self.due.value, today)
        }
    }

    /// True when some field is still blank or unselected.
    pub fn has_missing_fields(&self) -> bool {
        self.title.is_blank()
            || self.description.is_blank()
            || self.selected_priority().is_none()
            || self.due.is_blank()
    }

    /// Build the creation request from the current form values.
    pub fn to_new_task(&self, today: NaiveDate) -> NewTask {
        NewTask {
            title: self.title.value.clone(),
            description: self.description.value.clone(),
            priority: self.selected_priority(),
            due_date: self.parsed_due(today),
        }
    }
}

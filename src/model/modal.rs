//! Modal stack for the browser's own dialogs
//!
//! Table overlays (action menus, filter popover) live inside the table.
//! These are the full-screen dialogs the caller stacks on top of it.

/// A dialog displayed over the table
#[derive(Debug, Clone, PartialEq)]
pub enum Modal {
    /// Quit confirmation dialog
    QuitConfirm,
    /// Keyboard reference
    Help { scroll_offset: usize },
    /// Read-only view of one record
    RecordDetail { key: String },
    /// Confirmation before running a destructive row action
    ConfirmAction {
        action: String,
        key: String,
        prompt: String,
    },
}

/// A stack of modal dialogs
///
/// Only the top modal receives input.
#[derive(Debug, Default)]
pub struct ModalStack {
    stack: Vec<Modal>,
}

impl ModalStack {
    pub fn new() -> Self {
        Self { stack: Vec::new() }
    }

    pub fn push(&mut self, modal: Modal) {
        self.stack.push(modal);
    }

    pub fn pop(&mut self) -> Option<Modal> {
        self.stack.pop()
    }

    pub fn top(&self) -> Option<&Modal> {
        self.stack.last()
    }

    pub fn top_mut(&mut self) -> Option<&mut Modal> {
        self.stack.last_mut()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }
}

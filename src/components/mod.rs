//! UI Components
//!
//! Each component encapsulates its own state, event handling, and rendering logic.
//! Components communicate through Actions rather than direct state mutation.

pub mod action_menu;
pub mod confirm_dialog;
pub mod data_table;
pub mod filter_popover;
pub mod help_dialog;
pub mod layout;
pub mod pagination_bar;
pub mod record_dialog;
pub mod search;

pub use confirm_dialog::ConfirmDialog;
pub use data_table::{DataTable, TableOptions, TableProps};
pub use help_dialog::HelpDialog;
pub use layout::{calculate_app_layout, centered_popup};
pub use record_dialog::RecordDialog;

//! Intents reported by the table to its caller
//!
//! The table never mutates the dataset, pagination, committed filters or
//! selection itself. It reports what the user asked for and the caller
//! re-renders it with updated props.

use std::fmt;
use std::path::PathBuf;

use super::pagination::Location;
use super::selection::Selection;
use super::sort::SortState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableEvent {
    /// A committed filter value should change
    FilterChanged { key: String, value: String },
    /// The caller should re-query with its committed filter values
    FiltersSubmitted,
    /// Every advanced filter was reset
    FiltersCleared,
    /// Navigate to another page
    PageChanged(Location),
    /// Navigate to page 1 with a new page size
    PageSizeChanged(Location),
    /// Remote sort requested (`None` means unsorted)
    SortChanged(Option<SortState>),
    SelectionChanged(Selection),
    RowClicked { key: String, index: usize },
    /// A row action was picked from a row's menu
    ActionInvoked {
        action: String,
        key: String,
        index: usize,
    },
    Exported { path: PathBuf, rows: usize },
    ExportFailed(String),
}

impl fmt::Display for TableEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableEvent::FilterChanged { key, value } => {
                write!(f, "FilterChanged({}={:?})", key, value)
            }
            TableEvent::FiltersSubmitted => write!(f, "FiltersSubmitted"),
            TableEvent::FiltersCleared => write!(f, "FiltersCleared"),
            TableEvent::PageChanged(location) => write!(f, "PageChanged({})", location),
            TableEvent::PageSizeChanged(location) => write!(f, "PageSizeChanged({})", location),
            TableEvent::SortChanged(Some(sort)) => {
                write!(f, "SortChanged({} {})", sort.key, sort.direction.as_str())
            }
            TableEvent::SortChanged(None) => write!(f, "SortChanged(none)"),
            TableEvent::SelectionChanged(selection) => {
                write!(f, "SelectionChanged({} rows)", selection.len())
            }
            TableEvent::RowClicked { key, index } => write!(f, "RowClicked({}@{})", key, index),
            TableEvent::ActionInvoked { action, key, .. } => {
                write!(f, "ActionInvoked({} on {})", action, key)
            }
            TableEvent::Exported { path, rows } => {
                write!(f, "Exported({} rows to {})", rows, path.display())
            }
            TableEvent::ExportFailed(err) => write!(f, "ExportFailed({})", err),
        }
    }
}

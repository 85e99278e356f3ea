//! Action enum - Every user intent the browser understands
//!
//! Components map key and mouse events to Actions; the App routes each
//! Action either to its own state or to the table.

use crossterm::event::KeyEvent;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    // ─────────────────────────────────────────────────────────────────────────
    // App Lifecycle
    // ─────────────────────────────────────────────────────────────────────────
    /// Regular tick driving timers
    Tick,
    /// Terminal was resized
    Resize(u16, u16),
    /// Quit without confirmation
    ForceQuit,
    /// Open quit confirmation dialog
    OpenQuitDialog,
    /// Open keyboard reference
    OpenHelp,
    /// Close the current modal
    CloseModal,
    /// Answer yes to the current confirmation dialog
    ConfirmModal,
    /// Scroll the current modal
    ModalUp,
    ModalDown,
    /// Step back through visited locations
    HistoryBack,
    /// Step forward through visited locations
    HistoryForward,
    /// Re-run the current query
    Reload,

    // ─────────────────────────────────────────────────────────────────────────
    // Row Navigation
    // ─────────────────────────────────────────────────────────────────────────
    NextRow,
    PrevRow,
    FirstRow,
    LastRow,
    /// Click the row under the cursor
    ClickRow,

    // ─────────────────────────────────────────────────────────────────────────
    // Sorting
    // ─────────────────────────────────────────────────────────────────────────
    NextColumn,
    PrevColumn,
    /// Cycle the sort of the focused column
    SortFocusedColumn,

    // ─────────────────────────────────────────────────────────────────────────
    // Selection
    // ─────────────────────────────────────────────────────────────────────────
    /// Toggle the row under the cursor
    ToggleRowSelection,
    /// Header checkbox: select or clear every displayed row
    SelectAll,
    ClearSelection,

    // ─────────────────────────────────────────────────────────────────────────
    // Search & Filters
    // ─────────────────────────────────────────────────────────────────────────
    EnterSearchMode,
    ExitSearchMode,
    SearchInput(char),
    SearchBackspace,
    /// Submit the search box right away
    SubmitSearch,
    /// Open the advanced filter popover
    OpenFilters,

    // ─────────────────────────────────────────────────────────────────────────
    // Overlays
    // ─────────────────────────────────────────────────────────────────────────
    /// Open the action menu of the row under the cursor
    OpenRowActions,
    /// Key routed to the open overlay
    OverlayKey(KeyEvent),
    /// Pointer-down at (column, row)
    Click { column: u16, row: u16 },

    // ─────────────────────────────────────────────────────────────────────────
    // Pagination
    // ─────────────────────────────────────────────────────────────────────────
    NextPage,
    PrevPage,
    /// Jump to a page of the current window
    GoToPage(usize),
    CyclePageSize,

    // ─────────────────────────────────────────────────────────────────────────
    // Export
    // ─────────────────────────────────────────────────────────────────────────
    /// Export the selected rows
    Export,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Resize(w, h) => write!(f, "Resize({}, {})", w, h),
            Action::SearchInput(c) => write!(f, "SearchInput('{}')", c),
            Action::OverlayKey(key) => write!(f, "OverlayKey({:?})", key.code),
            Action::Click { column, row } => write!(f, "Click({}, {})", column, row),
            Action::GoToPage(page) => write!(f, "GoToPage({})", page),
            other => write!(f, "{:?}", other),
        }
    }
}

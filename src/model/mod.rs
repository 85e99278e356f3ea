//! Model layer - the state the table works on
//!
//! - `Column`, `FilterDescriptor`, `RowAction` inputs describe a table
//! - `PaginationSnapshot`, `Location`, `FilterValues`, `Selection` arrive as props
//! - `SortState` and `OpenOverlay` are interaction state owned by the table
//! - `TableEvent` is what the table reports back
//! - `ModalStack` holds the caller's dialogs

pub mod account;
pub mod column;
pub mod event;
pub mod filter;
pub mod modal;
pub mod overlay;
pub mod pagination;
pub mod selection;
pub mod sort;

// Re-export commonly used types
pub use account::{Account, AccountStatus};
pub use column::Column;
pub use event::TableEvent;
pub use filter::{FilterDescriptor, FilterKind, FilterOption, FilterValues};
pub use pagination::{Location, PaginationSnapshot};
pub use selection::Selection;
pub use sort::{SortDirection, SortMode, SortState};

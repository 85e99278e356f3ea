//! Generic data table
//!
//! Composes the toolbar (search box, filter button, export button), the
//! header row with sort arrows and the tri-state checkbox, the body rows with
//! their selection checkboxes and `⋮` triggers, the pagination bar and a
//! single floating overlay slot.
//!
//! The table holds interaction state only. Rows, pagination, committed filter
//! values and the selection arrive as `TableProps` on every call, and every
//! change the user asks for goes back to the caller as a `TableEvent`.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use serde::Serialize;
use std::time::Instant;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::action::Action;
use crate::components::action_menu::{ActionMenu, MenuOutcome, RowAction, MENU_WIDTH};
use crate::components::filter_popover::{FilterPopover, PopoverOutcome, POPOVER_WIDTH};
use crate::components::pagination_bar::{PagerTarget, PaginationBar};
use crate::components::search::DebouncedSearch;
use crate::export::{build_document, download, ExportConfig};
use crate::model::column::Column;
use crate::model::event::TableEvent;
use crate::model::filter::{split_filters, FilterDescriptor, FilterValues};
use crate::model::overlay::{Anchor, OpenOverlay, OverlayKind};
use crate::model::pagination::{Location, PaginationSnapshot};
use crate::model::selection::Selection;
use crate::model::sort::{next_sort, sorted_indices, SortMode, SortState};

const CHECKBOX_WIDTH: u16 = 3;
const SEPARATOR: &str = " │ ";
const SEPARATOR_WIDTH: u16 = 3;
const TRIGGER: &str = " ⋮ ";
const TRIGGER_WIDTH: u16 = 3;
const SEARCH_WIDTH: usize = 24;

// ═══════════════════════════════════════════════════════════════════════════════
// Options & Props
// ═══════════════════════════════════════════════════════════════════════════════

/// Behavior fixed for the life of a table
#[derive(Debug)]
pub struct TableOptions {
    pub title: String,
    /// Every column sorts, whatever it declares
    pub sortable: bool,
    pub sort_mode: SortMode,
    /// Quiet period of the search box; 0 disables auto-submit
    pub debounce_ms: u64,
    pub page_size_options: Vec<usize>,
    pub show_page_size: bool,
    pub empty_message: String,
    pub empty_icon: String,
    /// `None` hides the export button
    pub export: Option<ExportConfig>,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            title: "Records".to_string(),
            sortable: false,
            sort_mode: SortMode::Local,
            debounce_ms: 300,
            page_size_options: vec![10, 25, 50, 100],
            show_page_size: true,
            empty_message: "No records found".to_string(),
            empty_icon: "∅".to_string(),
            export: None,
        }
    }
}

/// Caller-owned state handed to the table on every call
pub struct TableProps<'a, T> {
    pub rows: &'a [T],
    pub loading: bool,
    pub pagination: Option<PaginationSnapshot>,
    /// Location the pagination navigates from
    pub location: Option<&'a Location>,
    pub filter_values: &'a FilterValues,
    pub selection: &'a Selection,
}

impl<'a, T> TableProps<'a, T> {
    pub fn new(rows: &'a [T], filter_values: &'a FilterValues, selection: &'a Selection) -> Self {
        Self {
            rows,
            loading: false,
            pagination: None,
            location: None,
            filter_values,
            selection,
        }
    }

    pub fn loading(mut self, loading: bool) -> Self {
        self.loading = loading;
        self
    }

    pub fn paginated(mut self, snapshot: PaginationSnapshot, location: &'a Location) -> Self {
        self.pagination = Some(snapshot);
        self.location = Some(location);
        self
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Hit Regions
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Hit {
    SearchBox,
    FilterButton,
    ExportButton,
    HeaderCheckbox,
    Header(usize),
    Checkbox(usize),
    Trigger(usize),
    Row(usize),
    Pager(PagerTarget),
}

/// Clickable regions recorded by the last draw
#[derive(Debug, Clone, Default)]
struct HitMap {
    toolbar: Vec<(Rect, Hit)>,
    header_checkbox: Option<Rect>,
    /// Header cell → column index
    headers: Vec<(Rect, usize)>,
    /// Per drawn row, keyed by display position
    checkboxes: Vec<(Rect, usize)>,
    triggers: Vec<(Rect, usize)>,
    rows: Vec<(Rect, usize)>,
    pager: PaginationBar,
}

impl HitMap {
    fn clear(&mut self) {
        self.toolbar.clear();
        self.header_checkbox = None;
        self.headers.clear();
        self.checkboxes.clear();
        self.triggers.clear();
        self.rows.clear();
        self.pager.clear();
    }

    fn rect_of(&self, hit: Hit) -> Option<Rect> {
        self.toolbar
            .iter()
            .find(|(_, h)| *h == hit)
            .map(|(area, _)| *area)
    }

    fn trigger_of(&self, position: usize) -> Option<Rect> {
        self.triggers
            .iter()
            .find(|(_, p)| *p == position)
            .map(|(area, _)| *area)
    }

    fn hit_at(&self, column: u16, row: u16) -> Option<Hit> {
        let at = Position::new(column, row);
        let find = |regions: &[(Rect, usize)]| {
            regions
                .iter()
                .find(|(area, _)| area.contains(at))
                .map(|(_, i)| *i)
        };

        if let Some((_, hit)) = self.toolbar.iter().find(|(area, _)| area.contains(at)) {
            return Some(*hit);
        }
        if self.header_checkbox.is_some_and(|area| area.contains(at)) {
            return Some(Hit::HeaderCheckbox);
        }
        if let Some(i) = find(&self.headers) {
            return Some(Hit::Header(i));
        }
        if let Some(p) = find(&self.checkboxes) {
            return Some(Hit::Checkbox(p));
        }
        if let Some(p) = find(&self.triggers) {
            return Some(Hit::Trigger(p));
        }
        if let Some(p) = find(&self.rows) {
            return Some(Hit::Row(p));
        }
        self.pager.target_at(column, row).map(Hit::Pager)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Overlay Slot
// ═══════════════════════════════════════════════════════════════════════════════

enum OverlayContent {
    Actions(ActionMenu),
    Filters(FilterPopover),
}

/// The one overlay a table may show at a time
struct Overlay {
    slot: OpenOverlay,
    content: OverlayContent,
}

enum OverlayInput {
    Key(KeyEvent),
    Click(u16, u16),
}

enum OverlayOutcome {
    Menu {
        outcome: MenuOutcome,
        key: String,
        index: usize,
    },
    Popover(PopoverOutcome),
}

// ═══════════════════════════════════════════════════════════════════════════════
// Data Table
// ═══════════════════════════════════════════════════════════════════════════════

pub struct DataTable<T> {
    columns: Vec<Column<T>>,
    row_key: Box<dyn Fn(&T) -> String>,
    /// The instant search channel, if any
    search_filter: Option<FilterDescriptor>,
    /// Staged through the popover
    advanced_filters: Vec<FilterDescriptor>,
    actions: Vec<RowAction<T>>,
    options: TableOptions,

    /// Display position of the cursor row
    cursor: usize,
    /// First drawn display position
    offset: usize,
    focused_column: usize,
    sort: Option<SortState>,
    search: DebouncedSearch,
    overlay: Option<Overlay>,
    /// Submit due on the next tick
    submit_pending: bool,
    hits: HitMap,
    viewport: Rect,
    status: Option<String>,
}

impl<T: Serialize> DataTable<T> {
    pub fn new(
        columns: Vec<Column<T>>,
        row_key: impl Fn(&T) -> String + 'static,
        options: TableOptions,
    ) -> Self {
        let search = DebouncedSearch::new(options.debounce_ms);
        Self {
            columns,
            row_key: Box::new(row_key),
            search_filter: None,
            advanced_filters: Vec::new(),
            actions: Vec::new(),
            options,
            cursor: 0,
            offset: 0,
            focused_column: 0,
            sort: None,
            search,
            overlay: None,
            submit_pending: false,
            hits: HitMap::default(),
            viewport: Rect::new(0, 0, 80, 24),
            status: None,
        }
    }

    /// The first `text` filter becomes the search box; the rest go to the popover
    pub fn filters(mut self, filters: Vec<FilterDescriptor>) -> Self {
        let (search, advanced) = split_filters(&filters);
        self.search_filter = search.cloned();
        self.advanced_filters = advanced.into_iter().cloned().collect();
        self
    }

    pub fn actions(mut self, actions: Vec<RowAction<T>>) -> Self {
        self.actions = actions;
        self
    }

    pub fn sort(&self) -> Option<&SortState> {
        self.sort.as_ref()
    }

    /// Restore a sort, e.g. one read back from a location
    pub fn set_sort(&mut self, sort: Option<SortState>) {
        self.sort = sort;
    }

    pub fn open_overlay(&self) -> Option<&OpenOverlay> {
        self.overlay.as_ref().map(|o| &o.slot)
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn search_value(&self) -> &str {
        self.search.value()
    }

    /// Whether every key should go to the table first
    pub fn captures_input(&self) -> bool {
        self.overlay.is_some() || self.search.editing
    }

    /// Drop all interaction state
    pub fn unmount(&mut self) {
        log::debug!("table '{}' unmounted", self.options.title);
        self.overlay = None;
        self.search.cancel();
        self.search.editing = false;
        self.submit_pending = false;
        self.hits = HitMap::default();
        self.status = None;
        self.cursor = 0;
        self.offset = 0;
    }

    /// Row indices in display order
    fn display_order(&self, rows: &[T]) -> Vec<usize> {
        match self.options.sort_mode {
            SortMode::Local => sorted_indices(rows, self.sort.as_ref()),
            SortMode::Remote => (0..rows.len()).collect(),
        }
    }

    /// Key and row index of the record drawn at `position`
    fn record_at(&self, props: &TableProps<'_, T>, position: usize) -> Option<(String, usize)> {
        let order = self.display_order(props.rows);
        let index = *order.get(position)?;
        Some(((self.row_key)(&props.rows[index]), index))
    }

    fn visible_keys(&self, rows: &[T]) -> Vec<String> {
        rows.iter().map(|r| (self.row_key)(r)).collect()
    }

    fn close_overlay(&mut self, reason: &str) {
        if let Some(overlay) = self.overlay.take() {
            log::debug!("overlay {:?} closed ({})", overlay.slot.kind, reason);
        }
    }

    /// Reconcile interaction state with fresh props
    pub fn sync(&mut self, props: &TableProps<'_, T>) {
        self.cursor = self.cursor.min(props.rows.len().saturating_sub(1));

        let vanished = match self.overlay.as_ref().map(|o| &o.slot.kind) {
            Some(OverlayKind::RowActions { row_key }) => {
                !props.rows.iter().any(|r| (self.row_key)(r) == *row_key)
            }
            _ => false,
        };
        if vanished {
            self.close_overlay("row left the dataset");
        }

        if let Some(search) = &self.search_filter {
            self.search.sync(props.filter_values.get(&search.key));
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Dispatch
    // ─────────────────────────────────────────────────────────────────────────

    /// Apply `action`, returning the intents for the caller
    pub fn dispatch(
        &mut self,
        action: Action,
        props: &TableProps<'_, T>,
        now: Instant,
    ) -> Vec<TableEvent> {
        self.sync(props);
        let len = props.rows.len();

        // The loading placeholder hides the rows these act on
        if props.loading && acts_on_rows(&action) {
            log::debug!("table '{}' ignored {} while loading", self.options.title, action);
            return Vec::new();
        }

        let events = match action {
            Action::Tick => self.tick(now),
            Action::Resize(..) => {
                self.close_overlay("resize");
                Vec::new()
            }
            Action::NextRow => {
                self.cursor = (self.cursor + 1).min(len.saturating_sub(1));
                Vec::new()
            }
            Action::PrevRow => {
                self.cursor = self.cursor.saturating_sub(1);
                Vec::new()
            }
            Action::FirstRow => {
                self.cursor = 0;
                Vec::new()
            }
            Action::LastRow => {
                self.cursor = len.saturating_sub(1);
                Vec::new()
            }
            Action::ClickRow => self.click_row(props, self.cursor),
            Action::NextColumn => {
                self.focused_column =
                    (self.focused_column + 1).min(self.columns.len().saturating_sub(1));
                Vec::new()
            }
            Action::PrevColumn => {
                self.focused_column = self.focused_column.saturating_sub(1);
                Vec::new()
            }
            Action::SortFocusedColumn => self.sort_by(self.focused_column),
            Action::ToggleRowSelection => self.toggle_row(props, self.cursor),
            Action::SelectAll => {
                let keys = self.visible_keys(props.rows);
                let next = props.selection.select_all(keys.iter().map(String::as_str));
                vec![TableEvent::SelectionChanged(next)]
            }
            Action::ClearSelection if !props.selection.is_empty() => {
                vec![TableEvent::SelectionChanged(Selection::new())]
            }
            Action::EnterSearchMode => {
                self.search.editing = self.search_filter.is_some();
                Vec::new()
            }
            Action::ExitSearchMode => {
                self.search.editing = false;
                Vec::new()
            }
            Action::SearchInput(c) => {
                self.search.push(c, now);
                self.search_changed()
            }
            Action::SearchBackspace => {
                self.search.backspace(now);
                self.search_changed()
            }
            Action::SubmitSearch => {
                self.search.cancel();
                self.search.editing = false;
                vec![TableEvent::FiltersSubmitted]
            }
            Action::OpenFilters => {
                self.open_filters(props.filter_values);
                Vec::new()
            }
            Action::OpenRowActions => {
                self.open_row_actions(props, self.cursor);
                Vec::new()
            }
            Action::OverlayKey(key) => self.overlay_input(OverlayInput::Key(key)),
            Action::Click { column, row } => self.click(props, column, row),
            Action::NextPage => match props.pagination {
                Some(snapshot) if snapshot.has_next() => self.go_to_page(props, snapshot.page + 1),
                _ => Vec::new(),
            },
            Action::PrevPage => match props.pagination {
                Some(snapshot) if snapshot.has_previous() => {
                    self.go_to_page(props, snapshot.page - 1)
                }
                _ => Vec::new(),
            },
            Action::GoToPage(page) => self.go_to_page(props, page),
            Action::CyclePageSize => self.cycle_page_size(props),
            Action::Export => self.export(props),
            _ => Vec::new(),
        };

        for event in &events {
            log::debug!("table '{}' emitted {}", self.options.title, event);
        }
        events
    }

    /// Fire the deferred submit and the search debounce, at most one submit per tick
    pub fn tick(&mut self, now: Instant) -> Vec<TableEvent> {
        let deferred = std::mem::take(&mut self.submit_pending);
        let debounced = self.search.poll(now);
        if deferred || debounced {
            vec![TableEvent::FiltersSubmitted]
        } else {
            Vec::new()
        }
    }

    fn search_changed(&self) -> Vec<TableEvent> {
        match &self.search_filter {
            Some(filter) => vec![TableEvent::FilterChanged {
                key: filter.key.clone(),
                value: self.search.value().to_string(),
            }],
            None => Vec::new(),
        }
    }

    fn sort_by(&mut self, column: usize) -> Vec<TableEvent> {
        let Some(col) = self.columns.get(column) else {
            return Vec::new();
        };
        if !(self.options.sortable || col.sortable) {
            return Vec::new();
        }
        let next = next_sort(self.sort.as_ref(), &col.key);
        self.focused_column = column;
        self.sort = next.clone();
        match self.options.sort_mode {
            SortMode::Local => Vec::new(),
            SortMode::Remote => vec![TableEvent::SortChanged(next)],
        }
    }

    fn toggle_row(&self, props: &TableProps<'_, T>, position: usize) -> Vec<TableEvent> {
        match self.record_at(props, position) {
            Some((key, _)) => vec![TableEvent::SelectionChanged(props.selection.toggled(&key))],
            None => Vec::new(),
        }
    }

    fn click_row(&mut self, props: &TableProps<'_, T>, position: usize) -> Vec<TableEvent> {
        match self.record_at(props, position) {
            Some((key, index)) => {
                self.cursor = position;
                vec![TableEvent::RowClicked { key, index }]
            }
            None => Vec::new(),
        }
    }

    fn go_to_page(&mut self, props: &TableProps<'_, T>, page: usize) -> Vec<TableEvent> {
        let Some(snapshot) = props.pagination else {
            return Vec::new();
        };
        if page == 0 || page > snapshot.pages.max(1) || page == snapshot.page {
            return Vec::new();
        }
        let location = props.location.cloned().unwrap_or_default();
        self.cursor = 0;
        self.offset = 0;
        vec![TableEvent::PageChanged(location.with_page(page))]
    }

    fn cycle_page_size(&mut self, props: &TableProps<'_, T>) -> Vec<TableEvent> {
        let sizes = &self.options.page_size_options;
        let (Some(snapshot), Some(&first)) = (props.pagination, sizes.first()) else {
            return Vec::new();
        };
        let next = sizes
            .iter()
            .position(|&size| size == snapshot.limit)
            .and_then(|i| sizes.get(i + 1))
            .copied()
            .unwrap_or(first);
        if next == snapshot.limit {
            return Vec::new();
        }
        let location = props.location.cloned().unwrap_or_default();
        self.cursor = 0;
        self.offset = 0;
        vec![TableEvent::PageSizeChanged(location.with_page_size(next))]
    }

    fn export(&mut self, props: &TableProps<'_, T>) -> Vec<TableEvent> {
        let Some(config) = &self.options.export else {
            return Vec::new();
        };
        let selected: Vec<&T> = self
            .display_order(props.rows)
            .into_iter()
            .map(|i| &props.rows[i])
            .filter(|r| props.selection.contains(&(self.row_key)(r)))
            .collect();
        if selected.is_empty() {
            self.status = Some("Select rows to export".to_string());
            return Vec::new();
        }

        let doc = build_document(&selected, &self.columns, config);
        match download(&doc, config) {
            Ok(path) => {
                let rows = doc.rows.len();
                self.status = Some(format!("Exported {} rows to {}", rows, path.display()));
                vec![TableEvent::Exported { path, rows }]
            }
            Err(err) => {
                log::error!("export failed: {:#}", err);
                self.status = Some(format!("Export failed: {}", err));
                vec![TableEvent::ExportFailed(format!("{:#}", err))]
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Overlays
    // ─────────────────────────────────────────────────────────────────────────

    fn open_filters(&mut self, committed: &FilterValues) {
        if self.advanced_filters.is_empty() {
            return;
        }
        let popover = FilterPopover::open(self.advanced_filters.clone(), committed);
        let trigger = self
            .hits
            .rect_of(Hit::FilterButton)
            .unwrap_or(Rect::new(self.viewport.x, self.viewport.y, 1, 1));
        let slot = OpenOverlay::open(
            OverlayKind::FilterPopover,
            trigger,
            self.viewport,
            POPOVER_WIDTH,
            popover.height(),
            Anchor::Left,
        );
        log::debug!("filter popover opened at {:?}", slot.position);
        self.overlay = Some(Overlay {
            slot,
            content: OverlayContent::Filters(popover),
        });
    }

    fn open_row_actions(&mut self, props: &TableProps<'_, T>, position: usize) {
        let Some((key, index)) = self.record_at(props, position) else {
            return;
        };
        let Some(menu) = ActionMenu::for_record(&self.actions, &props.rows[index], key.clone(), index)
        else {
            return;
        };
        let trigger = self.hits.trigger_of(position).unwrap_or(Rect::new(
            self.viewport.right().saturating_sub(TRIGGER_WIDTH),
            self.viewport.y,
            TRIGGER_WIDTH,
            1,
        ));
        let slot = OpenOverlay::open(
            OverlayKind::RowActions { row_key: key },
            trigger,
            self.viewport,
            MENU_WIDTH,
            menu.height(),
            Anchor::Right,
        );
        log::debug!("row actions opened at {:?}", slot.position);
        self.cursor = position;
        self.overlay = Some(Overlay {
            slot,
            content: OverlayContent::Actions(menu),
        });
    }

    fn overlay_input(&mut self, input: OverlayInput) -> Vec<TableEvent> {
        let outcome = {
            let Some(overlay) = self.overlay.as_mut() else {
                return Vec::new();
            };
            match &mut overlay.content {
                OverlayContent::Actions(menu) => OverlayOutcome::Menu {
                    outcome: match input {
                        OverlayInput::Key(key) => menu.handle_key(key),
                        OverlayInput::Click(column, row) => menu.handle_click(column, row),
                    },
                    key: menu.row_key.clone(),
                    index: menu.row_index,
                },
                OverlayContent::Filters(popover) => {
                    let outcome = match input {
                        OverlayInput::Key(key) => popover.handle_key(key),
                        OverlayInput::Click(column, row) => popover.handle_click(column, row),
                    };
                    overlay.slot.nested = popover.dropdown_area();
                    OverlayOutcome::Popover(outcome)
                }
            }
        };

        match outcome {
            OverlayOutcome::Menu {
                outcome: MenuOutcome::Invoke(action),
                key,
                index,
            } => {
                self.close_overlay("action invoked");
                vec![TableEvent::ActionInvoked { action, key, index }]
            }
            OverlayOutcome::Menu {
                outcome: MenuOutcome::Close,
                ..
            } => {
                self.close_overlay("menu closed");
                Vec::new()
            }
            OverlayOutcome::Menu { .. } => Vec::new(),
            OverlayOutcome::Popover(outcome) => self.settle_popover(outcome),
        }
    }

    fn settle_popover(&mut self, outcome: PopoverOutcome) -> Vec<TableEvent> {
        match outcome {
            PopoverOutcome::None => Vec::new(),
            PopoverOutcome::Close => {
                self.close_overlay("popover closed");
                Vec::new()
            }
            PopoverOutcome::Apply => {
                let applied = match self.overlay.as_mut().map(|o| &mut o.content) {
                    Some(OverlayContent::Filters(popover)) => popover.apply_events(),
                    _ => None,
                };
                // An invalid date keeps the popover open with its error line
                let Some(events) = applied else {
                    return Vec::new();
                };
                self.close_overlay("filters applied");
                self.submit_pending = true;
                events
            }
            PopoverOutcome::Clear => {
                let mut events = FilterPopover::clear_events(&self.advanced_filters);
                events.push(TableEvent::FiltersCleared);
                self.close_overlay("filters cleared");
                self.submit_pending = true;
                events
            }
        }
    }

    /// Pointer-down at (`column`, `row`)
    fn click(&mut self, props: &TableProps<'_, T>, column: u16, row: u16) -> Vec<TableEvent> {
        if let Some(overlay) = &self.overlay {
            let at = Position::new(column, row);
            if overlay.slot.is_outside(column, row) {
                // Closes, then the click reaches whatever lies beneath
                self.close_overlay("pointer-down outside");
            } else if overlay.slot.trigger.contains(at) && !overlay.slot.area.contains(at) {
                self.close_overlay("trigger toggled");
                return Vec::new();
            } else {
                return self.overlay_input(OverlayInput::Click(column, row));
            }
        }

        let hit = self.hits.hit_at(column, row);
        let on_rows = matches!(
            hit,
            Some(
                Hit::ExportButton
                    | Hit::HeaderCheckbox
                    | Hit::Checkbox(_)
                    | Hit::Trigger(_)
                    | Hit::Row(_)
            )
        );
        if props.loading && on_rows {
            return Vec::new();
        }

        match hit {
            Some(Hit::SearchBox) => {
                self.search.editing = self.search_filter.is_some();
                Vec::new()
            }
            Some(Hit::FilterButton) => {
                self.open_filters(props.filter_values);
                Vec::new()
            }
            Some(Hit::ExportButton) => self.export(props),
            Some(Hit::HeaderCheckbox) => {
                let keys = self.visible_keys(props.rows);
                let next = props.selection.select_all(keys.iter().map(String::as_str));
                vec![TableEvent::SelectionChanged(next)]
            }
            Some(Hit::Header(column)) => self.sort_by(column),
            Some(Hit::Checkbox(position)) => {
                self.cursor = position;
                self.toggle_row(props, position)
            }
            Some(Hit::Trigger(position)) => {
                self.open_row_actions(props, position);
                Vec::new()
            }
            Some(Hit::Row(position)) => self.click_row(props, position),
            Some(Hit::Pager(PagerTarget::Previous)) => self.dispatch_page_step(props, false),
            Some(Hit::Pager(PagerTarget::Next)) => self.dispatch_page_step(props, true),
            Some(Hit::Pager(PagerTarget::Page(page))) => self.go_to_page(props, page),
            Some(Hit::Pager(PagerTarget::PageSize)) => self.cycle_page_size(props),
            None => Vec::new(),
        }
    }

    fn dispatch_page_step(&mut self, props: &TableProps<'_, T>, forward: bool) -> Vec<TableEvent> {
        match props.pagination {
            Some(snapshot) if forward && snapshot.has_next() => {
                self.go_to_page(props, snapshot.page + 1)
            }
            Some(snapshot) if !forward && snapshot.has_previous() => {
                self.go_to_page(props, snapshot.page - 1)
            }
            _ => Vec::new(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Rendering
    // ─────────────────────────────────────────────────────────────────────────

    /// Draw the whole table into `area`; overlays go over the full frame
    pub fn render(&mut self, frame: &mut Frame, area: Rect, props: &TableProps<'_, T>) {
        self.sync(props);
        self.viewport = frame.area();
        self.hits.clear();

        let pager_height = if props.pagination.is_some() { 1 } else { 0 };
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(3),
                Constraint::Length(pager_height),
            ])
            .split(area);

        self.draw_toolbar(frame, chunks[0], props);
        self.draw_body(frame, chunks[1], props);
        if let Some(snapshot) = props.pagination {
            self.hits
                .pager
                .draw(frame, chunks[2], &snapshot, self.options.show_page_size);
        }
        self.draw_overlay(frame);
    }

    fn draw_toolbar(&mut self, frame: &mut Frame, area: Rect, props: &TableProps<'_, T>) {
        let mut items: Vec<(String, Style, Option<Hit>)> = Vec::new();
        let gap = || (" ".to_string(), Style::default(), None);

        if let Some(filter) = &self.search_filter {
            let value = self.search.value();
            let (text, style) = if value.is_empty() && !self.search.editing {
                let placeholder = filter.placeholder.as_deref().unwrap_or("Search…");
                (placeholder.to_string(), Style::default().fg(Color::DarkGray))
            } else if self.search.editing {
                (format!("{}▏", value), Style::default().fg(Color::Yellow))
            } else {
                (value.to_string(), Style::default().fg(Color::White))
            };
            let fitted: String = fit_line(Line::from(text), SEARCH_WIDTH)
                .into_iter()
                .map(|s| s.content.into_owned())
                .collect();
            items.push((format!(" / {} ", fitted), style, Some(Hit::SearchBox)));
            items.push(gap());
        }

        if !self.advanced_filters.is_empty() {
            let active = self
                .advanced_filters
                .iter()
                .flat_map(|f| f.value_keys())
                .filter(|k| props.filter_values.is_set(k))
                .count();
            let (text, style) = if active > 0 {
                (
                    format!(" Filters ({}) ", active),
                    Style::default()
                        .fg(Color::Magenta)
                        .add_modifier(Modifier::BOLD),
                )
            } else {
                (" Filters ".to_string(), Style::default().fg(Color::Cyan))
            };
            items.push((text, style, Some(Hit::FilterButton)));
            items.push(gap());
        }

        if self.options.export.is_some() {
            let selected = self
                .visible_keys(props.rows)
                .iter()
                .filter(|k| props.selection.contains(k))
                .count();
            // Disabled without a selection: no hit region
            if selected > 0 {
                items.push((
                    format!(" Export ({}) ", selected),
                    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                    Some(Hit::ExportButton),
                ));
            } else {
                items.push((" Export ".to_string(), Style::default().fg(Color::DarkGray), None));
            }
            items.push(gap());
        }

        if let Some(status) = &self.status {
            items.push((status.clone(), Style::default().fg(Color::Yellow), None));
        }

        let mut spans = Vec::with_capacity(items.len());
        let mut x = area.x;
        for (text, style, hit) in items {
            let width = text.width() as u16;
            if let Some(hit) = hit {
                self.hits
                    .toolbar
                    .push((Rect::new(x, area.y, width, 1).intersection(area), hit));
            }
            x = x.saturating_add(width);
            spans.push(Span::styled(text, style));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn draw_body(&mut self, frame: &mut Frame, area: Rect, props: &TableProps<'_, T>) {
        let title = match props.pagination {
            Some(snapshot) => format!(" {} ({}) ", self.options.title, snapshot.total),
            None => format!(" {} ({}) ", self.options.title, props.rows.len()),
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .border_style(Style::default().fg(Color::DarkGray));
        let inner = block.inner(area);
        frame.render_widget(block, area);
        if inner.height == 0 {
            return;
        }

        let (column_xs, trigger_x) = self.column_layout(inner);
        let keys = self.visible_keys(props.rows);
        let check = props.selection.header_check(keys.iter().map(String::as_str));

        // Header
        let mut header = vec![
            Span::styled(check.symbol(), Style::default().fg(Color::Green)),
            Span::raw(" "),
        ];
        self.hits.header_checkbox =
            Some(Rect::new(inner.x, inner.y, CHECKBOX_WIDTH, 1).intersection(inner));
        for (i, column) in self.columns.iter().enumerate() {
            let arrow = match &self.sort {
                Some(sort) if sort.key == column.key => format!(" {}", sort.direction.arrow()),
                _ => String::new(),
            };
            let mut style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
            if i == self.focused_column {
                style = style.add_modifier(Modifier::UNDERLINED);
            }
            let label = Line::styled(format!("{}{}", column.header, arrow), style);
            header.extend(fit_line(label, column.width as usize));
            if i + 1 < self.columns.len() {
                header.push(Span::styled(SEPARATOR, Style::default().fg(Color::DarkGray)));
            }
            self.hits.headers.push((
                Rect::new(column_xs[i], inner.y, column.width, 1).intersection(inner),
                i,
            ));
        }

        let separator = "─".repeat(inner.width as usize);
        let mut lines = vec![
            Line::from(header),
            Line::styled(separator, Style::default().fg(Color::DarkGray)),
        ];
        let body_top = inner.y + 2;
        let visible = inner.height.saturating_sub(2) as usize;

        if props.loading || props.rows.is_empty() {
            let placeholder = if props.loading {
                vec![Line::styled(
                    "⟳ Loading…",
                    Style::default().fg(Color::Yellow),
                )]
            } else {
                vec![
                    Line::styled(
                        self.options.empty_icon.clone(),
                        Style::default().fg(Color::DarkGray),
                    ),
                    Line::styled(
                        self.options.empty_message.clone(),
                        Style::default().fg(Color::DarkGray),
                    ),
                ]
            };
            frame.render_widget(Paragraph::new(lines), inner);
            let body = Rect::new(
                inner.x,
                body_top.min(inner.bottom()),
                inner.width,
                inner.height.saturating_sub(2),
            );
            let pad = (body.height as usize).saturating_sub(placeholder.len()) / 2;
            let mut centered = vec![Line::from(""); pad];
            centered.extend(placeholder);
            frame.render_widget(Paragraph::new(centered).alignment(Alignment::Center), body);
            return;
        }

        // Keep the cursor on screen
        if self.cursor < self.offset {
            self.offset = self.cursor;
        } else if visible > 0 && self.cursor >= self.offset + visible {
            self.offset = self.cursor + 1 - visible;
        }

        let order = self.display_order(props.rows);
        let end = order.len().min(self.offset + visible);
        for position in self.offset..end {
            let index = order[position];
            let record = &props.rows[index];
            let key = (self.row_key)(record);
            let selected = props.selection.contains(&key);
            let y = body_top + (position - self.offset) as u16;

            let mut spans = vec![
                Span::styled(
                    if selected { "[x]" } else { "[ ]" },
                    Style::default().fg(if selected { Color::Green } else { Color::DarkGray }),
                ),
                Span::raw(" "),
            ];
            for (i, column) in self.columns.iter().enumerate() {
                spans.extend(fit_line(column.cell(record, position), column.width as usize));
                if i + 1 < self.columns.len() {
                    spans.push(Span::styled(SEPARATOR, Style::default().fg(Color::DarkGray)));
                }
            }

            let has_actions = self.actions.iter().any(|a| a.is_visible(record));
            spans.push(Span::raw(" "));
            if has_actions {
                spans.push(Span::styled(
                    TRIGGER,
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                ));
                self.hits.triggers.push((
                    Rect::new(trigger_x, y, TRIGGER_WIDTH, 1).intersection(inner),
                    position,
                ));
            }

            let mut line = Line::from(spans);
            if position == self.cursor {
                line = line.style(Style::default().bg(Color::DarkGray));
            }
            lines.push(line);

            self.hits.checkboxes.push((
                Rect::new(inner.x, y, CHECKBOX_WIDTH, 1).intersection(inner),
                position,
            ));
            self.hits
                .rows
                .push((Rect::new(inner.x, y, inner.width, 1), position));
        }

        frame.render_widget(Paragraph::new(lines), inner);
    }

    /// Left edge of every column and of the `⋮` trigger
    fn column_layout(&self, inner: Rect) -> (Vec<u16>, u16) {
        let mut xs = Vec::with_capacity(self.columns.len());
        let mut x = inner.x + CHECKBOX_WIDTH + 1;
        for (i, column) in self.columns.iter().enumerate() {
            xs.push(x);
            x = x.saturating_add(column.width);
            if i + 1 < self.columns.len() {
                x = x.saturating_add(SEPARATOR_WIDTH);
            }
        }
        (xs, x.saturating_add(1))
    }

    fn draw_overlay(&mut self, frame: &mut Frame) {
        let viewport = self.viewport;
        let Some(overlay) = self.overlay.as_mut() else {
            return;
        };
        let area = overlay.slot.area;
        match &mut overlay.content {
            OverlayContent::Actions(menu) => menu.draw(frame, area),
            OverlayContent::Filters(popover) => {
                popover.draw(frame, area, viewport);
                overlay.slot.nested = popover.dropdown_area();
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Input
// ═══════════════════════════════════════════════════════════════════════════════

// Not a `Component`: drawing needs caller props, see `DataTable::render`
impl<T: Serialize> DataTable<T> {
    /// Map a key to an Action; the table does not change here
    pub fn handle_key_event(&mut self, key: KeyEvent) -> anyhow::Result<Option<Action>> {
        if self.overlay.is_some() {
            return Ok(Some(Action::OverlayKey(key)));
        }

        if self.search.editing {
            let action = match key.code {
                KeyCode::Esc => Some(Action::ExitSearchMode),
                KeyCode::Enter => Some(Action::SubmitSearch),
                KeyCode::Backspace => Some(Action::SearchBackspace),
                KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                    Some(Action::SearchInput(c))
                }
                _ => None,
            };
            return Ok(action);
        }

        let action = match key.code {
            KeyCode::Char('j') | KeyCode::Down => Some(Action::NextRow),
            KeyCode::Char('k') | KeyCode::Up => Some(Action::PrevRow),
            KeyCode::Char('g') | KeyCode::Home => Some(Action::FirstRow),
            KeyCode::Char('G') | KeyCode::End => Some(Action::LastRow),
            KeyCode::Char('h') => Some(Action::PrevColumn),
            KeyCode::Char('l') => Some(Action::NextColumn),
            KeyCode::Char('s') => Some(Action::SortFocusedColumn),
            KeyCode::Char(' ') => Some(Action::ToggleRowSelection),
            KeyCode::Char('a') => Some(Action::SelectAll),
            KeyCode::Esc => Some(Action::ClearSelection),
            KeyCode::Char('/') => Some(Action::EnterSearchMode),
            KeyCode::Char('f') => Some(Action::OpenFilters),
            KeyCode::Char('m') => Some(Action::OpenRowActions),
            KeyCode::Enter => Some(Action::ClickRow),
            KeyCode::Char('n') | KeyCode::Right => Some(Action::NextPage),
            KeyCode::Char('p') | KeyCode::Left => Some(Action::PrevPage),
            KeyCode::Char('z') => Some(Action::CyclePageSize),
            KeyCode::Char('x') => Some(Action::Export),
            KeyCode::Char(c) if c != '0' => c.to_digit(10).map(|d| Action::GoToPage(d as usize)),
            _ => None,
        };
        Ok(action)
    }

    pub fn handle_mouse_event(&mut self, mouse: MouseEvent) -> anyhow::Result<Option<Action>> {
        let action = match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => Some(Action::Click {
                column: mouse.column,
                row: mouse.row,
            }),
            MouseEventKind::ScrollDown if self.overlay.is_none() => Some(Action::NextRow),
            MouseEventKind::ScrollUp if self.overlay.is_none() => Some(Action::PrevRow),
            _ => None,
        };
        Ok(action)
    }
}

/// Actions aimed at rows, the header checkbox or the selection export
fn acts_on_rows(action: &Action) -> bool {
    matches!(
        action,
        Action::ClickRow
            | Action::ToggleRowSelection
            | Action::SelectAll
            | Action::OpenRowActions
            | Action::Export
    )
}

/// Fit `line` into exactly `width` cells, truncating with an ellipsis
fn fit_line(line: Line<'static>, width: usize) -> Vec<Span<'static>> {
    let truncate = line.width() > width;
    let budget = if truncate { width.saturating_sub(1) } else { width };
    let base = line.style;
    let mut used = 0;
    let mut spans = Vec::new();

    'outer: for span in line.spans {
        let mut text = String::new();
        for ch in span.content.chars() {
            let w = ch.width().unwrap_or(0);
            if used + w > budget {
                if !text.is_empty() {
                    spans.push(Span::styled(text, base.patch(span.style)));
                }
                break 'outer;
            }
            used += w;
            text.push(ch);
        }
        if !text.is_empty() {
            spans.push(Span::styled(text, base.patch(span.style)));
        }
    }

    if truncate && width > 0 {
        spans.push(Span::styled("…", base));
        used += 1;
    }
    if used < width {
        spans.push(Span::raw(" ".repeat(width - used)));
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::filter::FilterOption;
    use crate::model::sort::SortDirection;
    use pretty_assertions::assert_eq;
    use ratatui::{backend::TestBackend, Terminal};
    use std::time::Duration;

    #[derive(Debug, Clone, Serialize)]
    struct Person {
        id: String,
        name: String,
        email: String,
        age: Option<u32>,
        active: bool,
    }

    fn people(n: usize) -> Vec<Person> {
        (1..=n)
            .map(|i| Person {
                id: format!("p{}", i),
                name: format!("Person {:02}", i),
                email: format!("person{}@example.test", i),
                age: if i % 4 == 0 { None } else { Some(20 + (i as u32 * 7) % 30) },
                active: i % 2 == 1,
            })
            .collect()
    }

    fn options() -> TableOptions {
        TableOptions {
            title: "People".to_string(),
            ..TableOptions::default()
        }
    }

    fn table_with(options: TableOptions) -> DataTable<Person> {
        DataTable::new(
            vec![
                Column::new("name", "Name").width(12).sortable(),
                Column::new("email", "Email").width(20),
                Column::new("age", "Age").width(5).sortable(),
            ],
            |p: &Person| p.id.clone(),
            options,
        )
        .filters(vec![
            FilterDescriptor::text("q"),
            FilterDescriptor::select(
                "status",
                vec![
                    FilterOption::new("ACTIVE", "Active"),
                    FilterOption::new("CLOSED", "Closed"),
                ],
            ),
        ])
        .actions(vec![
            RowAction::new("view", "View"),
            RowAction::new("deactivate", "Deactivate")
                .destructive()
                .visible_when(|p: &Person| p.active),
        ])
    }

    fn table() -> DataTable<Person> {
        table_with(options())
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn render(table: &mut DataTable<Person>, props: &TableProps<'_, Person>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal
            .draw(|frame| {
                let area = frame.area();
                table.render(frame, area, props)
            })
            .unwrap();
        let buffer = terminal.backend().buffer();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn commit(values: &mut FilterValues, events: &[TableEvent]) {
        for event in events {
            if let TableEvent::FilterChanged { key, value } = event {
                values.set(key.clone(), value.clone());
            }
        }
    }

    // Layout of a 100x30 frame without pagination: toolbar on row 0, block
    // border on row 1, header on row 2, separator on row 3, rows from row 4.
    // Columns start at x=5 (Name), x=20 (Email), x=43 (Age); trigger at x=49.
    const HEADER_Y: u16 = 2;
    const FIRST_ROW_Y: u16 = 4;
    const TRIGGER_X: u16 = 50;

    #[test]
    fn test_three_header_clicks_return_to_unsorted() {
        let rows = people(5);
        let (values, selection) = (FilterValues::new(), Selection::new());
        let props = TableProps::new(&rows, &values, &selection);
        let mut table = table();
        let now = Instant::now();

        table.dispatch(Action::SortFocusedColumn, &props, now);
        assert_eq!(table.sort(), Some(&SortState::new("name", SortDirection::Asc)));
        table.dispatch(Action::SortFocusedColumn, &props, now);
        assert_eq!(table.sort(), Some(&SortState::new("name", SortDirection::Desc)));
        let events = table.dispatch(Action::SortFocusedColumn, &props, now);
        assert_eq!(table.sort(), None);
        assert!(events.is_empty());
    }

    #[test]
    fn test_unsortable_column_ignores_header_clicks() {
        let rows = people(5);
        let (values, selection) = (FilterValues::new(), Selection::new());
        let props = TableProps::new(&rows, &values, &selection);
        let mut table = table_with(TableOptions {
            sort_mode: SortMode::Remote,
            ..options()
        });
        let now = Instant::now();

        table.dispatch(Action::NextColumn, &props, now);
        let events = table.dispatch(Action::SortFocusedColumn, &props, now);
        assert!(events.is_empty());
        assert_eq!(table.sort(), None);

        render(&mut table, &props);
        let events = table.dispatch(Action::Click { column: 22, row: HEADER_Y }, &props, now);
        assert!(events.is_empty());
        assert_eq!(table.sort(), None);
    }

    #[test]
    fn test_global_sortable_flag_enables_every_column() {
        let rows = people(5);
        let (values, selection) = (FilterValues::new(), Selection::new());
        let props = TableProps::new(&rows, &values, &selection);
        let mut table = table_with(TableOptions {
            sortable: true,
            ..options()
        });

        table.dispatch(Action::NextColumn, &props, Instant::now());
        table.dispatch(Action::SortFocusedColumn, &props, Instant::now());
        assert_eq!(table.sort(), Some(&SortState::new("email", SortDirection::Asc)));
    }

    #[test]
    fn test_remote_sort_reports_and_keeps_order() {
        let rows = people(5);
        let (values, selection) = (FilterValues::new(), Selection::new());
        let props = TableProps::new(&rows, &values, &selection);
        let mut table = table_with(TableOptions {
            sort_mode: SortMode::Remote,
            ..options()
        });
        let now = Instant::now();

        let events = table.dispatch(Action::SortFocusedColumn, &props, now);
        let events2 = table.dispatch(Action::SortFocusedColumn, &props, now);
        assert_eq!(
            events,
            vec![TableEvent::SortChanged(Some(SortState::new("name", SortDirection::Asc)))]
        );
        assert_eq!(
            events2,
            vec![TableEvent::SortChanged(Some(SortState::new("name", SortDirection::Desc)))]
        );
        assert_eq!(table.display_order(&rows), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_local_sort_reorders_with_nulls_last() {
        let rows = people(8);
        let (values, selection) = (FilterValues::new(), Selection::new());
        let props = TableProps::new(&rows, &values, &selection);
        let mut table = table();

        render(&mut table, &props);
        // Header click on Age sorts ascending
        table.dispatch(Action::Click { column: 44, row: HEADER_Y }, &props, Instant::now());
        assert_eq!(table.sort(), Some(&SortState::new("age", SortDirection::Asc)));

        let order = table.display_order(&rows);
        let tail: Vec<&str> = order[6..].iter().map(|&i| rows[i].id.as_str()).collect();
        assert_eq!(tail, vec!["p4", "p8"]);
        let ages: Vec<u32> = order[..6].iter().filter_map(|&i| rows[i].age).collect();
        assert!(ages.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_next_page_requests_page_two() {
        let rows = people(10);
        let (values, selection) = (FilterValues::new(), Selection::new());
        let location: Location = "/people?page=1&limit=10".parse().unwrap();
        let snapshot = PaginationSnapshot::new(1, 10, 12);
        assert_eq!(snapshot.pages, 2);
        let props = TableProps::new(&rows, &values, &selection).paginated(snapshot, &location);
        let mut table = table();
        let now = Instant::now();

        assert!(table.dispatch(Action::PrevPage, &props, now).is_empty());
        let events = table.dispatch(Action::NextPage, &props, now);
        assert_eq!(events, vec![TableEvent::PageChanged(location.with_page(2))]);
        match &events[0] {
            TableEvent::PageChanged(target) => assert_eq!(target.page(), 2),
            other => panic!("unexpected event {}", other),
        }
    }

    #[test]
    fn test_page_size_cycles_and_resets_page() {
        let rows = people(10);
        let (values, selection) = (FilterValues::new(), Selection::new());
        let location: Location = "/people?page=3&limit=10".parse().unwrap();
        let props = TableProps::new(&rows, &values, &selection)
            .paginated(PaginationSnapshot::new(3, 10, 95), &location);
        let mut table = table();

        let events = table.dispatch(Action::CyclePageSize, &props, Instant::now());
        let TableEvent::PageSizeChanged(target) = &events[0] else {
            panic!("expected a page size change");
        };
        assert_eq!(target.page(), 1);
        assert_eq!(target.limit(10), 25);
    }

    #[test]
    fn test_typing_submits_once_with_final_value() {
        let rows = people(3);
        let selection = Selection::new();
        let mut values = FilterValues::new();
        let mut table = table();
        let start = Instant::now();
        let mut submits = Vec::new();

        {
            let props = TableProps::new(&rows, &values, &selection);
            table.dispatch(Action::EnterSearchMode, &props, start);
        }

        let mut at = start;
        for (i, c) in "ACME Corp".chars().enumerate() {
            at = start + Duration::from_millis(i as u64 * 40);
            let events = {
                let props = TableProps::new(&rows, &values, &selection);
                let mut events = table.dispatch(Action::SearchInput(c), &props, at);
                events.extend(table.tick(at + Duration::from_millis(20)));
                events
            };
            submits.extend(
                events
                    .iter()
                    .filter(|e| **e == TableEvent::FiltersSubmitted)
                    .map(|_| values.get("q").to_string()),
            );
            commit(&mut values, &events);
        }
        assert!(submits.is_empty());

        assert!(table.tick(at + Duration::from_millis(299)).is_empty());
        let events = table.tick(at + Duration::from_millis(300));
        assert_eq!(events, vec![TableEvent::FiltersSubmitted]);
        assert_eq!(values.get("q"), "ACME Corp");
        assert!(table.tick(at + Duration::from_millis(900)).is_empty());
    }

    #[test]
    fn test_enter_submits_search_immediately() {
        let rows = people(3);
        let (values, selection) = (FilterValues::new(), Selection::new());
        let props = TableProps::new(&rows, &values, &selection);
        let mut table = table();
        let now = Instant::now();

        table.dispatch(Action::EnterSearchMode, &props, now);
        table.dispatch(Action::SearchInput('x'), &props, now);
        let events = table.dispatch(Action::SubmitSearch, &props, now);
        assert_eq!(events, vec![TableEvent::FiltersSubmitted]);
        assert!(table.tick(now + Duration::from_secs(1)).is_empty());
        assert!(!table.captures_input());
    }

    #[test]
    fn test_popover_closed_outside_leaves_committed_value() {
        let rows = people(3);
        let (values, selection) = (FilterValues::new(), Selection::new());
        let props = TableProps::new(&rows, &values, &selection);
        let mut table = table();
        let now = Instant::now();

        render(&mut table, &props);
        table.dispatch(Action::OpenFilters, &props, now);
        assert_eq!(
            table.open_overlay().map(|o| o.kind.clone()),
            Some(OverlayKind::FilterPopover)
        );
        table.dispatch(Action::OverlayKey(key(KeyCode::Right)), &props, now);

        let events = table.dispatch(Action::Click { column: 99, row: 29 }, &props, now);
        assert!(events.is_empty());
        assert!(table.open_overlay().is_none());
        assert_eq!(values.get("status"), "");
        assert!(table.tick(now).is_empty());
    }

    #[test]
    fn test_apply_promotes_then_submits_next_tick() {
        let rows = people(3);
        let (values, selection) = (FilterValues::new(), Selection::new());
        let props = TableProps::new(&rows, &values, &selection);
        let mut table = table();
        let now = Instant::now();

        render(&mut table, &props);
        table.dispatch(Action::OpenFilters, &props, now);
        table.dispatch(Action::OverlayKey(key(KeyCode::Right)), &props, now);
        table.dispatch(Action::OverlayKey(key(KeyCode::Down)), &props, now);
        let events = table.dispatch(Action::OverlayKey(key(KeyCode::Enter)), &props, now);

        assert_eq!(
            events,
            vec![TableEvent::FilterChanged {
                key: "status".to_string(),
                value: "ACTIVE".to_string(),
            }]
        );
        assert!(table.open_overlay().is_none());
        assert_eq!(table.tick(now), vec![TableEvent::FiltersSubmitted]);
        assert!(table.tick(now).is_empty());
    }

    #[test]
    fn test_clear_resets_advanced_filters() {
        let rows = people(3);
        let selection = Selection::new();
        let values = FilterValues::from_iter([("status", "ACTIVE"), ("q", "acme")]);
        let props = TableProps::new(&rows, &values, &selection);
        let mut table = table();
        let now = Instant::now();

        render(&mut table, &props);
        table.dispatch(Action::OpenFilters, &props, now);
        table.dispatch(Action::OverlayKey(key(KeyCode::Down)), &props, now);
        table.dispatch(Action::OverlayKey(key(KeyCode::Down)), &props, now);
        let events = table.dispatch(Action::OverlayKey(key(KeyCode::Enter)), &props, now);

        assert_eq!(
            events,
            vec![
                TableEvent::FilterChanged {
                    key: "status".to_string(),
                    value: String::new(),
                },
                TableEvent::FiltersCleared,
            ]
        );
        assert_eq!(table.tick(now), vec![TableEvent::FiltersSubmitted]);
    }

    #[test]
    fn test_filter_popover_opens_below_its_button() {
        let rows = people(3);
        let (values, selection) = (FilterValues::new(), Selection::new());
        let props = TableProps::new(&rows, &values, &selection);
        let mut table = table();

        let screen = render(&mut table, &props);
        assert!(screen.lines().next().unwrap_or_default().contains("Filters"));
        let button = table.hits.rect_of(Hit::FilterButton).unwrap();
        table.dispatch(
            Action::Click {
                column: button.x + 1,
                row: button.y,
            },
            &props,
            Instant::now(),
        );
        let overlay = table.open_overlay().unwrap();
        assert!(!overlay.position.show_above);
        assert_eq!(overlay.area.y, 1);
        assert_eq!(overlay.area.x, button.x);
    }

    #[test]
    fn test_select_all_then_again_clears() {
        let rows = people(4);
        let values = FilterValues::new();
        let empty = Selection::new();
        let mut table = table();
        let now = Instant::now();

        let events = table.dispatch(Action::SelectAll, &TableProps::new(&rows, &values, &empty), now);
        let TableEvent::SelectionChanged(all) = events[0].clone() else {
            panic!("expected a selection change");
        };
        assert_eq!(all, Selection::from_iter(["p1", "p2", "p3", "p4"]));

        let events = table.dispatch(Action::SelectAll, &TableProps::new(&rows, &values, &all), now);
        assert_eq!(events, vec![TableEvent::SelectionChanged(Selection::new())]);
    }

    #[test]
    fn test_checkbox_clicks_toggle_rows() {
        let rows = people(4);
        let values = FilterValues::new();
        let selection = Selection::from_iter(["p3"]);
        let props = TableProps::new(&rows, &values, &selection);
        let mut table = table();

        let screen = render(&mut table, &props);
        assert!(screen.contains("[-]"));

        let events = table.dispatch(
            Action::Click { column: 2, row: FIRST_ROW_Y },
            &props,
            Instant::now(),
        );
        assert_eq!(
            events,
            vec![TableEvent::SelectionChanged(Selection::from_iter(["p1", "p3"]))]
        );

        let events = table.dispatch(Action::Click { column: 2, row: HEADER_Y }, &props, Instant::now());
        assert_eq!(
            events,
            vec![TableEvent::SelectionChanged(Selection::from_iter([
                "p1", "p2", "p3", "p4"
            ]))]
        );
    }

    #[test]
    fn test_esc_clears_selection_only_when_set() {
        let rows = people(2);
        let values = FilterValues::new();
        let empty = Selection::new();
        let some = Selection::from_iter(["p2"]);
        let mut table = table();
        let now = Instant::now();

        let action = table.handle_key_event(key(KeyCode::Esc)).unwrap().unwrap();
        assert!(table
            .dispatch(action.clone(), &TableProps::new(&rows, &values, &empty), now)
            .is_empty());
        assert_eq!(
            table.dispatch(action, &TableProps::new(&rows, &values, &some), now),
            vec![TableEvent::SelectionChanged(Selection::new())]
        );
    }

    #[test]
    fn test_export_selected_rows_only() {
        let dir = tempfile::tempdir().unwrap();
        let rows = people(10);
        let values = FilterValues::new();
        let selection = Selection::from_iter(["p2", "p5", "p9"]);
        let props = TableProps::new(&rows, &values, &selection);
        let mut table = table_with(TableOptions {
            export: Some(
                ExportConfig::new("people")
                    .include(&["name", "email"])
                    .directory(dir.path()),
            ),
            ..options()
        });

        let events = table.dispatch(Action::Export, &props, Instant::now());
        let path = dir.path().join("people.xls");
        assert_eq!(
            events,
            vec![TableEvent::Exported {
                path: path.clone(),
                rows: 3,
            }]
        );
        let xml = std::fs::read_to_string(path).unwrap();
        assert_eq!(xml.matches("<Row>").count(), 4);
        assert_eq!(xml.matches("<Cell>").count(), 8);
        assert!(xml.contains("person5@example.test"));
        assert!(!xml.contains("person1@example.test"));
    }

    #[test]
    fn test_export_disabled_without_selection() {
        let dir = tempfile::tempdir().unwrap();
        let rows = people(10);
        let (values, selection) = (FilterValues::new(), Selection::new());
        let props = TableProps::new(&rows, &values, &selection);
        let mut table = table_with(TableOptions {
            export: Some(ExportConfig::new("people").directory(dir.path())),
            ..options()
        });

        let screen = render(&mut table, &props);
        assert!(screen.contains(" Export "));
        assert!(table.hits.rect_of(Hit::ExportButton).is_none());
        assert!(table.dispatch(Action::Export, &props, Instant::now()).is_empty());
        assert!(!dir.path().join("people.xls").exists());
        assert_eq!(table.status(), Some("Select rows to export"));
    }

    #[test]
    fn test_row_menu_offers_visible_actions_only() {
        let rows = people(4);
        let (values, selection) = (FilterValues::new(), Selection::new());
        let props = TableProps::new(&rows, &values, &selection);
        let mut table = table();
        let now = Instant::now();

        render(&mut table, &props);
        // p2 is inactive: only "view" is offered
        table.dispatch(Action::NextRow, &props, now);
        table.dispatch(Action::OpenRowActions, &props, now);
        let overlay = table.open_overlay().unwrap();
        assert_eq!(
            overlay.kind,
            OverlayKind::RowActions {
                row_key: "p2".to_string()
            }
        );
        assert_eq!(overlay.area.height, 3);

        let events = table.dispatch(Action::OverlayKey(key(KeyCode::Enter)), &props, now);
        assert_eq!(
            events,
            vec![TableEvent::ActionInvoked {
                action: "view".to_string(),
                key: "p2".to_string(),
                index: 1,
            }]
        );
        assert!(table.open_overlay().is_none());
    }

    #[test]
    fn test_trigger_click_toggles_menu() {
        let rows = people(4);
        let (values, selection) = (FilterValues::new(), Selection::new());
        let props = TableProps::new(&rows, &values, &selection);
        let mut table = table();
        let now = Instant::now();

        let screen = render(&mut table, &props);
        assert!(screen.contains("⋮"));
        let click = Action::Click {
            column: TRIGGER_X,
            row: FIRST_ROW_Y,
        };
        table.dispatch(click.clone(), &props, now);
        assert!(table.open_overlay().is_some());
        table.dispatch(click, &props, now);
        assert!(table.open_overlay().is_none());
    }

    #[test]
    fn test_new_overlay_replaces_open_one() {
        let rows = people(4);
        let (values, selection) = (FilterValues::new(), Selection::new());
        let props = TableProps::new(&rows, &values, &selection);
        let mut table = table();
        let now = Instant::now();

        render(&mut table, &props);
        table.dispatch(Action::OpenRowActions, &props, now);
        // Keys go to the open menu, so open the popover through its button
        let button = table.hits.rect_of(Hit::FilterButton).unwrap();
        table.dispatch(
            Action::Click {
                column: button.x,
                row: button.y,
            },
            &props,
            now,
        );
        assert_eq!(
            table.open_overlay().map(|o| o.kind.clone()),
            Some(OverlayKind::FilterPopover)
        );
    }

    #[test]
    fn test_menu_closes_when_row_disappears() {
        let rows = people(4);
        let (values, selection) = (FilterValues::new(), Selection::new());
        let mut table = table();
        let now = Instant::now();

        table.dispatch(
            Action::OpenRowActions,
            &TableProps::new(&rows, &values, &selection),
            now,
        );
        assert!(table.open_overlay().is_some());

        let remaining = rows[1..].to_vec();
        table.sync(&TableProps::new(&remaining, &values, &selection));
        assert!(table.open_overlay().is_none());
    }

    #[test]
    fn test_row_click_reports_row_index() {
        let rows = people(4);
        let (values, selection) = (FilterValues::new(), Selection::new());
        let props = TableProps::new(&rows, &values, &selection);
        let mut table = table();

        render(&mut table, &props);
        let events = table.dispatch(
            Action::Click {
                column: 30,
                row: FIRST_ROW_Y + 2,
            },
            &props,
            Instant::now(),
        );
        assert_eq!(
            events,
            vec![TableEvent::RowClicked {
                key: "p3".to_string(),
                index: 2,
            }]
        );
    }

    #[test]
    fn test_loading_placeholder_replaces_rows() {
        let rows = people(4);
        let (values, selection) = (FilterValues::new(), Selection::new());
        let props = TableProps::new(&rows, &values, &selection).loading(true);
        let screen = render(&mut table(), &props);
        assert!(screen.contains("Loading"));
        assert!(!screen.contains("Person 01"));
    }

    #[test]
    fn test_empty_state_shows_message() {
        let rows: Vec<Person> = Vec::new();
        let (values, selection) = (FilterValues::new(), Selection::new());
        let props = TableProps::new(&rows, &values, &selection);
        let screen = render(
            &mut table_with(TableOptions {
                empty_message: "Nobody here".to_string(),
                ..options()
            }),
            &props,
        );
        assert!(screen.contains("Nobody here"));
        assert!(screen.contains("[ ]"));
    }

    #[test]
    fn test_fit_line_truncates_by_display_width() {
        let text: String = fit_line(Line::from("Überlänge-Name"), 8)
            .into_iter()
            .map(|s| s.content.into_owned())
            .collect();
        assert_eq!(text, "Überlän…");

        let text: String = fit_line(Line::from("日本語"), 5)
            .into_iter()
            .map(|s| s.content.into_owned())
            .collect();
        assert_eq!(text, "日本…");
    }

    #[test]
    fn test_rows_behind_loading_placeholder_ignore_row_actions() {
        let dir = tempfile::tempdir().unwrap();
        let rows = people(5);
        let values = FilterValues::new();
        let selection = Selection::from_iter(["p1"]);
        let loading = TableProps::new(&rows, &values, &selection).loading(true);
        let mut table = table_with(TableOptions {
            export: Some(ExportConfig::new("people").directory(dir.path())),
            ..options()
        });
        let now = Instant::now();

        let screen = render(&mut table, &loading);
        assert!(!screen.contains("Person 01"));
        for action in [
            Action::ToggleRowSelection,
            Action::ClickRow,
            Action::SelectAll,
            Action::OpenRowActions,
            Action::Export,
        ] {
            let events = table.dispatch(action.clone(), &loading, now);
            assert!(events.is_empty(), "{} reached a hidden row", action);
        }
        let header_click = Action::Click {
            column: 2,
            row: HEADER_Y,
        };
        assert!(table.dispatch(header_click, &loading, now).is_empty());
        assert!(table.open_overlay().is_none());
        assert!(!dir.path().join("people.xls").exists());

        let ready = TableProps::new(&rows, &values, &selection);
        assert_eq!(
            table.dispatch(Action::ToggleRowSelection, &ready, now),
            vec![TableEvent::SelectionChanged(Selection::new())]
        );
    }

    #[test]
    fn test_unmount_drops_overlay_and_pending_submits() {
        let rows = people(3);
        let (values, selection) = (FilterValues::new(), Selection::new());
        let props = TableProps::new(&rows, &values, &selection);
        let mut table = table();
        let now = Instant::now();

        render(&mut table, &props);
        // Apply leaves a submit for the next tick
        table.dispatch(Action::OpenFilters, &props, now);
        table.dispatch(Action::OverlayKey(key(KeyCode::Up)), &props, now);
        table.dispatch(Action::OverlayKey(key(KeyCode::Up)), &props, now);
        table.dispatch(Action::OverlayKey(key(KeyCode::Enter)), &props, now);
        // Typing arms the debounce
        table.dispatch(Action::EnterSearchMode, &props, now);
        table.dispatch(Action::SearchInput('a'), &props, now);
        table.dispatch(Action::OpenFilters, &props, now);
        assert!(table.open_overlay().is_some());

        table.unmount();
        assert!(table.open_overlay().is_none());
        assert!(!table.captures_input());
        assert!(table.tick(now).is_empty());
        assert!(table.tick(now + Duration::from_secs(5)).is_empty());
    }

    #[test]
    fn test_selection_follows_rows_through_local_sort() {
        let dir = tempfile::tempdir().unwrap();
        let rows = people(5);
        let values = FilterValues::new();
        let none = Selection::new();
        let mut table = table_with(TableOptions {
            export: Some(
                ExportConfig::new("people")
                    .include(&["name", "email"])
                    .directory(dir.path()),
            ),
            ..options()
        });
        let now = Instant::now();

        table.dispatch(Action::NextRow, &TableProps::new(&rows, &values, &none), now);
        let events = table.dispatch(
            Action::ToggleRowSelection,
            &TableProps::new(&rows, &values, &none),
            now,
        );
        let selection = Selection::from_iter(["p2"]);
        assert_eq!(events, vec![TableEvent::SelectionChanged(selection.clone())]);
        let props = TableProps::new(&rows, &values, &selection);

        // Name descending moves p2 from the second to the fourth row
        table.dispatch(Action::SortFocusedColumn, &props, now);
        table.dispatch(Action::SortFocusedColumn, &props, now);
        assert_eq!(table.sort(), Some(&SortState::new("name", SortDirection::Desc)));

        let screen = render(&mut table, &props);
        let lines: Vec<&str> = screen.lines().collect();
        let checked: Vec<&str> = lines
            .iter()
            .copied()
            .filter(|l| l.contains("[x]"))
            .collect();
        assert_eq!(checked.len(), 1);
        assert!(checked[0].contains("Person 02"));
        assert!(lines[FIRST_ROW_Y as usize + 3].contains("Person 02"));
        assert!(lines[FIRST_ROW_Y as usize + 1].contains("[ ]"));

        let events = table.dispatch(Action::Export, &props, now);
        assert_eq!(
            events,
            vec![TableEvent::Exported {
                path: dir.path().join("people.xls"),
                rows: 1,
            }]
        );
        let xml = std::fs::read_to_string(dir.path().join("people.xls")).unwrap();
        assert!(xml.contains("person2@example.test"));
        assert!(!xml.contains("person4@example.test"));
    }

    #[test]
    fn test_digit_keys_jump_to_page() {
        let rows = people(10);
        let (values, selection) = (FilterValues::new(), Selection::new());
        let location: Location = "/people?page=1&limit=10".parse().unwrap();
        let props = TableProps::new(&rows, &values, &selection)
            .paginated(PaginationSnapshot::new(1, 10, 45), &location);
        let mut table = table();
        let now = Instant::now();

        let action = table.handle_key_event(key(KeyCode::Char('3'))).unwrap();
        assert_eq!(action, Some(Action::GoToPage(3)));
        assert_eq!(
            table.dispatch(Action::GoToPage(3), &props, now),
            vec![TableEvent::PageChanged(location.with_page(3))]
        );
        // Current page and pages past the end go nowhere
        assert!(table.dispatch(Action::GoToPage(1), &props, now).is_empty());
        assert!(table.dispatch(Action::GoToPage(9), &props, now).is_empty());
        assert_eq!(table.handle_key_event(key(KeyCode::Char('0'))).unwrap(), None);
    }

    #[test]
    fn test_pager_regions_cleared_without_pagination() {
        let rows = people(10);
        let (values, selection) = (FilterValues::new(), Selection::new());
        let location: Location = "/people?page=1&limit=10".parse().unwrap();
        let paged = TableProps::new(&rows, &values, &selection)
            .paginated(PaginationSnapshot::new(1, 10, 30), &location);
        let mut table = table();

        render(&mut table, &paged);
        // The bar takes the last row of the 100x30 frame
        let next = (0..100)
            .find(|&x| table.hits.pager.target_at(x, 29) == Some(PagerTarget::Next))
            .unwrap();

        render(&mut table, &TableProps::new(&rows, &values, &selection));
        assert_eq!(table.hits.pager.target_at(next, 29), None);
        assert_eq!(table.hits.hit_at(next, 29), None);
    }
}

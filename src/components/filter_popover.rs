//! Advanced filter popover
//!
//! Select, date and date-range filters are edited on a staged copy of the
//! committed values. Nothing reaches the caller until "Apply"; closing the
//! popover any other way drops the edits on the next open, because the staged
//! copy is re-read from the committed values every time it opens.

use chrono::NaiveDate;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::model::event::TableEvent;
use crate::model::filter::{FilterDescriptor, FilterKind, FilterOption, FilterValues};

pub const POPOVER_WIDTH: u16 = 46;
const LABEL_WIDTH: usize = 16;
const DROPDOWN_WIDTH: u16 = 22;

/// A focusable line of the popover
#[derive(Debug, Clone, PartialEq, Eq)]
enum Slot {
    /// Edits `value_key` of the filter at `filter`
    Field {
        filter: usize,
        value_key: String,
        label: String,
    },
    Apply,
    Clear,
}

/// What the caller of `handle_key` should do next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopoverOutcome {
    None,
    Apply,
    Clear,
    Close,
}

/// Staged store plus popover interaction state
#[derive(Debug, Clone)]
pub struct FilterPopover {
    filters: Vec<FilterDescriptor>,
    staged: FilterValues,
    slots: Vec<Slot>,
    focus: usize,
    /// Highlighted option while the nested dropdown is open
    dropdown: Option<usize>,
    error: Option<String>,
    slot_areas: Vec<(usize, Rect)>,
    dropdown_area: Option<Rect>,
    /// First option drawn by the last dropdown render
    dropdown_offset: usize,
}

impl FilterPopover {
    /// Open over `filters`, staging a copy of the committed values
    pub fn open(filters: Vec<FilterDescriptor>, committed: &FilterValues) -> Self {
        let mut staged = FilterValues::new();
        let mut slots = Vec::new();
        for (i, filter) in filters.iter().enumerate() {
            for value_key in filter.value_keys() {
                staged.set(value_key.clone(), committed.get(&value_key));
                let label = match filter.kind {
                    FilterKind::DateRange if value_key.ends_with("_from") => {
                        format!("{} from", filter.display_label())
                    }
                    FilterKind::DateRange => format!("{} to", filter.display_label()),
                    _ => filter.display_label().to_string(),
                };
                slots.push(Slot::Field {
                    filter: i,
                    value_key,
                    label,
                });
            }
        }
        slots.push(Slot::Apply);
        slots.push(Slot::Clear);

        Self {
            filters,
            staged,
            slots,
            focus: 0,
            dropdown: None,
            error: None,
            slot_areas: Vec::new(),
            dropdown_area: None,
            dropdown_offset: 0,
        }
    }

    pub fn staged(&self) -> &FilterValues {
        &self.staged
    }

    pub fn set_staged(&mut self, key: &str, value: &str) {
        self.staged.set(key, value);
        self.error = None;
    }

    /// Height the popover asks for, borders included
    pub fn height(&self) -> u16 {
        let fields = self.slots.len().saturating_sub(2) as u16;
        // fields + blank + buttons + error line + borders
        fields + 1 + 1 + 1 + 2
    }

    pub fn is_dropdown_open(&self) -> bool {
        self.dropdown.is_some()
    }

    /// Area of the nested option dropdown from the last draw
    pub fn dropdown_area(&self) -> Option<Rect> {
        self.dropdown.and(self.dropdown_area)
    }

    /// Events that promote every staged advanced value to committed
    pub fn apply_events(&mut self) -> Option<Vec<TableEvent>> {
        if let Some(key) = self.invalid_date_key() {
            self.error = Some(format!("Invalid date in {} (YYYY-MM-DD)", key));
            return None;
        }
        let events = self
            .value_keys()
            .into_iter()
            .map(|key| TableEvent::FilterChanged {
                value: self.staged.get(&key).to_string(),
                key,
            })
            .collect();
        Some(events)
    }

    /// Events that reset every advanced value, both ends of date ranges included
    pub fn clear_events(filters: &[FilterDescriptor]) -> Vec<TableEvent> {
        filters
            .iter()
            .flat_map(|f| f.value_keys())
            .map(|key| TableEvent::FilterChanged {
                key,
                value: String::new(),
            })
            .collect()
    }

    fn value_keys(&self) -> Vec<String> {
        self.filters.iter().flat_map(|f| f.value_keys()).collect()
    }

    fn invalid_date_key(&self) -> Option<String> {
        self.filters
            .iter()
            .filter(|f| matches!(f.kind, FilterKind::Date | FilterKind::DateRange))
            .flat_map(|f| f.value_keys())
            .find(|key| {
                let value = self.staged.get(key);
                !value.is_empty() && NaiveDate::parse_from_str(value, "%Y-%m-%d").is_err()
            })
    }

    fn focused_field(&self) -> Option<(&FilterDescriptor, &str)> {
        match self.slots.get(self.focus)? {
            Slot::Field {
                filter, value_key, ..
            } => Some((&self.filters[*filter], value_key.as_str())),
            _ => None,
        }
    }

    /// Select options with a leading "Any" entry that clears the constraint
    fn options_of(filter: &FilterDescriptor) -> Vec<FilterOption> {
        let mut options = vec![FilterOption::new("", "Any")];
        options.extend(filter.options.iter().cloned());
        options
    }

    fn cycle_option(&mut self, forward: bool) {
        let Some((filter, key)) = self.focused_field() else {
            return;
        };
        if filter.kind != FilterKind::Select {
            return;
        }
        let options = Self::options_of(filter);
        let key = key.to_string();
        let current = options
            .iter()
            .position(|o| o.value == self.staged.get(&key))
            .unwrap_or(0);
        let next = if forward {
            (current + 1) % options.len()
        } else {
            (current + options.len() - 1) % options.len()
        };
        self.set_staged(&key, &options[next].value);
    }

    fn move_focus(&mut self, forward: bool) {
        let len = self.slots.len();
        self.focus = if forward {
            (self.focus + 1) % len
        } else {
            (self.focus + len - 1) % len
        };
    }

    fn open_dropdown(&mut self) {
        if let Some((filter, key)) = self.focused_field() {
            if filter.kind == FilterKind::Select {
                let current = Self::options_of(filter)
                    .iter()
                    .position(|o| o.value == self.staged.get(key))
                    .unwrap_or(0);
                self.dropdown = Some(current);
            }
        }
    }

    fn pick_dropdown(&mut self, index: usize) {
        if let Some((filter, key)) = self.focused_field() {
            let options = Self::options_of(filter);
            if let Some(option) = options.get(index) {
                let key = key.to_string();
                let value = option.value.clone();
                self.set_staged(&key, &value);
            }
        }
        self.dropdown = None;
    }

    fn edit_text(&mut self, c: Option<char>) {
        let Some((filter, key)) = self.focused_field() else {
            return;
        };
        let date_like = matches!(filter.kind, FilterKind::Date | FilterKind::DateRange);
        if filter.kind == FilterKind::Select {
            return;
        }
        let key = key.to_string();
        let mut value = self.staged.get(&key).to_string();
        match c {
            Some(c) if date_like && !(c.is_ascii_digit() || c == '-') => return,
            Some(c) => value.push(c),
            None => {
                value.pop();
            }
        }
        self.set_staged(&key, &value);
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> PopoverOutcome {
        if let Some(highlight) = self.dropdown {
            let count = self
                .focused_field()
                .map(|(f, _)| Self::options_of(f).len())
                .unwrap_or(1);
            match key.code {
                KeyCode::Esc => self.dropdown = None,
                KeyCode::Up | KeyCode::Char('k') => {
                    self.dropdown = Some(highlight.saturating_sub(1));
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    self.dropdown = Some((highlight + 1).min(count - 1));
                }
                KeyCode::Enter => self.pick_dropdown(highlight),
                _ => {}
            }
            return PopoverOutcome::None;
        }

        match key.code {
            KeyCode::Esc => return PopoverOutcome::Close,
            KeyCode::Down | KeyCode::Tab => self.move_focus(true),
            KeyCode::Up | KeyCode::BackTab => self.move_focus(false),
            KeyCode::Left => self.cycle_option(false),
            KeyCode::Right => self.cycle_option(true),
            KeyCode::Backspace => self.edit_text(None),
            KeyCode::Enter => match self.slots.get(self.focus).cloned() {
                Some(Slot::Apply) => return PopoverOutcome::Apply,
                Some(Slot::Clear) => return PopoverOutcome::Clear,
                Some(Slot::Field { filter, .. })
                    if self.filters[filter].kind == FilterKind::Select =>
                {
                    self.open_dropdown()
                }
                Some(Slot::Field { .. }) => self.move_focus(true),
                None => {}
            },
            KeyCode::Char(c) => self.edit_text(Some(c)),
            _ => {}
        }
        PopoverOutcome::None
    }

    /// Pointer-down inside the popover or its dropdown
    pub fn handle_click(&mut self, column: u16, row: u16) -> PopoverOutcome {
        let at = Position::new(column, row);
        if let (Some(_), Some(area)) = (self.dropdown, self.dropdown_area) {
            if area.contains(at) {
                // Border rows pick the nearest option
                let visible = area.height.saturating_sub(2).max(1);
                let line = row.saturating_sub(area.y + 1).min(visible - 1);
                let last = self
                    .focused_field()
                    .map(|(filter, _)| Self::options_of(filter).len().saturating_sub(1))
                    .unwrap_or(0);
                self.pick_dropdown((self.dropdown_offset + line as usize).min(last));
                return PopoverOutcome::None;
            }
        }
        let hit = self
            .slot_areas
            .iter()
            .find(|(_, area)| area.contains(at))
            .map(|(slot, _)| *slot);
        let Some(slot) = hit else {
            return PopoverOutcome::None;
        };
        self.focus = slot;
        self.dropdown = None;
        match self.slots[slot].clone() {
            Slot::Apply => PopoverOutcome::Apply,
            Slot::Clear => PopoverOutcome::Clear,
            Slot::Field { filter, .. } if self.filters[filter].kind == FilterKind::Select => {
                self.open_dropdown();
                PopoverOutcome::None
            }
            Slot::Field { .. } => PopoverOutcome::None,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Rendering
    // ─────────────────────────────────────────────────────────────────────────

    fn field_text(&self, filter: &FilterDescriptor, key: &str) -> (String, Style) {
        let value = self.staged.get(key);
        match filter.kind {
            FilterKind::Select => {
                let label = filter.option_label(value).unwrap_or("Any");
                (format!("{} ▾", label), Style::default().fg(Color::White))
            }
            _ if value.is_empty() => {
                let placeholder = filter.placeholder.as_deref().unwrap_or(match filter.kind {
                    FilterKind::Text => "…",
                    _ => "YYYY-MM-DD",
                });
                (placeholder.to_string(), Style::default().fg(Color::DarkGray))
            }
            _ => (value.to_string(), Style::default().fg(Color::White)),
        }
    }

    /// Draw into `area`; the caller clears nothing beneath it
    pub fn draw(&mut self, frame: &mut Frame, area: Rect, viewport: Rect) {
        frame.render_widget(Clear, area);
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Filters ")
            .title_style(
                Style::default()
                    .fg(Color::Magenta)
                    .add_modifier(Modifier::BOLD),
            )
            .border_style(Style::default().fg(Color::Cyan));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        self.slot_areas.clear();
        let mut lines = Vec::new();
        let mut focused_row = None;

        for (i, slot) in self.slots.iter().enumerate() {
            let Slot::Field {
                filter,
                value_key,
                label,
            } = slot
            else {
                continue;
            };
            let focused = i == self.focus;
            let (text, style) = self.field_text(&self.filters[*filter], value_key);
            let style = if focused {
                style.bg(Color::Blue).add_modifier(Modifier::BOLD)
            } else {
                style
            };
            let row = inner.y + lines.len() as u16;
            if focused {
                focused_row = Some(row);
            }
            self.slot_areas
                .push((i, Rect::new(inner.x, row, inner.width, 1)));
            lines.push(Line::from(vec![
                Span::styled(
                    format!("{:<width$}", label, width = LABEL_WIDTH),
                    Style::default().fg(Color::Cyan),
                ),
                Span::styled(format!(" {} ", text), style),
            ]));
        }

        lines.push(Line::from(""));
        let buttons_row = inner.y + lines.len() as u16;
        let apply_focused = self.slots.get(self.focus) == Some(&Slot::Apply);
        let clear_focused = self.slots.get(self.focus) == Some(&Slot::Clear);
        let button_style = |focused: bool, color: Color| {
            let style = Style::default().fg(color).add_modifier(Modifier::BOLD);
            if focused {
                style.bg(Color::Blue)
            } else {
                style
            }
        };
        lines.push(Line::from(vec![
            Span::styled(" Apply ", button_style(apply_focused, Color::Green)),
            Span::raw("  "),
            Span::styled(" Clear ", button_style(clear_focused, Color::Yellow)),
        ]));
        let apply_index = self.slots.len() - 2;
        self.slot_areas
            .push((apply_index, Rect::new(inner.x, buttons_row, 7, 1)));
        self.slot_areas
            .push((apply_index + 1, Rect::new(inner.x + 9, buttons_row, 7, 1)));

        if let Some(error) = &self.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        }

        frame.render_widget(Paragraph::new(lines), inner);

        self.dropdown_area = None;
        if let (Some(highlight), Some(row)) = (self.dropdown, focused_row) {
            self.draw_dropdown(frame, highlight, row, inner, viewport);
        }
    }

    fn draw_dropdown(
        &mut self,
        frame: &mut Frame,
        highlight: usize,
        row: u16,
        inner: Rect,
        viewport: Rect,
    ) {
        let Some((filter, _)) = self.focused_field() else {
            return;
        };
        let options = Self::options_of(filter);
        let height = options.len() as u16 + 2;
        let x = inner.x + LABEL_WIDTH as u16;
        let area = Rect::new(x, row + 1, DROPDOWN_WIDTH, height).intersection(viewport);

        let items: Vec<ListItem> = options
            .iter()
            .map(|o| ListItem::new(Line::from(o.label.clone())))
            .collect();
        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::DarkGray)),
            )
            .highlight_style(
                Style::default()
                    .bg(Color::Blue)
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("▶ ");
        let mut state = ListState::default();
        state.select(Some(highlight));

        frame.render_widget(Clear, area);
        frame.render_stateful_widget(list, area, &mut state);
        self.dropdown_area = Some(area);
        self.dropdown_offset = state.offset();
    }
}

//! Per-row contextual action menu

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState},
    Frame,
};

/// Fixed width of every action menu
pub const MENU_WIDTH: u16 = 24;

/// An action offered in each row's menu
pub struct RowAction<T> {
    pub id: String,
    pub label: String,
    /// Rendered in red
    pub destructive: bool,
    visible: Option<Box<dyn Fn(&T) -> bool>>,
}

impl<T> RowAction<T> {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            destructive: false,
            visible: None,
        }
    }

    pub fn destructive(mut self) -> Self {
        self.destructive = true;
        self
    }

    /// Only offer the action for records matching `predicate`
    pub fn visible_when(mut self, predicate: impl Fn(&T) -> bool + 'static) -> Self {
        self.visible = Some(Box::new(predicate));
        self
    }

    pub fn is_visible(&self, record: &T) -> bool {
        self.visible.as_ref().map_or(true, |p| p(record))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct MenuItem {
    id: String,
    label: String,
    destructive: bool,
}

/// Outcome of a key or click inside the menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuOutcome {
    None,
    Invoke(String),
    Close,
}

/// Open action menu of one row
#[derive(Debug, Clone)]
pub struct ActionMenu {
    pub row_key: String,
    pub row_index: usize,
    items: Vec<MenuItem>,
    highlight: usize,
    area: Option<Rect>,
}

impl ActionMenu {
    /// Menu for `record`, or `None` when no action is visible for it
    pub fn for_record<T>(
        actions: &[RowAction<T>],
        record: &T,
        row_key: String,
        row_index: usize,
    ) -> Option<Self> {
        let items: Vec<MenuItem> = actions
            .iter()
            .filter(|a| a.is_visible(record))
            .map(|a| MenuItem {
                id: a.id.clone(),
                label: a.label.clone(),
                destructive: a.destructive,
            })
            .collect();
        if items.is_empty() {
            return None;
        }
        Some(Self {
            row_key,
            row_index,
            items,
            highlight: 0,
            area: None,
        })
    }

    pub fn height(&self) -> u16 {
        self.items.len() as u16 + 2
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> MenuOutcome {
        match key.code {
            KeyCode::Esc | KeyCode::Char('m') => MenuOutcome::Close,
            KeyCode::Up | KeyCode::Char('k') => {
                self.highlight = self.highlight.saturating_sub(1);
                MenuOutcome::None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.highlight = (self.highlight + 1).min(self.items.len() - 1);
                MenuOutcome::None
            }
            KeyCode::Enter => MenuOutcome::Invoke(self.items[self.highlight].id.clone()),
            _ => MenuOutcome::None,
        }
    }

    pub fn handle_click(&mut self, column: u16, row: u16) -> MenuOutcome {
        let Some(area) = self.area else {
            return MenuOutcome::None;
        };
        if !area.contains(Position::new(column, row)) || row <= area.y {
            return MenuOutcome::None;
        }
        match self.items.get((row - area.y - 1) as usize) {
            Some(item) => MenuOutcome::Invoke(item.id.clone()),
            None => MenuOutcome::None,
        }
    }

    pub fn draw(&mut self, frame: &mut Frame, area: Rect) {
        let items: Vec<ListItem> = self
            .items
            .iter()
            .map(|item| {
                let style = if item.destructive {
                    Style::default().fg(Color::Red)
                } else {
                    Style::default().fg(Color::White)
                };
                ListItem::new(Line::from(Span::styled(item.label.clone(), style)))
            })
            .collect();

        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan)),
            )
            .highlight_style(
                Style::default()
                    .bg(Color::Blue)
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("▶ ");
        let mut state = ListState::default();
        state.select(Some(self.highlight));

        frame.render_widget(Clear, area);
        frame.render_stateful_widget(list, area, &mut state);
        self.area = Some(area);
    }
}

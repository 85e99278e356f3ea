//! Help dialog component
//!
//! Keyboard reference for the table and the browser around it.

use crate::action::Action;
use crate::component::Component;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
    Frame,
};

/// Help dialog showing all keyboard shortcuts
#[derive(Default)]
pub struct HelpDialog {
    pub scroll_offset: usize,
}

impl HelpDialog {
    pub fn new(scroll_offset: usize) -> Self {
        Self { scroll_offset }
    }
}

impl Component for HelpDialog {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let action = match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') => Some(Action::CloseModal),
            KeyCode::Char('j') | KeyCode::Down => Some(Action::ModalDown),
            KeyCode::Char('k') | KeyCode::Up => Some(Action::ModalUp),
            _ => None,
        };
        Ok(action)
    }

    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        match action {
            Action::ModalDown => self.scroll_offset = self.scroll_offset.saturating_add(1),
            Action::ModalUp => self.scroll_offset = self.scroll_offset.saturating_sub(1),
            _ => {}
        }
        Ok(None)
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect) -> Result<()> {
        // Clear the area
        frame.render_widget(Clear, area);

        let margin = 4;
        let dialog_area = Rect::new(
            area.x + margin,
            area.y + margin,
            area.width.saturating_sub(margin * 2),
            area.height.saturating_sub(margin * 2),
        );

        let content = build_help_content();
        let total = content.len();
        let visible_height = dialog_area.height.saturating_sub(2) as usize;

        // Clamp scroll offset
        let max_scroll = total.saturating_sub(visible_height);
        if self.scroll_offset > max_scroll {
            self.scroll_offset = max_scroll;
        }

        let paragraph = Paragraph::new(content.clone())
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Keyboard Shortcuts ")
                    .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
                    .border_style(Style::default().fg(Color::Cyan)),
            )
            .scroll((self.scroll_offset as u16, 0));

        frame.render_widget(paragraph, dialog_area);

        // Render scrollbar if content exceeds visible area
        if total > visible_height {
            let mut scrollbar_state =
                ScrollbarState::new(total.saturating_sub(visible_height)).position(self.scroll_offset);

            frame.render_stateful_widget(
                Scrollbar::new(ScrollbarOrientation::VerticalRight)
                    .begin_symbol(Some("↑"))
                    .end_symbol(Some("↓")),
                dialog_area.inner(ratatui::layout::Margin {
                    vertical: 1,
                    horizontal: 0,
                }),
                &mut scrollbar_state,
            );
        }

        Ok(())
    }
}

/// Build the help content with all keyboard shortcuts
fn build_help_content() -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    // Helper to add a section header
    let add_section = |lines: &mut Vec<Line<'static>>, title: &str| {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("  {} ", title),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(Span::styled(
            format!("  {}", "─".repeat(title.len() + 2)),
            Style::default().fg(Color::DarkGray),
        )));
    };

    // Helper to add a shortcut line
    let add_shortcut = |lines: &mut Vec<Line<'static>>, key: &str, description: &str| {
        lines.push(Line::from(vec![
            Span::styled(
                format!("  {:12}", key),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::styled(description.to_string(), Style::default().fg(Color::White)),
        ]));
    };

    add_section(&mut lines, "Rows");
    add_shortcut(&mut lines, "j / ↓", "Next row");
    add_shortcut(&mut lines, "k / ↑", "Previous row");
    add_shortcut(&mut lines, "g / G", "First / last row");
    add_shortcut(&mut lines, "Enter", "Open record details");
    add_shortcut(&mut lines, "m", "Row actions menu");

    add_section(&mut lines, "Columns");
    add_shortcut(&mut lines, "h / l", "Focus previous / next column");
    add_shortcut(&mut lines, "s", "Cycle sort: asc, desc, none");

    add_section(&mut lines, "Selection & Export");
    add_shortcut(&mut lines, "Space", "Toggle row selection");
    add_shortcut(&mut lines, "a", "Select or clear the whole page");
    add_shortcut(&mut lines, "Esc", "Clear selection");
    add_shortcut(&mut lines, "x", "Export selected rows (.xls)");

    add_section(&mut lines, "Search & Filters");
    add_shortcut(&mut lines, "/", "Search (submits after a pause)");
    add_shortcut(&mut lines, "Enter", "Submit search now");
    add_shortcut(&mut lines, "Esc", "Leave search box");
    add_shortcut(&mut lines, "f", "Advanced filters");
    add_shortcut(&mut lines, "Tab", "Next filter field (popover)");
    add_shortcut(&mut lines, "← / →", "Change filter value (popover)");

    add_section(&mut lines, "Pages");
    add_shortcut(&mut lines, "n / →", "Next page");
    add_shortcut(&mut lines, "p / ←", "Previous page");
    add_shortcut(&mut lines, "1-9", "Go to page");
    add_shortcut(&mut lines, "z", "Cycle page size");

    add_section(&mut lines, "Browser");
    add_shortcut(&mut lines, "[ / ]", "Back / forward through locations");
    add_shortcut(&mut lines, "r", "Reload current page");
    add_shortcut(&mut lines, "?", "Show this help");
    add_shortcut(&mut lines, "q", "Quit / Close dialog");
    add_shortcut(&mut lines, "Ctrl+c", "Quit immediately");

    // Footer
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "  Press q, Esc, or ? to close",
        Style::default().fg(Color::DarkGray),
    )));

    lines
}

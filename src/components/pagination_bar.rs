//! Pagination bar rendered under the table body

use ratatui::{
    layout::{Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::model::pagination::PaginationSnapshot;

/// Clickable element of the bar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagerTarget {
    Previous,
    Next,
    Page(usize),
    PageSize,
}

/// Hit regions recorded by the last draw
#[derive(Debug, Clone, Default)]
pub struct PaginationBar {
    hits: Vec<(Rect, PagerTarget)>,
}

impl PaginationBar {
    /// Forget the regions of a bar that is no longer drawn
    pub fn clear(&mut self) {
        self.hits.clear();
    }

    pub fn target_at(&self, column: u16, row: u16) -> Option<PagerTarget> {
        let at = Position::new(column, row);
        self.hits
            .iter()
            .find(|(area, _)| area.contains(at))
            .map(|(_, target)| *target)
    }

    /// Draw the bar; page buttons are omitted when there is a single page
    pub fn draw(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        snapshot: &PaginationSnapshot,
        show_page_size: bool,
    ) {
        self.hits.clear();
        let mut spans: Vec<Span<'static>> = Vec::new();
        let mut x = area.x;

        let mut push = |spans: &mut Vec<Span<'static>>,
                        hits: &mut Vec<(Rect, PagerTarget)>,
                        text: String,
                        style: Style,
                        target: Option<PagerTarget>| {
            let width = text.width() as u16;
            // Buttons pushed past the right edge are not clickable
            let hit = Rect::new(x, area.y, width, 1).intersection(area);
            if let (Some(target), false) = (target, hit.is_empty()) {
                hits.push((hit, target));
            }
            x = x.saturating_add(width);
            spans.push(Span::styled(text, style));
        };

        let enabled = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
        let disabled = Style::default().fg(Color::DarkGray);

        if snapshot.shows_page_numbers() {
            let (style, target) = if snapshot.has_previous() {
                (enabled, Some(PagerTarget::Previous))
            } else {
                (disabled, None)
            };
            push(&mut spans, &mut self.hits, " ‹ Prev ".to_string(), style, target);

            for page in snapshot.window() {
                let style = if page == snapshot.page {
                    Style::default()
                        .fg(Color::Black)
                        .bg(Color::Cyan)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::White)
                };
                push(
                    &mut spans,
                    &mut self.hits,
                    format!(" {} ", page),
                    style,
                    Some(PagerTarget::Page(page)),
                );
            }

            let (style, target) = if snapshot.has_next() {
                (enabled, Some(PagerTarget::Next))
            } else {
                (disabled, None)
            };
            push(&mut spans, &mut self.hits, " Next › ".to_string(), style, target);
            push(&mut spans, &mut self.hits, "  ".to_string(), Style::default(), None);
        }

        if show_page_size {
            push(
                &mut spans,
                &mut self.hits,
                format!(" Rows: {} ▾ ", snapshot.limit),
                Style::default().fg(Color::Yellow),
                Some(PagerTarget::PageSize),
            );
            push(&mut spans, &mut self.hits, "  ".to_string(), Style::default(), None);
        }

        let summary = match snapshot.record_range() {
            Some((first, last)) => format!("{}–{} of {}", first, last, snapshot.total),
            None => "0 records".to_string(),
        };
        push(
            &mut spans,
            &mut self.hits,
            summary,
            Style::default().fg(Color::DarkGray),
            None,
        );

        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}

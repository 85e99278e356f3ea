//! Record detail dialog
//!
//! Shows every serialized field of one record as a label/value list.

use crate::action::Action;
use crate::component::Component;
use crate::model::column::display_value;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};
use serde::Serialize;
use serde_json::Value;

const LABEL_WIDTH: usize = 12;

pub struct RecordDialog {
    title: String,
    /// Cached content lines
    content: Vec<Line<'static>>,
}

impl RecordDialog {
    pub fn new<T: Serialize>(title: impl Into<String>, record: &T) -> Result<Self> {
        let value = serde_json::to_value(record)?;
        Ok(Self {
            title: title.into(),
            content: render_fields(&value),
        })
    }

    /// Dialog for a record that no longer exists
    pub fn missing(key: &str) -> Self {
        Self {
            title: key.to_string(),
            content: vec![
                Line::from(""),
                Line::from(Span::styled(
                    format!("Record {} is not on this page", key),
                    Style::default().fg(Color::DarkGray),
                )),
            ],
        }
    }
}

impl Component for RecordDialog {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let action = match key.code {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => Some(Action::CloseModal),
            _ => None,
        };
        Ok(action)
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect) -> Result<()> {
        frame.render_widget(Clear, area);
        let background = Block::default().style(Style::default().bg(Color::Reset));
        frame.render_widget(background, area);

        let margin = 2;
        let overlay_area = Rect::new(
            area.x + margin,
            area.y + margin,
            area.width.saturating_sub(margin * 2),
            area.height.saturating_sub(margin * 2),
        );

        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(3)])
            .split(overlay_area);

        let paragraph = Paragraph::new(self.content.clone()).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(format!(" {} ", self.title))
                .title_style(
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ),
        );
        frame.render_widget(paragraph, main_chunks[0]);

        let help = Paragraph::new(Line::from(vec![
            Span::styled(
                " Enter/Esc ",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("Close"),
        ]))
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(help, main_chunks[1]);

        Ok(())
    }
}

fn render_fields(value: &Value) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from("")];
    let Value::Object(fields) = value else {
        lines.push(Line::from(format!("  {}", display_value(value))));
        return lines;
    };

    for (name, field) in fields {
        let text = match field {
            Value::Null => Span::styled("—", Style::default().fg(Color::DarkGray)),
            Value::Number(_) => Span::styled(display_value(field), Style::default().fg(Color::Cyan)),
            _ => Span::styled(display_value(field), Style::default().fg(Color::White)),
        };
        lines.push(Line::from(vec![
            Span::styled(
                format!("  {:width$}", name, width = LABEL_WIDTH),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
            text,
        ]));
    }
    lines
}

//! Terminal User Interface management
//!
//! Handles terminal setup, teardown, and event polling. The table reacts to
//! key presses, left pointer-downs and wheel scrolls, and its debounce and
//! query polling run on ticks, so `next_event` yields exactly those.

use anyhow::Result;
use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyEvent, KeyEventKind,
        MouseButton, MouseEvent, MouseEventKind,
    },
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{
    io::{self, Stdout},
    time::{Duration, Instant},
};

/// Interval between ticks
const TICK_RATE: Duration = Duration::from_millis(50);

/// Input the main loop reacts to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TuiEvent {
    /// The tick interval elapsed
    Tick,
    Key(KeyEvent),
    /// Left pointer-down or wheel scroll
    Mouse(MouseEvent),
    Resize(u16, u16),
}

/// Terminal wrapper for managing the TUI lifecycle
pub struct Tui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    last_tick: Instant,
}

impl Tui {
    /// Create a new Tui instance
    pub fn new() -> Result<Self> {
        let backend = CrosstermBackend::new(io::stdout());
        let terminal = Terminal::new(backend)?;
        Ok(Self {
            terminal,
            last_tick: Instant::now(),
        })
    }

    /// Enter the alternate screen, enable raw mode and mouse capture
    ///
    /// This should be called before the main loop starts.
    pub fn enter(&mut self) -> Result<()> {
        terminal::enable_raw_mode()?;
        crossterm::execute!(
            io::stdout(),
            EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide
        )?;
        self.terminal.clear()?;
        Ok(())
    }

    /// Exit the alternate screen, disable raw mode and release the mouse
    ///
    /// Also called automatically on Drop.
    pub fn exit(&mut self) -> Result<()> {
        terminal::disable_raw_mode()?;
        crossterm::execute!(
            io::stdout(),
            LeaveAlternateScreen,
            DisableMouseCapture,
            cursor::Show
        )?;
        Ok(())
    }

    /// Wait for the next input or tick
    ///
    /// Ticks are due every `TICK_RATE` even while input keeps arriving, so a
    /// held key or a stream of drags cannot starve the search debounce.
    /// Ignored input does not reset the wait.
    pub fn next_event(&mut self) -> Result<TuiEvent> {
        loop {
            let timeout = TICK_RATE.saturating_sub(self.last_tick.elapsed());
            if timeout.is_zero() || !event::poll(timeout)? {
                self.last_tick = Instant::now();
                return Ok(TuiEvent::Tick);
            }
            if let Some(event) = table_input(event::read()?) {
                return Ok(event);
            }
        }
    }

    /// Draw to the terminal using the provided closure
    pub fn draw<F>(&mut self, f: F) -> Result<()>
    where
        F: FnOnce(&mut ratatui::Frame),
    {
        self.terminal.draw(f)?;
        Ok(())
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        // Best effort cleanup on drop
        let _ = self.exit();
    }
}

/// Keep the input the table understands
///
/// Key releases (Windows) are dropped. The table acts on pointer-down only,
/// so releases, moves, drags and other buttons never reach it.
fn table_input(event: Event) -> Option<TuiEvent> {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => Some(TuiEvent::Key(key)),
        Event::Mouse(mouse) => match mouse.kind {
            MouseEventKind::Down(MouseButton::Left)
            | MouseEventKind::ScrollDown
            | MouseEventKind::ScrollUp => Some(TuiEvent::Mouse(mouse)),
            _ => None,
        },
        Event::Resize(width, height) => Some(TuiEvent::Resize(width, height)),
        _ => None,
    }
}

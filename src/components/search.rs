//! Debounced search channel
//!
//! Holds the live text of the search filter and a cancellable deadline. Every
//! edit restarts the deadline; when it passes, `poll` reports a single submit.
//! A zero delay disables the timer so only explicit submits go out.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct DebouncedSearch {
    value: String,
    delay: Duration,
    deadline: Option<Instant>,
    /// Whether the search box has keyboard focus
    pub editing: bool,
}

impl DebouncedSearch {
    pub fn new(debounce_ms: u64) -> Self {
        Self {
            value: String::new(),
            delay: Duration::from_millis(debounce_ms),
            deadline: None,
            editing: false,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_debounced(&self) -> bool {
        !self.delay.is_zero()
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Adopt the caller's committed value while the user is not typing
    pub fn sync(&mut self, committed: &str) {
        if !self.editing && self.deadline.is_none() && self.value != committed {
            self.value = committed.to_string();
        }
    }

    /// Record an edit and restart the timer
    pub fn input(&mut self, value: String, now: Instant) {
        self.value = value;
        if self.is_debounced() {
            self.deadline = Some(now + self.delay);
        }
    }

    pub fn push(&mut self, c: char, now: Instant) {
        let mut value = self.value.clone();
        value.push(c);
        self.input(value, now);
    }

    pub fn backspace(&mut self, now: Instant) {
        let mut value = self.value.clone();
        if value.pop().is_some() {
            self.input(value, now);
        }
    }

    /// `true` exactly once when the quiet period has elapsed
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}

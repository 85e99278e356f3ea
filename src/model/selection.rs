//! Row selection by opaque key
//!
//! Selection is tracked by row key, never by position, so it survives
//! re-sorting and re-filtering. Keys of rows that are not currently rendered
//! are kept untouched.

use std::collections::BTreeSet;

/// Tri-state of the header checkbox
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderCheck {
    Checked,
    Indeterminate,
    Unchecked,
}

impl HeaderCheck {
    pub fn symbol(&self) -> &'static str {
        match self {
            HeaderCheck::Checked => "[x]",
            HeaderCheck::Indeterminate => "[-]",
            HeaderCheck::Unchecked => "[ ]",
        }
    }
}

/// Set of selected row keys
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    keys: BTreeSet<String>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Copy with `key` flipped
    pub fn toggled(&self, key: &str) -> Selection {
        let mut next = self.clone();
        if !next.keys.remove(key) {
            next.keys.insert(key.to_string());
        }
        next
    }

    /// Copy after a "select all" click over the `visible` keys
    ///
    /// If every visible key is already selected the selection is cleared,
    /// otherwise the visible keys are added to it.
    pub fn select_all<'a>(&self, visible: impl IntoIterator<Item = &'a str>) -> Selection {
        let visible: Vec<&str> = visible.into_iter().collect();
        if !visible.is_empty() && visible.iter().all(|k| self.contains(k)) {
            return Selection::new();
        }
        let mut next = self.clone();
        next.keys.extend(visible.into_iter().map(str::to_string));
        next
    }

    /// Header checkbox state against the `visible` keys
    pub fn header_check<'a>(&self, visible: impl IntoIterator<Item = &'a str>) -> HeaderCheck {
        let visible: Vec<&str> = visible.into_iter().collect();
        if !visible.is_empty() && visible.iter().all(|k| self.contains(k)) {
            HeaderCheck::Checked
        } else if !self.is_empty() {
            HeaderCheck::Indeterminate
        } else {
            HeaderCheck::Unchecked
        }
    }
}

impl<S: Into<String>> FromIterator<S> for Selection {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().map(Into::into).collect(),
        }
    }
}

//! Pagination snapshot and addressable location
//!
//! Pagination is server driven: the caller owns the snapshot and mirrors
//! `page`/`limit` into a `Location`. The table only produces new locations.

use std::fmt;
use std::str::FromStr;

/// Maximum number of page buttons shown in the pagination bar
pub const PAGE_WINDOW: usize = 5;

/// Page/limit/total as reported by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationSnapshot {
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub pages: usize,
}

impl PaginationSnapshot {
    /// Build a snapshot from a requested page, clamping it into range
    pub fn new(page: usize, limit: usize, total: usize) -> Self {
        let limit = limit.max(1);
        let pages = total.div_ceil(limit);
        let page = page.clamp(1, pages.max(1));
        Self {
            page,
            limit,
            total,
            pages,
        }
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.pages
    }

    /// Whether the page-number row should be rendered at all
    pub fn shows_page_numbers(&self) -> bool {
        self.pages > 1
    }

    /// 1-based inclusive range of records on this page, `None` when empty
    pub fn record_range(&self) -> Option<(usize, usize)> {
        if self.total == 0 {
            return None;
        }
        let first = (self.page - 1) * self.limit + 1;
        let last = (self.page * self.limit).min(self.total);
        Some((first, last))
    }

    /// Zero-based slice bounds of this page within `total` records
    pub fn offset_range(&self) -> std::ops::Range<usize> {
        let start = ((self.page - 1) * self.limit).min(self.total);
        let end = (start + self.limit).min(self.total);
        start..end
    }

    pub fn window(&self) -> Vec<usize> {
        page_window(self.page, self.pages)
    }
}

/// Sliding window of at most `PAGE_WINDOW` page numbers centered on `page`
///
/// The window is clamped so it never starts before page 1 or runs past the
/// last page.
pub fn page_window(page: usize, pages: usize) -> Vec<usize> {
    if pages <= PAGE_WINDOW {
        return (1..=pages).collect();
    }
    let half = PAGE_WINDOW / 2;
    let mut start = page.saturating_sub(half).max(1);
    let mut end = start + PAGE_WINDOW - 1;
    if end > pages {
        end = pages;
        start = pages + 1 - PAGE_WINDOW;
    }
    (start..=end).collect()
}

// ═══════════════════════════════════════════════════════════════════════════════
// Location
// ═══════════════════════════════════════════════════════════════════════════════

/// A path plus ordered query parameters, e.g. `/accounts?page=2&limit=10`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    pub path: String,
    params: Vec<(String, String)>,
}

impl Location {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            params: Vec::new(),
        }
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set a parameter in place; an empty value removes it
    pub fn set_param(&mut self, key: &str, value: &str) {
        if value.is_empty() {
            self.params.retain(|(k, _)| k != key);
            return;
        }
        match self.params.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value.to_string(),
            None => self.params.push((key.to_string(), value.to_string())),
        }
    }

    pub fn with_param(mut self, key: &str, value: &str) -> Self {
        self.set_param(key, value);
        self
    }

    /// Current page, defaulting to 1 when absent or malformed
    pub fn page(&self) -> usize {
        self.param("page")
            .and_then(|p| p.parse::<usize>().ok())
            .filter(|p| *p >= 1)
            .unwrap_or(1)
    }

    pub fn limit(&self, default: usize) -> usize {
        self.param("limit")
            .and_then(|l| l.parse::<usize>().ok())
            .filter(|l| *l > 0)
            .unwrap_or(default)
    }

    /// Navigation target for a page number
    pub fn with_page(&self, page: usize) -> Location {
        self.clone().with_param("page", &page.max(1).to_string())
    }

    /// Navigation target for a new page size; always returns to page 1
    pub fn with_page_size(&self, limit: usize) -> Location {
        self.clone()
            .with_param("page", "1")
            .with_param("limit", &limit.max(1).to_string())
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path)?;
        for (i, (k, v)) in self.params.iter().enumerate() {
            let sep = if i == 0 { '?' } else { '&' };
            write!(
                f,
                "{}{}={}",
                sep,
                urlencoding::encode(k),
                urlencoding::encode(v)
            )?;
        }
        Ok(())
    }
}

impl FromStr for Location {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (path, query) = match s.split_once('?') {
            Some((path, query)) => (path, query),
            None => (s, ""),
        };
        let mut location = Location::new(path);
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            let key = urlencoding::decode(&k.replace('+', " "))?.into_owned();
            let value = urlencoding::decode(&v.replace('+', " "))?.into_owned();
            location.set_param(&key, &value);
        }
        Ok(location)
    }
}

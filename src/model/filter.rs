//! Filter descriptors and committed filter values
//!
//! At most one `Text` descriptor acts as the instant search box. Every other
//! descriptor is "advanced" and is edited through the staged popover.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Kind of input a filter is edited with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterKind {
    Text,
    Select,
    Date,
    DateRange,
}

/// One choice of a `Select` filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOption {
    pub value: String,
    pub label: String,
}

impl FilterOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Describes one filterable field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterDescriptor {
    pub key: String,
    pub label: Option<String>,
    pub kind: FilterKind,
    #[serde(default)]
    pub options: Vec<FilterOption>,
    pub placeholder: Option<String>,
}

impl FilterDescriptor {
    fn new(key: impl Into<String>, kind: FilterKind) -> Self {
        Self {
            key: key.into(),
            label: None,
            kind,
            options: Vec::new(),
            placeholder: None,
        }
    }

    pub fn text(key: impl Into<String>) -> Self {
        Self::new(key, FilterKind::Text)
    }

    pub fn select(key: impl Into<String>, options: Vec<FilterOption>) -> Self {
        let mut filter = Self::new(key, FilterKind::Select);
        filter.options = options;
        filter
    }

    pub fn date(key: impl Into<String>) -> Self {
        Self::new(key, FilterKind::Date)
    }

    pub fn date_range(key: impl Into<String>) -> Self {
        Self::new(key, FilterKind::DateRange)
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    /// Label shown to the user, falling back to the key
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.key)
    }

    /// Keys this filter writes into `FilterValues`
    ///
    /// Date ranges own two keys, `<key>_from` and `<key>_to`.
    pub fn value_keys(&self) -> Vec<String> {
        match self.kind {
            FilterKind::DateRange => vec![range_from_key(&self.key), range_to_key(&self.key)],
            _ => vec![self.key.clone()],
        }
    }

    /// Label of the option whose value matches, if any
    pub fn option_label(&self, value: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|o| o.value == value)
            .map(|o| o.label.as_str())
    }
}

pub fn range_from_key(key: &str) -> String {
    format!("{}_from", key)
}

pub fn range_to_key(key: &str) -> String {
    format!("{}_to", key)
}

/// Split descriptors into the instant search filter and the advanced ones
pub fn split_filters(
    filters: &[FilterDescriptor],
) -> (Option<&FilterDescriptor>, Vec<&FilterDescriptor>) {
    let search_index = filters.iter().position(|f| f.kind == FilterKind::Text);
    let search = search_index.map(|i| &filters[i]);
    let advanced = filters
        .iter()
        .enumerate()
        .filter(|(i, _)| Some(*i) != search_index)
        .map(|(_, f)| f)
        .collect();
    (search, advanced)
}

/// Filter key → value. An empty or missing value means "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterValues {
    values: BTreeMap<String, String>,
}

impl FilterValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> &str {
        self.values.get(key).map(String::as_str).unwrap_or("")
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn is_set(&self, key: &str) -> bool {
        !self.get(key).is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FilterValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = FilterValues::new();
        for (k, v) in iter {
            values.set(k, v);
        }
        values
    }
}

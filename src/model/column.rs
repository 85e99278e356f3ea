//! Column descriptors
//!
//! A column knows how to turn a record into a visible cell and into a
//! primitive export value. Records only need to be `Serialize`: when a column
//! has no renderer or export projection, the raw field named by the column
//! key is looked up through `serde_json`.

use ratatui::text::Line;
use serde::Serialize;
use serde_json::Value;

pub type CellRenderer<T> = Box<dyn Fn(&T, usize) -> Line<'static>>;
pub type ExportProjection<T> = Box<dyn Fn(&T) -> Value>;

/// Metadata plus render/export rules for one field
pub struct Column<T> {
    /// Unique within a table
    pub key: String,
    pub header: String,
    /// Width in terminal cells
    pub width: u16,
    pub sortable: bool,
    /// Key under which the value is stored in an export row
    pub export_key: Option<String>,
    render: Option<CellRenderer<T>>,
    export_value: Option<ExportProjection<T>>,
}

impl<T> std::fmt::Debug for Column<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Column")
            .field("key", &self.key)
            .field("header", &self.header)
            .field("width", &self.width)
            .field("sortable", &self.sortable)
            .field("export_key", &self.export_key)
            .finish()
    }
}

impl<T: Serialize> Column<T> {
    pub fn new(key: impl Into<String>, header: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            header: header.into(),
            width: 16,
            sortable: false,
            export_key: None,
            render: None,
            export_value: None,
        }
    }

    pub fn width(mut self, width: u16) -> Self {
        self.width = width;
        self
    }

    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    pub fn render(mut self, render: impl Fn(&T, usize) -> Line<'static> + 'static) -> Self {
        self.render = Some(Box::new(render));
        self
    }

    pub fn export_key(mut self, key: impl Into<String>) -> Self {
        self.export_key = Some(key.into());
        self
    }

    pub fn export_value(mut self, project: impl Fn(&T) -> Value + 'static) -> Self {
        self.export_value = Some(Box::new(project));
        self
    }

    /// Visible cell for `record` at display `index`
    ///
    /// Without a renderer the raw field is shown; a missing field is an empty cell.
    pub fn cell(&self, record: &T, index: usize) -> Line<'static> {
        match &self.render {
            Some(render) => render(record, index),
            None => Line::from(
                raw_field(record, &self.key)
                    .map(|v| display_value(&v))
                    .unwrap_or_default(),
            ),
        }
    }

    /// Export projection, falling back to the raw field
    pub fn export_cell(&self, record: &T) -> Value {
        match &self.export_value {
            Some(project) => project(record),
            None => raw_field(record, &self.key).unwrap_or(Value::Null),
        }
    }

    pub fn export_name(&self) -> &str {
        self.export_key.as_deref().unwrap_or(&self.key)
    }
}

/// Raw field `key` of a serialized record; `None` when absent or null
pub fn raw_field<T: Serialize>(record: &T, key: &str) -> Option<Value> {
    match serde_json::to_value(record) {
        Ok(Value::Object(mut map)) => map.remove(key).filter(|v| !v.is_null()),
        _ => None,
    }
}

/// Plain text rendering of a primitive value
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

//! Export of selected rows to a spreadsheet file
//!
//! Rows are projected through the export columns (include-list, then
//! exclude-list), optionally reshaped by a global transform, serialized to
//! SpreadsheetML and written to `<directory>/<filename>.xls`.

pub mod spreadsheet;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::PathBuf;

use crate::model::column::Column;

pub use spreadsheet::write_workbook;

/// Extension of every exported file
pub const EXPORT_EXTENSION: &str = "xls";

/// Export column name → primitive value
pub type ExportRow = Map<String, Value>;

pub type RowTransform = Box<dyn Fn(Vec<ExportRow>) -> Vec<ExportRow>>;

/// Where and what to export
pub struct ExportConfig {
    /// Base filename, without extension
    pub filename: String,
    /// Worksheet name; defaults to the filename
    pub sheet_name: Option<String>,
    /// Column keys to keep; `None` keeps all
    pub include_columns: Option<Vec<String>>,
    /// Column keys to drop
    pub exclude_columns: Vec<String>,
    pub directory: PathBuf,
    transform: Option<RowTransform>,
}

impl std::fmt::Debug for ExportConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportConfig")
            .field("filename", &self.filename)
            .field("sheet_name", &self.sheet_name)
            .field("include_columns", &self.include_columns)
            .field("exclude_columns", &self.exclude_columns)
            .field("directory", &self.directory)
            .field("transform", &self.transform.is_some())
            .finish()
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self::new("export")
    }
}

impl ExportConfig {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            sheet_name: None,
            include_columns: None,
            exclude_columns: Vec::new(),
            directory: PathBuf::from("."),
            transform: None,
        }
    }

    pub fn sheet_name(mut self, name: impl Into<String>) -> Self {
        self.sheet_name = Some(name.into());
        self
    }

    pub fn include(mut self, keys: &[&str]) -> Self {
        self.include_columns = Some(keys.iter().map(|k| k.to_string()).collect());
        self
    }

    pub fn exclude(mut self, keys: &[&str]) -> Self {
        self.exclude_columns = keys.iter().map(|k| k.to_string()).collect();
        self
    }

    pub fn directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = directory.into();
        self
    }

    pub fn transform(
        mut self,
        transform: impl Fn(Vec<ExportRow>) -> Vec<ExportRow> + 'static,
    ) -> Self {
        self.transform = Some(Box::new(transform));
        self
    }

    pub fn target_path(&self) -> PathBuf {
        self.directory
            .join(format!("{}.{}", self.filename, EXPORT_EXTENSION))
    }

    fn keeps(&self, key: &str) -> bool {
        let included = self
            .include_columns
            .as_ref()
            .map_or(true, |keys| keys.iter().any(|k| k == key));
        included && !self.exclude_columns.iter().any(|k| k == key)
    }
}

/// A column of the exported sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportColumn {
    /// Header text
    pub label: String,
    /// Key into each `ExportRow`
    pub name: String,
}

impl ExportColumn {
    pub fn new(label: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            name: name.into(),
        }
    }
}

/// Everything needed to write one sheet
#[derive(Debug, Clone, PartialEq)]
pub struct ExportDocument {
    pub sheet_name: String,
    pub columns: Vec<ExportColumn>,
    pub rows: Vec<ExportRow>,
}

/// Columns kept by `config`, in table order
pub fn export_columns<'a, T: Serialize>(
    columns: &'a [Column<T>],
    config: &ExportConfig,
) -> Vec<&'a Column<T>> {
    columns.iter().filter(|c| config.keeps(&c.key)).collect()
}

/// Project `records` through the export columns
pub fn build_document<T: Serialize>(
    records: &[&T],
    columns: &[Column<T>],
    config: &ExportConfig,
) -> ExportDocument {
    let columns = export_columns(columns, config);
    let rows: Vec<ExportRow> = records
        .iter()
        .map(|record| {
            columns
                .iter()
                .map(|c| (c.export_name().to_string(), c.export_cell(record)))
                .collect()
        })
        .collect();
    let rows = match &config.transform {
        Some(transform) => transform(rows),
        None => rows,
    };

    ExportDocument {
        sheet_name: config
            .sheet_name
            .clone()
            .unwrap_or_else(|| config.filename.clone()),
        columns: columns
            .iter()
            .map(|c| ExportColumn::new(c.header.clone(), c.export_name()))
            .collect(),
        rows,
    }
}

/// Write `doc` to the configured target, creating the directory if needed
pub fn download(doc: &ExportDocument, config: &ExportConfig) -> Result<PathBuf> {
    if !config.directory.exists() {
        fs::create_dir_all(&config.directory).with_context(|| {
            format!(
                "Failed to create export directory {}",
                config.directory.display()
            )
        })?;
    }
    let path = config.target_path();
    let xml = write_workbook(doc)?;
    fs::write(&path, xml).with_context(|| format!("Failed to write {}", path.display()))?;
    log::info!("exported {} rows to {}", doc.rows.len(), path.display());
    Ok(path)
}

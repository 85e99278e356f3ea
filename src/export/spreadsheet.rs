//! SpreadsheetML 2003 writer
//!
//! A single worksheet holding one table: a header row of labels followed by
//! one row per record. Numbers are typed `Number`, everything else `String`.

use anyhow::Result;
use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde_json::Value;
use std::io::{Cursor, Write};

use super::ExportDocument;
use crate::model::column::display_value;

const SPREADSHEET_NS: &str = "urn:schemas-microsoft-com:office:spreadsheet";

/// Serialize `doc` to a SpreadsheetML document
pub fn write_workbook(doc: &ExportDocument) -> Result<String> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 1);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut workbook = BytesStart::new("Workbook");
    workbook.push_attribute(("xmlns", SPREADSHEET_NS));
    workbook.push_attribute(("xmlns:ss", SPREADSHEET_NS));
    writer.write_event(Event::Start(workbook))?;

    let mut worksheet = BytesStart::new("Worksheet");
    worksheet.push_attribute(("ss:Name", doc.sheet_name.as_str()));
    writer.write_event(Event::Start(worksheet))?;
    writer.write_event(Event::Start(BytesStart::new("Table")))?;

    let header: Vec<Value> = doc
        .columns
        .iter()
        .map(|c| Value::String(c.label.clone()))
        .collect();
    write_row(&mut writer, header.iter())?;

    for row in &doc.rows {
        let cells = doc
            .columns
            .iter()
            .map(|c| row.get(&c.name).unwrap_or(&Value::Null));
        write_row(&mut writer, cells)?;
    }

    writer.write_event(Event::End(BytesEnd::new("Table")))?;
    writer.write_event(Event::End(BytesEnd::new("Worksheet")))?;
    writer.write_event(Event::End(BytesEnd::new("Workbook")))?;

    let bytes = writer.into_inner().into_inner();
    Ok(String::from_utf8(bytes)?)
}

fn write_row<'a, W: Write>(
    writer: &mut Writer<W>,
    cells: impl Iterator<Item = &'a Value>,
) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new("Row")))?;
    for value in cells {
        write_cell(writer, value)?;
    }
    writer.write_event(Event::End(BytesEnd::new("Row")))?;
    Ok(())
}

fn write_cell<W: Write>(writer: &mut Writer<W>, value: &Value) -> Result<()> {
    let kind = if value.is_number() { "Number" } else { "String" };
    let text = display_value(value);

    writer.write_event(Event::Start(BytesStart::new("Cell")))?;
    let mut data = BytesStart::new("Data");
    data.push_attribute(("ss:Type", kind));
    writer.write_event(Event::Start(data))?;
    writer.write_event(Event::Text(BytesText::from_escaped(partial_escape(
        text.as_str(),
    ))))?;
    writer.write_event(Event::End(BytesEnd::new("Data")))?;
    writer.write_event(Event::End(BytesEnd::new("Cell")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::{ExportColumn, ExportRow};
    use serde_json::json;

    fn document() -> ExportDocument {
        let mut row = ExportRow::new();
        row.insert("name".to_string(), json!("Smith & <Sons>"));
        row.insert("balance".to_string(), json!(12.5));
        row.insert("active".to_string(), json!(true));
        ExportDocument {
            sheet_name: "accounts".to_string(),
            columns: vec![
                ExportColumn::new("Name", "name"),
                ExportColumn::new("Balance", "balance"),
                ExportColumn::new("Active", "active"),
                ExportColumn::new("Notes", "notes"),
            ],
            rows: vec![row],
        }
    }

    #[test]
    fn test_workbook_structure() {
        let xml = write_workbook(&document()).unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains(
            "<Workbook xmlns=\"urn:schemas-microsoft-com:office:spreadsheet\" \
             xmlns:ss=\"urn:schemas-microsoft-com:office:spreadsheet\">"
        ));
        assert!(xml.contains("<Worksheet ss:Name=\"accounts\">"));
        assert_eq!(xml.matches("<Row>").count(), 2);
        assert_eq!(xml.matches("<Cell>").count(), 8);
    }

    #[test]
    fn test_cells_are_typed_and_escaped() {
        let xml = write_workbook(&document()).unwrap();
        assert!(xml.contains("<Data ss:Type=\"String\">Name</Data>"));
        assert!(xml.contains("<Data ss:Type=\"String\">Smith &amp; &lt;Sons&gt;</Data>"));
        assert!(xml.contains("<Data ss:Type=\"Number\">12.5</Data>"));
        assert!(xml.contains("<Data ss:Type=\"String\">true</Data>"));
        // Missing value exports as an empty string cell
        assert!(xml.contains("<Data ss:Type=\"String\"></Data>"));
    }
}

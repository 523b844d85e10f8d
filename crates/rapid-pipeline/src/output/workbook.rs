//! Workbook export: one worksheet per named data group
//!
//! The OOXML container is assembled directly with zip + quick-xml (the same
//! stack used to read OOXML on the ingestion side), with inline strings so no
//! shared-string table is needed.

use calamine::Reader;
use indexmap::IndexMap;
use quick_xml::escape::escape;
use serde_json::Value;
use std::io::Write;
use std::path::Path;

use crate::error::{Error, Result};

/// Rows for one sheet: each row maps a column header to its cell value
pub type SheetRows = Vec<IndexMap<String, Value>>;

/// Read the header row of every sheet in a template workbook, preserving
/// sheet order. Used to pin the column order of generated workbooks.
pub fn read_template_headers(data: &[u8]) -> Result<IndexMap<String, Vec<String>>> {
    let cursor = std::io::Cursor::new(data);
    let mut workbook = calamine::open_workbook_auto_from_rs(cursor)
        .map_err(|e| Error::template(format!("Failed to read template workbook: {}", e)))?;

    let mut headers = IndexMap::new();
    for sheet_name in workbook.sheet_names().to_vec() {
        if let Ok(range) = workbook.worksheet_range(&sheet_name) {
            let row_headers: Vec<String> = range
                .rows()
                .next()
                .map(|row| {
                    row.iter()
                        .map(|cell| cell.to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default();
            headers.insert(sheet_name, row_headers);
        }
    }

    Ok(headers)
}

/// Write a workbook with one sheet per data group.
///
/// When template headers are supplied for a sheet, columns follow the
/// template's order and missing cells render empty; otherwise columns follow
/// the first row's key order. Empty groups are skipped.
pub fn write_workbook(
    path: &Path,
    sheets: &IndexMap<String, SheetRows>,
    template_headers: Option<&IndexMap<String, Vec<String>>>,
) -> Result<()> {
    let populated: Vec<(&String, &SheetRows)> =
        sheets.iter().filter(|(_, rows)| !rows.is_empty()).collect();

    if populated.is_empty() {
        return Err(Error::persistence("No data to write to workbook"));
    }

    let file = std::fs::File::create(path)
        .map_err(|e| Error::persistence(format!("Failed to create {}: {}", path.display(), e)))?;
    let mut zip = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default();

    let write_part = |zip: &mut zip::ZipWriter<std::fs::File>, name: &str, body: &str| {
        zip.start_file(name, options)
            .and_then(|_| zip.write_all(body.as_bytes()).map_err(Into::into))
            .map_err(|e| Error::persistence(format!("Failed to write workbook part {}: {}", name, e)))
    };

    write_part(&mut zip, "[Content_Types].xml", &content_types(populated.len()))?;
    write_part(&mut zip, "_rels/.rels", ROOT_RELS)?;
    write_part(&mut zip, "xl/workbook.xml", &workbook_xml(&populated))?;
    write_part(&mut zip, "xl/_rels/workbook.xml.rels", &workbook_rels(populated.len()))?;

    for (index, (sheet_name, rows)) in populated.iter().enumerate() {
        let headers = template_headers
            .and_then(|t| t.get(*sheet_name))
            .filter(|h| !h.is_empty())
            .cloned()
            .unwrap_or_else(|| rows[0].keys().cloned().collect());

        let xml = worksheet_xml(&headers, rows);
        write_part(&mut zip, &format!("xl/worksheets/sheet{}.xml", index + 1), &xml)?;
    }

    zip.finish()
        .map_err(|e| Error::persistence(format!("Failed to finish workbook: {}", e)))?;

    tracing::info!(
        "Workbook written: {} ({} sheets)",
        path.display(),
        populated.len()
    );
    Ok(())
}

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

fn content_types(sheet_count: usize) -> String {
    let mut overrides = String::new();
    for i in 1..=sheet_count {
        overrides.push_str(&format!(
            r#"<Override PartName="/xl/worksheets/sheet{i}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#
        ));
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>{overrides}</Types>"#
    )
}

fn workbook_xml(sheets: &[(&String, &SheetRows)]) -> String {
    let mut entries = String::new();
    for (index, (name, _)) in sheets.iter().enumerate() {
        entries.push_str(&format!(
            r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
            escape(name.as_str()),
            index + 1,
            index + 1
        ));
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>{entries}</sheets></workbook>"#
    )
}

fn workbook_rels(sheet_count: usize) -> String {
    let mut entries = String::new();
    for i in 1..=sheet_count {
        entries.push_str(&format!(
            r#"<Relationship Id="rId{i}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{i}.xml"/>"#
        ));
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{entries}</Relationships>"#
    )
}

fn worksheet_xml(headers: &[String], rows: &SheetRows) -> String {
    let mut body = String::new();

    body.push_str(r#"<row r="1">"#);
    for (col, header) in headers.iter().enumerate() {
        body.push_str(&inline_cell(col, 1, header));
    }
    body.push_str("</row>");

    for (row_index, row) in rows.iter().enumerate() {
        let row_num = row_index + 2;
        body.push_str(&format!(r#"<row r="{}">"#, row_num));
        for (col, header) in headers.iter().enumerate() {
            let value = row.get(header).map(cell_text).unwrap_or_default();
            body.push_str(&inline_cell(col, row_num, &value));
        }
        body.push_str("</row>");
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{body}</sheetData></worksheet>"#
    )
}

fn inline_cell(col: usize, row: usize, text: &str) -> String {
    format!(
        r#"<c r="{}{}" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
        column_letter(col),
        row,
        escape(text)
    )
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// 0-based column index to spreadsheet letters (0 -> A, 26 -> AA)
fn column_letter(mut index: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters.reverse();
    String::from_utf8(letters).expect("ASCII column letters")
}

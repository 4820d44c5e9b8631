//! Office Open XML input (xlsx workbooks and docx documents).
//!
//! Only the parts needed for scanning are read: shared strings and the first
//! worksheet of a workbook, and the body text of a document. Styles, formulas
//! and layout are ignored.

use std::io::{Cursor, Read};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::{debug, trace};
use zip::ZipArchive;

use super::Result;
use crate::error::ExtractError;

const DOCUMENT_PART: &str = "word/document.xml";
const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";
const WORKSHEET_PREFIX: &str = "xl/worksheets/sheet";

/// Extract paragraph text from a docx document.
pub fn extract_docx_text(data: &[u8]) -> Result<String> {
    let mut archive = ZipArchive::new(Cursor::new(data))?;
    let xml = read_part(&mut archive, DOCUMENT_PART)?
        .ok_or_else(|| ExtractError::Document(format!("missing {}", DOCUMENT_PART)))?;

    let mut reader = Reader::from_str(&xml);
    let mut text = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event().map_err(|e| ExtractError::Document(e.to_string()))? {
            Event::Start(e) if e.local_name().as_ref() == b"t" => in_text = true,
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => text.push('\n'),
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"tab" => text.push('\t'),
                b"br" | b"cr" => text.push('\n'),
                _ => {}
            },
            Event::Text(e) if in_text => {
                let unescaped = e.unescape().map_err(|e| ExtractError::Document(e.to_string()))?;
                text.push_str(&unescaped);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    debug!("Extracted {} chars from docx", text.len());
    Ok(text)
}

/// Extract the rows of the first worksheet of an xlsx workbook.
pub fn extract_xlsx_rows(data: &[u8], max_rows: usize) -> Result<Vec<Vec<String>>> {
    let mut archive = ZipArchive::new(Cursor::new(data)).map_err(spreadsheet_err)?;

    let shared = match read_part(&mut archive, SHARED_STRINGS_PART)? {
        Some(xml) => parse_shared_strings(&xml)?,
        None => Vec::new(),
    };

    let sheet_name = first_worksheet(&archive)
        .ok_or_else(|| ExtractError::Spreadsheet("workbook has no worksheets".to_string()))?;
    trace!("Reading worksheet {}", sheet_name);

    let xml = read_part(&mut archive, &sheet_name)?
        .ok_or_else(|| ExtractError::Spreadsheet(format!("missing {}", sheet_name)))?;

    let rows = parse_sheet_rows(&xml, &shared, max_rows)?;
    debug!("Extracted {} rows from {}", rows.len(), sheet_name);
    Ok(rows)
}

fn read_part(archive: &mut ZipArchive<Cursor<&[u8]>>, name: &str) -> Result<Option<String>> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut content = String::new();
    file.read_to_string(&mut content)?;
    Ok(Some(content))
}

/// Worksheet part with the lowest sheet number.
fn first_worksheet(archive: &ZipArchive<Cursor<&[u8]>>) -> Option<String> {
    archive
        .file_names()
        .filter_map(|name| {
            let number = name
                .strip_prefix(WORKSHEET_PREFIX)?
                .strip_suffix(".xml")?
                .parse::<u32>()
                .ok()?;
            Some((number, name.to_string()))
        })
        .min_by_key(|(number, _)| *number)
        .map(|(_, name)| name)
}

fn parse_shared_strings(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    let mut strings = Vec::new();
    let mut current = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event().map_err(spreadsheet_err)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"si" => current.clear(),
                b"t" => in_text = true,
                _ => {}
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"si" => strings.push(std::mem::take(&mut current)),
                b"t" => in_text = false,
                _ => {}
            },
            Event::Text(e) if in_text => {
                current.push_str(&e.unescape().map_err(spreadsheet_err)?);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(strings)
}

#[derive(Default)]
struct CellState {
    column: usize,
    shared: bool,
    value: String,
}

fn parse_sheet_rows(xml: &str, shared: &[String], max_rows: usize) -> Result<Vec<Vec<String>>> {
    let mut reader = Reader::from_str(xml);
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut cell: Option<CellState> = None;
    let mut in_value = false;

    loop {
        match reader.read_event().map_err(spreadsheet_err)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"row" => row.clear(),
                b"c" => cell = Some(start_cell(&e, row.len())?),
                b"v" | b"t" => in_value = cell.is_some(),
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"c" => {
                // Empty cells still hold their column position
                let state = start_cell(&e, row.len())?;
                place_cell(&mut row, state.column, String::new());
            }
            Event::Text(e) if in_value => {
                if let Some(state) = cell.as_mut() {
                    state.value.push_str(&e.unescape().map_err(spreadsheet_err)?);
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"v" | b"t" => in_value = false,
                b"c" => {
                    if let Some(state) = cell.take() {
                        let value = if state.shared {
                            state
                                .value
                                .trim()
                                .parse::<usize>()
                                .ok()
                                .and_then(|idx| shared.get(idx).cloned())
                                .unwrap_or_default()
                        } else {
                            state.value
                        };
                        place_cell(&mut row, state.column, value);
                    }
                }
                b"row" => {
                    rows.push(std::mem::take(&mut row));
                    if max_rows > 0 && rows.len() >= max_rows {
                        break;
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(rows)
}

fn start_cell(e: &BytesStart<'_>, next_column: usize) -> Result<CellState> {
    let mut state = CellState {
        column: next_column,
        ..CellState::default()
    };

    if let Some(reference) = e.try_get_attribute("r").map_err(spreadsheet_err)? {
        let reference = reference.unescape_value().map_err(spreadsheet_err)?;
        if let Some(column) = column_index(&reference)? {
            state.column = column;
        }
    }
    if let Some(kind) = e.try_get_attribute("t").map_err(spreadsheet_err)? {
        state.shared = kind.unescape_value().map_err(spreadsheet_err)? == "s";
    }

    Ok(state)
}

fn place_cell(row: &mut Vec<String>, column: usize, value: String) {
    if row.len() <= column {
        row.resize(column + 1, String::new());
    }
    row[column] = value;
}

/// Last column a worksheet may address (XFD).
const MAX_COLUMNS: usize = 16_384;

/// Zero-based column index of an A1-style reference ("C7" -> 2).
fn column_index(reference: &str) -> Result<Option<usize>> {
    let letters: Vec<u8> = reference
        .bytes()
        .take_while(u8::is_ascii_alphabetic)
        .map(|b| b.to_ascii_uppercase())
        .collect();

    if letters.is_empty() {
        return Ok(None);
    }

    let mut index = 0usize;
    for b in letters {
        index = index * 26 + (b - b'A' + 1) as usize;
        if index > MAX_COLUMNS {
            return Err(ExtractError::Spreadsheet(format!(
                "cell reference {} is beyond the last column",
                reference
            )));
        }
    }
    Ok(Some(index - 1))
}

fn spreadsheet_err(err: impl std::fmt::Display) -> ExtractError {
    ExtractError::Spreadsheet(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use pretty_assertions::assert_eq;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn build_zip(parts: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in parts {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_column_index() {
        assert_eq!(column_index("A1").unwrap(), Some(0));
        assert_eq!(column_index("c7").unwrap(), Some(2));
        assert_eq!(column_index("AA10").unwrap(), Some(26));
        assert_eq!(column_index("XFD3").unwrap(), Some(16_383));
        assert_eq!(column_index("12").unwrap(), None);
        assert!(matches!(column_index("XFE1"), Err(ExtractError::Spreadsheet(_))));
    }

    #[test]
    fn test_xlsx_rejects_oversized_cell_reference() {
        for reference in ["ZZZZZZ1", "ZZZZZZZZZZZZZZ1"] {
            let sheet = format!(
                r#"<worksheet><sheetData><row r="1"><c r="{}"><v>1</v></c></row></sheetData></worksheet>"#,
                reference
            );
            let data = build_zip(&[("xl/worksheets/sheet1.xml", sheet.as_str())]);

            match extract_xlsx_rows(&data, 0) {
                Err(ExtractError::Spreadsheet(msg)) => assert!(msg.contains(reference)),
                other => panic!("unexpected result for {}: {:?}", reference, other),
            }
        }
    }

    #[test]
    fn test_extract_docx_text() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p><w:r><w:t>URGENT: invoice</w:t></w:r><w:r><w:t xml:space="preserve"> payment &amp; more</w:t></w:r></w:p>
    <w:p><w:r><w:t>Vendor:</w:t><w:tab/><w:t>Acme</w:t></w:r></w:p>
  </w:body>
</w:document>"#;
        let data = build_zip(&[(DOCUMENT_PART, xml)]);

        let text = extract_docx_text(&data).unwrap();
        assert_eq!(text, "URGENT: invoice payment & more\nVendor:\tAcme\n");
    }

    #[test]
    fn test_docx_without_body_part() {
        let data = build_zip(&[("word/styles.xml", "<styles/>")]);
        assert!(matches!(extract_docx_text(&data), Err(ExtractError::Document(_))));
    }

    #[test]
    fn test_extract_xlsx_rows() {
        let shared = r#"<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <si><t>Item</t></si><si><t>Price</t></si><si><r><t>Office </t></r><r><t>chair</t></r></si>
</sst>"#;
        let sheet = r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <sheetData>
    <row r="1"><c r="A1" t="s"><v>0</v></c><c r="C1" t="s"><v>1</v></c></row>
    <row r="2"><c r="A2" t="s"><v>2</v></c><c r="B2"/><c r="C2"><v>250.5</v></c></row>
    <row r="3"><c r="A3" t="inlineStr"><is><t>Desk</t></is></c><c r="C3"><v>90</v></c></row>
  </sheetData>
</worksheet>"#;
        let data = build_zip(&[
            (SHARED_STRINGS_PART, shared),
            ("xl/worksheets/sheet2.xml", "<worksheet><sheetData/></worksheet>"),
            ("xl/worksheets/sheet1.xml", sheet),
        ]);

        let rows = extract_xlsx_rows(&data, 0).unwrap();
        assert_eq!(
            rows,
            vec![
                vec!["Item".to_string(), String::new(), "Price".to_string()],
                vec!["Office chair".to_string(), String::new(), "250.5".to_string()],
                vec!["Desk".to_string(), String::new(), "90".to_string()],
            ]
        );

        assert_eq!(extract_xlsx_rows(&data, 1).unwrap().len(), 1);
    }

    #[test]
    fn test_xlsx_rejects_non_zip() {
        assert!(matches!(
            extract_xlsx_rows(b"plain text", 0),
            Err(ExtractError::Spreadsheet(_))
        ));
    }
}

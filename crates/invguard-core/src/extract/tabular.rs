//! Delimited text input.

use csv::ReaderBuilder;

use super::Result;
use crate::error::ExtractError;

/// Parse CSV bytes into rows. Every record is kept, including the header.
pub fn parse_csv_rows(data: &[u8], delimiter: char, max_rows: usize) -> Result<Vec<Vec<String>>> {
    let delimiter = u8::try_from(delimiter)
        .ok()
        .filter(u8::is_ascii)
        .ok_or(ExtractError::CsvDelimiter(delimiter))?;

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(data);

    let mut rows = Vec::new();
    for record in reader.records() {
        if max_rows > 0 && rows.len() >= max_rows {
            break;
        }
        let record = record?;
        rows.push(record.iter().map(|cell| cell.trim().to_string()).collect());
    }

    Ok(rows)
}

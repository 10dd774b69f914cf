//! CSV tables as exported by the spreadsheet.

use std::collections::HashMap;

use super::IngestError;

/// Lowercase a header and strip everything but ASCII letters and digits, so
/// "Winner ID", "winner_id" and "winnerid" all name the same column.
pub fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// One data row, addressable by (normalized) header or by position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    values: Vec<String>,
    by_key: HashMap<String, String>,
}

impl RawRow {
    pub fn new(headers: &[String], values: Vec<String>) -> Self {
        let mut by_key = HashMap::new();
        for (header, value) in headers.iter().zip(values.iter()) {
            // Later columns win when two headers normalize alike
            by_key.insert(normalize_key(header), value.clone());
        }
        Self { values, by_key }
    }

    /// First non-blank value among the given column names, trimmed.
    pub fn get(&self, names: &[&str]) -> &str {
        names
            .iter()
            .filter_map(|name| self.by_key.get(&normalize_key(name)))
            .map(|v| v.trim())
            .find(|v| !v.is_empty())
            .unwrap_or("")
    }

    /// Value at a column position, trimmed; blank when out of range.
    pub fn at(&self, index: usize) -> &str {
        self.cell(index).unwrap_or("")
    }

    /// Value at a column position, trimmed; `None` when the row is too short
    /// to have that cell at all.
    pub fn cell(&self, index: usize) -> Option<&str> {
        self.values.get(index).map(|v| v.trim())
    }

    pub fn is_blank(&self) -> bool {
        self.values.iter().all(|v| v.trim().is_empty())
    }
}

/// Parse CSV text with a header row. Blank lines are skipped; short rows keep
/// their own length, and their missing cells read as blank.
pub fn parse_csv(text: &str) -> Result<Vec<RawRow>, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let values: Vec<String> = record.iter().map(str::to_string).collect();
        let row = RawRow::new(&headers, values);
        if !row.is_blank() {
            rows.push(row);
        }
    }

    Ok(rows)
}

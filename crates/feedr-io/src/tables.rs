//! Raw table parsing.
//!
//! Both input tables are headerless comma-separated text with rows of varying
//! width. Rows are kept as plain strings here; interpretation happens in the
//! lookup index and the translator.

use csv::ReaderBuilder;
use feedr_core::{FeedrError, FeedrResult};

/// One row of an input table.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRecord {
    fields: Vec<String>,
    line: usize,
}

impl SourceRecord {
    pub fn new(line: usize, fields: Vec<String>) -> Self {
        Self { fields, line }
    }

    /// Trimmed field at `index`; missing trailing fields read as empty.
    pub fn field(&self, index: usize) -> &str {
        self.fields.get(index).map(|f| f.trim()).unwrap_or("")
    }

    /// 1-based line number in the source text.
    pub fn line(&self) -> usize {
        self.line
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn is_blank(&self) -> bool {
        self.fields.iter().all(|f| f.trim().is_empty())
    }
}

/// Split `text` into records, dropping blank rows.
pub fn read_rows(text: &str) -> FeedrResult<Vec<SourceRecord>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| FeedrError::Parse(format!("row {}: {}", idx + 1, e)))?;
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(idx + 1);
        let row = SourceRecord::new(line, record.iter().map(str::to_string).collect());
        if !row.is_blank() {
            rows.push(row);
        }
    }
    Ok(rows)
}

/// Parse the primary equipment table.
///
/// Fails when the text holds no rows at all, or when no row has the three
/// leading columns (name, type code, phase) every record needs.
pub fn parse_primary(text: &str) -> FeedrResult<Vec<SourceRecord>> {
    let rows = read_rows(text)?;
    if rows.is_empty() {
        return Err(FeedrError::Structure("primary table is empty".into()));
    }
    if !rows.iter().any(|r| r.len() >= 3) {
        return Err(FeedrError::Structure(
            "primary table is not tabular: no row has at least 3 fields".into(),
        ));
    }
    Ok(rows)
}

/// Parse the secondary equipment table. Blank text is an empty table.
pub fn parse_secondary(text: &str) -> FeedrResult<Vec<SourceRecord>> {
    let rows = read_rows(text)?;
    if !rows.is_empty() && !rows.iter().any(|r| r.len() >= 2) {
        return Err(FeedrError::Structure(
            "secondary table is not tabular: no row has at least 2 fields".into(),
        ));
    }
    Ok(rows)
}

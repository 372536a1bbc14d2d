//! Village reference tables used by the competition analysis
//!
//! Both files are small two-column CSVs exported from a spreadsheet. A
//! missing or malformed file is not fatal: the built-in sample table is used
//! instead and a warning is logged.

use crate::error::{AgriError, AgriResult};
use std::fs;
use std::path::Path;
use tracing::warn;

pub const VILLAGE_CROP_COLUMN: &str = "neighbouring_crops";
pub const VILLAGE_ACRES_COLUMN: &str = "acres";
pub const PRICE_CROP_COLUMN: &str = "CROP";
pub const PRICE_VALUE_COLUMN: &str = "Total Price earned in a hectare";

/// Ordered `(crop, value)` rows plus a sentence summarizing them
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceTable {
    pub rows: Vec<(String, i64)>,
    pub summary: String,
}

fn sample_village_crops() -> Vec<(String, i64)> {
    vec![
        ("Rice".to_string(), 100),
        ("Wheat".to_string(), 80),
        ("Sugarcane".to_string(), 60),
    ]
}

fn sample_crop_prices() -> Vec<(String, i64)> {
    vec![
        ("Rice".to_string(), 50000),
        ("Wheat".to_string(), 40000),
        ("Maize".to_string(), 35000),
    ]
}

/// Split one CSV line, honouring double-quoted fields
pub(crate) fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields.into_iter().map(|f| f.trim().to_string()).collect()
}

/// File contents as UTF-8, or decoded byte-per-char for legacy Windows exports
pub(crate) fn read_text(path: &Path) -> AgriResult<String> {
    let bytes = fs::read(path)?;
    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => e.into_bytes().into_iter().map(char::from).collect(),
    })
}

/// A headed CSV split into fields; blank lines are skipped
#[derive(Debug)]
pub(crate) struct CsvTable {
    source: String,
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl CsvTable {
    pub(crate) fn read(path: &Path) -> AgriResult<Self> {
        Self::parse(&read_text(path)?, &path.display().to_string())
    }

    pub(crate) fn parse(content: &str, source: &str) -> AgriResult<Self> {
        let mut lines = content
            .trim_start_matches('\u{feff}')
            .lines()
            .filter(|l| !l.trim().is_empty());

        let header = split_csv_line(
            lines
                .next()
                .ok_or_else(|| AgriError::Parse(format!("'{source}' is empty")))?,
        );
        Ok(Self {
            source: source.to_string(),
            header,
            rows: lines.map(split_csv_line).collect(),
        })
    }

    pub(crate) fn column(&self, name: &str) -> AgriResult<usize> {
        self.header.iter().position(|h| h == name).ok_or_else(|| {
            AgriError::Parse(format!("'{}' has no column '{}'", self.source, name))
        })
    }

    /// Data rows numbered from 2, counting non-blank lines only
    pub(crate) fn rows(&self) -> impl Iterator<Item = (usize, &[String])> {
        self.rows
            .iter()
            .enumerate()
            .map(|(i, fields)| (i + 2, fields.as_slice()))
    }

    pub(crate) fn field<'a>(
        &self,
        fields: &'a [String],
        idx: usize,
        line: usize,
    ) -> AgriResult<&'a str> {
        fields.get(idx).map(String::as_str).ok_or_else(|| {
            AgriError::Parse(format!("'{}' row {} is missing fields", self.source, line))
        })
    }
}

/// Read the `(key_column, value_column)` pairs of a headed CSV
///
/// Later duplicates of a key replace the earlier value in place.
pub fn read_two_columns(
    path: &Path,
    key_column: &str,
    value_column: &str,
) -> AgriResult<Vec<(String, i64)>> {
    let table = CsvTable::read(path)?;
    let key_idx = table.column(key_column)?;
    let value_idx = table.column(value_column)?;

    let mut rows: Vec<(String, i64)> = Vec::new();
    for (line, fields) in table.rows() {
        let key = table.field(fields, key_idx, line)?;
        let raw = table.field(fields, value_idx, line)?;
        let value: i64 = raw.parse().map_err(|_| {
            AgriError::Parse(format!(
                "'{}' row {}: {:?} is not an integer",
                path.display(),
                line,
                raw
            ))
        })?;

        match rows.iter_mut().find(|(k, _)| k == key) {
            Some(existing) => existing.1 = value,
            None => rows.push((key.to_string(), value)),
        }
    }
    Ok(rows)
}

fn read_or_sample(
    path: &Path,
    key_column: &str,
    value_column: &str,
    sample: fn() -> Vec<(String, i64)>,
) -> Vec<(String, i64)> {
    match read_two_columns(path, key_column, value_column) {
        Ok(rows) => rows,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "using sample reference data");
            sample()
        }
    }
}

/// Acreage planted by neighbouring farmers
pub fn read_village_crops(path: &Path) -> ReferenceTable {
    let rows = read_or_sample(
        path,
        VILLAGE_CROP_COLUMN,
        VILLAGE_ACRES_COLUMN,
        sample_village_crops,
    );
    let parts: Vec<String> = rows
        .iter()
        .map(|(crop, acres)| format!("{acres} acres of {crop}"))
        .collect();
    let summary = format!("The village has {}.", parts.join(", "));
    ReferenceTable { rows, summary }
}

/// Revenue per hectare by crop
pub fn read_crop_prices(path: &Path) -> ReferenceTable {
    let rows = read_or_sample(
        path,
        PRICE_CROP_COLUMN,
        PRICE_VALUE_COLUMN,
        sample_crop_prices,
    );
    let parts: Vec<String> = rows
        .iter()
        .map(|(crop, price)| format!("{crop} earns {price} per hectare"))
        .collect();
    let summary = format!(
        "Crop earnings per hectare are as follows: {}.",
        parts.join(", ")
    );
    ReferenceTable { rows, summary }
}

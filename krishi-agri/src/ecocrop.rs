//! EcoCrop growing ranges
//!
//! Looks up the pH, annual rainfall and temperature tolerances of a crop by
//! common name in a cleaned export of the FAO EcoCrop database. The export
//! keeps one row per species; `COMNAME` holds every common name as a
//! list literal such as `['rice', '_paddy']`.

use crate::error::AgriResult;
use crate::reference::CsvTable;
use serde::Serialize;
use std::path::Path;
use tracing::debug;

pub const COMMON_NAMES_COLUMN: &str = "COMNAME";
pub const SCIENTIFIC_NAME_COLUMN: &str = "ScientificName";

/// Growing ranges of one species; blank cells stay `None`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CropRanges {
    #[serde(rename = "ScientificName")]
    pub scientific_name: String,
    #[serde(rename = "PHMIN")]
    pub ph_min: Option<f64>,
    #[serde(rename = "PHMAX")]
    pub ph_max: Option<f64>,
    #[serde(rename = "RMIN")]
    pub rain_min_mm: Option<f64>,
    #[serde(rename = "RMAX")]
    pub rain_max_mm: Option<f64>,
    #[serde(rename = "TMIN")]
    pub temp_min_c: Option<f64>,
    #[serde(rename = "TMAX")]
    pub temp_max_c: Option<f64>,
}

#[derive(Debug, Clone)]
struct Entry {
    common_names: Vec<String>,
    ranges: CropRanges,
}

/// In-memory EcoCrop table
#[derive(Debug, Clone, Default)]
pub struct EcoCropTable {
    entries: Vec<Entry>,
}

/// Lowercase and drop leading underscores, the EcoCrop marker for
/// secondary names
pub fn normalize_crop_name(name: &str) -> String {
    name.trim().trim_start_matches('_').to_lowercase()
}

/// Split a `COMNAME` cell into normalized names
///
/// Accepts a bracketed list literal with either quote style, or a plain
/// comma-separated list.
fn parse_common_names(raw: &str) -> Vec<String> {
    let inner = raw.trim();
    let inner = inner
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(inner);

    inner
        .split(',')
        .map(|name| name.trim().trim_matches(|c| c == '\'' || c == '"'))
        .map(normalize_crop_name)
        .filter(|name| !name.is_empty())
        .collect()
}

fn parse_bound(raw: Option<&str>) -> Option<f64> {
    raw?.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

impl EcoCropTable {
    pub fn from_file(path: &Path) -> AgriResult<Self> {
        Self::from_table(&CsvTable::read(path)?)
    }

    pub fn from_csv_str(content: &str) -> AgriResult<Self> {
        Self::from_table(&CsvTable::parse(content, "<ecocrop>")?)
    }

    fn from_table(table: &CsvTable) -> AgriResult<Self> {
        let names_idx = table.column(COMMON_NAMES_COLUMN)?;
        let species_idx = table.column(SCIENTIFIC_NAME_COLUMN)?;
        let bounds = ["PHMIN", "PHMAX", "RMIN", "RMAX", "TMIN", "TMAX"]
            .map(|name| table.column(name))
            .into_iter()
            .collect::<AgriResult<Vec<_>>>()?;

        let mut entries = Vec::new();
        for (line, fields) in table.rows() {
            let common_names = parse_common_names(table.field(fields, names_idx, line)?);
            let scientific_name = table.field(fields, species_idx, line)?.to_string();
            let bound = |i: usize| parse_bound(fields.get(bounds[i]).map(String::as_str));

            entries.push(Entry {
                common_names,
                ranges: CropRanges {
                    scientific_name,
                    ph_min: bound(0),
                    ph_max: bound(1),
                    rain_min_mm: bound(2),
                    rain_max_mm: bound(3),
                    temp_min_c: bound(4),
                    temp_max_c: bound(5),
                },
            });
        }

        debug!(species = entries.len(), "EcoCrop table loaded");
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every species listing `crop_name` among its common names
    ///
    /// Matching is exact after [`normalize_crop_name`] on both sides, so
    /// `"Rice"`, `"rice"` and `"_rice"` are equivalent while `"ric"` matches
    /// nothing. Rows come back in file order.
    pub fn crop_ranges(&self, crop_name: &str) -> Vec<CropRanges> {
        let wanted = normalize_crop_name(crop_name);
        if wanted.is_empty() {
            return Vec::new();
        }
        self.entries
            .iter()
            .filter(|e| e.common_names.contains(&wanted))
            .map(|e| e.ranges.clone())
            .collect()
    }
}

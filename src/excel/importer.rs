//! Loss-run importer: Excel (.xlsx) worksheet → LossRunTable

use crate::error::{ClaimMapError, ClaimMapResult};
use crate::types::{CellValue, Column, LossRunTable};
use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Reads worksheets of an uploaded loss run
pub struct LossRunImporter {
    path: PathBuf,
}

impl LossRunImporter {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> ClaimMapResult<Xlsx<BufReader<File>>> {
        open_workbook(&self.path).map_err(|e| {
            ClaimMapError::Import(format!(
                "Failed to open Excel file {}: {}",
                self.path.display(),
                e
            ))
        })
    }

    /// Worksheet names in workbook order
    pub fn sheet_names(&self) -> ClaimMapResult<Vec<String>> {
        Ok(self.open()?.sheet_names().to_vec())
    }

    /// Load one worksheet; row 0 is the header
    pub fn load_sheet(&self, sheet_name: &str) -> ClaimMapResult<LossRunTable> {
        let mut workbook = self.open()?;

        let names = workbook.sheet_names().to_vec();
        if !names.iter().any(|n| n == sheet_name) {
            return Err(ClaimMapError::Import(format!(
                "Worksheet '{}' not found (available: {})",
                sheet_name,
                names.join(", ")
            )));
        }

        let range = workbook.worksheet_range(sheet_name).map_err(|e| {
            ClaimMapError::Import(format!("Failed to read worksheet '{}': {}", sheet_name, e))
        })?;

        let table = read_table(sheet_name, &range);
        table.validate_lengths().map_err(ClaimMapError::Import)?;
        tracing::info!(
            sheet = sheet_name,
            columns = table.columns.len(),
            rows = table.row_count(),
            "loaded worksheet"
        );
        Ok(table)
    }
}

/// Build a table from a worksheet range, skipping rows with no content
fn read_table(sheet_name: &str, range: &Range<Data>) -> LossRunTable {
    let mut table = LossRunTable::new(sheet_name);
    let mut rows = range.rows();

    let Some(header) = rows.next() else {
        return table; // empty sheet
    };
    let names = header_names(header);

    let mut columns: Vec<Vec<CellValue>> = vec![Vec::new(); names.len()];
    for row in rows {
        if row.iter().all(|cell| matches!(cell, Data::Empty)) {
            continue;
        }
        for (col, values) in columns.iter_mut().enumerate() {
            values.push(row.get(col).map(convert_cell).unwrap_or(CellValue::Empty));
        }
    }

    for (name, values) in names.into_iter().zip(columns) {
        table.add_column(Column::new(name, values));
    }
    table
}

/// Trimmed header names; blanks become `Unnamed: N`, repeats get `.1`, `.2`, ...
fn header_names(header: &[Data]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();

    header
        .iter()
        .enumerate()
        .map(|(idx, cell)| {
            let name = match cell {
                Data::Empty => String::new(),
                Data::Float(f) => CellValue::Number(*f).to_string(),
                other => other.to_string(),
            };
            let name = name.trim().to_string();
            let name = if name.is_empty() {
                format!("Unnamed: {}", idx)
            } else {
                name
            };

            let count = seen.entry(name.clone()).or_insert(0);
            let unique = if *count == 0 {
                name
            } else {
                format!("{}.{}", name, count)
            };
            *count += 1;
            unique
        })
        .collect()
}

/// Convert a calamine cell into a CellValue
fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => serial_to_datetime(dt.as_f64())
            .map(CellValue::DateTime)
            .unwrap_or(CellValue::Number(dt.as_f64())),
        Data::DateTimeIso(s) => parse_iso(s)
            .map(CellValue::DateTime)
            .unwrap_or_else(|| CellValue::Text(s.clone())),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Text(format!("#{:?}", e)),
    }
}

/// Excel 1900 date system serial → date/time
pub fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    epoch.checked_add_signed(Duration::milliseconds(millis))
}

/// Date/time → Excel 1900 date system serial
pub fn datetime_to_serial(dt: &NaiveDateTime) -> f64 {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default();
    (*dt - epoch).num_milliseconds() as f64 / 86_400_000.0
}

fn parse_iso(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

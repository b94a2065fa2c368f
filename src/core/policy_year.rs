//! Policy year normalization
//!
//! The column's storage kind decides the strategy: date columns give their year,
//! numeric columns are truncated, and anything else is parsed cell by cell as a
//! date with the raw value as fallback before integer coercion.

use crate::error::{ClaimMapError, ClaimMapResult};
use crate::types::{CellValue, Column, ColumnKind};
use chrono::{Datelike, NaiveDate, NaiveDateTime};

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_FORMATS: [&str; 10] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%m/%d/%y",
    "%d-%b-%Y",
    "%d %b %Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%Y%m%d",
];

/// Parse a free-text date; a bare four-digit year or `YYYY-MM` also counts
pub fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if text.len() == 4 && text.chars().all(|c| c.is_ascii_digit()) {
        return text.parse().ok().and_then(|y| NaiveDate::from_ymd_opt(y, 1, 1));
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt.date());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Some(date);
        }
    }

    // year-month only
    NaiveDate::parse_from_str(&format!("{}-01", text), "%Y-%m-%d").ok()
}

/// Convert a policy year column into integer years, one per row
pub fn normalize_policy_year(column: &Column) -> ClaimMapResult<Vec<i64>> {
    let kind = column.kind();
    tracing::debug!(column = %column.name, ?kind, "normalizing policy year");

    column
        .values
        .iter()
        .enumerate()
        .map(|(row, cell)| {
            let year = match (kind, cell) {
                (_, CellValue::DateTime(dt)) => Some(dt.year() as i64),
                (_, CellValue::Number(n)) if n.is_finite() => Some(n.trunc() as i64),
                (_, CellValue::Bool(b)) => Some(*b as i64),
                (ColumnKind::Text, CellValue::Text(s)) => parse_date_text(s)
                    .map(|d| d.year() as i64)
                    .or_else(|| s.trim().parse::<i64>().ok()),
                _ => None,
            };
            year.ok_or_else(|| ClaimMapError::Coercion {
                field: "Policy Year".to_string(),
                value: cell.to_string(),
                location: format!("loss run row {}", row + 2),
            })
        })
        .collect()
}

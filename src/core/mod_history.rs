//! Mod history table built from the mod/payroll form

use crate::error::{ClaimMapError, ClaimMapResult};
use crate::mod_form::{ModEntry, ModRecord};

/// One row of the Mod History sheet
#[derive(Debug, Clone, PartialEq)]
pub struct ModHistoryRow {
    /// "Projected", "Current", or the literal year
    pub label: String,
    pub mod_value: f64,
}

/// Coerce retained form rows and sort them newest year first
///
/// The first malformed value aborts; nothing is produced.
pub fn coerce_records(entries: &[ModEntry]) -> ClaimMapResult<Vec<ModRecord>> {
    if entries.is_empty() {
        return Err(ClaimMapError::Validation(
            "No mod rows entered: each row needs a policy year and a mod".to_string(),
        ));
    }

    let mut records = entries
        .iter()
        .map(ModEntry::coerce)
        .collect::<ClaimMapResult<Vec<_>>>()?;
    records.sort_by(|a, b| b.year.cmp(&a.year));
    Ok(records)
}

/// Label the two newest rows "Projected" and "Current"; the rest keep their year
pub fn mod_history(records: &[ModRecord]) -> Vec<ModHistoryRow> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| ModHistoryRow {
            label: match index {
                0 => "Projected".to_string(),
                1 => "Current".to_string(),
                _ => record.year.to_string(),
            },
            mod_value: record.mod_value,
        })
        .collect()
}

/// Years the summary covers: every form year except the newest
pub fn historical_years(records: &[ModRecord]) -> Vec<i64> {
    records.iter().skip(1).map(|r| r.year).collect()
}

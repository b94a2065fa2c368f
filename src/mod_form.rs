//! Mod/payroll form: one projection row plus four historical rows
//!
//! Inputs stay as entered text until export; coercion to numbers happens in
//! [`ModEntry::coerce`], which is where malformed input is reported.

use crate::error::{ClaimMapError, ClaimMapResult};

/// Number of historical rows below the projection row
pub const HISTORY_ROWS: usize = 4;

/// Labels shown next to each form row, projection first
pub const ROW_LABELS: [&str; HISTORY_ROWS + 1] = [
    "Projection Year",
    "Current Year",
    "Policy Year",
    "Policy Year",
    "Policy Year",
];

/// Payroll recorded for the projection row; it has no input
pub const PROJECTION_PAYROLL: &str = "0";

/// One historical row as entered
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryInput {
    /// `None` keeps the suggested year; `Some("")` is a cleared year
    pub year: Option<String>,
    pub mod_value: String,
    pub payroll: String,
}

impl HistoryInput {
    pub fn new(year: Option<&str>, mod_value: &str, payroll: &str) -> Self {
        Self {
            year: year.map(str::to_string),
            mod_value: mod_value.to_string(),
            payroll: payroll.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModForm {
    pub projection_year: String,
    pub projection_mod: String,
    pub history: [HistoryInput; HISTORY_ROWS],
}

/// A retained form row, still as text
#[derive(Debug, Clone, PartialEq)]
pub struct ModEntry {
    pub label: &'static str,
    pub year: String,
    pub mod_value: String,
    pub payroll: String,
}

/// A form row after numeric coercion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModRecord {
    pub year: i64,
    /// Rounded to a whole number
    pub mod_value: f64,
    pub payroll: f64,
}

impl ModForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_projection(&mut self, year: &str, mod_value: &str) {
        self.projection_year = year.to_string();
        self.projection_mod = mod_value.to_string();
    }

    /// Replace one historical row (`index` 0 is the current year)
    pub fn set_history(&mut self, index: usize, input: HistoryInput) -> ClaimMapResult<()> {
        let slot = self.history.get_mut(index).ok_or_else(|| {
            ClaimMapError::Validation(format!(
                "Mod form has {} historical rows, got row {}",
                HISTORY_ROWS,
                index + 1
            ))
        })?;
        *slot = input;
        Ok(())
    }

    /// Projection year when it reads as an integer
    pub fn projection_year(&self) -> Option<i64> {
        self.projection_year.trim().parse().ok()
    }

    /// Year pre-filled for a row `offset` years before the projection
    ///
    /// Blank when the projection year is not an integer or the year underflows.
    pub fn suggested_year(&self, offset: usize) -> String {
        self.projection_year()
            .and_then(|year| year.checked_sub(offset as i64))
            .map(|year| year.to_string())
            .unwrap_or_default()
    }

    /// Year shown in historical row `index`: the entered one, else the suggestion
    pub fn history_year(&self, index: usize) -> String {
        match self.history.get(index).and_then(|h| h.year.as_ref()) {
            Some(year) => year.clone(),
            None => self.suggested_year(index + 1),
        }
    }

    /// Rows that have both a year and a mod; partial rows are dropped
    pub fn entries(&self) -> Vec<ModEntry> {
        let mut entries = Vec::with_capacity(HISTORY_ROWS + 1);

        if filled(&self.projection_year) && filled(&self.projection_mod) {
            entries.push(ModEntry {
                label: ROW_LABELS[0],
                year: self.projection_year.clone(),
                mod_value: self.projection_mod.clone(),
                payroll: PROJECTION_PAYROLL.to_string(),
            });
        }

        for (index, input) in self.history.iter().enumerate() {
            let year = self.history_year(index);
            if filled(&year) && filled(&input.mod_value) {
                entries.push(ModEntry {
                    label: ROW_LABELS[index + 1],
                    year,
                    mod_value: input.mod_value.clone(),
                    payroll: input.payroll.clone(),
                });
            }
        }

        entries
    }
}

fn filled(s: &str) -> bool {
    !s.trim().is_empty()
}

impl ModEntry {
    /// Convert the entered text to numbers
    pub fn coerce(&self) -> ClaimMapResult<ModRecord> {
        let year = self
            .year
            .trim()
            .parse::<i64>()
            .map_err(|_| self.error("Policy Year", &self.year))?;
        let mod_value = self
            .mod_value
            .trim()
            .parse::<f64>()
            .map_err(|_| self.error("Mod", &self.mod_value))?;
        let payroll = self
            .payroll
            .trim()
            .parse::<f64>()
            .map_err(|_| self.error("Total Payroll", &self.payroll))?;

        Ok(ModRecord {
            year,
            mod_value: mod_value.round_ties_even(),
            payroll,
        })
    }

    fn error(&self, field: &str, value: &str) -> ClaimMapError {
        ClaimMapError::Coercion {
            field: field.to_string(),
            value: value.to_string(),
            location: format!("mod form row '{}' {}", self.label, self.year.trim()),
        }
    }
}

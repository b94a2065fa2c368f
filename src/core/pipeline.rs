//! Transform & aggregate: loss run + mapping + mod form -> report tables

use super::mod_history::{coerce_records, historical_years, mod_history, ModHistoryRow};
use super::remap::{normalize_year_column, remap_table};
use super::status::{normalize_cell, ClaimStatus};
use super::summary::{incurred_sums, pivot_summary, restrict_years, status_counts, ClaimSummaryRow};
use crate::error::ClaimMapResult;
use crate::mapping::{ColumnMapping, InternalField};
use crate::mod_form::ModForm;
use crate::types::{CellValue, LossRunTable};
use std::collections::BTreeSet;

/// Years of losses the loss run should cover, counting back from the newest
pub const EXPECTED_LOSS_YEARS: i64 = 4;

pub const LITIGATION_WARNING: &str =
    "Litigation status not provided. This will not be reflected in the dashboard.";

/// Everything an export writes, plus the warnings surfaced along the way
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimReport {
    /// Remapped claims restricted to the historical years
    pub data: LossRunTable,
    pub summary: Vec<ClaimSummaryRow>,
    pub mod_history: Vec<ModHistoryRow>,
    pub warnings: Vec<String>,
}

/// Run the full transform
pub fn build_report(
    table: &LossRunTable,
    mapping: &ColumnMapping,
    form: &ModForm,
) -> ClaimMapResult<ClaimReport> {
    let mut warnings = Vec::new();

    let mut data = remap_table(table, mapping)?;
    for field in mapping.unmapped_optional() {
        if field == InternalField::LitigationStatus {
            warnings.push(LITIGATION_WARNING.to_string());
        }
    }

    let years = normalize_year_column(&mut data)?;
    tracing::debug!(rows = years.len(), "policy years normalized");
    warnings.extend(coverage_warning(&years));

    let statuses: Vec<ClaimStatus> = data
        .column(InternalField::Status.display_header())
        .map(|c| c.values.iter().map(normalize_cell).collect())
        .unwrap_or_default();
    let unknown = statuses.iter().filter(|s| **s == ClaimStatus::Unknown).count();
    if unknown > 0 {
        warnings.push(format!(
            "{} claim(s) have an unrecognized status and are excluded from Open/Closed counts",
            unknown
        ));
    }

    let incurred: &[CellValue] = data
        .column(InternalField::Incurred.display_header())
        .map(|c| c.values.as_slice())
        .unwrap_or(&[]);

    let mut long_form = status_counts(&years, &statuses);
    long_form.extend(incurred_sums(&years, incurred)?);

    let records = coerce_records(&form.entries())?;
    let history = mod_history(&records);
    let historical = historical_years(&records);
    tracing::info!(?historical, "summarizing historical policy years");

    let mask: Vec<bool> = years.iter().map(|y| historical.contains(y)).collect();
    let data = data.filter_rows(&mask);
    let long_form = restrict_years(long_form, &historical);

    let summary = pivot_summary(&long_form, &records);
    for year in &historical {
        if !summary.iter().any(|r| r.policy_year == *year) {
            warnings.push(format!(
                "No claims found for policy year {}; it is missing from the summary",
                year
            ));
        }
    }

    for warning in &warnings {
        tracing::warn!("{}", warning);
    }

    Ok(ClaimReport {
        data,
        summary,
        mod_history: history,
        warnings,
    })
}

/// Warn when the loss run spans fewer than the expected years up to its newest
fn coverage_warning(years: &[i64]) -> Option<String> {
    let newest = *years.iter().max()?;
    let covered: BTreeSet<i64> = years
        .iter()
        .copied()
        .filter(|y| *y > newest - EXPECTED_LOSS_YEARS)
        .collect();

    if (covered.len() as i64) < EXPECTED_LOSS_YEARS {
        Some(format!(
            "Loss run covers {} of the {} policy years ending {}; the summary may be incomplete",
            covered.len(),
            EXPECTED_LOSS_YEARS,
            newest
        ))
    } else {
        None
    }
}

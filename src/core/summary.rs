//! Per-year claim summary: status counts, incurred sums, pivot and payroll join

use super::status::ClaimStatus;
use crate::error::{ClaimMapError, ClaimMapResult};
use crate::mod_form::ModRecord;
use crate::types::CellValue;
use regex::Regex;
use std::collections::BTreeMap;

/// Claim type of a long-form summary row
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ClaimType {
    Status(ClaimStatus),
    TotalIncurred,
}

impl ClaimType {
    pub fn label(self) -> &'static str {
        match self {
            ClaimType::Status(status) => status.as_str(),
            ClaimType::TotalIncurred => "Total Incurred",
        }
    }
}

/// One (year, claim type, value) row before pivoting
#[derive(Debug, Clone, PartialEq)]
pub struct LongFormRow {
    pub policy_year: i64,
    pub claim_type: ClaimType,
    pub value: f64,
}

/// Final summary row, one per historical policy year
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimSummaryRow {
    pub policy_year: i64,
    pub closed: u64,
    pub open: u64,
    pub total_claims: u64,
    pub total_incurred: f64,
    /// `None` when the year has no payroll row
    pub total_payroll: Option<f64>,
}

/// Column headers of the summary sheet, in order
pub const SUMMARY_HEADERS: [&str; 6] = [
    "Policy Year",
    "Closed",
    "Open",
    "Total Claims",
    "Total Incurred",
    "Total Payroll",
];

/// Count rows per (year, status)
pub fn status_counts(years: &[i64], statuses: &[ClaimStatus]) -> Vec<LongFormRow> {
    let mut counts: BTreeMap<(i64, ClaimStatus), u64> = BTreeMap::new();
    for (year, status) in years.iter().zip(statuses) {
        *counts.entry((*year, *status)).or_default() += 1;
    }

    counts
        .into_iter()
        .map(|((policy_year, status), count)| LongFormRow {
            policy_year,
            claim_type: ClaimType::Status(status),
            value: count as f64,
        })
        .collect()
}

/// Sum incurred per year; cells that are not numbers or money text are skipped
pub fn incurred_sums(years: &[i64], incurred: &[CellValue]) -> ClaimMapResult<Vec<LongFormRow>> {
    let parser = MoneyParser::new()?;
    let mut sums: BTreeMap<i64, f64> = BTreeMap::new();

    for (year, cell) in years.iter().zip(incurred) {
        let total = sums.entry(*year).or_insert(0.0);
        match cell {
            CellValue::Number(n) if !n.is_nan() => *total += n,
            CellValue::Text(s) => match parser.parse(s) {
                Some(n) => *total += n,
                None => tracing::debug!(year, value = %s, "skipping non-numeric incurred"),
            },
            _ => {}
        }
    }

    Ok(sums
        .into_iter()
        .map(|(policy_year, value)| LongFormRow {
            policy_year,
            claim_type: ClaimType::TotalIncurred,
            value,
        })
        .collect())
}

/// Recognises amounts such as `1,250.00`, `$1,250`, `-300` and `($300.00)`
pub struct MoneyParser {
    pattern: Regex,
}

impl MoneyParser {
    pub fn new() -> ClaimMapResult<Self> {
        let pattern = Regex::new(r"^(\()?\s*(-)?\s*\$?\s*(-)?([0-9][0-9,]*(?:\.[0-9]*)?|\.[0-9]+)\s*(\))?$")
            .map_err(|e| ClaimMapError::Validation(format!("Regex error: {}", e)))?;
        Ok(Self { pattern })
    }

    pub fn parse(&self, text: &str) -> Option<f64> {
        let caps = self.pattern.captures(text.trim())?;
        let parenthesized = caps.get(1).is_some() && caps.get(5).is_some();
        if caps.get(1).is_some() != caps.get(5).is_some() {
            return None;
        }
        let negative = parenthesized || caps.get(2).is_some() || caps.get(3).is_some();
        let amount: f64 = caps.get(4)?.as_str().replace(',', "").parse().ok()?;
        Some(if negative { -amount } else { amount })
    }
}

/// Keep long-form rows whose year is one of `years`
pub fn restrict_years(rows: Vec<LongFormRow>, years: &[i64]) -> Vec<LongFormRow> {
    rows.into_iter()
        .filter(|r| years.contains(&r.policy_year))
        .collect()
}

/// Pivot long-form rows to one row per year, join payroll, sort newest first
pub fn pivot_summary(rows: &[LongFormRow], payroll: &[ModRecord]) -> Vec<ClaimSummaryRow> {
    let mut by_year: BTreeMap<i64, ClaimSummaryRow> = BTreeMap::new();

    for row in rows {
        let entry = by_year.entry(row.policy_year).or_insert_with(|| ClaimSummaryRow {
            policy_year: row.policy_year,
            closed: 0,
            open: 0,
            total_claims: 0,
            total_incurred: 0.0,
            total_payroll: None,
        });
        match row.claim_type {
            ClaimType::Status(ClaimStatus::Open) => entry.open += row.value as u64,
            ClaimType::Status(ClaimStatus::Closed) => entry.closed += row.value as u64,
            ClaimType::Status(ClaimStatus::Unknown) => {}
            ClaimType::TotalIncurred => entry.total_incurred += row.value,
        }
    }

    let mut summary: Vec<ClaimSummaryRow> = by_year
        .into_values()
        .map(|mut row| {
            row.total_claims = row.open + row.closed;
            row.total_payroll = payroll
                .iter()
                .find(|p| p.year == row.policy_year)
                .map(|p| p.payroll);
            row
        })
        .collect();

    summary.sort_by(|a, b| b.policy_year.cmp(&a.policy_year));
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(year: i64, payroll: f64) -> ModRecord {
        ModRecord {
            year,
            mod_value: 100.0,
            payroll,
        }
    }

    #[test]
    fn test_status_counts_grouped() {
        let years = [2023, 2023, 2022, 2023];
        let statuses = [
            ClaimStatus::Open,
            ClaimStatus::Closed,
            ClaimStatus::Open,
            ClaimStatus::Open,
        ];
        let rows = status_counts(&years, &statuses);
        assert_eq!(rows.len(), 3);
        assert!(rows.contains(&LongFormRow {
            policy_year: 2023,
            claim_type: ClaimType::Status(ClaimStatus::Open),
            value: 2.0
        }));
    }

    #[test]
    fn test_incurred_sums_numeric_only() {
        let years = [2023, 2023, 2022, 2022];
        let cells = [
            CellValue::Number(100.0),
            CellValue::text("$1,250.50"),
            CellValue::text("pending"),
            CellValue::Empty,
        ];
        let rows = incurred_sums(&years, &cells).unwrap();
        assert_eq!(
            rows,
            vec![
                LongFormRow {
                    policy_year: 2022,
                    claim_type: ClaimType::TotalIncurred,
                    value: 0.0
                },
                LongFormRow {
                    policy_year: 2023,
                    claim_type: ClaimType::TotalIncurred,
                    value: 1350.5
                },
            ]
        );
    }

    #[test]
    fn test_money_parser() {
        let parser = MoneyParser::new().unwrap();
        assert_eq!(parser.parse("1250"), Some(1250.0));
        assert_eq!(parser.parse(" $12,000.25 "), Some(12000.25));
        assert_eq!(parser.parse("-300"), Some(-300.0));
        assert_eq!(parser.parse("($300.00)"), Some(-300.0));
        assert_eq!(parser.parse("$-5"), Some(-5.0));
        assert_eq!(parser.parse("(300"), None);
        assert_eq!(parser.parse("n/a"), None);
        assert_eq!(parser.parse(""), None);
    }

    #[test]
    fn test_pivot_missing_category_is_zero() {
        let rows = vec![
            LongFormRow {
                policy_year: 2023,
                claim_type: ClaimType::Status(ClaimStatus::Open),
                value: 3.0,
            },
            LongFormRow {
                policy_year: 2023,
                claim_type: ClaimType::TotalIncurred,
                value: 900.0,
            },
        ];
        let summary = pivot_summary(&rows, &[record(2023, 5000.0)]);
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].open, 3);
        assert_eq!(summary[0].closed, 0);
        assert_eq!(summary[0].total_claims, 3);
        assert_eq!(summary[0].total_payroll, Some(5000.0));
    }

    #[test]
    fn test_pivot_unknown_excluded_and_sorted_descending() {
        let rows = vec![
            LongFormRow {
                policy_year: 2021,
                claim_type: ClaimType::Status(ClaimStatus::Closed),
                value: 2.0,
            },
            LongFormRow {
                policy_year: 2022,
                claim_type: ClaimType::Status(ClaimStatus::Unknown),
                value: 4.0,
            },
            LongFormRow {
                policy_year: 2022,
                claim_type: ClaimType::Status(ClaimStatus::Open),
                value: 1.0,
            },
        ];
        let summary = pivot_summary(&rows, &[record(2021, 10.0)]);
        let years: Vec<i64> = summary.iter().map(|r| r.policy_year).collect();
        assert_eq!(years, vec![2022, 2021]);
        assert_eq!(summary[0].total_claims, 1);
        assert_eq!(summary[0].total_payroll, None);
        assert_eq!(summary[1].total_claims, 2);
    }

    #[test]
    fn test_restrict_years() {
        let rows = vec![
            LongFormRow {
                policy_year: 2025,
                claim_type: ClaimType::TotalIncurred,
                value: 1.0,
            },
            LongFormRow {
                policy_year: 2024,
                claim_type: ClaimType::TotalIncurred,
                value: 1.0,
            },
        ];
        let kept = restrict_years(rows, &[2024, 2023]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].policy_year, 2024);
    }
}

//! Report exporter: three-sheet workbook with display formats

use super::importer::datetime_to_serial;
use crate::core::{ClaimReport, SUMMARY_HEADERS};
use crate::error::{ClaimMapError, ClaimMapResult};
use crate::types::{CellValue, LossRunTable};
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use std::path::{Path, PathBuf};

pub const DATA_SHEET: &str = "Data";
pub const SUMMARY_SHEET: &str = "OpenClosedIncurred";
pub const MOD_HISTORY_SHEET: &str = "Mod History";

pub const DEFAULT_FILE_NAME: &str = "claim_output.xlsx";

/// Two-decimal USD, as Excel's built-in simple currency format
pub const CURRENCY_FORMAT: &str = "\"$\"#,##0.00_-";
pub const WHOLE_DOLLAR_FORMAT: &str = "\"$\"#,##0";
pub const INTEGER_FORMAT: &str = "0";
pub const DATETIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

/// Append `.xlsx` unless the name already ends with it (any case)
pub fn export_file_name(name: &str) -> String {
    let name = name.trim();
    let name = if name.is_empty() { DEFAULT_FILE_NAME } else { name };
    if name.to_lowercase().ends_with(".xlsx") {
        name.to_string()
    } else {
        format!("{}.xlsx", name)
    }
}

/// Writes a [`ClaimReport`] as an .xlsx workbook
pub struct ReportExporter<'a> {
    report: &'a ClaimReport,
    header_format: Format,
}

impl<'a> ReportExporter<'a> {
    pub fn new(report: &'a ClaimReport) -> Self {
        Self {
            report,
            header_format: Format::new().set_bold(),
        }
    }

    /// Build the workbook in memory
    pub fn build(&self) -> ClaimMapResult<Workbook> {
        let mut workbook = Workbook::new();
        self.write_data_sheet(workbook.add_worksheet())?;
        self.write_summary_sheet(workbook.add_worksheet())?;
        self.write_mod_history_sheet(workbook.add_worksheet())?;
        Ok(workbook)
    }

    /// Serialize to bytes (nothing touches the filesystem)
    pub fn to_bytes(&self) -> ClaimMapResult<Vec<u8>> {
        let mut workbook = self.build()?;
        workbook
            .save_to_buffer()
            .map_err(|e| ClaimMapError::Export(format!("Failed to build workbook: {}", e)))
    }

    /// Save into `dir` under `file_name` (coerced to .xlsx); returns the path
    pub fn save(&self, dir: &Path, file_name: &str) -> ClaimMapResult<PathBuf> {
        let path = dir.join(export_file_name(file_name));
        let bytes = self.to_bytes()?;
        std::fs::write(&path, bytes)?;
        tracing::info!(path = %path.display(), "workbook written");
        Ok(path)
    }

    fn write_header(&self, worksheet: &mut Worksheet, headers: &[&str]) -> ClaimMapResult<()> {
        for (col, header) in headers.iter().enumerate() {
            worksheet.write_string_with_format(0, col as u16, *header, &self.header_format)?;
        }
        Ok(())
    }

    fn write_data_sheet(&self, worksheet: &mut Worksheet) -> ClaimMapResult<()> {
        worksheet.set_name(DATA_SHEET)?;
        let table: &LossRunTable = &self.report.data;
        self.write_header(worksheet, &table.column_names())?;

        let date_format = Format::new().set_num_format(DATETIME_FORMAT);
        for (col, column) in table.columns.iter().enumerate() {
            for (idx, value) in column.values.iter().enumerate() {
                let row = idx as u32 + 1;
                let col = col as u16;
                match value {
                    CellValue::Empty => {}
                    CellValue::Text(s) => {
                        worksheet.write_string(row, col, s)?;
                    }
                    CellValue::Number(n) if n.is_finite() => {
                        worksheet.write_number(row, col, *n)?;
                    }
                    CellValue::Number(_) => {}
                    CellValue::Bool(b) => {
                        worksheet.write_boolean(row, col, *b)?;
                    }
                    CellValue::DateTime(dt) => {
                        worksheet.write_number_with_format(
                            row,
                            col,
                            datetime_to_serial(dt),
                            &date_format,
                        )?;
                    }
                }
            }
        }
        Ok(())
    }

    fn write_summary_sheet(&self, worksheet: &mut Worksheet) -> ClaimMapResult<()> {
        worksheet.set_name(SUMMARY_SHEET)?;
        self.write_header(worksheet, &SUMMARY_HEADERS)?;

        let currency = Format::new().set_num_format(CURRENCY_FORMAT);
        let whole_dollar = Format::new().set_num_format(WHOLE_DOLLAR_FORMAT);

        for (idx, row) in self.report.summary.iter().enumerate() {
            let r = idx as u32 + 1;
            worksheet.write_number(r, 0, row.policy_year as f64)?;
            worksheet.write_number(r, 1, row.closed as f64)?;
            worksheet.write_number(r, 2, row.open as f64)?;
            worksheet.write_number(r, 3, row.total_claims as f64)?;
            worksheet.write_number_with_format(r, 4, row.total_incurred, &currency)?;
            match row.total_payroll {
                Some(payroll) => {
                    worksheet.write_number_with_format(r, 5, payroll, &whole_dollar)?;
                }
                None => {
                    worksheet.write_blank(r, 5, &whole_dollar)?;
                }
            }
        }
        Ok(())
    }

    fn write_mod_history_sheet(&self, worksheet: &mut Worksheet) -> ClaimMapResult<()> {
        worksheet.set_name(MOD_HISTORY_SHEET)?;
        self.write_header(worksheet, &["Policy Year", "Mod"])?;

        let integer = Format::new().set_num_format(INTEGER_FORMAT);
        for (idx, row) in self.report.mod_history.iter().enumerate() {
            let r = idx as u32 + 1;
            worksheet.write_string(r, 0, &row.label)?;
            worksheet.write_number_with_format(r, 1, row.mod_value, &integer)?;
        }
        Ok(())
    }
}

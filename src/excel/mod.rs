//! Excel import/export
//!
//! - Import: loss-run worksheet (.xlsx) → in-memory table
//! - Export: claim report → three-sheet workbook with display formats

mod exporter;
mod importer;

pub use exporter::{
    export_file_name, ReportExporter, CURRENCY_FORMAT, DATA_SHEET, DEFAULT_FILE_NAME,
    INTEGER_FORMAT, MOD_HISTORY_SHEET, SUMMARY_SHEET, WHOLE_DOLLAR_FORMAT,
};
pub use importer::{datetime_to_serial, serial_to_datetime, LossRunImporter};

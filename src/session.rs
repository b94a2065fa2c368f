//! Session state: upload, worksheet choice, mapping and mod form
//!
//! One `Session` holds everything a user has entered. It is created when a
//! workbook is uploaded, mutated by each interaction, and dropped at the end.

use crate::core::{build_report, ClaimReport};
use crate::error::{ClaimMapError, ClaimMapResult};
use crate::excel::{export_file_name, LossRunImporter, ReportExporter, DEFAULT_FILE_NAME};
use crate::mapping::{ColumnMapping, InternalField};
use crate::mod_form::ModForm;
use crate::types::LossRunTable;
use std::path::{Path, PathBuf};

pub struct Session {
    importer: LossRunImporter,
    sheet_names: Vec<String>,
    sheet: String,
    table: LossRunTable,
    mapping: ColumnMapping,
    pub mod_form: ModForm,
    output_name: String,
}

impl Session {
    /// Open an uploaded workbook and load its first worksheet
    pub fn upload<P: AsRef<Path>>(path: P) -> ClaimMapResult<Self> {
        let importer = LossRunImporter::new(path);
        let sheet_names = importer.sheet_names()?;
        let first = sheet_names.first().cloned().ok_or_else(|| {
            ClaimMapError::Import(format!(
                "Workbook {} has no worksheets",
                importer.path().display()
            ))
        })?;
        let table = importer.load_sheet(&first)?;

        Ok(Self {
            importer,
            sheet_names,
            sheet: first,
            table,
            mapping: ColumnMapping::new(),
            mod_form: ModForm::new(),
            output_name: DEFAULT_FILE_NAME.to_string(),
        })
    }

    /// Build a session around an already-loaded table
    pub fn from_table(path: impl AsRef<Path>, table: LossRunTable) -> Self {
        Self {
            importer: LossRunImporter::new(path),
            sheet_names: vec![table.name.clone()],
            sheet: table.name.clone(),
            table,
            mapping: ColumnMapping::new(),
            mod_form: ModForm::new(),
            output_name: DEFAULT_FILE_NAME.to_string(),
        }
    }

    pub fn sheet_names(&self) -> &[String] {
        &self.sheet_names
    }

    pub fn sheet(&self) -> &str {
        &self.sheet
    }

    pub fn table(&self) -> &LossRunTable {
        &self.table
    }

    pub fn mapping(&self) -> &ColumnMapping {
        &self.mapping
    }

    /// Load a different worksheet; selections naming absent columns are reset
    pub fn select_sheet(&mut self, sheet: &str) -> ClaimMapResult<Vec<InternalField>> {
        if sheet == self.sheet {
            return Ok(Vec::new());
        }
        self.table = self.importer.load_sheet(sheet)?;
        self.sheet = sheet.to_string();

        let columns = self.table.column_names();
        let reset = self.mapping.retain_columns(&columns);
        if !reset.is_empty() {
            tracing::debug!(?reset, sheet, "selections reset after sheet change");
        }
        Ok(reset)
    }

    /// Choose a source column for a field, or `None` for no column
    pub fn select(&mut self, field: InternalField, column: Option<&str>) -> ClaimMapResult<()> {
        if let Some(column) = column {
            if !self.table.has_column(column) {
                return Err(ClaimMapError::Mapping(format!(
                    "Column '{}' for '{}' is not in worksheet '{}' (columns: {})",
                    column,
                    field,
                    self.sheet,
                    self.table.column_names().join(", ")
                )));
            }
        }
        self.mapping.select(field, column.map(str::to_string));
        Ok(())
    }

    /// Clear every field selection; the table and sheet choice stay
    pub fn restart_mapping(&mut self) {
        tracing::debug!("mapping restarted");
        self.mapping.restart();
    }

    pub fn missing_required(&self) -> Vec<InternalField> {
        self.mapping.missing_required()
    }

    pub fn output_name(&self) -> &str {
        &self.output_name
    }

    /// Set the export file name, coerced to end with .xlsx
    pub fn set_output_name(&mut self, name: &str) {
        self.output_name = export_file_name(name);
    }

    /// Run the transform on current inputs
    pub fn report(&self) -> ClaimMapResult<ClaimReport> {
        self.mapping.ensure_complete()?;
        build_report(&self.table, &self.mapping, &self.mod_form)
    }

    /// Build the report and write the workbook into `dir`
    pub fn export(&self, dir: &Path) -> ClaimMapResult<(ClaimReport, PathBuf)> {
        let report = self.report()?;
        let path = ReportExporter::new(&report).save(dir, &self.output_name)?;
        Ok((report, path))
    }
}

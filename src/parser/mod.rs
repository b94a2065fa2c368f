use crate::error::{ClaimMapError, ClaimMapResult};
use crate::mapping::{ColumnMapping, InternalField};
use crate::mod_form::{HistoryInput, HISTORY_ROWS};
use crate::session::Session;
use jsonschema::JSONSchema;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// A form value as typed: YAML numbers and strings are both accepted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FormValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for FormValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormValue::Integer(i) => write!(f, "{}", i),
            FormValue::Float(x) => write!(f, "{}", x),
            FormValue::Text(s) => write!(f, "{}", s),
        }
    }
}

fn text(value: &Option<FormValue>) -> String {
    value.as_ref().map(FormValue::to_string).unwrap_or_default()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectionInput {
    #[serde(default)]
    pub year: Option<FormValue>,
    #[serde(default, rename = "mod")]
    pub mod_value: Option<FormValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryRowInput {
    /// Omit to take the year suggested from the projection year
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<FormValue>,
    #[serde(default, rename = "mod")]
    pub mod_value: Option<FormValue>,
    #[serde(default)]
    pub payroll: Option<FormValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModsSection {
    #[serde(default)]
    pub projection: ProjectionInput,
    #[serde(default)]
    pub history: Vec<HistoryRowInput>,
}

/// Session file: everything a user enters for one export
///
/// # Example
/// ```yaml
/// sheet: Losses
/// output: acme_2025.xlsx
/// mapping:
///   Policy Year: PolYr
///   Status: ClaimStat
///   Body Part Category: Body
///   Injury Cause Category: Cause
///   Incurred: Inc
/// mods:
///   projection: { year: 2025, mod: 95 }
///   history:
///     - { mod: 100, payroll: 1200000 }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default)]
    pub mapping: BTreeMap<String, Option<String>>,
    #[serde(default)]
    pub mods: ModsSection,
}

/// Parse and validate a session file
pub fn parse_session_file(path: &Path) -> ClaimMapResult<SessionFile> {
    let content = std::fs::read_to_string(path)?;
    parse_session_str(&content)
}

pub fn parse_session_str(content: &str) -> ClaimMapResult<SessionFile> {
    let yaml: Value = serde_yaml::from_str(content)?;
    if yaml.is_null() {
        return Ok(SessionFile::default());
    }
    validate_against_schema(&yaml)?;
    Ok(serde_yaml::from_value(yaml)?)
}

/// Validate YAML against the embedded session JSON Schema
fn validate_against_schema(yaml: &Value) -> ClaimMapResult<()> {
    let schema_str = include_str!("../../schema/session.schema.json");
    let schema_value: serde_json::Value = serde_json::from_str(schema_str)
        .map_err(|e| ClaimMapError::Validation(format!("Failed to parse schema: {}", e)))?;

    let compiled_schema = JSONSchema::compile(&schema_value)
        .map_err(|e| ClaimMapError::Validation(format!("Failed to compile schema: {}", e)))?;

    let json_value: serde_json::Value = serde_json::to_value(yaml).map_err(|e| {
        ClaimMapError::Validation(format!("Failed to convert YAML to JSON: {}", e))
    })?;

    if let Err(errors) = compiled_schema.validate(&json_value) {
        let error_messages: Vec<String> = errors.map(|e| format!("  - {}", e)).collect();
        return Err(ClaimMapError::Validation(format!(
            "Session file does not match schema:\n{}",
            error_messages.join("\n")
        )));
    }

    Ok(())
}

impl SessionFile {
    /// Parsed mapping entries; `null` columns mean "none"
    pub fn field_selections(&self) -> ClaimMapResult<Vec<(InternalField, Option<&str>)>> {
        self.mapping
            .iter()
            .map(|(field, column)| Ok((field.parse::<InternalField>()?, column.as_deref())))
            .collect()
    }

    /// Apply sheet choice, mapping, mod form and file name to a session
    pub fn apply(&self, session: &mut Session) -> ClaimMapResult<()> {
        if let Some(sheet) = &self.sheet {
            session.select_sheet(sheet)?;
        }

        for (field, column) in self.field_selections()? {
            session.select(field, column)?;
        }

        if self.mods.history.len() > HISTORY_ROWS {
            return Err(ClaimMapError::Validation(format!(
                "Mod form has {} historical rows, got {}",
                HISTORY_ROWS,
                self.mods.history.len()
            )));
        }
        let projection = &self.mods.projection;
        session
            .mod_form
            .set_projection(&text(&projection.year), &text(&projection.mod_value));
        for (index, row) in self.mods.history.iter().enumerate() {
            let input = HistoryInput {
                year: row.year.as_ref().map(FormValue::to_string),
                mod_value: text(&row.mod_value),
                payroll: text(&row.payroll),
            };
            session.mod_form.set_history(index, input)?;
        }

        if let Some(output) = &self.output {
            session.set_output_name(output);
        }
        Ok(())
    }

    /// Starter file for a workbook: suggested mapping, empty mod form
    pub fn template(session: &Session) -> Self {
        let columns = session.table().column_names();
        let suggested = ColumnMapping::suggest(&columns);

        let mapping = InternalField::ALL
            .into_iter()
            .map(|f| (f.name().to_string(), suggested.get(f).map(str::to_string)))
            .collect();

        SessionFile {
            sheet: Some(session.sheet().to_string()),
            output: Some(session.output_name().to_string()),
            mapping,
            mods: ModsSection {
                projection: ProjectionInput::default(),
                history: vec![HistoryRowInput::default(); HISTORY_ROWS],
            },
        }
    }

    pub fn to_yaml(&self) -> ClaimMapResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

use thiserror::Error;

use crate::mapping::InternalField;

pub type ClaimMapResult<T> = Result<T, ClaimMapError>;

#[derive(Error, Debug)]
pub enum ClaimMapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Import error: {0}")]
    Import(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("Mapping error: {0}")]
    Mapping(String),

    #[error("Missing required column mappings: {}", join_fields(.0))]
    MissingFields(Vec<InternalField>),

    #[error("Cannot convert {field} value '{value}' ({location})")]
    Coercion {
        field: String,
        value: String,
        location: String,
    },

    #[error("Validation error: {0}")]
    Validation(String),
}

fn join_fields(fields: &[InternalField]) -> String {
    fields
        .iter()
        .map(|f| f.name())
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<rust_xlsxwriter::XlsxError> for ClaimMapError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        ClaimMapError::Export(e.to_string())
    }
}

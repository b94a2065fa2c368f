//! Column mapping: six fixed internal fields mapped onto source columns

use crate::error::{ClaimMapError, ClaimMapResult};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Internal fields of the claim schema, in export column order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum InternalField {
    PolicyYear,
    Status,
    BodyPartCategory,
    InjuryCauseCategory,
    Incurred,
    LitigationStatus,
}

impl InternalField {
    pub const ALL: [InternalField; 6] = [
        InternalField::PolicyYear,
        InternalField::Status,
        InternalField::BodyPartCategory,
        InternalField::InjuryCauseCategory,
        InternalField::Incurred,
        InternalField::LitigationStatus,
    ];

    /// Canonical field name
    pub fn name(self) -> &'static str {
        match self {
            InternalField::PolicyYear => "Policy Year",
            InternalField::Status => "Status",
            InternalField::BodyPartCategory => "Body Part Category",
            InternalField::InjuryCauseCategory => "Injury Cause Category",
            InternalField::Incurred => "Incurred",
            InternalField::LitigationStatus => "Litigation Status",
        }
    }

    /// Header used for the field in the exported Data sheet
    pub fn display_header(self) -> &'static str {
        match self {
            InternalField::PolicyYear => "Policy Year",
            InternalField::Status => "Claim Status",
            InternalField::BodyPartCategory => "Body Part Cat.",
            InternalField::InjuryCauseCategory => "Injury Cause Cat.",
            InternalField::Incurred => "Incurred",
            InternalField::LitigationStatus => "Litigation",
        }
    }

    pub fn is_required(self) -> bool {
        self.default_value().is_none()
    }

    /// Constant filled in when an optional field is left unmapped
    pub fn default_value(self) -> Option<&'static str> {
        match self {
            InternalField::LitigationStatus => Some("N/A"),
            _ => None,
        }
    }

    pub fn required() -> impl Iterator<Item = InternalField> {
        Self::ALL.into_iter().filter(|f| f.is_required())
    }
}

impl fmt::Display for InternalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for InternalField {
    type Err = ClaimMapError;

    /// Accepts the canonical name or the display header, ignoring case and spacing
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = squash(s);
        InternalField::ALL
            .into_iter()
            .find(|f| squash(f.name()) == wanted || squash(f.display_header()) == wanted)
            .ok_or_else(|| {
                ClaimMapError::Mapping(format!(
                    "Unknown field '{}' (expected one of: {})",
                    s,
                    InternalField::ALL
                        .iter()
                        .map(|f| f.name())
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            })
    }
}

/// Lowercase and drop everything but letters and digits
fn squash(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// User selections: internal field -> source column name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMapping {
    selections: BTreeMap<InternalField, String>,
}

impl ColumnMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or clear the selection for a field
    ///
    /// `None` removes the field from the mapping, like choosing "none".
    pub fn select(&mut self, field: InternalField, column: Option<String>) {
        match column {
            Some(column) => {
                self.selections.insert(field, column);
            }
            None => {
                self.selections.remove(&field);
            }
        }
    }

    pub fn get(&self, field: InternalField) -> Option<&str> {
        self.selections.get(&field).map(String::as_str)
    }

    pub fn is_mapped(&self, field: InternalField) -> bool {
        self.selections.contains_key(&field)
    }

    /// Mapped fields in export column order
    pub fn iter(&self) -> impl Iterator<Item = (InternalField, &str)> {
        self.selections.iter().map(|(f, c)| (*f, c.as_str()))
    }

    pub fn len(&self) -> usize {
        self.selections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    /// Clear every selection
    pub fn restart(&mut self) {
        self.selections.clear();
    }

    /// Required fields that have no selection, in field order
    pub fn missing_required(&self) -> Vec<InternalField> {
        InternalField::required()
            .filter(|f| !self.is_mapped(*f))
            .collect()
    }

    /// Optional fields left unmapped (they receive their default value)
    pub fn unmapped_optional(&self) -> Vec<InternalField> {
        InternalField::ALL
            .into_iter()
            .filter(|f| !f.is_required() && !self.is_mapped(*f))
            .collect()
    }

    pub fn ensure_complete(&self) -> ClaimMapResult<()> {
        let missing = self.missing_required();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ClaimMapError::MissingFields(missing))
        }
    }

    /// Drop selections that name columns not offered anymore
    ///
    /// Returns the fields that were reset.
    pub fn retain_columns(&mut self, columns: &[&str]) -> Vec<InternalField> {
        let stale: Vec<InternalField> = self
            .selections
            .iter()
            .filter(|(_, c)| !columns.contains(&c.as_str()))
            .map(|(f, _)| *f)
            .collect();
        for field in &stale {
            self.selections.remove(field);
        }
        stale
    }

    /// Propose a mapping by matching column names against field names and headers
    pub fn suggest(columns: &[&str]) -> Self {
        let mut mapping = Self::new();
        for field in InternalField::ALL {
            let found = columns.iter().find(|c| {
                let c = squash(c);
                !c.is_empty() && (c == squash(field.name()) || c == squash(field.display_header()))
            });
            if let Some(column) = found {
                mapping.select(field, Some((*column).to_string()));
            }
        }
        mapping
    }
}

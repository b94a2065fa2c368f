//! Project the loss run onto the mapped fields

use super::policy_year::normalize_policy_year;
use crate::error::{ClaimMapError, ClaimMapResult};
use crate::mapping::{ColumnMapping, InternalField};
use crate::types::{CellValue, Column, LossRunTable};

/// Keep only mapped columns, renamed to display headers, then append a
/// constant column for every unmapped optional field.
pub fn remap_table(table: &LossRunTable, mapping: &ColumnMapping) -> ClaimMapResult<LossRunTable> {
    mapping.ensure_complete()?;

    let rows = table.row_count();
    let mut remapped = LossRunTable::new(table.name.clone());

    for (field, source) in mapping.iter() {
        let column = table.column(source).ok_or_else(|| {
            ClaimMapError::Mapping(format!(
                "Column '{}' mapped to '{}' is not in worksheet '{}'",
                source, field, table.name
            ))
        })?;
        remapped.add_column(Column::new(field.display_header(), column.values.clone()));
    }

    for field in mapping.unmapped_optional() {
        if let Some(default) = field.default_value() {
            tracing::debug!(%field, default, "filling unmapped optional field");
            remapped.add_column(Column::constant(
                field.display_header(),
                CellValue::text(default),
                rows,
            ));
        }
    }

    Ok(remapped)
}

/// Replace the Policy Year column with integer years and return them
pub fn normalize_year_column(table: &mut LossRunTable) -> ClaimMapResult<Vec<i64>> {
    let header = InternalField::PolicyYear.display_header();
    let column = table.column_mut(header).ok_or_else(|| {
        ClaimMapError::Mapping(format!("Table has no '{}' column", header))
    })?;

    let years = normalize_policy_year(column)?;
    column.values = years.iter().map(|y| CellValue::Number(*y as f64)).collect();
    Ok(years)
}

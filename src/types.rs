use chrono::NaiveDateTime;
use std::fmt;

//==============================================================================
// Cell values
//==============================================================================

/// A single worksheet cell as read from the loss run
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Number(n) => write!(f, "{}", format_number(*n)),
            CellValue::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            CellValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

/// Format a number for display, dropping a zero fractional part
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        let rounded = (n * 1e6).round() / 1e6;
        format!("{:.6}", rounded)
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    }
}

//==============================================================================
// Columns and tables
//==============================================================================

/// Storage kind of a column, judged on its non-empty cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// No non-empty cells
    Empty,
    /// Every non-empty cell is a number (booleans count as numbers)
    Numeric,
    /// Every non-empty cell is a date/time
    DateTime,
    /// Anything else
    Text,
}

/// A named column of cells
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<CellValue>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<CellValue>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Column of `len` copies of the same value
    pub fn constant(name: impl Into<String>, value: CellValue, len: usize) -> Self {
        Self::new(name, vec![value; len])
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn kind(&self) -> ColumnKind {
        let mut kind = ColumnKind::Empty;
        for value in self.values.iter().filter(|v| !matches!(v, CellValue::Empty)) {
            let cell_kind = match value {
                CellValue::Number(_) | CellValue::Bool(_) => ColumnKind::Numeric,
                CellValue::DateTime(_) => ColumnKind::DateTime,
                _ => return ColumnKind::Text,
            };
            if kind == ColumnKind::Empty {
                kind = cell_kind;
            } else if kind != cell_kind {
                return ColumnKind::Text;
            }
        }
        kind
    }
}

/// Column-oriented in-memory table (one worksheet of the loss run)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LossRunTable {
    /// Worksheet the table was loaded from
    pub name: String,
    pub columns: Vec<Column>,
}

impl LossRunTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    pub fn add_column(&mut self, column: Column) {
        self.columns.push(column);
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map(Column::len).unwrap_or(0)
    }

    /// Cells of one row, in column order
    pub fn row(&self, index: usize) -> Vec<&CellValue> {
        self.columns
            .iter()
            .map(|c| c.values.get(index).unwrap_or(&CellValue::Empty))
            .collect()
    }

    /// First `n` rows as a new table
    pub fn head(&self, n: usize) -> LossRunTable {
        LossRunTable {
            name: self.name.clone(),
            columns: self
                .columns
                .iter()
                .map(|c| Column::new(c.name.clone(), c.values.iter().take(n).cloned().collect()))
                .collect(),
        }
    }

    /// Keep only the rows whose mask entry is true
    pub fn filter_rows(&self, mask: &[bool]) -> LossRunTable {
        LossRunTable {
            name: self.name.clone(),
            columns: self
                .columns
                .iter()
                .map(|c| {
                    let values = c
                        .values
                        .iter()
                        .zip(mask)
                        .filter(|(_, keep)| **keep)
                        .map(|(v, _)| v.clone())
                        .collect();
                    Column::new(c.name.clone(), values)
                })
                .collect(),
        }
    }

    /// Check that every column has the same number of rows
    pub fn validate_lengths(&self) -> Result<(), String> {
        let expected = self.row_count();
        for column in &self.columns {
            if column.len() != expected {
                return Err(format!(
                    "Column '{}' has {} rows, expected {}",
                    column.name,
                    column.len(),
                    expected
                ));
            }
        }
        Ok(())
    }
}

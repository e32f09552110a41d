use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LoadError;

// ---------------------------------------------------------------------------
// CellValue – a single cell of a table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring common Pandas dtypes.
/// Sets of values are kept in `BTreeSet`s downstream so `CellValue` must be `Ord`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Integer(i64),
    Float(f64),
    Bool(bool),
    String(String),
    Null,
}

// -- Manual Eq/Ord so we can put CellValue in BTreeSet --

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use CellValue::*;
        fn discriminant(v: &CellValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) | Float(_) => 2,
                String(_) => 3,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            // Mixed numerics order by value, integers first on ties.
            (Integer(a), Float(b)) => (*a as f64).total_cmp(b).then(std::cmp::Ordering::Less),
            (Float(a), Integer(b)) => a.total_cmp(&(*b as f64)).then(std::cmp::Ordering::Greater),
            (String(a), String(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for CellValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::String(s) => s.hash(state),
            CellValue::Integer(i) => i.hash(state),
            CellValue::Float(f) => f.to_bits().hash(state),
            CellValue::Bool(b) => b.hash(state),
            CellValue::Null => {}
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Integer(i)
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        CellValue::Float(v)
    }
}

impl CellValue {
    /// Null, or a float that is NaN (Pandas' missing marker for numeric columns).
    pub fn is_missing(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Float(v) => v.is_nan(),
            _ => false,
        }
    }

    /// Interpret the value as an `f64`. Text that parses as a number counts.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) if !v.is_nan() => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::String(s) => s.trim().parse::<f64>().ok().filter(|v| !v.is_nan()),
            _ => None,
        }
    }

    /// Textual form used by substring and token matching; `None` when missing.
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            _ if self.is_missing() => None,
            CellValue::String(s) => Some(Cow::Borrowed(s.as_str())),
            other => Some(Cow::Owned(other.to_string())),
        }
    }

    /// Literal equality used by value-set criteria: numerics compare by value,
    /// everything else must match exactly.
    pub fn matches_literal(&self, literal: &CellValue) -> bool {
        match (self, literal) {
            (CellValue::Integer(_) | CellValue::Float(_), CellValue::Integer(_) | CellValue::Float(_)) => {
                self.as_f64() == literal.as_f64()
            }
            _ => self == literal,
        }
    }
}

// ---------------------------------------------------------------------------
// TableId – which of the two datasets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableId {
    Protein,
    Drug,
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableId::Protein => write!(f, "protein"),
            TableId::Drug => write!(f, "drug"),
        }
    }
}

impl FromStr for TableId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "protein" | "uniprot" => Ok(TableId::Protein),
            "drug" | "drugbank" => Ok(TableId::Drug),
            other => Err(format!("unknown table '{other}' (expected 'protein' or 'drug')")),
        }
    }
}

// ---------------------------------------------------------------------------
// Column / Table – the loaded dataset
// ---------------------------------------------------------------------------

/// One named column; `values[i]` is the cell of row `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<CellValue>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<CellValue>) -> Self {
        Column {
            name: name.into(),
            values,
        }
    }
}

/// An immutable, column-oriented table. Row identity is the 0-based position.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    label: String,
    columns: Vec<Column>,
    index: HashMap<String, usize>,
    len: usize,
}

impl Table {
    /// Assemble a table from columns in declared order.
    ///
    /// Fails when two columns share a name or the columns disagree on length.
    pub fn from_columns(label: impl Into<String>, columns: Vec<Column>) -> Result<Self, LoadError> {
        let label = label.into();
        let len = columns.first().map_or(0, |c| c.values.len());
        let mut index = HashMap::with_capacity(columns.len());

        for (i, col) in columns.iter().enumerate() {
            if index.insert(col.name.clone(), i).is_some() {
                return Err(LoadError::Malformed {
                    origin: label,
                    message: format!("duplicate column '{}'", col.name),
                });
            }
            if col.values.len() != len {
                return Err(LoadError::Malformed {
                    origin: label,
                    message: format!(
                        "column '{}' has {} values but the table has {len} rows",
                        col.name,
                        col.values.len()
                    ),
                });
            }
        }

        Ok(Table {
            label,
            columns,
            index,
            len,
        })
    }

    /// Assemble a table from row-major records, each as long as `column_names`.
    pub fn from_rows(
        label: impl Into<String>,
        column_names: Vec<String>,
        rows: Vec<Vec<CellValue>>,
    ) -> Result<Self, LoadError> {
        let label = label.into();
        let mut columns: Vec<Column> = column_names
            .into_iter()
            .map(|name| Column::new(name, Vec::with_capacity(rows.len())))
            .collect();

        for (row_no, row) in rows.into_iter().enumerate() {
            if row.len() != columns.len() {
                return Err(LoadError::Malformed {
                    origin: label,
                    message: format!(
                        "row {row_no} has {} fields but {} were declared",
                        row.len(),
                        columns.len()
                    ),
                });
            }
            for (col, value) in columns.iter_mut().zip(row) {
                col.values.push(value);
            }
        }

        Table::from_columns(label, columns)
    }

    /// Human-readable origin of the table (usually its source path).
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// All row positions, ascending.
    pub fn positions(&self) -> Range<usize> {
        0..self.len
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.index.get(name).map(|&i| &self.columns[i])
    }

    /// Column names in declared order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&CellValue> {
        self.column(column).and_then(|c| c.values.get(row))
    }
}

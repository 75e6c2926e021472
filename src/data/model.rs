use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};

// ---------------------------------------------------------------------------
// CellValue – a single cell of a table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring common spreadsheet / Pandas dtypes.
/// Used as a `BTreeMap` key for group counts, so `CellValue` must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// ISO-8601 date string kept as text for simplicity.
    Date(String),
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
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
                Date(_) => 5,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) | (Date(a), Date(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
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
            CellValue::Date(d) => write!(f, "{d}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::String(s) | CellValue::Date(s) => serializer.serialize_str(s),
            CellValue::Integer(i) => serializer.serialize_i64(*i),
            // JSON has no NaN; non-finite floats become null.
            CellValue::Float(v) if !v.is_finite() => serializer.serialize_none(),
            CellValue::Float(v) => serializer.serialize_f64(*v),
            CellValue::Bool(b) => serializer.serialize_bool(*b),
            CellValue::Null => serializer.serialize_none(),
        }
    }
}

impl CellValue {
    /// Interpret the value as an `f64`. NaN counts as missing.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) if v.is_nan() => None,
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Null or NaN.
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null) || matches!(self, CellValue::Float(v) if v.is_nan())
    }

    /// Value used as a join key. Whole floats collapse to integers because
    /// spreadsheets hand back nullable id columns as floats.
    pub fn as_key(&self) -> Option<i64> {
        match self {
            CellValue::Integer(i) => Some(*i),
            CellValue::Float(v) if v.is_finite() && v.fract() == 0.0 => Some(*v as i64),
            _ => None,
        }
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        CellValue::Float(v)
    }
}

impl From<i64> for CellValue {
    fn from(v: i64) -> Self {
        CellValue::Integer(v)
    }
}

impl From<bool> for CellValue {
    fn from(v: bool) -> Self {
        CellValue::Bool(v)
    }
}

impl From<&str> for CellValue {
    fn from(v: &str) -> Self {
        CellValue::String(v.to_string())
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(CellValue::Null)
    }
}

// ---------------------------------------------------------------------------
// Row – one record of the table
// ---------------------------------------------------------------------------

/// One row: column_name → value. Missing keys read as `Null`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    pub cells: BTreeMap<String, CellValue>,
}

static NULL: CellValue = CellValue::Null;

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, column: &str) -> &CellValue {
        self.cells.get(column).unwrap_or(&NULL)
    }

    pub fn set(&mut self, column: impl Into<String>, value: impl Into<CellValue>) {
        self.cells.insert(column.into(), value.into());
    }

    /// Builder-style `set`, handy for fixtures.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.set(column, value);
        self
    }

    pub fn number(&self, column: &str) -> Option<f64> {
        self.get(column).as_f64()
    }
}

// ---------------------------------------------------------------------------
// Table – an immutable in-memory dataset
// ---------------------------------------------------------------------------

/// A loaded dataset: ordered column names plus rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    /// Column names in source order.
    pub column_names: Vec<String>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(column_names: Vec<String>, rows: Vec<Row>) -> Self {
        Table { column_names, rows }
    }

    /// Build a table from rows, collecting column names in first-seen order.
    pub fn from_rows(rows: Vec<Row>) -> Self {
        let mut column_names: Vec<String> = Vec::new();
        for row in &rows {
            for col in row.cells.keys() {
                if !column_names.contains(col) {
                    column_names.push(col.clone());
                }
            }
        }
        Table { column_names, rows }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.column_names.iter().any(|c| c == column)
    }

    /// Copy of the table without `column`.
    pub fn drop_column(&self, column: &str) -> Table {
        Table {
            column_names: self
                .column_names
                .iter()
                .filter(|c| *c != column)
                .cloned()
                .collect(),
            rows: self
                .rows
                .iter()
                .map(|r| {
                    let mut r = r.clone();
                    r.cells.remove(column);
                    r
                })
                .collect(),
        }
    }

    /// Non-null numeric values of a column.
    pub fn numbers<'a>(&'a self, column: &'a str) -> impl Iterator<Item = f64> + 'a {
        self.rows.iter().filter_map(move |r| r.number(column))
    }

    /// Sorted set of distinct values of a column (nulls included).
    pub fn unique_values(&self, column: &str) -> BTreeSet<CellValue> {
        self.rows.iter().map(|r| r.get(column).clone()).collect()
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (k, v) in &self.cells {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

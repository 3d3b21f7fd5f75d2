//! Semi-structured invoice rows.
//!
//! A row is an ordered mapping from column name to a JSON cell. Rows are
//! never edited in place: changes are collected in a [`RowPatch`] and
//! [`Row::apply`] returns a new row.

use std::borrow::Cow;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// A single cell as seen by the adjuster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellValue {
    /// Missing column or JSON `null`.
    Empty,
    /// Numeric cell.
    Number(Number),
    /// Any other cell, rendered as text.
    Text(String),
}

impl CellValue {
    /// Text form of the cell, as a spreadsheet export would show it.
    #[must_use]
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Self::Empty => Cow::Borrowed(""),
            Self::Number(n) => Cow::Owned(n.to_string()),
            Self::Text(s) => Cow::Borrowed(s),
        }
    }

    /// Integral cell from a whole-number decimal.
    ///
    /// Values outside the `i64` range are kept as text rather than
    /// silently losing precision.
    #[must_use]
    pub fn integer(value: Decimal) -> Self {
        let whole = value.trunc();
        match whole.to_i64() {
            Some(n) => Self::Number(Number::from(n)),
            None => Self::Text(whole.normalize().to_string()),
        }
    }
}

impl From<&Value> for CellValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Self::Empty,
            Value::Number(n) => Self::Number(n.clone()),
            Value::String(s) => Self::Text(s.clone()),
            other => Self::Text(other.to_string()),
        }
    }
}

impl From<CellValue> for Value {
    fn from(cell: CellValue) -> Self {
        match cell {
            CellValue::Empty => Self::Null,
            CellValue::Number(n) => Self::Number(n),
            CellValue::Text(s) => Self::String(s),
        }
    }
}

/// An invoice row with column order preserved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(Map<String, Value>);

impl Row {
    /// Creates an empty row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cell in `column`, or `None` if the column is absent.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<CellValue> {
        self.0.get(column).map(CellValue::from)
    }

    /// Returns the cell in `column`, treating an absent column as empty.
    #[must_use]
    pub fn cell(&self, column: &str) -> CellValue {
        self.get(column).unwrap_or(CellValue::Empty)
    }

    /// Returns true if the row has `column`.
    #[must_use]
    pub fn contains(&self, column: &str) -> bool {
        self.0.contains_key(column)
    }

    /// Builder-style setter used when constructing rows.
    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(column.into(), value.into());
        self
    }

    /// Column names in order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true for a row without columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns a new row with `patch` applied.
    ///
    /// Existing columns keep their position; new columns are appended.
    #[must_use]
    pub fn apply(&self, patch: &RowPatch) -> Self {
        let mut map = self.0.clone();
        for (column, cell) in &patch.changes {
            map.insert(column.clone(), Value::from(cell.clone()));
        }
        Self(map)
    }
}

impl From<Map<String, Value>> for Row {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Changed cells of one row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowPatch {
    changes: Vec<(String, CellValue)>,
}

impl RowPatch {
    /// Creates an empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a new value for `column`.
    pub fn set(&mut self, column: impl Into<String>, cell: CellValue) {
        let column = column.into();
        if let Some(slot) = self.changes.iter_mut().find(|(c, _)| *c == column) {
            slot.1 = cell;
        } else {
            self.changes.push((column, cell));
        }
    }

    /// The value recorded for `column`, if any.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.changes
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, cell)| cell)
    }

    /// Returns true when nothing changes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

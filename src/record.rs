//! Row data types shared by every pipeline stage.
//!
//! A [`Record`] is one spreadsheet row: an ordered column → [`CellValue`]
//! map plus the row index it came from. The index never changes as the
//! record is cleaned and enriched, so every failure traces back to its
//! source row.

use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use std::fmt;

/// A single spreadsheet cell.
///
/// Only [`CellValue::Text`] counts as string-valued for normalisation;
/// every other variant passes through the cleaning stage untouched.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Int(i64),
    Bool(bool),
    /// A date or duration cell, kept in its textual form but never normalised.
    Timestamp(String),
    /// Blank cell (or a cell holding a spreadsheet error value).
    #[default]
    Empty,
}

impl CellValue {
    /// The string contents when this is a text cell.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// `true` for [`CellValue::Empty`] and whitespace-only text.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) | CellValue::Timestamp(s) => f.write_str(s),
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Int(i) => write!(f, "{i}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Empty => Ok(()),
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Text(s) | CellValue::Timestamp(s) => serializer.serialize_str(s),
            CellValue::Number(n) => serializer.serialize_f64(*n),
            CellValue::Int(i) => serializer.serialize_i64(*i),
            CellValue::Bool(b) => serializer.serialize_bool(*b),
            CellValue::Empty => serializer.serialize_none(),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Int(i)
    }
}

/// One input row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    /// 0-based data-row position (header excluded), unique within a run.
    pub index: usize,
    /// Column name → value, in header order.
    pub fields: IndexMap<String, CellValue>,
}

impl Record {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            fields: IndexMap::new(),
        }
    }

    /// Builder-style field insertion, mostly for manual records and tests.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.fields.insert(column.into(), value.into());
        self
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.fields.get(column)
    }
}

/// The loaded contents of one or more sheets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    /// Union of all header names, in first-seen order.
    pub columns: Vec<String>,
    /// Records in source order.
    pub records: Vec<Record>,
}

impl Dataset {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

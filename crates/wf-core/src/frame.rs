//! In-memory tabular data parsed from the source CSV
//!
//! A [`RawFrame`] is the hand-off between the CSV reader and the store: an
//! ordered list of columns (header name verbatim plus inferred type) and the
//! rows in file order.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Column type inferred from the raw text of a CSV column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Boolean,
    BigInt,
    Double,
    Varchar,
}

impl ColumnType {
    /// SQL type name used when creating the raw table
    pub fn sql_type(&self) -> &'static str {
        match self {
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::BigInt => "BIGINT",
            ColumnType::Double => "DOUBLE",
            ColumnType::Varchar => "VARCHAR",
        }
    }

    /// Narrowest type able to hold every non-empty value in `values`.
    ///
    /// Integers win over floats, floats over booleans, anything else is text.
    /// A column with no non-empty values is `Varchar`.
    pub fn infer<'a>(values: impl IntoIterator<Item = &'a str> + Clone) -> ColumnType {
        let mut present = values
            .clone()
            .into_iter()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .peekable();
        if present.peek().is_none() {
            return ColumnType::Varchar;
        }

        let non_empty = || {
            values
                .clone()
                .into_iter()
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        if non_empty().all(|v| v.parse::<i64>().is_ok()) {
            ColumnType::BigInt
        } else if non_empty().all(|v| v.parse::<f64>().is_ok()) {
            ColumnType::Double
        } else if non_empty().all(|v| parse_bool(v).is_some()) {
            ColumnType::Boolean
        } else {
            ColumnType::Varchar
        }
    }

    /// Convert one raw text cell into a value of this type.
    ///
    /// Empty cells become [`CellValue::Null`]. Text columns keep the cell
    /// untrimmed; typed columns trim surrounding whitespace before parsing.
    pub fn parse_cell(&self, raw: &str) -> CellValue {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return CellValue::Null;
        }
        match self {
            ColumnType::BigInt => trimmed
                .parse()
                .map(CellValue::BigInt)
                .unwrap_or_else(|_| CellValue::Text(raw.to_string())),
            ColumnType::Double => trimmed
                .parse()
                .map(CellValue::Double)
                .unwrap_or_else(|_| CellValue::Text(raw.to_string())),
            ColumnType::Boolean => parse_bool(trimmed)
                .map(CellValue::Boolean)
                .unwrap_or_else(|| CellValue::Text(raw.to_string())),
            ColumnType::Varchar => CellValue::Text(raw.to_string()),
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_type())
    }
}

fn parse_bool(v: &str) -> Option<bool> {
    if v.eq_ignore_ascii_case("true") {
        Some(true)
    } else if v.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// A single typed cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Boolean(bool),
    BigInt(i64),
    Double(f64),
    Text(String),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Integer view of the cell, accepting integral doubles and numeric text.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CellValue::BigInt(v) => Some(*v),
            CellValue::Double(v) if v.fract() == 0.0 => Some(*v as i64),
            CellValue::Boolean(b) => Some(i64::from(*b)),
            CellValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => f.write_str("NULL"),
            CellValue::Boolean(b) => write!(f, "{}", b),
            CellValue::BigInt(v) => write!(f, "{}", v),
            CellValue::Double(v) => write!(f, "{}", v),
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

/// A named, typed column of a frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
}

/// Parsed CSV contents ready to be written to the raw table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFrame {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<CellValue>>,
}

impl RawFrame {
    /// Build a frame from a header and untyped text records.
    ///
    /// Column types are inferred over all records. Every record must have
    /// exactly `header.len()` fields; callers enforce that while reading.
    pub fn from_text_records(header: Vec<String>, records: Vec<Vec<String>>) -> Self {
        let columns: Vec<Column> = header
            .into_iter()
            .enumerate()
            .map(|(idx, name)| {
                let column_type =
                    ColumnType::infer(records.iter().map(|r| r[idx].as_str()));
                Column { name, column_type }
            })
            .collect();

        let rows = records
            .iter()
            .map(|record| {
                columns
                    .iter()
                    .zip(record)
                    .map(|(col, raw)| col.column_type.parse_cell(raw))
                    .collect()
            })
            .collect();

        Self { columns, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

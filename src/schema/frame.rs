// src/schema/frame.rs

use serde_json::{Map, Value};

use super::tables::TableRow;
use crate::error::{BulletinError, Result};

/// One exported record: column name → JSON value, in column order.
pub type Record = Map<String, Value>;

/// Column-ordered, untyped view of a table, as handed to the export sinks.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Record>,
}

impl Frame {
    pub fn from_rows<R: TableRow>(name: &str, rows: &[R]) -> Result<Self> {
        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            match serde_json::to_value(row)? {
                Value::Object(map) => records.push(map),
                other => {
                    return Err(BulletinError::Serialization(format!(
                        "row of table {name} serialized to {other}, expected an object"
                    )))
                }
            }
        }
        Ok(Self {
            name: name.to_string(),
            columns: R::COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows: records,
        })
    }

    /// Set `column` to `value` on every row, appending the column if it is new.
    pub fn with_column(mut self, column: &str, value: Value) -> Self {
        if !self.columns.iter().any(|c| c == column) {
            self.columns.push(column.to_string());
        }
        for row in &mut self.rows {
            row.insert(column.to_string(), value.clone());
        }
        self
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

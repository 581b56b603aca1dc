use anyhow::{anyhow, Result};
use serde_json::Value as JsonValue;
use std::collections::BTreeSet;
use std::fmt;

/// Column holding the country of each record
pub const COUNTRY: &str = "Country";
/// Column holding the platform (app) of each record
pub const APP: &str = "App";

/// Trim and lowercase a key value so that "  USA " and "usa" compare equal.
///
/// Every comparison against `Country` or `App` goes through this function.
pub fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// A single cell, typed the way a dataframe library would infer it
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Integer(i64),
    Float(f64),
    Null,
}

impl Value {
    /// Guess the type of a raw CSV field
    pub fn infer(raw: &str) -> Self {
        if raw.is_empty() {
            return Value::Null;
        }
        if let Ok(i) = raw.parse::<i64>() {
            return Value::Integer(i);
        }
        if let Ok(f) = raw.parse::<f64>() {
            return Value::Float(f);
        }
        Value::Text(raw.to_string())
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Float(_))
    }

    /// Text form used for category labels and key comparisons
    pub fn as_label(&self) -> String {
        match self {
            Value::Text(s) => s.clone(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Null => String::new(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "<null>"),
            other => write!(f, "{}", other.as_label()),
        }
    }
}

/// Column-addressable record table.
///
/// Rows always have exactly `headers.len()` cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { headers, rows }
    }

    /// Build a table from raw string cells, inferring each cell's type
    pub fn from_raw(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|row| {
                let mut cells: Vec<Value> = row.iter().map(|s| Value::infer(s)).collect();
                cells.resize(width, Value::Null);
                cells
            })
            .collect();
        Self { headers, rows }
    }

    /// Create a Table from a JSON Array of Objects
    pub fn from_json(value: &JsonValue) -> Result<Self> {
        let array = value
            .as_array()
            .ok_or_else(|| anyhow!("Input data must be a JSON array of objects"))?;

        if array.is_empty() {
            return Ok(Self::default());
        }

        // Headers come from the first object, in file order
        let first_obj = array[0]
            .as_object()
            .ok_or_else(|| anyhow!("Items in array must be objects"))?;

        let headers: Vec<String> = first_obj.keys().cloned().collect();

        let mut rows = Vec::new();
        for item in array {
            let obj = item
                .as_object()
                .ok_or_else(|| anyhow!("Items in array must be objects"))?;

            let mut row = Vec::with_capacity(headers.len());
            for header in &headers {
                let cell = match obj.get(header) {
                    Some(JsonValue::String(s)) => Value::Text(s.clone()),
                    Some(JsonValue::Number(n)) => match n.as_i64() {
                        Some(i) => Value::Integer(i),
                        None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
                    },
                    Some(JsonValue::Bool(b)) => Value::Text(b.to_string()),
                    Some(JsonValue::Null) | None => Value::Null,
                    _ => return Err(anyhow!("Unsupported value type for field '{}'", header)),
                };
                row.push(cell);
            }
            rows.push(row);
        }

        Ok(Self { headers, rows })
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Exact-name column lookup
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Columns whose non-null cells are all numbers.
    ///
    /// A column with no non-null cell is not numeric.
    pub fn numeric_columns(&self) -> Vec<String> {
        self.headers
            .iter()
            .enumerate()
            .filter(|(idx, _)| {
                let mut seen = false;
                for row in &self.rows {
                    match &row[*idx] {
                        Value::Null => {}
                        v if v.is_numeric() => seen = true,
                        _ => return false,
                    }
                }
                seen
            })
            .map(|(_, name)| name.clone())
            .collect()
    }

    /// Sorted distinct labels of a column, nulls skipped
    pub fn unique_labels(&self, column: &str) -> Vec<String> {
        let Some(idx) = self.column_index(column) else {
            return Vec::new();
        };
        let set: BTreeSet<String> = self
            .rows
            .iter()
            .filter(|row| row[idx] != Value::Null)
            .map(|row| row[idx].as_label())
            .collect();
        set.into_iter().collect()
    }

    /// Rewrite the text cells of `column` through [`normalize`]
    pub fn normalize_column(&mut self, column: &str) {
        let Some(idx) = self.column_index(column) else {
            return;
        };
        for row in &mut self.rows {
            if let Value::Text(s) = &row[idx] {
                row[idx] = Value::Text(normalize(s));
            }
        }
    }

    /// New table with the same headers and only the rows accepted by `keep`
    pub fn filter<F>(&self, mut keep: F) -> Table
    where
        F: FnMut(&[Value]) -> bool,
    {
        Table {
            headers: self.headers.clone(),
            rows: self.rows.iter().filter(|r| keep(r.as_slice())).cloned().collect(),
        }
    }

    /// Sum of a column's numeric cells; non-numeric cells count as zero
    pub fn sum(&self, column: &str) -> Option<f64> {
        let idx = self.column_index(column)?;
        Some(self.rows.iter().filter_map(|r| r[idx].as_f64()).sum())
    }
}

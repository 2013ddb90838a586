//! Query result types for dbchat.
//!
//! Defines the structures used to represent query results from the database
//! and their rendering as observation text for the agent.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Maximum number of rows kept from a single query.
pub const MAX_ROWS: usize = 1000;

/// Represents the result of executing a SQL query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryResult {
    /// Column metadata for the result set.
    pub columns: Vec<ColumnInfo>,

    /// Rows of data.
    pub rows: Vec<Row>,

    /// Time taken to execute the query.
    #[serde(skip)]
    pub execution_time: Duration,

    /// Whether rows beyond `MAX_ROWS` were dropped.
    #[serde(default)]
    pub was_truncated: bool,
}

impl QueryResult {
    /// Creates a new empty query result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a query result with the given columns and rows.
    pub fn with_data(columns: Vec<ColumnInfo>, rows: Vec<Row>) -> Self {
        Self {
            columns,
            rows,
            ..Self::default()
        }
    }

    /// Sets the execution time.
    pub fn with_execution_time(mut self, duration: Duration) -> Self {
        self.execution_time = duration;
        self
    }

    /// Number of rows in the result.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the result set is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Renders the rows as a list of tuples, e.g. `[('Krish', 90), ('John', 86)]`.
    ///
    /// An empty result renders as an empty string.
    pub fn format_as_tuples(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }

        let tuples = self
            .rows
            .iter()
            .map(|row| {
                let values = row.iter().map(Value::to_literal).collect::<Vec<_>>();
                if values.len() == 1 {
                    format!("({},)", values[0])
                } else {
                    format!("({})", values.join(", "))
                }
            })
            .collect::<Vec<_>>();

        format!("[{}]", tuples.join(", "))
    }

    /// Renders the rows as tab-separated lines under a header line.
    pub fn format_as_tsv(&self) -> String {
        let header = self
            .columns
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join("\t");
        let body = self
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(Value::to_display_string)
                    .collect::<Vec<_>>()
                    .join("\t")
            })
            .collect::<Vec<_>>();

        std::iter::once(header)
            .chain(body)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Metadata about a column in a result set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Column name.
    pub name: String,

    /// Column data type as reported by the driver.
    pub data_type: String,
}

impl ColumnInfo {
    /// Creates a new column info with the given name and type.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

/// A row of data from a query result.
pub type Row = Vec<Value>;

/// Represents a single value from a database query.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub enum Value {
    /// NULL value.
    #[default]
    Null,

    /// Boolean value.
    Bool(bool),

    /// Signed integer (up to i64).
    Int(i64),

    /// Floating point number.
    Float(f64),

    /// Text/string value.
    String(String),

    /// Binary data.
    Bytes(Vec<u8>),
}

impl Value {
    /// Returns true if this value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Converts the value to its plain display form.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::String(s) => s.clone(),
            Value::Bytes(b) => format!("<{} bytes>", b.len()),
        }
    }

    /// Converts the value to a literal as it appears inside a tuple: strings
    /// are single-quoted with embedded quotes escaped.
    pub fn to_literal(&self) -> String {
        match self {
            Value::String(s) => format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'")),
            other => other.to_display_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_display_string())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn students() -> QueryResult {
        QueryResult::with_data(
            vec![ColumnInfo::new("NAME", "TEXT"), ColumnInfo::new("MARKS", "INTEGER")],
            vec![
                vec![Value::from("Krish"), Value::Int(90)],
                vec![Value::from("O'Neil"), Value::Null],
            ],
        )
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Null.to_display_string(), "NULL");
        assert_eq!(Value::Bool(true).to_display_string(), "true");
        assert_eq!(Value::Int(42).to_display_string(), "42");
        assert_eq!(Value::Float(2.5).to_display_string(), "2.5");
        assert_eq!(Value::from("hello").to_display_string(), "hello");
        assert_eq!(Value::Bytes(vec![1, 2, 3]).to_display_string(), "<3 bytes>");
    }

    #[test]
    fn test_value_from_option() {
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some(7i64)), Value::Int(7));
    }

    #[test]
    fn test_format_as_tuples() {
        assert_eq!(
            students().format_as_tuples(),
            "[('Krish', 90), ('O\\'Neil', NULL)]"
        );
    }

    #[test]
    fn test_single_column_tuples_have_trailing_comma() {
        let result = QueryResult::with_data(
            vec![ColumnInfo::new("COUNT(*)", "INTEGER")],
            vec![vec![Value::Int(5)]],
        );
        assert_eq!(result.format_as_tuples(), "[(5,)]");
    }

    #[test]
    fn test_empty_result_formats_as_empty_string() {
        assert_eq!(QueryResult::new().format_as_tuples(), "");
        assert!(QueryResult::new().is_empty());
    }

    #[test]
    fn test_format_as_tsv() {
        assert_eq!(
            students().format_as_tsv(),
            "NAME\tMARKS\nKrish\t90\nO'Neil\tNULL"
        );
        assert_eq!(students().row_count(), 2);
    }
}

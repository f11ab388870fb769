//! Query input and tabular result models.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

/// Where the SQL for a query comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuerySource {
    Text(String),
    File(PathBuf),
}

/// Warehouse column type, as reported by the driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Fixed { scale: i64 },
    Real,
    Text,
    Boolean,
    Date,
    Time,
    TimestampNtz,
    TimestampLtz,
    TimestampTz,
    Other(String),
}

impl ColumnType {
    /// Map a SQL API `rowType.type` name.
    pub fn from_api(name: &str, scale: Option<i64>) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "fixed" => Self::Fixed {
                scale: scale.unwrap_or(0),
            },
            "real" => Self::Real,
            "text" => Self::Text,
            "boolean" => Self::Boolean,
            "date" => Self::Date,
            "time" => Self::Time,
            "timestamp_ntz" => Self::TimestampNtz,
            "timestamp_ltz" => Self::TimestampLtz,
            "timestamp_tz" => Self::TimestampTz,
            other => Self::Other(other.to_string()),
        }
    }

    /// Date and timestamp types. `TIME` carries no calendar date.
    pub const fn is_datetime(&self) -> bool {
        matches!(
            self,
            Self::Date | Self::TimestampNtz | Self::TimestampLtz | Self::TimestampTz
        )
    }
}

/// One column of a raw driver result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawColumn {
    pub name: String,
    pub column_type: ColumnType,
}

/// Result set exactly as the driver returned it: warehouse column names and
/// wire-format cell strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawResultSet {
    pub columns: Vec<RawColumn>,
    pub rows: Vec<Vec<Option<String>>>,
}

/// Normalized tabular result exposed to callers.
///
/// Column names are lower-cased; datetime cells are strings in either
/// `YYYY-MM-DD` or `YYYY-MM-DD HH:MM:SS` form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl QueryResult {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Iterate one column's cells, in row order.
    pub fn column<'a>(&'a self, name: &str) -> Option<impl Iterator<Item = &'a Value> + 'a> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| row.get(idx).unwrap_or(&Value::Null)))
    }
}

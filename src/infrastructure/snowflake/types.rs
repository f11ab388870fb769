//! Wire types for the Snowflake SQL API v2.

use serde::{Deserialize, Serialize};

use crate::domain::models::{ColumnType, RawColumn};

/// Body of `POST /api/v2/statements`
#[derive(Debug, Clone, Serialize)]
pub struct StatementRequest<'a> {
    pub statement: &'a str,
    pub warehouse: &'a str,
    pub database: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<&'a str>,
    /// Server-side timeout in seconds
    pub timeout: u64,
}

/// First-partition response (200) or query status (202 / errors).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementResponse {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub statement_handle: Option<String>,
    #[serde(default)]
    pub result_set_meta_data: Option<ResultSetMetaData>,
    #[serde(default)]
    pub data: Vec<Vec<Option<String>>>,
}

/// Response for `GET /api/v2/statements/{handle}?partition=n`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PartitionResponse {
    #[serde(default)]
    pub data: Vec<Vec<Option<String>>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSetMetaData {
    #[serde(default)]
    pub num_rows: Option<u64>,
    #[serde(default)]
    pub row_type: Vec<RowType>,
    #[serde(default)]
    pub partition_info: Vec<PartitionInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RowType {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub scale: Option<i64>,
}

impl From<&RowType> for RawColumn {
    fn from(row_type: &RowType) -> Self {
        Self {
            name: row_type.name.clone(),
            column_type: ColumnType::from_api(&row_type.type_name, row_type.scale),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitionInfo {
    #[serde(default)]
    pub row_count: u64,
}

//! Request and result models for the query and update operations.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// One result row: column name mapped to the string-normalized cell value.
///
/// Key order equals the statement's column order (`serde_json` is built
/// with `preserve_order`). SQL NULL cells are JSON null.
pub type Row = serde_json::Map<String, JsonValue>;

/// Ordered rows produced by a read query.
///
/// Serializes as a JSON array of row objects, one per result row.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct RowSet {
    pub rows: Vec<Row>,
}

impl RowSet {
    /// Get the number of rows in the result.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Check if the result is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl From<Vec<Row>> for RowSet {
    fn from(rows: Vec<Row>) -> Self {
        Self { rows }
    }
}

/// Outcome of a write operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationOutcome {
    /// Operation name, e.g. "update".
    pub operation: String,
    pub success: bool,
    /// Human-readable summary; reports the affected-row count on success.
    pub message: String,
}

impl OperationOutcome {
    /// Create a successful outcome.
    pub fn succeeded(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            success: true,
            message: message.into(),
        }
    }
}

/// Input for the query operation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    /// Logical connection name (pool key).
    pub connection_name: String,
    /// SQL text to execute as a read statement.
    pub query: String,
}

impl QueryRequest {
    pub fn new(connection_name: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            connection_name: connection_name.into(),
            query: query.into(),
        }
    }
}

/// Input for the update operation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest {
    /// Logical connection name (pool key).
    pub connection_name: String,
    /// UPDATE statement with positional `?` placeholders.
    pub update_query: String,
    /// JSON object of column name to value, as raw text.
    pub payload: String,
}

impl UpdateRequest {
    pub fn new(
        connection_name: impl Into<String>,
        update_query: impl Into<String>,
        payload: impl Into<String>,
    ) -> Self {
        Self {
            connection_name: connection_name.into(),
            update_query: update_query.into(),
            payload: payload.into(),
        }
    }
}

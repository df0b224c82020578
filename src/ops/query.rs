//! Query operation.
//!
//! Executes a read statement against a named connection and returns the
//! rows as an ordered sequence of string-normalized objects.

use crate::db::{ConnectionHandler, run_query};
use crate::error::{OperationError, OperationResult};
use crate::models::{QueryRequest, RowSet};
use crate::ops::CONNECTOR_NAME;
use std::sync::Arc;
use tracing::{info, warn};

/// Handler for the query operation.
pub struct QueryOperation {
    handler: Arc<ConnectionHandler>,
}

impl QueryOperation {
    pub fn new(handler: Arc<ConnectionHandler>) -> Self {
        Self { handler }
    }

    /// Run a read statement on the named connection.
    ///
    /// The borrowed connection is returned to the pool on every exit path:
    /// success, operation error, or validation error.
    pub async fn run(&self, request: QueryRequest) -> OperationResult<RowSet> {
        if request.connection_name.trim().is_empty() {
            return Err(OperationError::invalid_configuration(
                "Connection name is not provided.",
            ));
        }

        let mut guard = self
            .handler
            .borrow(CONNECTOR_NAME, &request.connection_name)
            .await?;
        let result = run_query(&mut guard, &request.query).await;

        match &result {
            Ok(set) => info!(
                connection = %request.connection_name,
                row_count = set.row_count(),
                "Query operation complete"
            ),
            Err(e) => warn!(
                connection = %request.connection_name,
                error = %e,
                "Query operation failed"
            ),
        }
        result
    }
}

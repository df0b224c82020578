//! Update operation.
//!
//! Executes a write statement against a named connection, binding
//! positional parameters from a JSON payload, and reports the affected-row
//! count.

use crate::db::{ConnectionHandler, run_update};
use crate::error::{OperationError, OperationResult};
use crate::models::{OperationOutcome, UpdateRequest};
use crate::ops::CONNECTOR_NAME;
use std::sync::Arc;
use tracing::{info, warn};

/// Handler for the update operation.
pub struct UpdateOperation {
    handler: Arc<ConnectionHandler>,
}

impl UpdateOperation {
    pub fn new(handler: Arc<ConnectionHandler>) -> Self {
        Self { handler }
    }

    /// Run a write statement on the named connection.
    ///
    /// The borrowed connection is returned to the pool on every exit path:
    /// success, operation error, or validation error.
    pub async fn run(&self, request: UpdateRequest) -> OperationResult<OperationOutcome> {
        if request.connection_name.trim().is_empty() {
            return Err(OperationError::invalid_configuration(
                "Connection name is not provided.",
            ));
        }

        let mut guard = self
            .handler
            .borrow(CONNECTOR_NAME, &request.connection_name)
            .await?;
        let result = run_update(&mut guard, &request.update_query, &request.payload).await;

        match &result {
            Ok(outcome) => info!(
                connection = %request.connection_name,
                message = %outcome.message,
                "Update operation complete"
            ),
            Err(e) => warn!(
                connection = %request.connection_name,
                error = %e,
                "Update operation failed"
            ),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConnectionSettings;
    use crate::error::ErrorKind;

    async fn setup() -> (Arc<ConnectionHandler>, UpdateOperation) {
        let handler = Arc::new(ConnectionHandler::new());
        let settings = ConnectionSettings::new("mem", "sqlite::memory:").unwrap();
        handler.register(CONNECTOR_NAME, settings).await;
        let op = UpdateOperation::new(handler.clone());
        (handler, op)
    }

    #[tokio::test]
    async fn empty_update_query_is_invalid_configuration() {
        let (handler, op) = setup().await;
        let err = op
            .run(UpdateRequest::new("mem", "", r#"{"a":"1"}"#))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
        assert_eq!(handler.idle_count(CONNECTOR_NAME, "mem").await, 1);
    }

    #[tokio::test]
    async fn empty_payload_is_invalid_configuration() {
        let (handler, op) = setup().await;
        let err = op
            .run(UpdateRequest::new("mem", "UPDATE t SET a=? WHERE b=?", ""))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
        assert_eq!(handler.idle_count(CONNECTOR_NAME, "mem").await, 1);
    }

    #[tokio::test]
    async fn failed_update_is_operation_error_and_releases() {
        let (handler, op) = setup().await;
        let err = op
            .run(UpdateRequest::new(
                "mem",
                "UPDATE missing_table SET a=? WHERE b=?",
                r#"{"a":"1","b":"2"}"#,
            ))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Operation);
        assert_eq!(handler.idle_count(CONNECTOR_NAME, "mem").await, 1);
    }
}

//! Error types for the sqlgate facade.
//!
//! All fallible operations resolve to one of three kinds: the caller sent
//! unusable input (`InvalidConfiguration`), the backend rejected or failed
//! the statement (`Operation`), or a live connection could not be obtained
//! (`Connection`). The boundary layer converts any of them into an
//! [`ErrorRecord`] carrying a stable code/message pair.

use serde::Serialize;
use thiserror::Error;

/// Stable error codes reported to the host, one per error kind.
pub const CODE_INVALID_CONFIGURATION: &str = "700701";
pub const CODE_OPERATION_ERROR: &str = "700702";
pub const CODE_CONNECTION_ERROR: &str = "700703";

#[derive(Error, Debug)]
pub enum OperationError {
    /// Missing or empty required input. Re-sending the same input will not
    /// succeed; this is a caller bug, not a backend condition.
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    /// The backend rejected or failed the statement.
    #[error("Operation failed: {message}")]
    Operation {
        message: String,
        #[source]
        source: Option<sqlx::Error>,
    },

    /// A live connection could not be obtained or validated.
    #[error("Connection failed: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<sqlx::Error>,
    },
}

impl OperationError {
    /// Create an invalid-configuration error.
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            message: message.into(),
        }
    }

    /// Create an operation error without an underlying driver cause.
    pub fn operation(message: impl Into<String>) -> Self {
        Self::Operation {
            message: message.into(),
            source: None,
        }
    }

    /// Create an operation error wrapping a driver error.
    pub fn operation_with(message: impl Into<String>, source: sqlx::Error) -> Self {
        Self::Operation {
            message: message.into(),
            source: Some(source),
        }
    }

    /// Create a connection error without an underlying driver cause.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            source: None,
        }
    }

    /// Create a connection error wrapping a driver error.
    pub fn connection_with(message: impl Into<String>, source: sqlx::Error) -> Self {
        Self::Connection {
            message: message.into(),
            source: Some(source),
        }
    }

    /// The kind tag for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidConfiguration { .. } => ErrorKind::InvalidConfiguration,
            Self::Operation { .. } => ErrorKind::Operation,
            Self::Connection { .. } => ErrorKind::Connection,
        }
    }

    /// Whether retrying the whole operation (new borrow, new execution) can
    /// plausibly succeed. Invalid input never recovers by resending.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }
}

/// Discriminant for [`OperationError`], used by callers that match on kind
/// rather than destructuring variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    InvalidConfiguration,
    Operation,
    Connection,
}

impl ErrorKind {
    /// The stable code the boundary layer reports for this kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfiguration => CODE_INVALID_CONFIGURATION,
            Self::Operation => CODE_OPERATION_ERROR,
            Self::Connection => CODE_CONNECTION_ERROR,
        }
    }
}

/// Caller-visible error payload: code/kind/message, ready for the host to
/// record into its output context.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorRecord {
    pub code: &'static str,
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&OperationError> for ErrorRecord {
    fn from(err: &OperationError) -> Self {
        Self {
            code: err.kind().code(),
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Convert driver errors raised while opening or probing a session.
///
/// Statement execution maps driver errors itself (always to `Operation`);
/// this impl covers the connection-establishment paths.
impl From<sqlx::Error> for OperationError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Configuration(msg) => {
                let message = format!("Invalid connection configuration: {msg}");
                OperationError::connection_with(message, err)
            }
            sqlx::Error::Io(io_err) => {
                let message = format!("I/O error while connecting: {io_err}");
                OperationError::connection_with(message, err)
            }
            sqlx::Error::Tls(tls_err) => {
                let message = format!("TLS error while connecting: {tls_err}");
                OperationError::connection_with(message, err)
            }
            sqlx::Error::Protocol(msg) => {
                let message = format!("Protocol error: {msg}");
                OperationError::connection_with(message, err)
            }
            sqlx::Error::Database(db_err) => {
                let message = db_err.message().to_string();
                OperationError::connection_with(message, err)
            }
            _ => OperationError::connection_with(err.to_string(), err),
        }
    }
}

/// Result type alias for facade operations.
pub type OperationResult<T> = Result<T, OperationError>;

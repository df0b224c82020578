//! sqlgate
//!
//! Managed-connection query/update facade over remote SQL backends.
//! Callers supply a logical connection name plus SQL text (and, for
//! updates, a JSON payload of column values); the facade executes the
//! statement and returns structured results.
//!
//! The host mediation layer registers connection settings once, then
//! dispatches into [`ops::QueryOperation`] and [`ops::UpdateOperation`].
//! Errors carry one of three kinds (invalid configuration, operation
//! failure, connection failure) and convert to an [`error::ErrorRecord`]
//! code/message pair at the boundary.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod ops;

pub use config::ConnectionSettings;
pub use db::ConnectionHandler;
pub use error::{ErrorRecord, OperationError};
pub use ops::{QueryOperation, UpdateOperation};

//! Database access layer.
//!
//! This module provides the connection lifecycle and statement execution
//! core:
//! - Named connection pooling with borrow/return/evict semantics
//! - Single-session connections with liveness validation
//! - Query and update execution with string-normalized results
//! - Bound-column discovery for positional update parameters

pub mod columns;
pub mod connection;
pub mod executor;
pub mod handler;
pub mod types;

pub use columns::extract_bound_columns;
pub use connection::Connection;
pub use executor::{run_query, run_update};
pub use handler::{ConnectionGuard, ConnectionHandler};

//! Data models for the sqlgate facade.
//!
//! This module re-exports all model types used throughout the crate.

pub mod backend;
pub mod result;

pub use backend::BackendKind;
pub use result::{OperationOutcome, QueryRequest, Row, RowSet, UpdateRequest};

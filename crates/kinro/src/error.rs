//! Error types for Kinro operations.
//!
//! This module provides the main error type [`KinroError`] which wraps
//! the failures a store operation, a reload, or an export can produce.

use std::io;

use thiserror::Error;

use kinro_core::{identifier::Id, validation::ValidationError};

use crate::remote::RemoteError;

/// The main error type for Kinro operations.
///
/// Variants raised before any request is issued (`Validation`,
/// `DuplicateConnection`, `NodeNotFound`, `NoPendingConnection`) guarantee
/// that the backend was not contacted. `Remote` and `Reload` guarantee that
/// the view was left as it was before the operation.
#[derive(Debug, Error)]
pub enum KinroError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("A connection from `{from}` to `{to}` already exists")]
    DuplicateConnection { from: Id, to: Id },

    #[error("No class `{0}` in the diagram")]
    NodeNotFound(Id),

    #[error("No connection is waiting for a relationship type")]
    NoPendingConnection,

    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Reload failed: {0}")]
    Reload(RemoteError),

    #[error("Export error: {0}")]
    Export(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

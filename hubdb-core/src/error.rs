//! Error types for HubDB
//!
//! This module defines the error types surfaced by HubDB stores.

use thiserror::Error;

/// The main error type for HubDB store operations
#[derive(Error, Debug)]
pub enum Error {
    /// The request was malformed: a message of the wrong type for the
    /// store, an invalid identifier, or a validation failure
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The requested message was not found
    #[error("not found")]
    NotFound,

    /// The underlying key-value engine returned an error
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// Data corruption was detected
    #[error("corruption detected: {0}")]
    Corruption(String),

    /// A serialization/deserialization error occurred
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// A specialized Result type for HubDB operations
pub type Result<T> = std::result::Result<T, Error>;

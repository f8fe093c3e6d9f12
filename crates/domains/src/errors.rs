//! # DomainError
//!
//! Failures reported by port implementations (stores, caches, repositories).
//! A lookup that simply finds nothing is not an error; ports return `Option`.

use thiserror::Error;

/// The error type shared by every port trait.
#[derive(Error, Debug)]
pub enum DomainError {
    /// Resource not found (e.g. board, user)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Input rejected before reaching storage
    #[error("validation error: {0}")]
    Validation(String),

    /// A cached or stored value could not be (de)serialized
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Infrastructure failure (e.g. DB down, cache unreachable)
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// A specialized Result type for port operations.
pub type Result<T> = std::result::Result<T, DomainError>;

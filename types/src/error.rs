//! Validation errors for the core types.

use thiserror::Error;

/// Error raised when parsing a core type from untrusted input.
#[derive(Debug, Error)]
pub enum TypeError {
    #[error("invalid wallet address: {0}")]
    InvalidAddress(String),

    #[error("invalid transaction id: {0}")]
    InvalidTxId(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("identity key must not be empty")]
    InvalidIdentity,
}

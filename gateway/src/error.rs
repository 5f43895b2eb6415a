//! Errors for the outbound seams.

use thiserror::Error;

/// Failures talking to the on-chain ledger.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The ledger answered with a non-success HTTP status.
    #[error("ledger returned HTTP {status}: {url}")]
    Http { status: u16, url: String },

    /// Transport-level failure (connect, timeout, TLS).
    #[error("ledger unreachable: {0}")]
    Network(String),

    /// The ledger answered but the body did not parse.
    #[error("ledger response malformed: {0}")]
    Decode(String),
}

impl GatewayError {
    /// True when a retry could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            GatewayError::Network(_) => true,
            GatewayError::Http { status, .. } => *status >= 500,
            GatewayError::Decode(_) => false,
        }
    }
}

/// Failures applying role changes or notifications downstream.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("authorization sink rejected the operation: {0}")]
    Rejected(String),

    #[error("authorization sink unavailable: {0}")]
    Unavailable(String),
}

//! Errors for aggregation and scheduling.

use thiserror::Error;

use siglink_gateway::GatewayError;
use siglink_store::StoreError;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A balance lookup failed after retries. The identity's cycle is
    /// abandoned with no partial writes.
    #[error("ledger fault during aggregation: {0}")]
    Gateway(#[from] GatewayError),

    #[error("portfolio sum overflowed")]
    Overflow,
}

//! Errors for issuance and pipeline plumbing.

use thiserror::Error;

use siglink_store::StoreError;
use siglink_types::{IdentityId, WalletAddress};

#[derive(Debug, Error)]
pub enum ChallengeError {
    /// The address is already verified property of another identity.
    #[error("address {} is verified by another identity", address.short())]
    AddressOwned {
        address: WalletAddress,
        owner: IdentityId,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Infrastructure failure inside the pipeline, distinct from a semantic
/// rejection. The notifier redelivers, so these surface as errors rather
/// than outcomes.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

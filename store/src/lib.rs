//! Abstract storage traits for the siglink service.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits. The rest of the codebase depends only on the traits.

pub mod challenge;
pub mod error;
pub mod memory;
pub mod portfolio;
pub mod processed;
pub mod threshold;
pub mod wallet;

pub use challenge::{ChallengeRecord, ChallengeStore};
pub use error::StoreError;
pub use memory::MemoryStore;
pub use portfolio::{PortfolioRecord, PortfolioStore};
pub use processed::ProcessedTxStore;
pub use threshold::{RoleThreshold, ThresholdStore};
pub use wallet::{WalletRecord, WalletStore};

use siglink_types::{IdentityId, Timestamp, WalletAddress};

/// The full storage surface the service runs against.
///
/// Besides the per-family traits, a backend must provide the one multi-store
/// operation that has to be atomic: committing a verification. A crash can
/// never leave a verified wallet with an unconsumed challenge.
pub trait Store:
    WalletStore + ChallengeStore + ProcessedTxStore + PortfolioStore + ThresholdStore + Send + Sync
{
    /// Atomically: upsert the wallet as verified and owned by `identity`,
    /// ensure a portfolio row exists for the identity, and delete every
    /// challenge for the address.
    fn commit_verification(
        &self,
        address: &WalletAddress,
        identity: &IdentityId,
        now: Timestamp,
    ) -> Result<(), StoreError>;
}

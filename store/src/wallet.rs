//! Wallet ledger storage trait.

use serde::{Deserialize, Serialize};
use siglink_types::{IdentityId, Timestamp, WalletAddress};

use crate::StoreError;

/// The durable record of a wallet claim.
///
/// `address` is the primary key; exactly one owner at a time. A wallet may
/// exist unverified (claimed but unproven) before becoming verified.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletRecord {
    pub address: WalletAddress,
    pub owner: IdentityId,
    pub verified: bool,
    pub verified_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl WalletRecord {
    /// A fresh unverified claim.
    pub fn claimed(address: WalletAddress, owner: IdentityId, now: Timestamp) -> Self {
        Self {
            address,
            owner,
            verified: false,
            verified_at: None,
            created_at: now,
        }
    }
}

/// Trait for wallet ledger operations.
pub trait WalletStore {
    fn get_wallet(&self, address: &WalletAddress) -> Result<Option<WalletRecord>, StoreError>;
    fn put_wallet(&self, record: &WalletRecord) -> Result<(), StoreError>;
    /// Delete a wallet row. Returns whether a row existed.
    fn delete_wallet(&self, address: &WalletAddress) -> Result<bool, StoreError>;
    /// All *verified* wallets owned by the identity.
    fn verified_wallets_for(&self, identity: &IdentityId)
        -> Result<Vec<WalletRecord>, StoreError>;
    /// Distinct identities owning at least one verified wallet.
    fn verified_identities(&self) -> Result<Vec<IdentityId>, StoreError>;
    fn iter_wallets(&self) -> Result<Vec<WalletRecord>, StoreError>;
    /// Delete unverified wallets created before `cutoff`. Returns the count.
    fn sweep_stale_unverified(&self, cutoff: Timestamp) -> Result<u64, StoreError>;

    fn verified_wallet_count(&self) -> Result<u64, StoreError> {
        Ok(self
            .iter_wallets()?
            .into_iter()
            .filter(|w| w.verified)
            .count() as u64)
    }
}

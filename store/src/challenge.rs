//! Challenge row storage trait.

use serde::{Deserialize, Serialize};
use siglink_types::{IdentityId, SignalCode, Timestamp, WalletAddress};

use crate::StoreError;

/// A one-time verification code bound to an (identity, wallet) pair.
///
/// The composite `(address, identity)` pair is the row's identity; at most
/// one live challenge per pair is meaningful.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeRecord {
    pub identity: IdentityId,
    pub address: WalletAddress,
    pub code: SignalCode,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
}

impl ChallengeRecord {
    /// Whether this challenge is still live at `now` (`expires_at > now`).
    pub fn is_live(&self, now: Timestamp) -> bool {
        !self.expires_at.is_past(now)
    }
}

/// Trait for challenge row operations.
pub trait ChallengeStore {
    /// Insert or overwrite the row for `(address, identity)`.
    fn put_challenge(&self, record: &ChallengeRecord) -> Result<(), StoreError>;
    /// The row for `(address, identity)`, live or not.
    fn challenge_for(
        &self,
        identity: &IdentityId,
        address: &WalletAddress,
    ) -> Result<Option<ChallengeRecord>, StoreError>;
    /// The unique live challenge matching `(address, code)`, if any.
    ///
    /// Must be a single atomic read relative to concurrent expiry sweeps.
    fn find_live(
        &self,
        address: &WalletAddress,
        code: SignalCode,
        now: Timestamp,
    ) -> Result<Option<ChallengeRecord>, StoreError>;
    /// Delete every challenge for the address (batch-wide, deliberate).
    /// Returns the count removed.
    fn delete_challenges(&self, address: &WalletAddress) -> Result<u64, StoreError>;
    /// Delete every challenge with `expires_at <= now`. Returns the count.
    fn sweep_expired(&self, now: Timestamp) -> Result<u64, StoreError>;
    /// Number of challenge rows for the address.
    fn challenge_count(&self, address: &WalletAddress) -> Result<u64, StoreError>;
    /// Number of live challenges across all addresses.
    fn live_challenge_count(&self, now: Timestamp) -> Result<u64, StoreError>;
    /// Most recently created challenge for the address regardless of owner,
    /// used by the administrative override to resolve a claimant.
    fn latest_challenge(
        &self,
        address: &WalletAddress,
    ) -> Result<Option<ChallengeRecord>, StoreError>;
}

//! In-memory storage backend.
//!
//! Used by tests and by dev mode. Every operation takes the single inner
//! lock, so multi-step operations (`insert_processed`,
//! `commit_verification`) are atomic with respect to each other.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use siglink_types::{IdentityId, SignalCode, Timestamp, TxId, WalletAddress};

use crate::challenge::{ChallengeRecord, ChallengeStore};
use crate::portfolio::{PortfolioRecord, PortfolioStore};
use crate::processed::ProcessedTxStore;
use crate::threshold::{sort_ladder, RoleThreshold, ThresholdStore};
use crate::wallet::{WalletRecord, WalletStore};
use crate::{Store, StoreError};
use siglink_types::{Amount, RoleId};

#[derive(Default)]
struct Inner {
    wallets: BTreeMap<WalletAddress, WalletRecord>,
    challenges: BTreeMap<(WalletAddress, IdentityId), ChallengeRecord>,
    processed: BTreeSet<TxId>,
    portfolios: BTreeMap<IdentityId, PortfolioRecord>,
    thresholds: BTreeMap<RoleId, RoleThreshold>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Backend("store lock poisoned".into()))
    }
}

impl WalletStore for MemoryStore {
    fn get_wallet(&self, address: &WalletAddress) -> Result<Option<WalletRecord>, StoreError> {
        Ok(self.lock()?.wallets.get(address).cloned())
    }

    fn put_wallet(&self, record: &WalletRecord) -> Result<(), StoreError> {
        self.lock()?
            .wallets
            .insert(record.address.clone(), record.clone());
        Ok(())
    }

    fn delete_wallet(&self, address: &WalletAddress) -> Result<bool, StoreError> {
        Ok(self.lock()?.wallets.remove(address).is_some())
    }

    fn verified_wallets_for(
        &self,
        identity: &IdentityId,
    ) -> Result<Vec<WalletRecord>, StoreError> {
        Ok(self
            .lock()?
            .wallets
            .values()
            .filter(|w| w.verified && &w.owner == identity)
            .cloned()
            .collect())
    }

    fn verified_identities(&self) -> Result<Vec<IdentityId>, StoreError> {
        let guard = self.lock()?;
        let mut seen = BTreeSet::new();
        for w in guard.wallets.values() {
            if w.verified {
                seen.insert(w.owner.clone());
            }
        }
        Ok(seen.into_iter().collect())
    }

    fn iter_wallets(&self) -> Result<Vec<WalletRecord>, StoreError> {
        Ok(self.lock()?.wallets.values().cloned().collect())
    }

    fn sweep_stale_unverified(&self, cutoff: Timestamp) -> Result<u64, StoreError> {
        let mut guard = self.lock()?;
        let before = guard.wallets.len();
        guard
            .wallets
            .retain(|_, w| w.verified || !w.created_at.is_past(cutoff));
        Ok((before - guard.wallets.len()) as u64)
    }
}

impl ChallengeStore for MemoryStore {
    fn put_challenge(&self, record: &ChallengeRecord) -> Result<(), StoreError> {
        let key = (record.address.clone(), record.identity.clone());
        self.lock()?.challenges.insert(key, record.clone());
        Ok(())
    }

    fn challenge_for(
        &self,
        identity: &IdentityId,
        address: &WalletAddress,
    ) -> Result<Option<ChallengeRecord>, StoreError> {
        let key = (address.clone(), identity.clone());
        Ok(self.lock()?.challenges.get(&key).cloned())
    }

    fn find_live(
        &self,
        address: &WalletAddress,
        code: SignalCode,
        now: Timestamp,
    ) -> Result<Option<ChallengeRecord>, StoreError> {
        Ok(self
            .lock()?
            .challenges
            .values()
            .find(|c| c.address == *address && c.code == code && c.is_live(now))
            .cloned())
    }

    fn delete_challenges(&self, address: &WalletAddress) -> Result<u64, StoreError> {
        let mut guard = self.lock()?;
        let before = guard.challenges.len();
        guard.challenges.retain(|(addr, _), _| addr != address);
        Ok((before - guard.challenges.len()) as u64)
    }

    fn sweep_expired(&self, now: Timestamp) -> Result<u64, StoreError> {
        let mut guard = self.lock()?;
        let before = guard.challenges.len();
        guard.challenges.retain(|_, c| c.is_live(now));
        Ok((before - guard.challenges.len()) as u64)
    }

    fn challenge_count(&self, address: &WalletAddress) -> Result<u64, StoreError> {
        Ok(self
            .lock()?
            .challenges
            .keys()
            .filter(|(addr, _)| addr == address)
            .count() as u64)
    }

    fn live_challenge_count(&self, now: Timestamp) -> Result<u64, StoreError> {
        Ok(self
            .lock()?
            .challenges
            .values()
            .filter(|c| c.is_live(now))
            .count() as u64)
    }

    fn latest_challenge(
        &self,
        address: &WalletAddress,
    ) -> Result<Option<ChallengeRecord>, StoreError> {
        Ok(self
            .lock()?
            .challenges
            .values()
            .filter(|c| c.address == *address)
            .max_by_key(|c| c.created_at)
            .cloned())
    }
}

impl ProcessedTxStore for MemoryStore {
    fn insert_processed(&self, tx_id: &TxId) -> Result<bool, StoreError> {
        Ok(self.lock()?.processed.insert(tx_id.clone()))
    }

    fn is_processed(&self, tx_id: &TxId) -> Result<bool, StoreError> {
        Ok(self.lock()?.processed.contains(tx_id))
    }

    fn processed_count(&self) -> Result<u64, StoreError> {
        Ok(self.lock()?.processed.len() as u64)
    }
}

impl PortfolioStore for MemoryStore {
    fn get_portfolio(
        &self,
        identity: &IdentityId,
    ) -> Result<Option<PortfolioRecord>, StoreError> {
        Ok(self.lock()?.portfolios.get(identity).cloned())
    }

    fn put_portfolio(&self, record: &PortfolioRecord) -> Result<(), StoreError> {
        self.lock()?
            .portfolios
            .insert(record.identity.clone(), record.clone());
        Ok(())
    }

    fn iter_portfolios(&self) -> Result<Vec<PortfolioRecord>, StoreError> {
        Ok(self.lock()?.portfolios.values().cloned().collect())
    }
}

impl ThresholdStore for MemoryStore {
    fn put_threshold(&self, record: &RoleThreshold) -> Result<(), StoreError> {
        self.lock()?
            .thresholds
            .insert(record.role_id.clone(), record.clone());
        Ok(())
    }

    fn get_threshold(&self, role_id: &RoleId) -> Result<Option<RoleThreshold>, StoreError> {
        Ok(self.lock()?.thresholds.get(role_id).cloned())
    }

    fn delete_threshold(&self, role_id: &RoleId) -> Result<bool, StoreError> {
        Ok(self.lock()?.thresholds.remove(role_id).is_some())
    }

    fn thresholds_desc(&self) -> Result<Vec<RoleThreshold>, StoreError> {
        let mut ladder: Vec<_> = self.lock()?.thresholds.values().cloned().collect();
        sort_ladder(&mut ladder);
        Ok(ladder)
    }
}

impl Store for MemoryStore {
    fn commit_verification(
        &self,
        address: &WalletAddress,
        identity: &IdentityId,
        now: Timestamp,
    ) -> Result<(), StoreError> {
        let mut guard = self.lock()?;

        let record = match guard.wallets.get(address) {
            Some(existing) => WalletRecord {
                address: address.clone(),
                owner: identity.clone(),
                verified: true,
                verified_at: Some(now),
                created_at: existing.created_at,
            },
            None => WalletRecord {
                address: address.clone(),
                owner: identity.clone(),
                verified: true,
                verified_at: Some(now),
                created_at: now,
            },
        };
        guard.wallets.insert(address.clone(), record);

        guard
            .portfolios
            .entry(identity.clone())
            .or_insert_with(|| PortfolioRecord {
                identity: identity.clone(),
                total_balance: Amount::ZERO,
                updated_at: now,
            });

        guard.challenges.retain(|(addr, _), _| addr != address);
        Ok(())
    }
}

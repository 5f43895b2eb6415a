//! Atomic multi-store commit for wallet verification.
//!
//! The wallet upsert, the portfolio row, and the address-wide challenge
//! consume all land in one LMDB write transaction.

use std::ops::Bound;

use siglink_store::portfolio::PortfolioRecord;
use siglink_store::wallet::WalletRecord;
use siglink_store::{Store, StoreError};
use siglink_types::{Amount, IdentityId, Timestamp, WalletAddress};

use crate::environment::{decode, encode, increment_prefix};
use crate::{LmdbError, LmdbStore};

impl Store for LmdbStore {
    fn commit_verification(
        &self,
        address: &WalletAddress,
        identity: &IdentityId,
        now: Timestamp,
    ) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;

        let wallet_key = address.as_str().as_bytes();
        let created_at = match self
            .wallets_db
            .get(&wtxn, wallet_key)
            .map_err(LmdbError::from)?
        {
            Some(bytes) => decode::<WalletRecord>(bytes)?.created_at,
            None => now,
        };
        let record = WalletRecord {
            address: address.clone(),
            owner: identity.clone(),
            verified: true,
            verified_at: Some(now),
            created_at,
        };
        self.wallets_db
            .put(&mut wtxn, wallet_key, &encode(&record)?)
            .map_err(LmdbError::from)?;

        let portfolio_key = identity.as_str().as_bytes();
        let has_portfolio = self
            .portfolios_db
            .get(&wtxn, portfolio_key)
            .map_err(LmdbError::from)?
            .is_some();
        if !has_portfolio {
            let portfolio = PortfolioRecord {
                identity: identity.clone(),
                total_balance: Amount::ZERO,
                updated_at: now,
            };
            self.portfolios_db
                .put(&mut wtxn, portfolio_key, &encode(&portfolio)?)
                .map_err(LmdbError::from)?;
        }

        // Consume every challenge for the address, stale duplicates included.
        let prefix = address.as_str().as_bytes().to_vec();
        let mut upper = prefix.clone();
        increment_prefix(&mut upper);
        let challenge_keys: Vec<Vec<u8>> = {
            let bounds = (
                Bound::Included(prefix.as_slice()),
                Bound::Excluded(upper.as_slice()),
            );
            let iter = self
                .challenges_db
                .range(&wtxn, &bounds)
                .map_err(LmdbError::from)?;
            let mut keys = Vec::new();
            for result in iter {
                let (key, _bytes) = result.map_err(LmdbError::from)?;
                keys.push(key.to_vec());
            }
            keys
        };
        for key in &challenge_keys {
            self.challenges_db
                .delete(&mut wtxn, key)
                .map_err(LmdbError::from)?;
        }

        wtxn.commit().map_err(LmdbError::from)?;
        tracing::debug!(
            address = address.short(),
            identity = %identity,
            consumed = challenge_keys.len(),
            "verification committed"
        );
        Ok(())
    }
}

//! LMDB implementation of WalletStore.

use std::collections::BTreeSet;

use siglink_store::wallet::{WalletRecord, WalletStore};
use siglink_store::StoreError;
use siglink_types::{IdentityId, Timestamp, WalletAddress};

use crate::environment::{decode, encode};
use crate::{LmdbError, LmdbStore};

impl WalletStore for LmdbStore {
    fn get_wallet(&self, address: &WalletAddress) -> Result<Option<WalletRecord>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let found = self
            .wallets_db
            .get(&rtxn, address.as_str().as_bytes())
            .map_err(LmdbError::from)?;
        match found {
            Some(bytes) => Ok(Some(decode(bytes)?)),
            None => Ok(None),
        }
    }

    fn put_wallet(&self, record: &WalletRecord) -> Result<(), StoreError> {
        let bytes = encode(record)?;
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.wallets_db
            .put(&mut wtxn, record.address.as_str().as_bytes(), &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn delete_wallet(&self, address: &WalletAddress) -> Result<bool, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let existed = self
            .wallets_db
            .delete(&mut wtxn, address.as_str().as_bytes())
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(existed)
    }

    fn verified_wallets_for(
        &self,
        identity: &IdentityId,
    ) -> Result<Vec<WalletRecord>, StoreError> {
        Ok(self
            .iter_wallets()?
            .into_iter()
            .filter(|w| w.verified && &w.owner == identity)
            .collect())
    }

    fn verified_identities(&self) -> Result<Vec<IdentityId>, StoreError> {
        let mut seen = BTreeSet::new();
        for wallet in self.iter_wallets()? {
            if wallet.verified {
                seen.insert(wallet.owner);
            }
        }
        Ok(seen.into_iter().collect())
    }

    fn iter_wallets(&self) -> Result<Vec<WalletRecord>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let iter = self.wallets_db.iter(&rtxn).map_err(LmdbError::from)?;
        let mut wallets = Vec::new();
        for result in iter {
            let (_key, bytes) = result.map_err(LmdbError::from)?;
            wallets.push(decode(bytes)?);
        }
        Ok(wallets)
    }

    fn sweep_stale_unverified(&self, cutoff: Timestamp) -> Result<u64, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let mut stale_keys = Vec::new();
        {
            let iter = self.wallets_db.iter(&wtxn).map_err(LmdbError::from)?;
            for result in iter {
                let (key, bytes) = result.map_err(LmdbError::from)?;
                let wallet: WalletRecord = decode(bytes)?;
                if !wallet.verified && wallet.created_at.is_past(cutoff) {
                    stale_keys.push(key.to_vec());
                }
            }
        }
        for key in &stale_keys {
            self.wallets_db
                .delete(&mut wtxn, key)
                .map_err(LmdbError::from)?;
        }
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(stale_keys.len() as u64)
    }
}

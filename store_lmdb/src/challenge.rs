//! LMDB implementation of ChallengeStore.
//!
//! Challenge keys are `address_bytes ++ identity_bytes`; listing or
//! deleting every challenge for an address is a prefix range-scan.

use std::ops::Bound;

use heed::types::Bytes;
use heed::{Database, RoTxn};

use siglink_store::challenge::{ChallengeRecord, ChallengeStore};
use siglink_store::StoreError;
use siglink_types::{IdentityId, SignalCode, Timestamp, WalletAddress};

use crate::environment::{challenge_key, decode, encode, increment_prefix};
use crate::{LmdbError, LmdbStore};

/// Collect every challenge row whose key starts with the address prefix.
fn scan_address(
    db: &Database<Bytes, Bytes>,
    rtxn: &RoTxn<'_>,
    address: &WalletAddress,
) -> Result<Vec<(Vec<u8>, ChallengeRecord)>, LmdbError> {
    let prefix = address.as_str().as_bytes().to_vec();
    let mut upper = prefix.clone();
    increment_prefix(&mut upper);
    let bounds = (
        Bound::Included(prefix.as_slice()),
        Bound::Excluded(upper.as_slice()),
    );
    let iter = db.range(rtxn, &bounds)?;
    let mut rows = Vec::new();
    for result in iter {
        let (key, bytes) = result?;
        rows.push((key.to_vec(), decode(bytes)?));
    }
    Ok(rows)
}

impl ChallengeStore for LmdbStore {
    fn put_challenge(&self, record: &ChallengeRecord) -> Result<(), StoreError> {
        let key = challenge_key(&record.address, &record.identity);
        let bytes = encode(record)?;
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.challenges_db
            .put(&mut wtxn, &key, &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn challenge_for(
        &self,
        identity: &IdentityId,
        address: &WalletAddress,
    ) -> Result<Option<ChallengeRecord>, StoreError> {
        let key = challenge_key(address, identity);
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let found = self
            .challenges_db
            .get(&rtxn, &key)
            .map_err(LmdbError::from)?;
        match found {
            Some(bytes) => Ok(Some(decode(bytes)?)),
            None => Ok(None),
        }
    }

    fn find_live(
        &self,
        address: &WalletAddress,
        code: SignalCode,
        now: Timestamp,
    ) -> Result<Option<ChallengeRecord>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let rows = scan_address(&self.challenges_db, &rtxn, address)?;
        Ok(rows
            .into_iter()
            .map(|(_, record)| record)
            .find(|c| c.code == code && c.is_live(now)))
    }

    fn delete_challenges(&self, address: &WalletAddress) -> Result<u64, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let keys: Vec<Vec<u8>> = {
            let rows = scan_address(&self.challenges_db, &wtxn, address)?;
            rows.into_iter().map(|(key, _)| key).collect()
        };
        for key in &keys {
            self.challenges_db
                .delete(&mut wtxn, key)
                .map_err(LmdbError::from)?;
        }
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(keys.len() as u64)
    }

    fn sweep_expired(&self, now: Timestamp) -> Result<u64, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let mut dead_keys = Vec::new();
        {
            let iter = self.challenges_db.iter(&wtxn).map_err(LmdbError::from)?;
            for result in iter {
                let (key, bytes) = result.map_err(LmdbError::from)?;
                let record: ChallengeRecord = decode(bytes)?;
                if !record.is_live(now) {
                    dead_keys.push(key.to_vec());
                }
            }
        }
        for key in &dead_keys {
            self.challenges_db
                .delete(&mut wtxn, key)
                .map_err(LmdbError::from)?;
        }
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(dead_keys.len() as u64)
    }

    fn challenge_count(&self, address: &WalletAddress) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let rows = scan_address(&self.challenges_db, &rtxn, address)?;
        Ok(rows.len() as u64)
    }

    fn live_challenge_count(&self, now: Timestamp) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let iter = self.challenges_db.iter(&rtxn).map_err(LmdbError::from)?;
        let mut live = 0u64;
        for result in iter {
            let (_key, bytes) = result.map_err(LmdbError::from)?;
            let record: ChallengeRecord = decode(bytes)?;
            if record.is_live(now) {
                live += 1;
            }
        }
        Ok(live)
    }

    fn latest_challenge(
        &self,
        address: &WalletAddress,
    ) -> Result<Option<ChallengeRecord>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let rows = scan_address(&self.challenges_db, &rtxn, address)?;
        Ok(rows
            .into_iter()
            .map(|(_, record)| record)
            .max_by_key(|c| c.created_at))
    }
}

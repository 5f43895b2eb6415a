//! LMDB environment setup and shared key helpers.

use std::path::Path;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};
use serde::de::DeserializeOwned;
use serde::Serialize;

use siglink_types::{IdentityId, WalletAddress};

use crate::LmdbError;

/// Default map size: 1 GiB is far beyond what this service accumulates.
const DEFAULT_MAP_SIZE: usize = 1 << 30;
const MAX_DBS: u32 = 8;

/// LMDB-backed implementation of the full store surface.
///
/// One database per record family. Challenge keys are the composite
/// `address_bytes ++ identity_bytes`, so consuming every challenge for an
/// address is a prefix range-scan (the address is fixed-length, which keeps
/// the prefix unambiguous).
pub struct LmdbStore {
    pub(crate) env: Env,
    pub(crate) wallets_db: Database<Bytes, Bytes>,
    pub(crate) challenges_db: Database<Bytes, Bytes>,
    pub(crate) processed_db: Database<Bytes, Bytes>,
    pub(crate) portfolios_db: Database<Bytes, Bytes>,
    pub(crate) thresholds_db: Database<Bytes, Bytes>,
}

impl LmdbStore {
    /// Open or create an LMDB environment at the given path.
    pub fn open(path: &Path) -> Result<Self, LmdbError> {
        Self::open_with_map_size(path, DEFAULT_MAP_SIZE)
    }

    pub fn open_with_map_size(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)
            .map_err(|e| LmdbError::Heed(format!("create data dir: {e}")))?;
        let env = unsafe {
            EnvOpenOptions::new()
                .max_dbs(MAX_DBS)
                .map_size(map_size)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let wallets_db = env.create_database(&mut wtxn, Some("wallets"))?;
        let challenges_db = env.create_database(&mut wtxn, Some("challenges"))?;
        let processed_db = env.create_database(&mut wtxn, Some("processed_transactions"))?;
        let portfolios_db = env.create_database(&mut wtxn, Some("portfolios"))?;
        let thresholds_db = env.create_database(&mut wtxn, Some("role_thresholds"))?;
        wtxn.commit()?;

        tracing::debug!(path = %path.display(), "opened LMDB environment");

        Ok(Self {
            env,
            wallets_db,
            challenges_db,
            processed_db,
            portfolios_db,
            thresholds_db,
        })
    }
}

pub(crate) fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, LmdbError> {
    Ok(bincode::serialize(value)?)
}

pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, LmdbError> {
    Ok(bincode::deserialize(bytes)?)
}

/// Build the composite challenge key `address_bytes ++ identity_bytes`.
pub(crate) fn challenge_key(address: &WalletAddress, identity: &IdentityId) -> Vec<u8> {
    let a = address.as_str().as_bytes();
    let i = identity.as_str().as_bytes();
    let mut key = Vec::with_capacity(a.len() + i.len());
    key.extend_from_slice(a);
    key.extend_from_slice(i);
    key
}

/// Increment a byte prefix to its exclusive upper range bound.
///
/// Trailing 0xFF bytes are dropped before incrementing; an all-0xFF prefix
/// has no upper bound (never the case for ASCII address prefixes).
pub(crate) fn increment_prefix(prefix: &mut Vec<u8>) {
    while let Some(&last) = prefix.last() {
        if last == 0xFF {
            prefix.pop();
        } else {
            let idx = prefix.len() - 1;
            prefix[idx] = last + 1;
            return;
        }
    }
}

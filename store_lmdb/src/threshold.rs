//! LMDB implementation of ThresholdStore.

use siglink_store::threshold::{sort_ladder, RoleThreshold, ThresholdStore};
use siglink_store::StoreError;
use siglink_types::RoleId;

use crate::environment::{decode, encode};
use crate::{LmdbError, LmdbStore};

impl ThresholdStore for LmdbStore {
    fn put_threshold(&self, record: &RoleThreshold) -> Result<(), StoreError> {
        let bytes = encode(record)?;
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.thresholds_db
            .put(&mut wtxn, record.role_id.as_str().as_bytes(), &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn get_threshold(&self, role_id: &RoleId) -> Result<Option<RoleThreshold>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let found = self
            .thresholds_db
            .get(&rtxn, role_id.as_str().as_bytes())
            .map_err(LmdbError::from)?;
        match found {
            Some(bytes) => Ok(Some(decode(bytes)?)),
            None => Ok(None),
        }
    }

    fn delete_threshold(&self, role_id: &RoleId) -> Result<bool, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let existed = self
            .thresholds_db
            .delete(&mut wtxn, role_id.as_str().as_bytes())
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(existed)
    }

    fn thresholds_desc(&self) -> Result<Vec<RoleThreshold>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let iter = self.thresholds_db.iter(&rtxn).map_err(LmdbError::from)?;
        let mut ladder = Vec::new();
        for result in iter {
            let (_key, bytes) = result.map_err(LmdbError::from)?;
            ladder.push(decode(bytes)?);
        }
        sort_ladder(&mut ladder);
        Ok(ladder)
    }
}

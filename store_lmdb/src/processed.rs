//! LMDB implementation of the processed-transaction set.
//!
//! The get-then-put sequence runs inside one write transaction; LMDB's
//! single-writer model makes it an atomic test-and-set, so exactly one of
//! two concurrent duplicate deliveries wins the insert.

use siglink_store::processed::ProcessedTxStore;
use siglink_store::StoreError;
use siglink_types::TxId;

use crate::{LmdbError, LmdbStore};

impl ProcessedTxStore for LmdbStore {
    fn insert_processed(&self, tx_id: &TxId) -> Result<bool, StoreError> {
        let key = tx_id.as_str().as_bytes();
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let already = self
            .processed_db
            .get(&wtxn, key)
            .map_err(LmdbError::from)?
            .is_some();
        if already {
            return Ok(false);
        }
        self.processed_db
            .put(&mut wtxn, key, &[])
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(true)
    }

    fn is_processed(&self, tx_id: &TxId) -> Result<bool, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self
            .processed_db
            .get(&rtxn, tx_id.as_str().as_bytes())
            .map_err(LmdbError::from)?
            .is_some())
    }

    fn processed_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.processed_db.len(&rtxn).map_err(LmdbError::from)?)
    }
}

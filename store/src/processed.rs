//! Processed-transaction idempotency set.
//!
//! Append-only keyset of transaction ids; a record's existence, not its
//! content, is the semantic payload. The uniqueness guarantee here is the
//! sole concurrency primitive protecting replay detection, so it must be
//! enforced by the storage layer itself.

use siglink_types::TxId;

use crate::StoreError;

pub trait ProcessedTxStore {
    /// Atomic test-and-set: insert the id, returning `false` if it was
    /// already present. Exactly one caller wins under concurrent duplicate
    /// delivery.
    fn insert_processed(&self, tx_id: &TxId) -> Result<bool, StoreError>;

    fn is_processed(&self, tx_id: &TxId) -> Result<bool, StoreError>;

    fn processed_count(&self) -> Result<u64, StoreError>;
}

//! Error taxonomy shared by every storage backend.

use thiserror::Error;

/// Failure surfaced by a storage backend.
///
/// Only three things can go wrong at this layer: the addressed record
/// does not exist, a record failed to encode or decode, or the backend
/// itself misbehaved (I/O, environment, transaction).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no record for {0}")]
    NotFound(String),

    #[error("record encoding failed: {0}")]
    Serialization(String),

    #[error("storage backend failure: {0}")]
    Backend(String),
}

//! LMDB storage backend for siglink.
//!
//! Implements all storage traits from `siglink-store` using the `heed` LMDB
//! bindings. Each record family maps to one LMDB database within a single
//! environment. LMDB's single-writer model is what makes the multi-step
//! operations (`insert_processed`, `commit_verification`) atomic.

pub mod challenge;
pub mod environment;
pub mod error;
pub mod portfolio;
pub mod processed;
pub mod threshold;
pub mod wallet;
pub mod write_batch;

pub use environment::LmdbStore;
pub use error::LmdbError;

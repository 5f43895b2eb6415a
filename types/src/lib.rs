//! Fundamental types for the siglink service.
//!
//! This crate defines the core types shared across every other crate in the
//! workspace: wallet addresses, transaction ids, identities, amounts,
//! signal codes, and timestamps.

pub mod address;
pub mod amount;
pub mod error;
pub mod id;
pub mod time;

pub use address::WalletAddress;
pub use amount::Amount;
pub use error::TypeError;
pub use id::{IdentityId, RoleId, SignalCode, TxId};
pub use time::Timestamp;

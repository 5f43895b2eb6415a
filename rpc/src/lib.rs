//! HTTP API for the siglink service.
//!
//! Endpoints:
//! - challenge issuance for wallet linking
//! - webhook intake for trade notifications (acked, processed async)
//! - manual sync trigger
//! - threshold CRUD, operator wallet ops, dashboard stats

pub mod error;
pub mod handlers;
pub mod server;

pub use error::RpcError;
pub use server::{router, AppState, RpcServer};

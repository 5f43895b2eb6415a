//! Outbound collaborator seams for the siglink service.
//!
//! Two external systems sit behind traits here:
//! - the on-chain **ledger** (balance and transaction-detail endpoints),
//! - the downstream **authorization sink** (role grants/revocations and
//!   user notifications).
//!
//! The rest of the workspace depends only on the traits; the HTTP client
//! and the logging sink are the production implementations.

pub mod error;
pub mod http;
pub mod ledger;
pub mod sink;

pub use error::{GatewayError, SinkError};
pub use http::HttpLedgerGateway;
pub use ledger::{LedgerGateway, OnChainTransaction};
pub use sink::{AuthorizationSink, LogSink};

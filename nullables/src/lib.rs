//! Programmable doubles for the outbound seams.
//!
//! `NullGateway` plays the ledger: balances and transactions are seeded
//! programmatically, and faults can be injected to exercise the
//! unavailable-ledger paths. `NullSink` plays the authorization
//! platform: it records every grant, revocation, and notice for
//! assertions.
//!
//! Neither double touches the network.

pub mod gateway;
pub mod sink;

pub use gateway::NullGateway;
pub use sink::NullSink;

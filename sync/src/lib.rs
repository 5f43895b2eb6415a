//! Balance aggregation and tiered role synchronization.
//!
//! The sync side of the service keeps downstream authorization in step
//! with on-chain reality: it sums the balances of every verified wallet
//! an identity owns, resolves the tier role that total earns, and applies
//! the grant/revoke delta through the authorization sink. A scheduler
//! runs the whole population in batches on a timer, with a circuit
//! breaker that backs off when the ledger is unhealthy, and periodic
//! cleanup sweeps retire expired challenges and abandoned claims.

pub mod cleanup;
pub mod engine;
pub mod error;
pub mod portfolio;
pub mod roles;
pub mod scheduler;

pub use cleanup::{CleanupConfig, CleanupReport, CleanupSweeper};
pub use engine::{RefreshOutcome, SyncEngine};
pub use error::SyncError;
pub use roles::{resolve_role, RoleDelta};
pub use scheduler::{SchedulerConfig, SyncScheduler, SyncSummary};

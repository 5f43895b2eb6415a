//! One identity's full refresh cycle: aggregate, persist, apply roles.

use std::sync::Arc;

use siglink_gateway::{AuthorizationSink, LedgerGateway};
use siglink_store::portfolio::{PortfolioRecord, PortfolioStore};
use siglink_store::Store;
use siglink_types::{Amount, IdentityId, RoleId, Timestamp};

use crate::error::SyncError;
use crate::portfolio::aggregate_balance;
use crate::roles::{apply_role_delta, resolve_role};

/// How a refresh cycle ended.
#[derive(Debug, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Portfolio committed and role delta applied.
    Updated {
        total: Amount,
        role: Option<RoleId>,
    },
    /// A ledger fault aborted the cycle before any write. Stale state is
    /// kept; the next cycle retries.
    GatewayFault,
}

/// Store + gateway + sink wired together for refresh cycles.
pub struct SyncEngine {
    store: Arc<dyn Store>,
    gateway: Arc<dyn LedgerGateway>,
    sink: Arc<dyn AuthorizationSink>,
}

impl SyncEngine {
    pub fn new(
        store: Arc<dyn Store>,
        gateway: Arc<dyn LedgerGateway>,
        sink: Arc<dyn AuthorizationSink>,
    ) -> Self {
        Self {
            store,
            gateway,
            sink,
        }
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Recompute one identity's portfolio and bring its tier role in line.
    ///
    /// The cycle either commits fully or leaves no writes behind: a
    /// gateway fault during aggregation returns `GatewayFault` without
    /// touching the portfolio. Sink failures after the portfolio commit
    /// are logged, never rolled back.
    pub async fn refresh_identity(
        &self,
        identity: &IdentityId,
        now: Timestamp,
    ) -> Result<RefreshOutcome, SyncError> {
        let total = match aggregate_balance(self.store.as_ref(), self.gateway.as_ref(), identity)
            .await
        {
            Ok(total) => total,
            Err(SyncError::Gateway(e)) => {
                tracing::warn!(identity = %identity, error = %e, "aggregation skipped, ledger fault");
                return Ok(RefreshOutcome::GatewayFault);
            }
            Err(e) => return Err(e),
        };

        self.store.put_portfolio(&PortfolioRecord {
            identity: identity.clone(),
            total_balance: total,
            updated_at: now,
        })?;

        let ladder = self.store.thresholds_desc()?;
        let target = resolve_role(total, &ladder).map(|tier| tier.role_id.clone());

        match apply_role_delta(self.sink.as_ref(), identity, target.as_ref(), &ladder).await {
            Ok(delta) if !delta.is_noop() => {
                tracing::info!(
                    identity = %identity,
                    total = %total,
                    granted = ?delta.granted,
                    revoked = ?delta.revoked,
                    "tier role updated"
                );
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(identity = %identity, error = %e, "role delta not applied");
            }
        }

        Ok(RefreshOutcome::Updated {
            total,
            role: target,
        })
    }
}

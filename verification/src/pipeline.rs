//! Layers 2–6: on-chain confrontation, replay protection, challenge
//! matching, ownership arbitration, and the atomic commit.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use siglink_gateway::{AuthorizationSink, LedgerGateway};
use siglink_store::Store;
use siglink_sync::SyncEngine;
use siglink_types::{Timestamp, WalletAddress};

use crate::error::PipelineError;
use crate::outcomes::{Outcome, RejectReason};
use crate::schema::ClaimedTransfer;

/// Per-address async locks so two notifications for the same wallet
/// cannot interleave between challenge match and commit.
///
/// Entries exist only while a notification for the address is in
/// flight; `release` drops an entry once nothing else references it.
#[derive(Default)]
struct AddressLocks {
    inner: Mutex<HashMap<WalletAddress, Arc<tokio::sync::Mutex<()>>>>,
}

impl AddressLocks {
    fn lock_for(&self, address: &WalletAddress) -> Arc<tokio::sync::Mutex<()>> {
        let mut table = self.inner.lock().unwrap();
        table
            .entry(address.clone())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    /// Remove the entry unless another task still holds a clone of it.
    fn release(&self, address: &WalletAddress) {
        let mut table = self.inner.lock().unwrap();
        if let Some(entry) = table.get(address) {
            if Arc::strong_count(entry) == 1 {
                table.remove(address);
            }
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }
}

/// Counts for one processed batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub accepted: u64,
    pub rejected: u64,
    /// Items abandoned on an internal store failure; the notifier will
    /// redeliver them.
    pub failed: u64,
}

pub struct VerificationPipeline {
    store: Arc<dyn Store>,
    gateway: Arc<dyn LedgerGateway>,
    sink: Arc<dyn AuthorizationSink>,
    engine: Arc<SyncEngine>,
    locks: AddressLocks,
}

impl VerificationPipeline {
    pub fn new(
        store: Arc<dyn Store>,
        gateway: Arc<dyn LedgerGateway>,
        sink: Arc<dyn AuthorizationSink>,
        engine: Arc<SyncEngine>,
    ) -> Self {
        Self {
            store,
            gateway,
            sink,
            engine,
            locks: AddressLocks::default(),
        }
    }

    /// Process a notification batch. Items are independent: one bad item
    /// never aborts its siblings.
    pub async fn process_batch(
        &self,
        items: Vec<serde_json::Value>,
        now: Timestamp,
    ) -> BatchSummary {
        let mut summary = BatchSummary::default();
        for item in items {
            match self.process_one(item, now).await {
                Ok(Outcome::Accepted { address, identity }) => {
                    summary.accepted += 1;
                    tracing::info!(address = address.short(), identity = %identity, "wallet verified");
                }
                Ok(Outcome::Rejected(reason)) => {
                    summary.rejected += 1;
                    tracing::debug!(reason = reason.as_str(), "notification rejected");
                }
                Err(e) => {
                    summary.failed += 1;
                    tracing::error!(error = %e, "notification processing failed");
                }
            }
        }
        summary
    }

    /// Run one notification through every layer to a terminal outcome.
    pub async fn process_one(
        &self,
        raw: serde_json::Value,
        now: Timestamp,
    ) -> Result<Outcome, PipelineError> {
        // Layer 1: schema. Nothing is mutated on failure.
        let claim = match ClaimedTransfer::from_value(raw) {
            Ok(claim) => claim,
            Err(e) => {
                tracing::debug!(error = %e, "notification failed schema validation");
                return Ok(Outcome::Rejected(RejectReason::InvalidSchema));
            }
        };

        // Layer 2: on-chain truth, deliberately before the replay log. A
        // forged payload carrying a real txId must not burn the
        // idempotency slot of the genuine transaction.
        let on_chain = match self.gateway.get_transaction(&claim.tx_id).await {
            Ok(Some(tx)) => tx,
            Ok(None) => {
                tracing::debug!(tx_id = claim.tx_id.as_str(), "transaction absent on chain");
                return Ok(Outcome::Rejected(RejectReason::OnChainMismatch));
            }
            Err(e) => {
                tracing::warn!(tx_id = claim.tx_id.as_str(), error = %e, "ledger unavailable");
                return Ok(Outcome::Rejected(RejectReason::GatewayUnavailable));
            }
        };
        if on_chain.source != claim.source || on_chain.amount != claim.amount {
            tracing::debug!(
                tx_id = claim.tx_id.as_str(),
                "claimed source/amount differ from chain"
            );
            return Ok(Outcome::Rejected(RejectReason::OnChainMismatch));
        }

        // Layer 3: replay. The txId alone gates this, atomically.
        if !self.store.insert_processed(&claim.tx_id)? {
            return Ok(Outcome::Rejected(RejectReason::Replay));
        }

        // Layers 4–6 serialize per address, match through commit. The
        // lock table entry is dropped again once this item is done.
        let lock = self.locks.lock_for(&claim.source);
        let verdict = {
            let _guard = lock.lock().await;
            self.match_and_commit(&claim, now)
        };
        drop(lock);
        self.locks.release(&claim.source);

        let outcome = verdict?;
        let identity = match &outcome {
            Outcome::Accepted { identity, .. } => identity.clone(),
            Outcome::Rejected(_) => return Ok(outcome),
        };

        // Post-commit work is best-effort: the verification stands even
        // if the refresh or the notice fails.
        if let Err(e) = self.engine.refresh_identity(&identity, now).await {
            tracing::warn!(identity = %identity, error = %e, "post-verify refresh failed");
        }
        let notice = format!("wallet {} verified", claim.source.short());
        if let Err(e) = self.sink.notify(&identity, &notice).await {
            tracing::debug!(identity = %identity, error = %e, "notice not delivered");
        }

        Ok(outcome)
    }

    /// Layers 4–6 under the address lock: challenge match, ownership
    /// arbitration, atomic commit.
    fn match_and_commit(
        &self,
        claim: &ClaimedTransfer,
        now: Timestamp,
    ) -> Result<Outcome, PipelineError> {
        let challenge = match self.store.find_live(&claim.source, claim.code, now)? {
            Some(challenge) => challenge,
            // Ordinary traffic that happens to hit the webhook.
            None => return Ok(Outcome::Rejected(RejectReason::NoChallenge)),
        };

        if let Some(wallet) = self.store.get_wallet(&claim.source)? {
            if wallet.verified && wallet.owner != challenge.identity {
                // First verifier wins. The late claimant loses its
                // challenge so the code cannot be replayed against the
                // rightful owner.
                self.store.delete_challenges(&claim.source)?;
                tracing::warn!(
                    address = claim.source.short(),
                    owner = %wallet.owner,
                    claimant = %challenge.identity,
                    "verification attempt against an owned wallet"
                );
                return Ok(Outcome::Rejected(RejectReason::OwnershipConflict));
            }
        }

        self.store
            .commit_verification(&claim.source, &challenge.identity, now)?;
        Ok(Outcome::Accepted {
            address: claim.source.clone(),
            identity: challenge.identity,
        })
    }
}

//! Periodic maintenance sweeps.

use std::sync::Arc;

use serde::Serialize;

use siglink_store::Store;
use siglink_types::Timestamp;

use crate::error::SyncError;

#[derive(Clone, Copy, Debug)]
pub struct CleanupConfig {
    /// Unverified claims older than this are abandoned and removed.
    /// Must comfortably exceed the challenge TTL so a sweep never races
    /// an active verification window.
    pub stale_wallet_cutoff_secs: u64,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            stale_wallet_cutoff_secs: 24 * 60 * 60,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub expired_challenges: u64,
    pub stale_wallets: u64,
}

/// Retires expired challenges and abandoned unverified claims.
pub struct CleanupSweeper {
    store: Arc<dyn Store>,
    config: CleanupConfig,
}

impl CleanupSweeper {
    pub fn new(store: Arc<dyn Store>, config: CleanupConfig) -> Self {
        Self { store, config }
    }

    pub fn run_once(&self, now: Timestamp) -> Result<CleanupReport, SyncError> {
        let expired_challenges = self.store.sweep_expired(now)?;
        let cutoff = now.minus_secs(self.config.stale_wallet_cutoff_secs);
        let stale_wallets = self.store.sweep_stale_unverified(cutoff)?;

        if expired_challenges > 0 || stale_wallets > 0 {
            tracing::info!(expired_challenges, stale_wallets, "cleanup sweep done");
        }
        Ok(CleanupReport {
            expired_challenges,
            stale_wallets,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use siglink_store::challenge::{ChallengeRecord, ChallengeStore};
    use siglink_store::memory::MemoryStore;
    use siglink_store::wallet::{WalletRecord, WalletStore};
    use siglink_types::{IdentityId, SignalCode, WalletAddress};

    fn addr(c: char) -> WalletAddress {
        WalletAddress::parse(c.to_string().repeat(60)).unwrap()
    }

    fn ident(s: &str) -> IdentityId {
        IdentityId::parse(s).unwrap()
    }

    #[test]
    fn sweeps_expired_challenges_and_stale_claims() {
        let store = Arc::new(MemoryStore::new());
        let sweeper = CleanupSweeper::new(
            store.clone(),
            CleanupConfig {
                stale_wallet_cutoff_secs: 1000,
            },
        );

        store
            .put_challenge(&ChallengeRecord {
                identity: ident("u1"),
                address: addr('A'),
                code: SignalCode::new(12345),
                created_at: Timestamp::new(0),
                expires_at: Timestamp::new(900),
            })
            .unwrap();
        store
            .put_challenge(&ChallengeRecord {
                identity: ident("u2"),
                address: addr('B'),
                code: SignalCode::new(23456),
                created_at: Timestamp::new(4000),
                expires_at: Timestamp::new(4900),
            })
            .unwrap();

        // Old unverified claim goes; recent claim and verified wallet stay.
        store
            .put_wallet(&WalletRecord::claimed(addr('A'), ident("u1"), Timestamp::new(10)))
            .unwrap();
        store
            .put_wallet(&WalletRecord::claimed(addr('B'), ident("u2"), Timestamp::new(4000)))
            .unwrap();
        let mut old_but_verified =
            WalletRecord::claimed(addr('C'), ident("u3"), Timestamp::new(5));
        old_but_verified.verified = true;
        store.put_wallet(&old_but_verified).unwrap();

        let report = sweeper.run_once(Timestamp::new(4500)).unwrap();

        assert_eq!(report.expired_challenges, 1);
        assert_eq!(report.stale_wallets, 1);
        assert!(store.get_wallet(&addr('A')).unwrap().is_none());
        assert!(store.get_wallet(&addr('B')).unwrap().is_some());
        assert!(store.get_wallet(&addr('C')).unwrap().is_some());
    }

    #[test]
    fn quiet_sweep_reports_zeroes() {
        let store = Arc::new(MemoryStore::new());
        let sweeper = CleanupSweeper::new(store, CleanupConfig::default());
        let report = sweeper.run_once(Timestamp::new(100)).unwrap();
        assert_eq!(report, CleanupReport::default());
    }
}

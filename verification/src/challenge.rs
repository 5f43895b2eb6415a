//! Challenge issuance and lifecycle.

use std::sync::Arc;

use rand::Rng;

use siglink_store::challenge::ChallengeRecord;
use siglink_store::wallet::WalletRecord;
use siglink_store::Store;
use siglink_types::{IdentityId, SignalCode, Timestamp, WalletAddress};

use crate::error::ChallengeError;

#[derive(Clone, Copy, Debug)]
pub struct ChallengeConfig {
    /// Sliding lifetime of a challenge.
    pub ttl_secs: u64,
    /// Inclusive code range. Five digits by default so the code reads as
    /// a plausible share count in a normal order.
    pub code_min: u32,
    pub code_max: u32,
}

impl Default for ChallengeConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 15 * 60,
            code_min: 10_000,
            code_max: 99_999,
        }
    }
}

/// What the caller gets back from `issue`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedChallenge {
    pub code: SignalCode,
    pub expires_at: Timestamp,
    /// True when an existing live challenge was extended instead of a
    /// fresh code minted.
    pub reused: bool,
}

/// Issues and manages one-time signal codes.
pub struct ChallengeService {
    store: Arc<dyn Store>,
    config: ChallengeConfig,
}

impl ChallengeService {
    pub fn new(store: Arc<dyn Store>, config: ChallengeConfig) -> Self {
        Self { store, config }
    }

    /// Issue a challenge binding `identity` to `address`.
    ///
    /// Conflicts surface here rather than at verification time: an
    /// address already verified by someone else is rejected outright.
    /// Re-issuing within the TTL returns the same code and slides the
    /// expiry forward instead of stacking duplicates.
    pub fn issue(
        &self,
        identity: &IdentityId,
        address: &WalletAddress,
        now: Timestamp,
    ) -> Result<IssuedChallenge, ChallengeError> {
        match self.store.get_wallet(address)? {
            Some(wallet) if wallet.verified && wallet.owner != *identity => {
                return Err(ChallengeError::AddressOwned {
                    address: address.clone(),
                    owner: wallet.owner,
                });
            }
            Some(wallet) if wallet.owner == *identity => {}
            // Unverified claim by someone else, or no claim at all:
            // (re)target the claim row at this identity.
            _ => {
                self.store
                    .put_wallet(&WalletRecord::claimed(address.clone(), identity.clone(), now))?;
            }
        }

        if let Some(existing) = self.store.challenge_for(identity, address)? {
            if existing.is_live(now) {
                let extended = ChallengeRecord {
                    expires_at: now.plus_secs(self.config.ttl_secs),
                    ..existing
                };
                self.store.put_challenge(&extended)?;
                tracing::debug!(
                    address = address.short(),
                    identity = %identity,
                    "live challenge extended"
                );
                return Ok(IssuedChallenge {
                    code: extended.code,
                    expires_at: extended.expires_at,
                    reused: true,
                });
            }
        }

        let code = SignalCode::new(
            rand::thread_rng().gen_range(self.config.code_min..=self.config.code_max),
        );
        let record = ChallengeRecord {
            identity: identity.clone(),
            address: address.clone(),
            code,
            created_at: now,
            expires_at: now.plus_secs(self.config.ttl_secs),
        };
        self.store.put_challenge(&record)?;
        tracing::info!(
            address = address.short(),
            identity = %identity,
            expires_at = %record.expires_at,
            "challenge issued"
        );
        Ok(IssuedChallenge {
            code,
            expires_at: record.expires_at,
            reused: false,
        })
    }

    /// The live challenge matching `(address, code)`, if any.
    pub fn find_live(
        &self,
        address: &WalletAddress,
        code: SignalCode,
        now: Timestamp,
    ) -> Result<Option<ChallengeRecord>, ChallengeError> {
        Ok(self.store.find_live(address, code, now)?)
    }

    /// Delete every challenge for the address.
    pub fn consume(&self, address: &WalletAddress) -> Result<u64, ChallengeError> {
        Ok(self.store.delete_challenges(address)?)
    }

    /// Delete every expired challenge.
    pub fn sweep_expired(&self, now: Timestamp) -> Result<u64, ChallengeError> {
        Ok(self.store.sweep_expired(now)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use siglink_store::challenge::ChallengeStore;
    use siglink_store::memory::MemoryStore;
    use siglink_store::wallet::WalletStore;

    fn addr(c: char) -> WalletAddress {
        WalletAddress::parse(c.to_string().repeat(60)).unwrap()
    }

    fn ident(s: &str) -> IdentityId {
        IdentityId::parse(s).unwrap()
    }

    fn service() -> (Arc<MemoryStore>, ChallengeService) {
        let store = Arc::new(MemoryStore::new());
        let service = ChallengeService::new(store.clone(), ChallengeConfig::default());
        (store, service)
    }

    #[test]
    fn issue_mints_a_code_in_range_and_claims_the_wallet() {
        let (store, service) = service();
        let issued = service
            .issue(&ident("alice"), &addr('A'), Timestamp::new(100))
            .unwrap();

        assert!((10_000..=99_999).contains(&issued.code.value()));
        assert!(!issued.reused);
        assert_eq!(issued.expires_at, Timestamp::new(100 + 900));

        let wallet = store.get_wallet(&addr('A')).unwrap().unwrap();
        assert_eq!(wallet.owner, ident("alice"));
        assert!(!wallet.verified);
    }

    #[test]
    fn reissue_within_ttl_reuses_the_code_and_slides_expiry() {
        let (store, service) = service();
        let first = service
            .issue(&ident("alice"), &addr('A'), Timestamp::new(100))
            .unwrap();
        let second = service
            .issue(&ident("alice"), &addr('A'), Timestamp::new(400))
            .unwrap();

        assert_eq!(second.code, first.code);
        assert!(second.reused);
        assert_eq!(second.expires_at, Timestamp::new(400 + 900));
        assert_eq!(store.challenge_count(&addr('A')).unwrap(), 1);
    }

    #[test]
    fn reissue_after_expiry_mints_a_fresh_row() {
        let (store, service) = service();
        service
            .issue(&ident("alice"), &addr('A'), Timestamp::new(100))
            .unwrap();

        let later = service
            .issue(&ident("alice"), &addr('A'), Timestamp::new(100 + 900))
            .unwrap();
        assert!(!later.reused);
        assert_eq!(later.expires_at, Timestamp::new(100 + 900 + 900));
        // Still one row per (address, identity) pair.
        assert_eq!(store.challenge_count(&addr('A')).unwrap(), 1);
    }

    #[test]
    fn issue_rejects_an_address_verified_by_another_identity() {
        let (store, service) = service();
        let mut wallet = WalletRecord::claimed(addr('A'), ident("alice"), Timestamp::new(1));
        wallet.verified = true;
        store.put_wallet(&wallet).unwrap();

        let err = service
            .issue(&ident("mallory"), &addr('A'), Timestamp::new(100))
            .unwrap_err();
        assert!(matches!(err, ChallengeError::AddressOwned { .. }));
        // The verified owner is untouched.
        assert_eq!(
            store.get_wallet(&addr('A')).unwrap().unwrap().owner,
            ident("alice")
        );
    }

    #[test]
    fn unverified_claim_can_be_retargeted() {
        let (store, service) = service();
        service
            .issue(&ident("alice"), &addr('A'), Timestamp::new(100))
            .unwrap();
        service
            .issue(&ident("bob"), &addr('A'), Timestamp::new(200))
            .unwrap();

        assert_eq!(
            store.get_wallet(&addr('A')).unwrap().unwrap().owner,
            ident("bob")
        );
        // Both identities hold a pending challenge for the address.
        assert_eq!(store.challenge_count(&addr('A')).unwrap(), 2);
    }

    #[test]
    fn two_addresses_for_one_identity_get_independent_challenges() {
        let (store, service) = service();
        service
            .issue(&ident("alice"), &addr('A'), Timestamp::new(100))
            .unwrap();
        service
            .issue(&ident("alice"), &addr('B'), Timestamp::new(100))
            .unwrap();

        assert_eq!(store.challenge_count(&addr('A')).unwrap(), 1);
        assert_eq!(store.challenge_count(&addr('B')).unwrap(), 1);
    }
}

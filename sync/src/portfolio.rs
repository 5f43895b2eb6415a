//! Exact-integer balance aggregation across an identity's verified wallets.

use futures_util::future::try_join_all;

use siglink_gateway::LedgerGateway;
use siglink_store::Store;
use siglink_types::{Amount, IdentityId};

use crate::error::SyncError;

/// Sum the current on-chain balances of every verified wallet the
/// identity owns.
///
/// Balances are fetched in parallel. If any single lookup fails, the
/// whole aggregation fails: a partial sum understates net worth and
/// would cause wrongful tier demotion, so stale state is preferable.
pub async fn aggregate_balance(
    store: &dyn Store,
    gateway: &dyn LedgerGateway,
    identity: &IdentityId,
) -> Result<Amount, SyncError> {
    let wallets = store.verified_wallets_for(identity)?;
    let balances = try_join_all(
        wallets
            .iter()
            .map(|wallet| gateway.get_balance(&wallet.address)),
    )
    .await?;

    let mut total = Amount::ZERO;
    for balance in balances {
        total = total.checked_add(balance).ok_or(SyncError::Overflow)?;
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use siglink_nullables::NullGateway;
    use siglink_store::memory::MemoryStore;
    use siglink_store::wallet::{WalletRecord, WalletStore};
    use siglink_types::{Timestamp, WalletAddress};

    fn addr(c: char) -> WalletAddress {
        WalletAddress::parse(c.to_string().repeat(60)).unwrap()
    }

    fn verified(address: WalletAddress, owner: &IdentityId) -> WalletRecord {
        let mut record = WalletRecord::claimed(address, owner.clone(), Timestamp::new(1));
        record.verified = true;
        record.verified_at = Some(Timestamp::new(1));
        record
    }

    #[tokio::test]
    async fn sums_only_verified_wallets_of_the_identity() {
        let store = MemoryStore::new();
        let gateway = NullGateway::new();
        let identity = IdentityId::parse("alice").unwrap();
        let other = IdentityId::parse("bob").unwrap();

        store.put_wallet(&verified(addr('A'), &identity)).unwrap();
        store.put_wallet(&verified(addr('B'), &identity)).unwrap();
        store.put_wallet(&verified(addr('C'), &other)).unwrap();
        // Unverified claim never counts.
        store
            .put_wallet(&WalletRecord::claimed(
                addr('D'),
                identity.clone(),
                Timestamp::new(1),
            ))
            .unwrap();

        gateway.set_balance(addr('A'), Amount::new(100));
        gateway.set_balance(addr('B'), Amount::new(250));
        gateway.set_balance(addr('C'), Amount::new(9_999));
        gateway.set_balance(addr('D'), Amount::new(9_999));

        let total = aggregate_balance(&store, &gateway, &identity)
            .await
            .unwrap();
        assert_eq!(total, Amount::new(350));
    }

    #[tokio::test]
    async fn one_failed_lookup_fails_the_whole_aggregation() {
        let store = MemoryStore::new();
        let gateway = NullGateway::new();
        let identity = IdentityId::parse("alice").unwrap();

        store.put_wallet(&verified(addr('A'), &identity)).unwrap();
        store.put_wallet(&verified(addr('B'), &identity)).unwrap();
        gateway.set_balance(addr('A'), Amount::new(100));
        gateway.fail_balance(addr('B'), "timeout");

        let result = aggregate_balance(&store, &gateway, &identity).await;
        assert!(matches!(result, Err(SyncError::Gateway(_))));
    }

    #[tokio::test]
    async fn identity_with_no_wallets_sums_to_zero() {
        let store = MemoryStore::new();
        let gateway = NullGateway::new();
        let identity = IdentityId::parse("nobody").unwrap();

        let total = aggregate_balance(&store, &gateway, &identity)
            .await
            .unwrap();
        assert_eq!(total, Amount::ZERO);
    }
}

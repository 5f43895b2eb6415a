//! The on-chain ledger seam.

use futures_util::future::BoxFuture;

use siglink_types::{Amount, TxId, WalletAddress};

use crate::error::GatewayError;

/// Transaction details as reported by the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnChainTransaction {
    /// Sending address.
    pub source: WalletAddress,
    /// Receiving address.
    pub dest: WalletAddress,
    /// Transferred amount in base units.
    pub amount: Amount,
    /// Ledger tick the transaction settled in.
    pub tick: u64,
}

/// Read-only view of the chain: balances and settled transactions.
///
/// Implementations must be safe to share across tasks; the verification
/// pipeline and the sync engine both hold the same gateway.
pub trait LedgerGateway: Send + Sync {
    /// Current spendable balance of an address.
    ///
    /// An address the ledger has never seen reports a zero balance, not
    /// an error.
    fn get_balance<'a>(
        &'a self,
        address: &'a WalletAddress,
    ) -> BoxFuture<'a, Result<Amount, GatewayError>>;

    /// Look up a settled transaction by id.
    ///
    /// `Ok(None)` means the ledger does not know the transaction; errors
    /// are reserved for the ledger being unreachable or misbehaving.
    fn get_transaction<'a>(
        &'a self,
        tx_id: &'a TxId,
    ) -> BoxFuture<'a, Result<Option<OnChainTransaction>, GatewayError>>;
}

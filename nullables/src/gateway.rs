//! Nullable ledger — seeded balances and transactions, injectable faults.

use std::collections::HashMap;
use std::sync::Mutex;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;

use siglink_gateway::{GatewayError, LedgerGateway, OnChainTransaction};
use siglink_types::{Amount, TxId, WalletAddress};

#[derive(Default)]
struct Inner {
    balances: HashMap<WalletAddress, Amount>,
    transactions: HashMap<TxId, OnChainTransaction>,
    /// Addresses whose balance lookups fail.
    failing_balances: HashMap<WalletAddress, String>,
    /// When set, every call fails with this message.
    down: Option<String>,
    balance_calls: u64,
    transaction_calls: u64,
}

/// A test ledger that answers from seeded state.
pub struct NullGateway {
    inner: Mutex<Inner>,
}

impl NullGateway {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Seed the balance an address reports. Unseeded addresses read zero,
    /// like the real ledger.
    pub fn set_balance(&self, address: WalletAddress, amount: Amount) {
        self.inner.lock().unwrap().balances.insert(address, amount);
    }

    /// Seed a settled transaction.
    pub fn set_transaction(&self, tx_id: TxId, tx: OnChainTransaction) {
        self.inner.lock().unwrap().transactions.insert(tx_id, tx);
    }

    /// Make balance lookups for one address fail.
    pub fn fail_balance(&self, address: WalletAddress, message: &str) {
        self.inner
            .lock()
            .unwrap()
            .failing_balances
            .insert(address, message.to_string());
    }

    /// Make every call fail, as if the ledger were unreachable.
    pub fn go_down(&self, message: &str) {
        self.inner.lock().unwrap().down = Some(message.to_string());
    }

    /// Undo [`go_down`](Self::go_down).
    pub fn come_up(&self) {
        self.inner.lock().unwrap().down = None;
    }

    pub fn balance_calls(&self) -> u64 {
        self.inner.lock().unwrap().balance_calls
    }

    pub fn transaction_calls(&self) -> u64 {
        self.inner.lock().unwrap().transaction_calls
    }
}

impl Default for NullGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerGateway for NullGateway {
    fn get_balance<'a>(
        &'a self,
        address: &'a WalletAddress,
    ) -> BoxFuture<'a, Result<Amount, GatewayError>> {
        let result = {
            let mut inner = self.inner.lock().unwrap();
            inner.balance_calls += 1;
            if let Some(message) = &inner.down {
                Err(GatewayError::Network(message.clone()))
            } else if let Some(message) = inner.failing_balances.get(address) {
                Err(GatewayError::Network(message.clone()))
            } else {
                Ok(inner.balances.get(address).copied().unwrap_or(Amount::ZERO))
            }
        };
        async move { result }.boxed()
    }

    fn get_transaction<'a>(
        &'a self,
        tx_id: &'a TxId,
    ) -> BoxFuture<'a, Result<Option<OnChainTransaction>, GatewayError>> {
        let result = {
            let mut inner = self.inner.lock().unwrap();
            inner.transaction_calls += 1;
            if let Some(message) = &inner.down {
                Err(GatewayError::Network(message.clone()))
            } else {
                Ok(inner.transactions.get(tx_id).cloned())
            }
        };
        async move { result }.boxed()
    }
}

//! HTTP client for the on-chain ledger REST API.
//!
//! Two endpoints are consumed:
//! - `GET {base}/v1/balances/{address}` — current balance; unknown
//!   addresses come back with no balance object and read as zero.
//! - `GET {base}/v1/transactions/{tx_id}` — settled transaction details;
//!   a 404 means the transaction is unknown, which is a normal answer
//!   during verification, not a fault.

use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use serde::Deserialize;

use siglink_types::{Amount, TxId, WalletAddress};
use siglink_utils::retry::{retry_with_backoff, RetryPolicy};

use crate::error::GatewayError;
use crate::ledger::{LedgerGateway, OnChainTransaction};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct BalanceEnvelope {
    #[serde(default)]
    balance: Option<BalanceInfo>,
}

#[derive(Debug, Deserialize)]
struct BalanceInfo {
    balance: String,
}

#[derive(Debug, Deserialize)]
struct TransactionEnvelope {
    #[serde(default)]
    transaction: Option<TransactionInfo>,
}

#[derive(Debug, Deserialize)]
struct TransactionInfo {
    #[serde(rename = "sourceId")]
    source_id: String,
    #[serde(rename = "destId")]
    dest_id: String,
    amount: String,
    #[serde(rename = "tickNumber")]
    tick_number: u64,
}

/// Ledger client backed by `reqwest`, with bounded retries on transient
/// faults.
pub struct HttpLedgerGateway {
    base_url: String,
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl HttpLedgerGateway {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn balance_url(&self, address: &WalletAddress) -> String {
        format!("{}/v1/balances/{}", self.base_url, address.as_str())
    }

    fn transaction_url(&self, tx_id: &TxId) -> String {
        format!("{}/v1/transactions/{}", self.base_url, tx_id.as_str())
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<Option<T>, GatewayError> {
        let resp = self
            .client
            .get(url)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(GatewayError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let value = resp
            .json::<T>()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))?;
        Ok(Some(value))
    }

    async fn fetch_balance_once(
        &self,
        address: &WalletAddress,
    ) -> Result<Amount, GatewayError> {
        let url = self.balance_url(address);
        let envelope: Option<BalanceEnvelope> = self.get_json(&url).await?;
        match envelope.and_then(|e| e.balance) {
            Some(info) => Amount::parse(&info.balance)
                .map_err(|e| GatewayError::Decode(e.to_string())),
            None => Ok(Amount::ZERO),
        }
    }

    async fn fetch_transaction_once(
        &self,
        tx_id: &TxId,
    ) -> Result<Option<OnChainTransaction>, GatewayError> {
        let url = self.transaction_url(tx_id);
        let envelope: Option<TransactionEnvelope> = self.get_json(&url).await?;
        let info = match envelope.and_then(|e| e.transaction) {
            Some(info) => info,
            None => return Ok(None),
        };

        let source = WalletAddress::parse(info.source_id)
            .map_err(|e| GatewayError::Decode(e.to_string()))?;
        let dest = WalletAddress::parse(info.dest_id)
            .map_err(|e| GatewayError::Decode(e.to_string()))?;
        let amount = Amount::parse(&info.amount)
            .map_err(|e| GatewayError::Decode(e.to_string()))?;

        Ok(Some(OnChainTransaction {
            source,
            dest,
            amount,
            tick: info.tick_number,
        }))
    }
}

impl LedgerGateway for HttpLedgerGateway {
    fn get_balance<'a>(
        &'a self,
        address: &'a WalletAddress,
    ) -> BoxFuture<'a, Result<Amount, GatewayError>> {
        async move {
            retry_with_backoff(
                self.retry,
                "ledger.get_balance",
                GatewayError::is_transient,
                || self.fetch_balance_once(address),
            )
            .await
        }
        .boxed()
    }

    fn get_transaction<'a>(
        &'a self,
        tx_id: &'a TxId,
    ) -> BoxFuture<'a, Result<Option<OnChainTransaction>, GatewayError>> {
        async move {
            retry_with_backoff(
                self.retry,
                "ledger.get_transaction",
                GatewayError::is_transient,
                || self.fetch_transaction_once(tx_id),
            )
            .await
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_trimmed() {
        let gw = HttpLedgerGateway::new("http://ledger.example/");
        let address = WalletAddress::parse("A".repeat(60)).unwrap();
        assert_eq!(
            gw.balance_url(&address),
            format!("http://ledger.example/v1/balances/{}", "A".repeat(60))
        );
    }

    #[test]
    fn transaction_url_uses_tx_id() {
        let gw = HttpLedgerGateway::new("http://ledger.example");
        let tx = TxId::parse("a".repeat(60)).unwrap();
        assert_eq!(
            gw.transaction_url(&tx),
            format!("http://ledger.example/v1/transactions/{}", "a".repeat(60))
        );
    }

    #[test]
    fn balance_envelope_missing_balance_reads_as_none() {
        let envelope: BalanceEnvelope = serde_json::from_str("{}").unwrap();
        assert!(envelope.balance.is_none());

        let envelope: BalanceEnvelope =
            serde_json::from_str(r#"{"balance":{"balance":"12345"}}"#).unwrap();
        assert_eq!(envelope.balance.unwrap().balance, "12345");
    }

    #[test]
    fn transaction_envelope_deserializes_ledger_field_names() {
        let json = format!(
            r#"{{"transaction":{{"sourceId":"{}","destId":"{}","amount":"42000","tickNumber":19283746}}}}"#,
            "S".repeat(60),
            "D".repeat(60)
        );
        let envelope: TransactionEnvelope = serde_json::from_str(&json).unwrap();
        let info = envelope.transaction.unwrap();
        assert_eq!(info.amount, "42000");
        assert_eq!(info.tick_number, 19283746);
    }

    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    /// Minimal ledger stand-in: answers every request with the given
    /// status line and counts how many requests arrived.
    async fn serve_status(status_line: &'static str, hits: Arc<AtomicU32>) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let (mut socket, _) = match listener.accept().await {
                    Ok(pair) => pair,
                    Err(_) => return,
                };
                hits.fetch_add(1, Ordering::SeqCst);
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 {status_line}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n"
                );
                let _ = socket.write_all(response.as_bytes()).await;
            }
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn client_error_is_not_retried() {
        let hits = Arc::new(AtomicU32::new(0));
        let base = serve_status("400 Bad Request", hits.clone()).await;
        let gw = HttpLedgerGateway::new(&base)
            .with_retry(RetryPolicy::new(3, Duration::from_millis(1)));
        let address = WalletAddress::parse("A".repeat(60)).unwrap();

        let result = gw.get_balance(&address).await;
        assert!(matches!(
            result,
            Err(GatewayError::Http { status: 400, .. })
        ));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn server_error_is_retried_to_exhaustion() {
        let hits = Arc::new(AtomicU32::new(0));
        let base = serve_status("503 Service Unavailable", hits.clone()).await;
        let gw = HttpLedgerGateway::new(&base)
            .with_retry(RetryPolicy::new(3, Duration::from_millis(1)));
        let address = WalletAddress::parse("A".repeat(60)).unwrap();

        let result = gw.get_balance(&address).await;
        assert!(matches!(
            result,
            Err(GatewayError::Http { status: 503, .. })
        ));
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn transient_classification() {
        assert!(GatewayError::Network("timeout".into()).is_transient());
        assert!(GatewayError::Http {
            status: 503,
            url: String::new()
        }
        .is_transient());
        assert!(!GatewayError::Http {
            status: 400,
            url: String::new()
        }
        .is_transient());
        assert!(!GatewayError::Decode("bad json".into()).is_transient());
    }
}

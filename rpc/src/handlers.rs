//! Request/response DTOs for the HTTP API.

use serde::{Deserialize, Serialize};

use siglink_store::threshold::RoleThreshold;
use siglink_store::wallet::WalletRecord;

// ── Challenges ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct IssueChallengeRequest {
    pub identity: String,
    pub address: String,
}

#[derive(Serialize)]
pub struct IssueChallengeResponse {
    pub code: u32,
    pub expires_at: u64,
    pub reused: bool,
}

// ── Webhook ──────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct WebhookAck {
    pub received: usize,
}

// ── Thresholds ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct PutThresholdRequest {
    pub role_id: String,
    pub role_name: String,
    /// Decimal string in base units.
    pub threshold: String,
}

#[derive(Deserialize)]
pub struct UpdateThresholdRequest {
    pub role_name: String,
    pub threshold: String,
}

#[derive(Serialize)]
pub struct ThresholdResponse {
    pub role_id: String,
    pub role_name: String,
    pub threshold: String,
}

impl From<&RoleThreshold> for ThresholdResponse {
    fn from(record: &RoleThreshold) -> Self {
        Self {
            role_id: record.role_id.as_str().to_string(),
            role_name: record.role_name.clone(),
            threshold: record.threshold.to_string(),
        }
    }
}

// ── Wallets ──────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct WalletResponse {
    pub address: String,
    pub owner: String,
    pub verified: bool,
    pub verified_at: Option<u64>,
    pub created_at: u64,
}

impl From<&WalletRecord> for WalletResponse {
    fn from(record: &WalletRecord) -> Self {
        Self {
            address: record.address.as_str().to_string(),
            owner: record.owner.as_str().to_string(),
            verified: record.verified,
            verified_at: record.verified_at.map(|t| t.as_secs()),
            created_at: record.created_at.as_secs(),
        }
    }
}

#[derive(Serialize)]
pub struct WalletListResponse {
    pub wallets: Vec<WalletResponse>,
}

// ── Stats ────────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct StatsResponse {
    pub verified_wallets: u64,
    pub pending_challenges: u64,
    pub portfolios: u64,
    pub processed_transactions: u64,
}

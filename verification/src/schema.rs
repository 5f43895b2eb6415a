//! Layer 1: strict structural validation of notifier payloads.
//!
//! The notifier is untrusted input. The serde model denies unknown
//! fields and the second pass re-validates every value against the
//! domain types, so nothing downstream ever sees a malformed claim.

use serde::Deserialize;
use thiserror::Error;

use siglink_types::{Amount, SignalCode, TxId, TypeError, WalletAddress};

/// The notifier's wire shape, before any domain validation.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawNotification {
    #[serde(rename = "sourceId")]
    pub source_id: String,
    #[serde(rename = "destId")]
    pub dest_id: String,
    /// Decimal string; the notifier never sends floats we would accept.
    pub amount: String,
    #[serde(rename = "tickNumber")]
    pub tick_number: u64,
    #[serde(rename = "txId")]
    pub tx_id: String,
    #[serde(rename = "numberOfShares")]
    pub number_of_shares: u64,
}

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("not a notification object: {0}")]
    Shape(#[from] serde_json::Error),
    #[error(transparent)]
    Value(#[from] TypeError),
    #[error("tick must be positive")]
    ZeroTick,
    #[error("share count {0} out of range")]
    ShareCount(u64),
}

/// A fully validated claim, ready for on-chain confrontation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimedTransfer {
    pub source: WalletAddress,
    pub dest: WalletAddress,
    pub amount: Amount,
    pub tick: u64,
    pub tx_id: TxId,
    /// The claimed share count read as a signal code.
    pub code: SignalCode,
}

impl ClaimedTransfer {
    /// Validate one raw JSON item into a typed claim.
    pub fn from_value(raw: serde_json::Value) -> Result<Self, SchemaError> {
        let raw: RawNotification = serde_json::from_value(raw)?;
        if raw.tick_number == 0 {
            return Err(SchemaError::ZeroTick);
        }
        let code = u32::try_from(raw.number_of_shares)
            .ok()
            .filter(|&c| c > 0)
            .ok_or(SchemaError::ShareCount(raw.number_of_shares))?;

        Ok(Self {
            source: WalletAddress::parse(raw.source_id)?,
            dest: WalletAddress::parse(raw.dest_id)?,
            amount: Amount::parse(&raw.amount)?,
            tick: raw.tick_number,
            tx_id: TxId::parse(raw.tx_id)?,
            code: SignalCode::new(code),
        })
    }
}

//! Terminal outcomes of one notification.

use std::fmt;

use siglink_types::{IdentityId, WalletAddress};

/// Why a notification was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectReason {
    /// The payload did not match the notifier schema.
    InvalidSchema,
    /// The transaction is absent on chain or its recorded fields differ
    /// from the claim.
    OnChainMismatch,
    /// The ledger could not be consulted; redelivery will retry.
    GatewayUnavailable,
    /// The transaction was already accepted once.
    Replay,
    /// No live challenge matches (address, code); unrelated traffic.
    NoChallenge,
    /// The wallet is already verified property of a different identity.
    OwnershipConflict,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::InvalidSchema => "invalid-schema",
            RejectReason::OnChainMismatch => "on-chain-mismatch",
            RejectReason::GatewayUnavailable => "gateway-unavailable",
            RejectReason::Replay => "replay",
            RejectReason::NoChallenge => "no-challenge",
            RejectReason::OwnershipConflict => "ownership-conflict",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every notification ends in exactly one of these.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Accepted {
        address: WalletAddress,
        identity: IdentityId,
    },
    Rejected(RejectReason),
}

impl Outcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Outcome::Accepted { .. })
    }
}

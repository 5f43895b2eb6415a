//! Wallet address type: exactly 60 uppercase ASCII letters.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TypeError;

/// A ledger wallet address.
///
/// Always exactly [`WalletAddress::LEN`] characters drawn from `A-Z`.
/// Construction goes through [`WalletAddress::parse`], so a value of this
/// type is known to be well-formed.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WalletAddress(String);

impl WalletAddress {
    /// Fixed length of every wallet address.
    pub const LEN: usize = 60;

    /// Parse and validate a raw address string.
    pub fn parse(raw: impl Into<String>) -> Result<Self, TypeError> {
        let s = raw.into();
        if s.len() != Self::LEN || !s.bytes().all(|b| b.is_ascii_uppercase()) {
            return Err(TypeError::InvalidAddress(s));
        }
        Ok(Self(s))
    }

    /// Return the raw address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for log output: the first 12 characters.
    pub fn short(&self) -> &str {
        &self.0[..12]
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for WalletAddress {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for WalletAddress {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl From<WalletAddress> for String {
    fn from(a: WalletAddress) -> Self {
        a.0
    }
}

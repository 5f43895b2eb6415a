//! Ledger amount type.
//!
//! Amounts are exact integers (u128) in the ledger's smallest unit.
//! Floating point never appears in any amount path; wire values are
//! decimal strings parsed exactly.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TypeError;

/// A non-negative on-chain amount in raw units.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Amount(u128);

impl Amount {
    pub const ZERO: Self = Self(0);

    pub fn new(raw: u128) -> Self {
        Self(raw)
    }

    /// Parse a decimal string exactly. Rejects signs, whitespace, and
    /// anything that is not a plain run of ASCII digits.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TypeError::InvalidAmount(s.to_string()));
        }
        s.parse::<u128>()
            .map(Self)
            .map_err(|_| TypeError::InvalidAmount(s.to_string()))
    }

    pub fn raw(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Amount {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_plain_digits() {
        assert_eq!(Amount::parse("0").unwrap(), Amount::ZERO);
        assert_eq!(Amount::parse("42000").unwrap().raw(), 42000);
    }

    #[test]
    fn rejects_non_digits() {
        assert!(Amount::parse("").is_err());
        assert!(Amount::parse("-1").is_err());
        assert!(Amount::parse("+1").is_err());
        assert!(Amount::parse(" 1").is_err());
        assert!(Amount::parse("1.0").is_err());
        assert!(Amount::parse("1e3").is_err());
    }

    #[test]
    fn rejects_overflow() {
        // u128::MAX has 39 digits; 40 nines overflows.
        assert!(Amount::parse(&"9".repeat(40)).is_err());
    }

    #[test]
    fn checked_add_overflow_is_none() {
        let max = Amount::new(u128::MAX);
        assert!(max.checked_add(Amount::new(1)).is_none());
        assert_eq!(
            Amount::new(1).checked_add(Amount::new(2)),
            Some(Amount::new(3))
        );
    }

    #[test]
    fn display_matches_raw() {
        assert_eq!(Amount::new(42000).to_string(), "42000");
    }
}

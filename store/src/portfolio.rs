//! Cached portfolio aggregate storage trait.

use serde::{Deserialize, Serialize};
use siglink_types::{Amount, IdentityId, Timestamp};

use crate::StoreError;

/// Derived aggregate of an identity's verified balances.
///
/// Always recomputed and fully overwritten, never incrementally patched.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioRecord {
    pub identity: IdentityId,
    pub total_balance: Amount,
    pub updated_at: Timestamp,
}

pub trait PortfolioStore {
    fn get_portfolio(&self, identity: &IdentityId) -> Result<Option<PortfolioRecord>, StoreError>;
    fn put_portfolio(&self, record: &PortfolioRecord) -> Result<(), StoreError>;
    fn iter_portfolios(&self) -> Result<Vec<PortfolioRecord>, StoreError>;
}

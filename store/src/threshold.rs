//! Role threshold ladder storage trait.

use serde::{Deserialize, Serialize};
use siglink_types::{Amount, RoleId};

use crate::StoreError;

/// One rung of the tier ladder: holders whose aggregate balance reaches
/// `threshold` qualify for `role_id`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleThreshold {
    pub role_id: RoleId,
    pub role_name: String,
    pub threshold: Amount,
}

pub trait ThresholdStore {
    /// Insert or overwrite the rung keyed by `role_id`.
    fn put_threshold(&self, record: &RoleThreshold) -> Result<(), StoreError>;
    fn get_threshold(&self, role_id: &RoleId) -> Result<Option<RoleThreshold>, StoreError>;
    /// Delete a rung. Returns whether it existed.
    fn delete_threshold(&self, role_id: &RoleId) -> Result<bool, StoreError>;
    /// The full ladder, ordered descending by threshold. Equal thresholds
    /// are ordered by role id so the result is deterministic.
    fn thresholds_desc(&self) -> Result<Vec<RoleThreshold>, StoreError>;
}

/// Sort a ladder in the canonical resolution order.
pub fn sort_ladder(ladder: &mut [RoleThreshold]) {
    ladder.sort_by(|a, b| {
        b.threshold
            .cmp(&a.threshold)
            .then_with(|| a.role_id.cmp(&b.role_id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rung(id: &str, threshold: u128) -> RoleThreshold {
        RoleThreshold {
            role_id: RoleId::new(id),
            role_name: id.to_string(),
            threshold: Amount::new(threshold),
        }
    }

    #[test]
    fn sorts_descending_by_threshold() {
        let mut ladder = vec![rung("shark", 100), rung("whale", 1000), rung("fish", 10)];
        sort_ladder(&mut ladder);
        let ids: Vec<_> = ladder.iter().map(|r| r.role_id.as_str()).collect();
        assert_eq!(ids, ["whale", "shark", "fish"]);
    }

    #[test]
    fn equal_thresholds_break_ties_deterministically() {
        let mut ladder = vec![rung("b", 100), rung("a", 100)];
        sort_ladder(&mut ladder);
        let ids: Vec<_> = ladder.iter().map(|r| r.role_id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
    }
}

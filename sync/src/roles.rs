//! Tier-role resolution and grant/revoke deltas.

use siglink_gateway::{AuthorizationSink, SinkError};
use siglink_store::threshold::RoleThreshold;
use siglink_types::{Amount, IdentityId, RoleId};

/// The role changes applied for one identity.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RoleDelta {
    pub granted: Option<RoleId>,
    pub revoked: Vec<RoleId>,
}

impl RoleDelta {
    pub fn is_noop(&self) -> bool {
        self.granted.is_none() && self.revoked.is_empty()
    }
}

/// The highest tier whose threshold the total meets.
///
/// `ladder` must be sorted descending by threshold (the store returns it
/// that way). Monotonic in `total`: a larger balance never resolves to a
/// lower tier.
pub fn resolve_role(total: Amount, ladder: &[RoleThreshold]) -> Option<&RoleThreshold> {
    ladder.iter().find(|tier| tier.threshold <= total)
}

/// Bring the identity's downstream roles in line with `target`.
///
/// Grants the target tier when not already held and revokes every other
/// ladder role the identity holds. Roles outside the ladder are never
/// touched. Idempotent: running twice with the same inputs applies
/// nothing the second time.
pub async fn apply_role_delta(
    sink: &dyn AuthorizationSink,
    identity: &IdentityId,
    target: Option<&RoleId>,
    ladder: &[RoleThreshold],
) -> Result<RoleDelta, SinkError> {
    let held = sink.roles_of(identity).await?;
    let mut delta = RoleDelta::default();

    for tier in ladder {
        let is_target = target == Some(&tier.role_id);
        let holds = held.contains(&tier.role_id);
        if is_target && !holds {
            sink.grant_role(identity, &tier.role_id).await?;
            delta.granted = Some(tier.role_id.clone());
        } else if !is_target && holds {
            sink.revoke_role(identity, &tier.role_id).await?;
            delta.revoked.push(tier.role_id.clone());
        }
    }
    Ok(delta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use siglink_nullables::NullSink;
    use siglink_store::threshold::sort_ladder;

    fn tier(id: &str, threshold: u128) -> RoleThreshold {
        RoleThreshold {
            role_id: RoleId::new(id),
            role_name: id.to_string(),
            threshold: Amount::new(threshold),
        }
    }

    fn ladder(tiers: &[(&str, u128)]) -> Vec<RoleThreshold> {
        let mut ladder: Vec<_> = tiers.iter().map(|(id, t)| tier(id, *t)).collect();
        sort_ladder(&mut ladder);
        ladder
    }

    #[test]
    fn shark_whale_scenario() {
        let ladder = ladder(&[("shark", 100), ("whale", 1000)]);

        let at = |balance: u128| {
            resolve_role(Amount::new(balance), &ladder).map(|t| t.role_id.as_str().to_string())
        };
        assert_eq!(at(999), Some("shark".to_string()));
        assert_eq!(at(1000), Some("whale".to_string()));
        assert_eq!(at(50), None);
    }

    #[test]
    fn empty_ladder_resolves_to_none() {
        assert!(resolve_role(Amount::new(1_000_000), &[]).is_none());
    }

    #[tokio::test]
    async fn grants_target_and_revokes_other_tiers() {
        let sink = NullSink::new();
        let identity = IdentityId::parse("alice").unwrap();
        let ladder = ladder(&[("shark", 100), ("whale", 1000), ("fish", 10)]);
        sink.seed_roles(
            identity.clone(),
            vec![RoleId::new("fish"), RoleId::new("moderator")],
        );

        let delta = apply_role_delta(&sink, &identity, Some(&RoleId::new("whale")), &ladder)
            .await
            .unwrap();

        assert_eq!(delta.granted, Some(RoleId::new("whale")));
        assert_eq!(delta.revoked, vec![RoleId::new("fish")]);
        // Non-ladder roles survive untouched.
        assert!(sink.held_roles(&identity).contains(&RoleId::new("moderator")));
    }

    #[tokio::test]
    async fn delta_is_idempotent() {
        let sink = NullSink::new();
        let identity = IdentityId::parse("alice").unwrap();
        let ladder = ladder(&[("shark", 100)]);
        let target = RoleId::new("shark");

        let first = apply_role_delta(&sink, &identity, Some(&target), &ladder)
            .await
            .unwrap();
        assert_eq!(first.granted, Some(target.clone()));

        let second = apply_role_delta(&sink, &identity, Some(&target), &ladder)
            .await
            .unwrap();
        assert!(second.is_noop());
        assert_eq!(sink.grants().len(), 1);
    }

    #[tokio::test]
    async fn none_target_revokes_every_held_tier() {
        let sink = NullSink::new();
        let identity = IdentityId::parse("alice").unwrap();
        let ladder = ladder(&[("shark", 100), ("whale", 1000)]);
        sink.seed_roles(identity.clone(), vec![RoleId::new("whale")]);

        let delta = apply_role_delta(&sink, &identity, None, &ladder)
            .await
            .unwrap();
        assert!(delta.granted.is_none());
        assert_eq!(delta.revoked, vec![RoleId::new("whale")]);
    }

    proptest! {
        #[test]
        fn resolve_role_is_monotonic(lo in 0u128..1_000_000, delta in 0u128..1_000_000) {
            let ladder = ladder(&[("fish", 10), ("shark", 100), ("whale", 1000), ("kraken", 500_000)]);
            let rank = |balance: u128| -> usize {
                match resolve_role(Amount::new(balance), &ladder) {
                    // Higher threshold = higher rank; none ranks lowest.
                    Some(t) => ladder.len() - ladder.iter().position(|x| x.role_id == t.role_id).unwrap(),
                    None => 0,
                }
            };
            prop_assert!(rank(lo + delta) >= rank(lo));
        }
    }
}

use proptest::prelude::*;

use siglink_types::{Amount, Timestamp, TxId, WalletAddress};

proptest! {
    /// Addresses parse iff they are exactly 60 uppercase ASCII letters.
    #[test]
    fn address_accepts_exactly_60_uppercase(s in "[A-Z]{60}") {
        let address = WalletAddress::parse(s.clone()).unwrap();
        prop_assert_eq!(address.as_str(), s.as_str());
    }

    #[test]
    fn address_rejects_wrong_lengths(s in "[A-Z]{1,59}") {
        prop_assert!(WalletAddress::parse(s).is_err());
    }

    #[test]
    fn address_rejects_any_non_uppercase_byte(
        prefix in "[A-Z]{0,59}",
        bad in "[a-z0-9 !@#]",
    ) {
        let mut s = prefix;
        s.push_str(&bad);
        while s.len() < 60 {
            s.push('A');
        }
        prop_assert!(WalletAddress::parse(s).is_err());
    }

    /// Tx ids parse iff they are exactly 60 lowercase alphanumerics.
    #[test]
    fn tx_id_accepts_exactly_60_lower_alnum(s in "[a-z0-9]{60}") {
        let id = TxId::parse(s.clone()).unwrap();
        prop_assert_eq!(id.as_str(), s.as_str());
    }

    #[test]
    fn tx_id_rejects_uppercase(s in "[a-z0-9]{59}") {
        let mut s = s;
        s.push('A');
        prop_assert!(TxId::parse(s).is_err());
    }

    /// Amount parsing is exact: Display output parses back to the same value.
    #[test]
    fn amount_display_parse_roundtrip(raw in 0u128..u128::MAX) {
        let amount = Amount::new(raw);
        prop_assert_eq!(Amount::parse(&amount.to_string()).unwrap(), amount);
    }

    /// A parsed amount always equals the digit string it came from.
    #[test]
    fn amount_parse_matches_value(raw in 0u128..1_000_000_000_000) {
        let amount = Amount::parse(&raw.to_string()).unwrap();
        prop_assert_eq!(amount.raw(), raw);
    }

    /// checked_add agrees with u128 addition when no overflow.
    #[test]
    fn amount_checked_add(a in 0u128..u128::MAX / 2, b in 0u128..u128::MAX / 2) {
        let sum = Amount::new(a).checked_add(Amount::new(b));
        prop_assert_eq!(sum, Some(Amount::new(a + b)));
    }

    /// Timestamp ordering mirrors the underlying seconds.
    #[test]
    fn timestamp_ordering(a in 0u64..u64::MAX, b in 0u64..u64::MAX) {
        let ta = Timestamp::new(a);
        let tb = Timestamp::new(b);
        prop_assert_eq!(ta <= tb, a <= b);
        prop_assert_eq!(ta == tb, a == b);
    }

    /// A deadline is past exactly when now has reached it.
    #[test]
    fn timestamp_is_past_is_inclusive(deadline in 0u64..1_000_000, now in 0u64..1_000_000) {
        prop_assert_eq!(
            Timestamp::new(deadline).is_past(Timestamp::new(now)),
            deadline <= now
        );
    }

    /// elapsed_since saturates rather than underflowing.
    #[test]
    fn timestamp_elapsed_since(base in 0u64..1_000_000, offset in 0u64..1_000_000) {
        let t = Timestamp::new(base);
        prop_assert_eq!(t.elapsed_since(Timestamp::new(base + offset)), offset);
        prop_assert_eq!(Timestamp::new(base + offset).elapsed_since(t), 0);
    }
}

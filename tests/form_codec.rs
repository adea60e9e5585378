use std::collections::BTreeMap;

use oauth2_wire::{FormUrlEncoded, escape, unescape};
use proptest::prelude::*;

proptest! {
    #[test]
    fn decode_inverts_encode(map in prop::collection::btree_map("[^&=]*", "[^&=]*", 0..8)) {
        // An empty key with an empty value still encodes as "=", so every map round-trips.
        let form = FormUrlEncoded::from(map.clone());
        let decoded = FormUrlEncoded::decode(&form.encode()).unwrap();
        prop_assert_eq!(decoded.into_map(), map);
    }

    #[test]
    fn unescape_inverts_escape(input in any::<String>()) {
        prop_assert_eq!(unescape(&escape(&input)).unwrap(), input);
    }

    #[test]
    fn escaped_text_holds_no_delimiters(input in "[:#\\[\\]@!$&'()*+,;= a-z/?]*") {
        let escaped = escape(&input);
        prop_assert!(!escaped.contains(|c: char| ":#[]@!$&'()*+,;= ".contains(c)));
    }

    #[test]
    fn encoding_is_deterministic(map in prop::collection::btree_map("[a-z_]{1,12}", ".*", 0..6)) {
        let first = FormUrlEncoded::from(map.clone()).encode();
        let second: FormUrlEncoded = map.into_iter().rev().collect();
        prop_assert_eq!(first, second.encode());
    }
}

#[test]
fn empty_map_round_trips() {
    let form = FormUrlEncoded::from(BTreeMap::new());
    assert!(FormUrlEncoded::decode(&form.encode()).unwrap().is_empty());
}

//! Property-based tests for the canonicalizer, covering §8's canonicalization
//! determinism and canonical-equality invariants across arbitrary records.

use proof_canon::canonize;
use proptest::prelude::*;
use serde_json::Value;

fn arb_json(max_depth: u32) -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        any::<bool>().prop_map(Value::Bool),
        Just(Value::Null),
        any::<i32>().prop_map(|n| Value::Number(n.into())),
        "[a-zA-Z0-9 _-]{0,32}".prop_map(Value::String),
    ];
    leaf.prop_recursive(max_depth, 128, 8, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::hash_map("[a-zA-Z_][a-zA-Z0-9_]{0,12}", inner, 0..6)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(400))]

    /// Two canonicalizations of the same record on the same run produce
    /// byte-identical output (determinism).
    #[test]
    fn canonization_is_deterministic(v in arb_json(3)) {
        if let Ok(first) = canonize(&v) {
            let second = canonize(&v).unwrap();
            prop_assert_eq!(first, second);
        }
    }

    /// Canonical bytes always round-trip to an equivalent value.
    #[test]
    fn canonical_bytes_parse_back_to_an_equivalent_value(v in arb_json(3)) {
        if let Ok(bytes) = canonize(&v) {
            let s = std::str::from_utf8(&bytes).expect("canonical output must be UTF-8");
            let reparsed: Value = serde_json::from_str(s).expect("canonical output must parse");
            prop_assert_eq!(v, reparsed);
        }
    }

    /// Reordering an object's keys never changes its canonical bytes.
    #[test]
    fn key_order_does_not_affect_canonical_bytes(
        keys in prop::collection::hash_set("[a-z]{1,8}", 1..6),
    ) {
        let keys: Vec<String> = keys.into_iter().collect();
        let mut forward = serde_json::Map::new();
        let mut reversed = serde_json::Map::new();
        for (i, k) in keys.iter().enumerate() {
            forward.insert(k.clone(), Value::Number((i as i64).into()));
        }
        for (i, k) in keys.iter().rev().enumerate() {
            reversed.insert(k.clone(), Value::Number(((keys.len() - 1 - i) as i64).into()));
        }
        let a = canonize(&Value::Object(forward)).unwrap();
        let b = canonize(&Value::Object(reversed)).unwrap();
        prop_assert_eq!(a, b);
    }

    /// Adding a null-valued field to an object never changes its canonical
    /// bytes relative to the object without that field.
    #[test]
    fn null_valued_fields_do_not_affect_canonical_bytes(
        key in "[a-z]{1,8}",
        extra_key in "[a-z]{1,8}",
        value in any::<i32>(),
    ) {
        prop_assume!(key != extra_key);
        let mut without = serde_json::Map::new();
        without.insert(key.clone(), Value::Number(value.into()));
        let mut with_null = without.clone();
        with_null.insert(extra_key, Value::Null);
        let a = canonize(&Value::Object(without)).unwrap();
        let b = canonize(&Value::Object(with_null)).unwrap();
        prop_assert_eq!(a, b);
    }
}

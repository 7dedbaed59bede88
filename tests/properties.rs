use dragon_cfg::{Node, Plain, Value};
use indexmap::IndexMap;
use proptest::prelude::*;

fn scalar() -> impl Strategy<Value = Plain> {
    prop_oneof![
        Just(Plain::Null),
        any::<bool>().prop_map(Plain::Bool),
        any::<i64>().prop_map(Plain::Int),
        (-1.0e6..1.0e6f64).prop_map(Plain::Float),
        "[a-z ]{0,8}".prop_map(Plain::Str),
    ]
}

fn mapping(inner: impl Strategy<Value = Plain>) -> impl Strategy<Value = IndexMap<String, Plain>> {
    prop::collection::vec(("[a-z]{1,6}", inner), 0..5)
        .prop_map(|pairs| pairs.into_iter().collect::<IndexMap<_, _>>())
}

fn plain() -> impl Strategy<Value = Plain> {
    scalar().prop_recursive(4, 48, 5, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Plain::List),
            prop::collection::vec(inner.clone(), 0..4).prop_map(Plain::Tuple),
            mapping(inner).prop_map(Plain::Map),
        ]
    })
}

fn tree() -> impl Strategy<Value = Node> {
    mapping(plain()).prop_map(Node::from_map)
}

proptest! {
    #[test]
    fn deep_copy_matches_and_is_independent(node in tree(), frozen in any::<bool>()) {
        node.freeze(frozen);
        let before = node.to_plain().unwrap();
        let copy = node.deep_copy();
        prop_assert_eq!(copy.to_plain().unwrap(), before.clone());
        prop_assert_eq!(copy.is_frozen(), frozen);

        copy.unfreeze();
        copy.set("__extra__", 1).unwrap();
        for key in copy.keys() {
            if let Value::Node(child) = copy.get(&key).unwrap() {
                child.set("__extra__", 1).unwrap();
            }
        }
        prop_assert_eq!(node.to_plain().unwrap(), before);
    }

    #[test]
    fn plain_round_trip_is_idempotent(node in tree()) {
        let plain = node.to_plain().unwrap();
        let rewrapped = Node::from_plain(plain.clone()).unwrap();
        prop_assert_eq!(rewrapped.to_plain().unwrap(), plain);
    }

    #[test]
    fn reads_never_add_keys(node in tree(), key in "[A-Z]{1,4}", nested in "[A-Z]{1,4}") {
        let before = node.to_plain().unwrap();
        let detached = node.child(&key).unwrap();
        let _ = detached.get(&nested).unwrap();
        prop_assert_eq!(node.to_plain().unwrap(), before);
    }

    #[test]
    fn merge_keeps_both_sides(left in tree(), right in tree()) {
        let merged = left.merged_with(&right).unwrap();
        for key in right.keys() {
            prop_assert!(merged.contains_key(&key));
        }
        for key in left.keys() {
            prop_assert!(merged.contains_key(&key));
        }
    }
}

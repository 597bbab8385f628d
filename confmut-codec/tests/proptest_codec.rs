//! Property-based tests: parse -> encode -> parse is structurally stable
//! for JSON and YAML.

use confmut_codec::{Format, encode, parse};
use confmut_doc::{ConfigDocument, Node};
use confmut_types::Scalar;
use proptest::prelude::*;

fn arb_scalar() -> impl Strategy<Value = Scalar> {
    prop_oneof![
        Just(Scalar::Null),
        any::<bool>().prop_map(Scalar::Bool),
        any::<i64>().prop_map(Scalar::Integer),
        (-1.0e9f64..1.0e9).prop_map(Scalar::Float),
        "x[a-z0-9_]{0,10}".prop_map(Scalar::String),
    ]
}

fn arb_doc() -> impl Strategy<Value = ConfigDocument> {
    let leaf = arb_scalar().prop_map(Node::Scalar);
    let tree = leaf.prop_recursive(3, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(|items| Node::sequence(items)),
            prop::collection::btree_map("[a-z][a-z0-9_]{0,5}", inner, 0..4)
                .prop_map(|entries| Node::mapping(entries)),
        ]
    });
    prop::collection::btree_map("[a-z][a-z0-9_]{0,5}", tree, 0..5)
        .prop_map(|entries| ConfigDocument::new(Node::mapping(entries)))
}

proptest! {
    #[test]
    fn json_reencode_is_stable(doc in arb_doc()) {
        let text = encode(Format::Json, &doc).unwrap();
        let back = parse(Format::Json, &text).unwrap();
        prop_assert_eq!(back, doc);
    }

    #[test]
    fn yaml_reencode_is_stable(doc in arb_doc()) {
        let text = encode(Format::Yaml, &doc).unwrap();
        let back = parse(Format::Yaml, &text).unwrap();
        prop_assert_eq!(back, doc);
    }
}

#![no_main]

//! Mutate arbitrary scalars under arbitrary boundaries. A successful
//! mutation must differ from the original and, for declared boundaries,
//! stay inside them.

use confmut_mutate::{MutationRng, mutate_value, validate_boundary};
use confmut_types::{Boundary, Scalar};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, arbitrary::Arbitrary)]
enum FuzzScalar {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl From<FuzzScalar> for Scalar {
    fn from(value: FuzzScalar) -> Self {
        match value {
            FuzzScalar::Null => Scalar::Null,
            FuzzScalar::Bool(b) => Scalar::Bool(b),
            FuzzScalar::Integer(i) => Scalar::Integer(i),
            FuzzScalar::Float(f) => Scalar::Float(f),
            FuzzScalar::String(s) => Scalar::String(s),
        }
    }
}

#[derive(Debug, arbitrary::Arbitrary)]
enum FuzzBoundary {
    Integer(i64, i64),
    Float(f64, f64),
    Candidates(Vec<String>),
    Rule(Option<u8>, Option<u8>, Option<String>),
    Corrupt,
    Boolean,
    Enum(Vec<i64>),
}

impl From<FuzzBoundary> for Boundary {
    fn from(value: FuzzBoundary) -> Self {
        match value {
            FuzzBoundary::Integer(min, max) => Boundary::Integer { min, max },
            FuzzBoundary::Float(min, max) => Boundary::Float { min, max },
            FuzzBoundary::Candidates(candidates) => Boundary::String {
                candidates,
                min_len: None,
                max_len: None,
                charset: None,
            },
            FuzzBoundary::Rule(min_len, max_len, charset) => Boundary::String {
                candidates: Vec::new(),
                min_len: min_len.map(usize::from),
                max_len: max_len.map(usize::from),
                charset,
            },
            FuzzBoundary::Corrupt => Boundary::any_string(),
            FuzzBoundary::Boolean => Boundary::Boolean,
            FuzzBoundary::Enum(values) => Boundary::Enum {
                values: values.into_iter().map(Scalar::Integer).collect(),
            },
        }
    }
}

#[derive(Debug, arbitrary::Arbitrary)]
struct FuzzInput {
    seed: u64,
    boundary: FuzzBoundary,
    original: FuzzScalar,
}

fuzz_target!(|input: FuzzInput| {
    let boundary = Boundary::from(input.boundary);
    if validate_boundary(&boundary).is_err() {
        return;
    }
    let original = Scalar::from(input.original);
    let mut rng = MutationRng::seeded(input.seed);
    let Ok((value, strategy)) = mutate_value(&boundary, &original, &mut rng) else {
        return;
    };
    assert_ne!(value, original);
    if strategy.is_none() {
        assert!(boundary.contains(&value), "{value} escaped {boundary:?}");
    }
});

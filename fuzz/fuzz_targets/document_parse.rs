#![no_main]

//! Parse arbitrary text in each supported format, then re-encode it and
//! check that every leaf survives the trip. Walked paths must resolve and
//! update in place.

use confmut_codec::{Format, encode, parse};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, arbitrary::Arbitrary)]
struct FuzzInput {
    format: FuzzFormat,
    text: String,
}

#[derive(Debug, arbitrary::Arbitrary)]
enum FuzzFormat {
    Yaml,
    Json,
    Toml,
}

fuzz_target!(|input: FuzzInput| {
    let format = match input.format {
        FuzzFormat::Yaml => Format::Yaml,
        FuzzFormat::Json => Format::Json,
        FuzzFormat::Toml => Format::Toml,
    };
    let Ok(doc) = parse(format, &input.text) else {
        return;
    };
    let paths: Vec<_> = doc.leaves().map(|(path, _)| path).collect();
    for path in &paths {
        assert!(doc.get(path).is_ok(), "walked path {path} does not resolve");
    }
    if let Some(first) = paths.first() {
        let updated = doc
            .update(first, confmut_types::Scalar::Bool(true))
            .expect("walked path updates");
        assert_eq!(updated.get(first), Ok(&confmut_types::Scalar::Bool(true)));
    }
    // Encoding may legitimately fail, e.g. nulls in TOML.
    let Ok(text) = encode(format, &doc) else {
        return;
    };
    if let Ok(back) = parse(format, &text) {
        assert_eq!(back.leaf_count(), doc.leaf_count());
    }
});

use camino::Utf8PathBuf;
use confmut_codec::{CodecError, Format, load};
use confmut_types::{LeafPath, Scalar};
use fs_err as fs;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn write(dir: &TempDir, name: &str, contents: &str) -> Utf8PathBuf {
    let path = Utf8PathBuf::from_path_buf(dir.path().join(name)).expect("utf8 temp path");
    fs::write(&path, contents).expect("write fixture");
    path
}

fn p(s: &str) -> LeafPath {
    s.parse().unwrap()
}

#[test]
fn loads_json_and_re_encodes_mutation() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "svc.json", r#"{"timeout": 30, "mode": "strict"}"#);

    let loaded = load(&path).expect("load");
    assert_eq!(loaded.format, Format::Json);
    assert_eq!(loaded.document.leaf_count(), 2);

    let edits = vec![(p("timeout"), Scalar::Integer(3))];
    let mutated = loaded.document.update(&edits[0].0, edits[0].1.clone()).unwrap();
    let text = loaded.render(&mutated, &edits).unwrap();
    assert_eq!(text, "{\n  \"timeout\": 3,\n  \"mode\": \"strict\"\n}\n");
}

#[test]
fn toml_render_patches_the_original_text() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "svc.toml",
        "# keep me\ntimeout = 30  # seconds\n\n[db]\nport = 5432\n",
    );

    let loaded = load(&path).expect("load");
    let edits = vec![(p("db.port"), Scalar::Integer(1))];
    let mutated = loaded.document.update(&edits[0].0, edits[0].1.clone()).unwrap();
    let text = loaded.render(&mutated, &edits).unwrap();
    assert_eq!(text, "# keep me\ntimeout = 30  # seconds\n\n[db]\nport = 1\n");
}

#[test]
fn yaml_yml_extension_is_accepted() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "svc.yml", "retries: 3\n");
    let loaded = load(&path).expect("load");
    assert_eq!(loaded.format, Format::Yaml);
    assert_eq!(loaded.document.get(&p("retries")), Ok(&Scalar::Integer(3)));
}

#[test]
fn unknown_extension_and_missing_file_fail() {
    let dir = TempDir::new().unwrap();
    let ini = write(&dir, "svc.ini", "a=1\n");
    assert!(matches!(load(&ini), Err(CodecError::UnsupportedFormat { .. })));

    let missing = Utf8PathBuf::from_path_buf(dir.path().join("gone.json")).unwrap();
    assert!(matches!(load(&missing), Err(CodecError::Io(_))));
}

#[test]
fn malformed_document_is_a_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "svc.toml", "timeout = = 3\n");
    let err = load(&path).unwrap_err();
    assert!(matches!(err, CodecError::Parse { format: Format::Toml, .. }), "{err}");
}

//! Document codecs for confmut.
//!
//! Responsibilities:
//! - Pick a format from the file extension.
//! - Parse JSON, YAML and TOML text into a [`ConfigDocument`].
//! - Write documents back: JSON and YAML are re-encoded, TOML is patched in
//!   place with `toml_edit` so comments and layout survive.

use camino::{Utf8Path, Utf8PathBuf};
use confmut_doc::ConfigDocument;
use confmut_types::{LeafPath, Scalar};
use fs_err as fs;
use tracing::debug;

mod error;
mod json;
mod toml_text;
mod yaml;

pub use error::CodecError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Json,
    Yaml,
    Toml,
}

impl Format {
    pub fn from_path(path: &Utf8Path) -> Result<Self, CodecError> {
        match path.extension().map(|e| e.to_ascii_lowercase()).as_deref() {
            Some("json") => Ok(Format::Json),
            Some("yaml") | Some("yml") => Ok(Format::Yaml),
            Some("toml") => Ok(Format::Toml),
            _ => Err(CodecError::UnsupportedFormat {
                path: path.to_string(),
            }),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Yaml => "yaml",
            Format::Toml => "toml",
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

pub fn parse(format: Format, text: &str) -> Result<ConfigDocument, CodecError> {
    match format {
        Format::Json => json::parse(text),
        Format::Yaml => yaml::parse(text),
        Format::Toml => toml_text::parse(text),
    }
}

/// Encode a whole document.
pub fn encode(format: Format, doc: &ConfigDocument) -> Result<String, CodecError> {
    match format {
        Format::Json => json::encode(doc),
        Format::Yaml => yaml::encode(doc),
        Format::Toml => toml_text::encode(doc),
    }
}

/// Rewrite only the given leaves of a TOML source text.
pub fn patch_toml(source: &str, edits: &[(LeafPath, Scalar)]) -> Result<String, CodecError> {
    toml_text::patch(source, edits)
}

/// A document read from disk together with its original text.
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub path: Utf8PathBuf,
    pub format: Format,
    pub source: String,
    pub document: ConfigDocument,
}

impl LoadedDocument {
    /// Text for `mutated`, which differs from the loaded document at `edits`.
    pub fn render(
        &self,
        mutated: &ConfigDocument,
        edits: &[(LeafPath, Scalar)],
    ) -> Result<String, CodecError> {
        match self.format {
            Format::Toml => patch_toml(&self.source, edits),
            format => encode(format, mutated),
        }
    }
}

pub fn load(path: &Utf8Path) -> Result<LoadedDocument, CodecError> {
    let format = Format::from_path(path)?;
    let source = fs::read_to_string(path)?;
    let document = parse(format, &source)?;
    debug!(path = %path, %format, leaves = document.leaf_count(), "loaded document");
    Ok(LoadedDocument {
        path: path.to_path_buf(),
        format,
        source,
        document,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_follows_extension() {
        let fmt = |p: &str| Format::from_path(Utf8Path::new(p));
        assert_eq!(fmt("a/b.JSON").unwrap(), Format::Json);
        assert_eq!(fmt("c.yml").unwrap(), Format::Yaml);
        assert_eq!(fmt("c.yaml").unwrap(), Format::Yaml);
        assert_eq!(fmt("Cargo.toml").unwrap(), Format::Toml);
        assert!(matches!(
            fmt("settings.ini"),
            Err(CodecError::UnsupportedFormat { .. })
        ));
        assert!(fmt("noext").is_err());
    }
}

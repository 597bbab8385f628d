//! Error types for confmut-codec.

use crate::Format;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    /// The file extension names no supported format.
    #[error("unsupported config format for '{path}' (expected .json, .yaml, .yml or .toml)")]
    UnsupportedFormat { path: String },

    #[error("failed to parse {format} document: {message}")]
    Parse { format: Format, message: String },

    /// The document cannot be written back in its format.
    #[error("cannot serialize {format} document: {message}")]
    Serialization { format: Format, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CodecError {
    pub(crate) fn parse(format: Format, message: impl ToString) -> Self {
        CodecError::Parse {
            format,
            message: message.to_string(),
        }
    }

    pub(crate) fn serialization(format: Format, message: impl ToString) -> Self {
        CodecError::Serialization {
            format,
            message: message.to_string(),
        }
    }

    pub fn is_serialization(&self) -> bool {
        matches!(self, CodecError::Serialization { .. })
    }
}

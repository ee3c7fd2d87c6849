//! Errors raised while decoding a specs index.

use std::io;

use thiserror::Error;

/// The index body could not be decompressed or deserialized.
#[derive(Debug, Error)]
pub enum FormatError {
    /// The gzip stream was corrupt or truncated.
    #[error("failed to decompress index: {0}")]
    Decompress(#[source] io::Error),

    /// The Marshal header names a version this reader does not understand.
    #[error("unsupported Marshal version {major}.{minor}")]
    UnsupportedVersion { major: u8, minor: u8 },

    /// The stream ended in the middle of a value.
    #[error("unexpected end of Marshal data at offset {offset}")]
    UnexpectedEof { offset: usize },

    /// An unrecognised type tag.
    #[error("unknown Marshal type tag 0x{tag:02x} at offset {offset}")]
    UnknownTag { tag: u8, offset: usize },

    /// A length field was negative.
    #[error("invalid length {length} at offset {offset}")]
    InvalidLength { length: i64, offset: usize },

    /// An object or symbol back-reference points nowhere usable.
    #[error("invalid back-reference {index} at offset {offset}")]
    InvalidLink { index: usize, offset: usize },

    /// A float payload was not a number.
    #[error("invalid float at offset {offset}")]
    InvalidFloat { offset: usize },

    /// Containers are nested deeper than the reader allows.
    #[error("nesting deeper than {limit} levels")]
    DepthExceeded { limit: usize },

    /// A name or version string was not valid UTF-8.
    #[error("entry {entry}: {field} is not valid UTF-8")]
    InvalidUtf8 { entry: usize, field: &'static str },

    /// The decoded object graph is not a list of spec tuples.
    #[error("{}", shape_message(.entry, .reason))]
    UnexpectedShape { entry: Option<usize>, reason: String },
}

fn shape_message(entry: &Option<usize>, reason: &str) -> String {
    match entry {
        Some(index) => format!("unexpected index shape at entry {}: {}", index, reason),
        None => format!("unexpected index shape: {}", reason),
    }
}

impl FormatError {
    pub(crate) fn shape(entry: usize, reason: impl Into<String>) -> Self {
        Self::UnexpectedShape {
            entry: Some(entry),
            reason: reason.into(),
        }
    }
}

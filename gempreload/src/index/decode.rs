//! Decompression and entry mapping for specs index bodies.

use std::io::Read;

use flate2::read::GzDecoder;
use tracing::debug;

use super::error::FormatError;
use super::marshal::{self, Value};
use super::types::{DecodedIndex, PackageIdentifier};

const GEM_VERSION_CLASS: &str = "Gem::Version";

/// Decompress a gzipped specs index and decode its entries.
pub fn decode_index(compressed: &[u8]) -> Result<DecodedIndex, FormatError> {
    let payload = gunzip(compressed)?;
    debug!(
        compressed = compressed.len(),
        decompressed = payload.len(),
        "Decompressed specs index"
    );
    decode_payload(&payload)
}

/// Inflate a gzip stream fully into memory.
pub fn gunzip(compressed: &[u8]) -> Result<Vec<u8>, FormatError> {
    let mut payload = Vec::new();
    GzDecoder::new(compressed)
        .read_to_end(&mut payload)
        .map_err(FormatError::Decompress)?;
    Ok(payload)
}

/// Decode an uncompressed Marshal payload of `[name, version, platform]`
/// tuples. The platform element is not retained.
pub fn decode_payload(payload: &[u8]) -> Result<DecodedIndex, FormatError> {
    let root = marshal::load(payload)?;
    let tuples = root.as_array().ok_or_else(|| FormatError::UnexpectedShape {
        entry: None,
        reason: "root object is not an array".to_string(),
    })?;

    let entries = tuples
        .iter()
        .enumerate()
        .map(|(index, tuple)| identifier_from_tuple(index, tuple))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DecodedIndex::new(entries))
}

fn identifier_from_tuple(index: usize, tuple: &Value) -> Result<PackageIdentifier, FormatError> {
    let fields = tuple
        .as_array()
        .ok_or_else(|| FormatError::shape(index, "entry is not an array"))?;

    let (name, version) = match fields {
        [name, version, ..] => (name, version),
        _ => {
            return Err(FormatError::shape(
                index,
                format!("expected at least 2 fields, found {}", fields.len()),
            ))
        }
    };

    let name = name
        .as_bytes()
        .ok_or_else(|| FormatError::shape(index, "name is not a string"))?;
    let version = version_bytes(version)
        .ok_or_else(|| FormatError::shape(index, "version is not a string or Gem::Version"))?;

    Ok(PackageIdentifier::new(
        utf8(index, "name", name)?,
        utf8(index, "version", version)?,
    ))
}

/// Versions appear either as plain strings or as serialized `Gem::Version`
/// objects, depending on the repository software that wrote the index.
fn version_bytes(value: &Value) -> Option<&[u8]> {
    match value {
        Value::String(bytes) => Some(bytes),
        _ if value.class_name() != Some(GEM_VERSION_CLASS) => None,
        Value::UserMarshal { data, .. } => data.as_array()?.first()?.as_bytes(),
        Value::UserDefined { data, .. } => Some(data),
        Value::Object { .. } => value.ivar("@version")?.as_bytes(),
        _ => None,
    }
}

fn utf8(entry: usize, field: &'static str, bytes: &[u8]) -> Result<String, FormatError> {
    String::from_utf8(bytes.to_vec()).map_err(|_| FormatError::InvalidUtf8 { entry, field })
}

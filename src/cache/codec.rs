//! Key & Payload Codec
//!
//! Derives cache keys from a request's path and query parameters, and wraps
//! payloads in a self-describing envelope: bodies above the compression
//! threshold are zlib-compressed and prefixed with [`COMPRESSED_MARKER`],
//! everything else is stored as-is.

use std::fmt;
use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use sha2::{Digest, Sha256};

use crate::error::CodecError;

/// Envelope tag identifying a compressed payload.
pub const COMPRESSED_MARKER: &[u8] = b"COMPRESSED:";

/// Namespace prefix shared by every derived key.
pub const KEY_PREFIX: &str = "cache";

// == Cache Key ==
/// Key derived from a request path and its query parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// == Derive Key ==
/// Builds `cache:{path}:{sha256 of the sorted parameters}`.
///
/// Parameters are treated as a multiset: insertion order is irrelevant and
/// repeated names are kept. Each name and value is length-prefixed before
/// hashing so that `("ab", "c")` and `("a", "bc")` cannot collide.
pub fn derive_key<I, K, V>(path: &str, params: I) -> CacheKey
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut pairs: Vec<(K, V)> = params.into_iter().collect();
    pairs.sort_by(|a, b| {
        (a.0.as_ref(), a.1.as_ref()).cmp(&(b.0.as_ref(), b.1.as_ref()))
    });

    let mut hasher = Sha256::new();
    for (name, value) in &pairs {
        for field in [name.as_ref(), value.as_ref()] {
            hasher.update((field.len() as u64).to_be_bytes());
            hasher.update(field.as_bytes());
        }
    }

    CacheKey(format!(
        "{}:{}:{}",
        KEY_PREFIX,
        path,
        hex::encode(hasher.finalize())
    ))
}

// == Encode ==
/// Wraps `payload` in the cache envelope.
///
/// Payloads longer than `threshold_bytes` are compressed. A short payload that
/// already starts with the marker is compressed as well, otherwise `decode`
/// could not tell it apart from a real envelope.
pub fn encode(payload: &[u8], threshold_bytes: usize) -> Result<Vec<u8>, CodecError> {
    if payload.len() <= threshold_bytes && !payload.starts_with(COMPRESSED_MARKER) {
        return Ok(payload.to_vec());
    }

    let mut encoder = ZlibEncoder::new(COMPRESSED_MARKER.to_vec(), Compression::default());
    encoder.write_all(payload).map_err(CodecError::Compress)?;
    encoder.finish().map_err(CodecError::Compress)
}

// == Decode ==
/// Inverse of [`encode`].
pub fn decode(bytes: &[u8]) -> Result<Vec<u8>, CodecError> {
    match bytes.strip_prefix(COMPRESSED_MARKER) {
        Some(compressed) => {
            let mut decoder = ZlibDecoder::new(compressed);
            let mut out = Vec::with_capacity(compressed.len() * 2);
            decoder.read_to_end(&mut out).map_err(CodecError::Corrupt)?;
            Ok(out)
        }
        None => Ok(bytes.to_vec()),
    }
}

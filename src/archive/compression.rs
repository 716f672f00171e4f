//! zstd compression for entry payloads and the outer archive layer

use crate::archive::format::zstd_level;
use crate::error::{BroccoliError, Result};
use std::io::{self, Read};

/// Compress `data` at a 0-11 quality level
pub fn compress(data: &[u8], quality: u8) -> io::Result<Vec<u8>> {
    zstd::encode_all(data, zstd_level(quality))
}

/// Decompress `data`, reading at most `limit + 1` bytes so callers can
/// tell an exact fit from an overflow.
pub fn decompress_bounded(data: &[u8], limit: u64) -> io::Result<Vec<u8>> {
    let decoder = zstd::stream::read::Decoder::new(data)?;
    let mut output = Vec::new();
    decoder.take(limit.saturating_add(1)).read_to_end(&mut output)?;
    Ok(output)
}

/// Decompress a file payload whose plaintext must be exactly `size` bytes
pub(crate) fn decompress_entry(path: &str, data: &[u8], size: u64) -> Result<Vec<u8>> {
    let plain = decompress_bounded(data, size).map_err(|e| BroccoliError::DecompressionFailed {
        path: path.to_string(),
        reason: e.to_string(),
    })?;

    if plain.len() as u64 != size {
        return Err(BroccoliError::Corrupt(format!(
            "{}: expected {} bytes, decompressed {}",
            path,
            size,
            plain.len()
        )));
    }
    Ok(plain)
}

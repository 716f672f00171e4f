//! Text-safe wrapping for archives embedded in generated source

use crate::error::Result;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Encode archive bytes as standard base64
pub fn encode(archive: &[u8]) -> String {
    STANDARD.encode(archive)
}

/// Decode archive bytes from standard base64, ignoring surrounding whitespace
pub fn decode(text: &str) -> Result<Vec<u8>> {
    Ok(STANDARD.decode(text.trim())?)
}

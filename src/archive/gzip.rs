//! Gzip framing detection and decompression.

use std::io::Read;

use flate2::read::GzDecoder;

use crate::error::{Error, Result};

/// True when the buffer starts with a gzip member header (deflate method).
pub fn is_gzip(buf: &[u8]) -> bool {
    buf.len() >= 3 && buf[0] == 0x1F && buf[1] == 0x8B && buf[2] == 0x08
}

/// Decompress one gzip stream into a fully materialized buffer.
///
/// The inner bytes are commonly a tar archive but can be anything; the
/// caller re-sniffs the result.
pub fn gunzip(buf: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(buf);
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|e| Error::Decompression(e.to_string()))?;
    Ok(decompressed)
}

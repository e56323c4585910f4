//! ZIP archive detection and in-memory extraction.
//!
//! ## Architecture
//!
//! - [`structures`]: data structures for the ZIP format elements (EOCD,
//!   ZIP64 records, header constants)
//! - [`parser`]: central-directory parsing and member decompression over
//!   the downloaded payload
//!
//! The archive is read back-to-front: End of Central Directory first, then
//! the Central Directory for member metadata, then each member's Local File
//! Header to find its data. ZIP64 archives and the STORED and DEFLATE
//! compression methods are supported; encrypted and multi-disk archives are
//! not.

mod parser;
mod structures;

pub use structures::*;

use crate::archive::ArchiveEntry;
use crate::error::Result;

/// True when the buffer starts with one of the `PK` signature pairs
/// (local-file, central-directory or spanned-archive markers, in any
/// combination).
pub fn is_zip(buf: &[u8]) -> bool {
    buf.len() >= 4
        && buf[0] == 0x50
        && buf[1] == 0x4B
        && (buf[2] == 0x03 || buf[2] == 0x05 || buf[2] == 0x07)
        && (buf[3] == 0x04 || buf[3] == 0x06 || buf[3] == 0x08)
}

/// Unpack a zip archive into fully materialized entries.
///
/// Entries follow central directory order; stored and deflated members are
/// both fully decompressed.
///
/// # Errors
///
/// [`Error::Archive`](crate::Error::Archive) with a message starting
/// "invalid or unsupported zip format" when no end-of-central-directory
/// record is found or the structure is otherwise unreadable.
pub fn unpack_zip(buf: &[u8]) -> Result<Vec<ArchiveEntry>> {
    parser::unpack(buf)
}

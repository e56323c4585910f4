//! Tar archive detection and in-memory extraction.

use std::io::Read;

use tar::Archive;

use crate::error::{Error, Result};

use super::ArchiveEntry;

/// Offset of the `ustar` magic field in a POSIX tar header.
const MAGIC_OFFSET: usize = 257;

/// True when the buffer carries the POSIX `ustar` magic.
pub fn is_tar(buf: &[u8]) -> bool {
    buf.len() >= MAGIC_OFFSET + 5 && &buf[MAGIC_OFFSET..MAGIC_OFFSET + 5] == b"ustar"
}

/// Unpack a tar archive into fully materialized entries, in archive order.
///
/// Every entry is emitted, including non-regular ones (directories,
/// symlinks) with whatever data they carry — filtering is left to the
/// caller. A truncated or malformed structure fails the whole operation;
/// it never degrades to an empty result.
pub fn unpack_tar(buf: &[u8]) -> Result<Vec<ArchiveEntry>> {
    let mut archive = Archive::new(buf);
    let mut entries = Vec::new();

    let iter = archive
        .entries()
        .map_err(|e| Error::Archive(format!("malformed tar archive: {e}")))?;

    for entry in iter {
        let mut entry = entry.map_err(|e| Error::Archive(format!("malformed tar archive: {e}")))?;

        let path = String::from_utf8_lossy(&entry.path_bytes()).into_owned();

        let mut data = Vec::new();
        entry
            .read_to_end(&mut data)
            .map_err(|e| Error::Archive(format!("unexpected end of data: {e}")))?;

        entries.push(ArchiveEntry { path, data });
    }

    Ok(entries)
}

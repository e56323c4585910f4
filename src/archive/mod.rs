//! Archive sniffing and extraction.
//!
//! Downloaded payloads carry no trustworthy file extension, so the kind of
//! container is decided from magic bytes alone:
//!
//! - [`gzip`]: the 3-byte gzip member header
//! - [`tar`]: the POSIX `ustar` magic at offset 257
//! - [`zip`]: the `PK` signature family
//!
//! [`extract`] composes the detectors into the unpack pipeline: at most one
//! gzip layer is stripped (the `.tar.gz` case), then tar is tried before
//! zip, and a payload matching nothing fails rather than yielding zero
//! entries.

pub mod gzip;
pub mod tar;
pub mod zip;

use crate::error::{Error, Result};

/// A single named file extracted from an archive.
///
/// `path` is archive-relative with forward slashes, exactly as stored in the
/// container; no normalization is applied. Paths are not guaranteed unique —
/// lookups take the first match in archive order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub path: String,
    pub data: Vec<u8>,
}

/// Container formats recognized by the sniffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Gzip,
    Tar,
    Zip,
}

impl Format {
    /// Classify a payload by its magic bytes.
    ///
    /// Buffers shorter than a format's signature are simply not that
    /// format; sniffing never fails.
    pub fn sniff(buf: &[u8]) -> Option<Format> {
        if gzip::is_gzip(buf) {
            Some(Format::Gzip)
        } else if tar::is_tar(buf) {
            Some(Format::Tar)
        } else if zip::is_zip(buf) {
            Some(Format::Zip)
        } else {
            None
        }
    }
}

/// Unpack a downloaded payload into its member files.
///
/// Strips at most one gzip layer, then dispatches to the first matching
/// extractor (tar before zip). Source bytes are never mutated.
///
/// # Errors
///
/// [`Error::Decompression`] for a corrupt gzip stream, [`Error::Archive`]
/// for a malformed container, and [`Error::UnrecognizedArchive`] when no
/// format matches after gzip stripping.
pub fn extract(payload: &[u8]) -> Result<Vec<ArchiveEntry>> {
    let decompressed;
    let buf = if gzip::is_gzip(payload) {
        decompressed = gzip::gunzip(payload)?;
        &decompressed[..]
    } else {
        payload
    };

    if tar::is_tar(buf) {
        tar::unpack_tar(buf)
    } else if zip::is_zip(buf) {
        zip::unpack_zip(buf)
    } else {
        Err(Error::UnrecognizedArchive)
    }
}

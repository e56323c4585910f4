use std::path::PathBuf;
use thiserror::Error;

/// Failures surfaced by install and run operations.
///
/// Every error is reported to the immediate caller; nothing is retried or
/// downgraded internally. URLs embedded in messages are always credential
/// redacted.
#[derive(Debug, Error)]
pub enum Error {
    /// Network or HTTP-level download failure.
    #[error("failed to download {url}: {reason}")]
    Download { url: String, reason: String },

    /// The payload claimed to be gzip but could not be decompressed.
    #[error("unable to gunzip payload: {0}")]
    Decompression(String),

    /// Malformed tar or zip structure.
    #[error("{0}")]
    Archive(String),

    /// The payload matched none of gzip, tar or zip.
    #[error("unrecognized archive kind")]
    UnrecognizedArchive,

    /// The requested member is not present in the downloaded archive.
    #[error("unable to find {member} in {url}")]
    MemberNotFound { member: String, url: String },

    /// No source was registered for the running platform.
    #[error("no package found for {os}_{arch}")]
    NoMatch { os: String, arch: String },

    /// The install path is occupied by something other than a regular file.
    #[error("{} exists but is not a file", .path.display())]
    NotAFile { path: PathBuf },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

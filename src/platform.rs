//! Platform identification and source selection.
//!
//! A [`BinWrapper`](crate::BinWrapper) is configured with one download
//! location per (OS, architecture) pair; at install time the source matching
//! the running host is picked with an exact comparison — no fuzzy or
//! wildcard matching.

use std::fmt;

use url::Url;

use crate::error::{Error, Result};

/// Operating systems a binary source can be registered for.
///
/// Display output uses the `std::env::consts::OS` spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Os {
    Linux,
    MacOs,
    Windows,
}

impl Os {
    /// The OS the current process is running on, if it is a supported one.
    pub fn current() -> Option<Self> {
        match std::env::consts::OS {
            "linux" => Some(Os::Linux),
            "macos" => Some(Os::MacOs),
            "windows" => Some(Os::Windows),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Os::Linux => "linux",
            Os::MacOs => "macos",
            Os::Windows => "windows",
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Processor architectures a binary source can be registered for.
///
/// Display output uses the `std::env::consts::ARCH` spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arch {
    X86,
    X86_64,
    Arm,
    Aarch64,
}

impl Arch {
    /// The architecture the current process is running on, if supported.
    pub fn current() -> Option<Self> {
        match std::env::consts::ARCH {
            "x86" => Some(Arch::X86),
            "x86_64" => Some(Arch::X86_64),
            "arm" => Some(Arch::Arm),
            "aarch64" => Some(Arch::Aarch64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Arch::X86 => "x86",
            Arch::X86_64 => "x86_64",
            Arch::Arm => "arm",
            Arch::Aarch64 => "aarch64",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered download location for one (OS, architecture) pair.
#[derive(Debug, Clone)]
pub struct PlatformSource {
    pub os: Os,
    pub arch: Arch,
    pub url: Url,
}

/// Select the source matching `os`/`arch` exactly.
///
/// Sources are scanned in registration order, so the first of any duplicate
/// (os, arch) registrations wins.
pub(crate) fn resolve(sources: &[PlatformSource], os: Os, arch: Arch) -> Result<&PlatformSource> {
    sources
        .iter()
        .find(|source| source.os == os && source.arch == arch)
        .ok_or_else(|| Error::NoMatch {
            os: os.to_string(),
            arch: arch.to_string(),
        })
}

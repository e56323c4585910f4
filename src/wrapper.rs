//! The binary wrapper: registration surface and install/run orchestration.

use std::ffi::OsStr;
use std::io::ErrorKind;
use std::path::PathBuf;

use log::debug;
use url::Url;

use crate::error::{Error, Result};
use crate::net::HttpOptions;
use crate::platform::{self, Arch, Os, PlatformSource};
use crate::{install, run};

/// Wraps one platform-specific external binary: where to get it for each
/// platform, where to put it, and how to run it.
///
/// Configuration is accumulated with chained calls, then [`install`] or
/// [`run`] drive the state machine:
///
/// ```no_run
/// use binwrap::{Arch, BinWrapper, Os};
/// use url::Url;
///
/// # async fn example() -> binwrap::Result<i32> {
/// let wrapper = BinWrapper::new()
///     .src(
///         Url::parse("https://example.com/tool-x86_64-linux.tar.gz").unwrap(),
///         Os::Linux,
///         Arch::X86_64,
///     )
///     .src(
///         Url::parse("https://example.com/tool-aarch64-macos.tar.gz").unwrap(),
///         Os::MacOs,
///         Arch::Aarch64,
///     )
///     .dest("bin")
///     .name("tool");
///
/// wrapper.run(["--version"]).await
/// # }
/// ```
///
/// [`install`]: BinWrapper::install
/// [`run`]: BinWrapper::run
#[derive(Debug, Clone)]
pub struct BinWrapper {
    sources: Vec<PlatformSource>,
    dest: PathBuf,
    name: String,
    http_options: HttpOptions,
}

impl Default for BinWrapper {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            dest: PathBuf::from("bin"),
            name: "bin".to_string(),
            http_options: HttpOptions::default(),
        }
    }
}

impl BinWrapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a download location for one (OS, architecture) pair.
    ///
    /// Registering the same pair twice keeps the first entry authoritative.
    pub fn src(mut self, url: Url, os: Os, arch: Arch) -> Self {
        self.sources.push(PlatformSource { os, arch, url });
        self
    }

    /// Set the directory the binary is installed into. Defaults to `bin`.
    pub fn dest(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dest = dir.into();
        self
    }

    /// Set the archive member to extract, which is also the installed file
    /// name. Defaults to `bin`.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Replace the HTTP options used for the download.
    pub fn http_options(mut self, options: HttpOptions) -> Self {
        self.http_options = options;
        self
    }

    /// Add a single HTTP request header for the download.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.http_options = self.http_options.header(name, value);
        self
    }

    /// The local install path. Computed without any I/O.
    pub fn path(&self) -> PathBuf {
        self.dest.join(&self.name)
    }

    /// Ensure the binary is present locally.
    ///
    /// A file already at [`path`](BinWrapper::path) makes this a no-op —
    /// nothing is fetched or rewritten. Otherwise the source for the
    /// running platform is resolved, downloaded, unpacked and installed;
    /// any failure propagates and leaves no installed state behind.
    pub async fn install(&self) -> Result<()> {
        if self.is_installed().await? {
            debug!("{} already installed", self.path().display());
            return Ok(());
        }

        let source = self.find_matching_source()?;
        install::download_and_unpack(&source.url, &self.name, &self.path(), &self.http_options)
            .await
    }

    /// Ensure the binary is present, then execute it with `args`.
    ///
    /// Child stdout/stderr are relayed live; returns the child's exit code
    /// once both streams are drained.
    pub async fn run<I, S>(&self, args: I) -> Result<i32>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.install().await?;
        run::run(&self.path(), args).await
    }

    /// Whether a regular file already occupies the install path.
    ///
    /// Anything else at that path (a directory, a socket) is a hard error,
    /// not "absent" — installing over it would clobber something we do not
    /// own.
    async fn is_installed(&self) -> Result<bool> {
        match tokio::fs::metadata(self.path()).await {
            Ok(metadata) if metadata.is_file() => Ok(true),
            Ok(_) => Err(Error::NotAFile { path: self.path() }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn find_matching_source(&self) -> Result<&PlatformSource> {
        match (Os::current(), Arch::current()) {
            (Some(os), Some(arch)) => platform::resolve(&self.sources, os, arch),
            _ => Err(Error::NoMatch {
                os: std::env::consts::OS.to_string(),
                arch: std::env::consts::ARCH.to_string(),
            }),
        }
    }
}

//! # binwrap
//!
//! Download, install and run platform-specific binary releases.
//!
//! Host tools that ship a native helper binary register one artifact URL
//! per (OS, architecture) pair; `binwrap` picks the right one for the
//! running platform, fetches it over HTTP(S), sniffs the payload's real
//! container format from magic bytes (gzip-wrapped tar, plain tar, or
//! zip — file extensions are never trusted), extracts the named member,
//! installs it with the executable bit set, and spawns it with the
//! caller's arguments.
//!
//! ## Features
//!
//! - Magic-byte format detection for gzip, tar and zip payloads
//! - In-memory extraction, including deflated zip members and ZIP64
//! - Idempotent installs: a binary already on disk is never re-fetched
//! - Custom request headers and `HTTPS_PROXY` support, with credentials
//!   redacted from every error message
//! - Live stdout/stderr relay from the spawned binary
//!
//! ## Example
//!
//! ```no_run
//! use binwrap::{Arch, BinWrapper, Os};
//! use url::Url;
//!
//! #[tokio::main]
//! async fn main() -> binwrap::Result<()> {
//!     let wrapper = BinWrapper::new()
//!         .src(
//!             Url::parse("https://example.com/tool-x86_64-linux.tar.gz").unwrap(),
//!             Os::Linux,
//!             Arch::X86_64,
//!         )
//!         .src(
//!             Url::parse("https://example.com/tool-aarch64-macos.tar.gz").unwrap(),
//!             Os::MacOs,
//!             Arch::Aarch64,
//!         )
//!         .dest("bin")
//!         .name("tool");
//!
//!     let code = wrapper.run(["--version"]).await?;
//!     std::process::exit(code)
//! }
//! ```

pub mod archive;
pub mod error;
pub mod install;
pub mod net;
pub mod platform;
pub mod run;
mod wrapper;

pub use archive::{ArchiveEntry, Format};
pub use error::{Error, Result};
pub use net::HttpOptions;
pub use platform::{Arch, Os, PlatformSource};
pub use wrapper::BinWrapper;

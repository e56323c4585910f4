//! Network retrieval.
//!
//! One GET per install: the artifact is fetched in full and handed to the
//! unpack pipeline as raw bytes. Custom headers and the conventional
//! `HTTPS_PROXY` environment variable are honored; download failures carry
//! a credential-redacted form of the URL.

mod http;

pub use http::{HttpOptions, fetch};

pub(crate) use http::redact;

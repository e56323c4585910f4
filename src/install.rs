//! Download-and-unpack installation.

use std::path::Path;

use log::debug;
use tokio::fs;
use url::Url;

use crate::archive;
use crate::error::{Error, Result};
use crate::net::{self, HttpOptions};

/// Fetch `url`, unpack it, and install the member named `member` at
/// `install_path` with the executable bit set.
///
/// The member path must match an archive entry byte-for-byte — no
/// normalization — and the first match wins when an archive carries
/// duplicates. The file is staged next to its final location and renamed
/// into place, so a failed install never leaves a half-written binary at
/// the install path.
pub async fn download_and_unpack(
    url: &Url,
    member: &str,
    install_path: &Path,
    options: &HttpOptions,
) -> Result<()> {
    let payload = net::fetch(url, options).await?;
    let entries = archive::extract(&payload)?;

    let found = entries
        .iter()
        .find(|entry| entry.path == member)
        .ok_or_else(|| Error::MemberNotFound {
            member: member.to_string(),
            url: net::redact(url),
        })?;

    if let Some(parent) = install_path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).await?;
    }

    let staging = staging_path(install_path);
    fs::write(&staging, &found.data).await?;
    set_executable(&staging).await?;
    fs::rename(&staging, install_path).await?;

    debug!("installed {member} to {}", install_path.display());
    Ok(())
}

/// Sibling path used while the binary is being written.
fn staging_path(install_path: &Path) -> std::path::PathBuf {
    let mut name = install_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    install_path.with_file_name(name)
}

#[cfg(unix)]
async fn set_executable(path: &Path) -> Result<()> {
    use std::fs::Permissions;
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, Permissions::from_mode(0o755)).await?;
    Ok(())
}

#[cfg(not(unix))]
async fn set_executable(_path: &Path) -> Result<()> {
    // Windows derives executability from the file extension.
    Ok(())
}

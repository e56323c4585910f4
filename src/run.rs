//! Spawning the installed binary.

use std::ffi::OsStr;
use std::path::Path;
use std::process::Stdio;

use log::debug;
use tokio::process::Command;

use crate::error::Result;

/// Spawn `binary` with `args`, relaying its stdout and stderr to the
/// parent's streams as they arrive.
///
/// Both streams are drained before this returns, so output produced just
/// before exit is never lost. The child's exit code is returned; a child
/// killed by a signal reports no code and maps to -1.
pub async fn run<I, S>(binary: &Path, args: I) -> Result<i32>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    debug!("spawning {}", binary.display());

    let mut child = Command::new(binary)
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let relay_stdout = async move {
        if let Some(mut stream) = stdout {
            tokio::io::copy(&mut stream, &mut tokio::io::stdout()).await?;
        }
        Ok::<_, std::io::Error>(())
    };
    let relay_stderr = async move {
        if let Some(mut stream) = stderr {
            tokio::io::copy(&mut stream, &mut tokio::io::stderr()).await?;
        }
        Ok::<_, std::io::Error>(())
    };

    let (status, _, _) = tokio::try_join!(child.wait(), relay_stdout, relay_stderr)?;

    Ok(status.code().unwrap_or(-1))
}

//! PID file management.
//!
//! Run coordination state (job slot, sessions) lives in this process only, so
//! two instances serving the same bot would each admit a run. The server
//! writes its PID to the configured path under an `fs2` exclusive lock and
//! refuses to start if another instance holds it.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;

use fs2::FileExt;

/// Write the current process PID to `path` and acquire an exclusive lock.
///
/// The returned [`File`] must stay alive for as long as the server runs;
/// dropping it releases the lock.
pub fn write_pid_file(path: &Path) -> anyhow::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    // Lock before truncating so a losing instance leaves the file intact.
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .read(true)
        .open(path)
        .map_err(|e| anyhow::anyhow!("opening PID file {}: {e}", path.display()))?;

    file.try_lock_exclusive().map_err(|_| {
        anyhow::anyhow!(
            "another vm-manager instance is running (PID file {} is locked)",
            path.display()
        )
    })?;

    let pid = std::process::id();
    file.set_len(0)?;
    {
        let mut f = &file;
        writeln!(f, "{pid}")?;
        f.flush()?;
    }

    tracing::info!(path = %path.display(), pid, "PID file written");
    Ok(file)
}

/// Remove the PID file; the lock goes with `_handle`.
pub fn remove_pid_file(path: &Path, _handle: File) {
    if let Err(e) = fs::remove_file(path) {
        tracing::warn!(path = %path.display(), error = %e, "failed to remove PID file");
    } else {
        tracing::info!(path = %path.display(), "PID file removed");
    }
}

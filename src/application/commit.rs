//! Atomic replacement of the target with a fully written staging file.

use std::io;
use std::path::Path;

use tokio::fs;
use tracing::debug;

use crate::utils::partial_sibling;

/// Moves `staging` over `target`.
///
/// A plain rename is tried first. When that fails (typically because the
/// scratch directory lives on another filesystem) the staged bytes are copied
/// into a hidden sibling of `target`, flushed, and renamed over it. `target`
/// is never removed before its replacement is complete on disk, and is left
/// untouched when this returns an error.
pub async fn replace(staging: &Path, target: &Path) -> io::Result<()> {
    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }

    match fs::rename(staging, target).await {
        Ok(()) => {
            sync_parent(target).await;
            return Ok(());
        }
        Err(e) => debug!(error = %e, "direct rename failed, staging beside target"),
    }

    let sibling = partial_sibling(target).ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "target has no file name")
    })?;

    if let Err(e) = copy_synced(staging, &sibling).await {
        let _ = fs::remove_file(&sibling).await;
        return Err(e);
    }
    if let Err(e) = fs::rename(&sibling, target).await {
        let _ = fs::remove_file(&sibling).await;
        return Err(e);
    }
    sync_parent(target).await;

    if let Err(e) = fs::remove_file(staging).await {
        debug!(staging = %staging.display(), error = %e, "staging file left behind after commit");
    }
    Ok(())
}

/// Flushes the directory entry written by the final rename. Best-effort:
/// directories cannot be opened for syncing on every platform.
async fn sync_parent(target: &Path) {
    let parent = match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let synced = match fs::File::open(parent).await {
        Ok(dir) => dir.sync_all().await,
        Err(e) => Err(e),
    };
    if let Err(e) = synced {
        debug!(dir = %parent.display(), error = %e, "could not sync target directory");
    }
}

async fn copy_synced(from: &Path, to: &Path) -> io::Result<()> {
    let mut src = fs::File::open(from).await?;
    let mut dst = fs::File::create(to).await?;
    tokio::io::copy(&mut src, &mut dst).await?;
    dst.sync_all().await
}

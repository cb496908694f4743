use super::engine::{ArchiveEngine, Exit, EXIT_OK};
use super::vfs::{Access, MountGuard, VirtualFs};
use crate::errors::{Result, SetupError};
use std::fs;
use std::path::Path;

const MOUNT_SRC: &str = "/archive_source";
const MOUNT_DEST: &str = "/archive_dest";

/// Remove `dir` if present and recreate it empty.
pub fn reset_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        fs::remove_dir_all(dir).map_err(|e| SetupError::io(dir, e))?;
    }
    fs::create_dir_all(dir).map_err(|e| SetupError::io(dir, e))
}

/// Unpack `archive_path` into a freshly emptied `extract_dir`.
///
/// The engine sees the archive's directory read-only at `/archive_source` and
/// `extract_dir` at `/archive_dest`; both mounts are released before this
/// returns, whatever the outcome.
pub fn extract_archive(archive_path: &Path, extract_dir: &Path) -> Result<()> {
    reset_dir(extract_dir)?;

    let fail = |reason: String| SetupError::Extraction {
        archive: archive_path.to_path_buf(),
        reason,
    };

    let archive_name = archive_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| fail("archive path has no usable file name".into()))?;
    let archive_dir = match archive_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut vfs = VirtualFs::new();
    let mut mounts = MountGuard::new(&mut vfs);
    mounts
        .bind(archive_dir, MOUNT_SRC, Access::ReadOnly)
        .map_err(|e| fail(e.to_string()))?;
    mounts
        .bind(extract_dir, MOUNT_DEST, Access::ReadWrite)
        .map_err(|e| fail(e.to_string()))?;

    let v_archive = format!("{MOUNT_SRC}/{archive_name}");
    let v_dest = format!("-o{MOUNT_DEST}");
    let args = ["x", v_archive.as_str(), v_dest.as_str(), "-y"];
    tracing::debug!(?args, "invoking archive engine");

    match ArchiveEngine::new().call_main(&mounts, &args) {
        Ok(()) => Ok(()),
        Err(Exit { status: EXIT_OK, .. }) => Ok(()),
        Err(Exit { status, message }) => Err(fail(format!("exit status {status}: {message}"))),
    }
}

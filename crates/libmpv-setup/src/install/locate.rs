use crate::errors::{Result, SetupError};
use std::fs;
use std::path::{Path, PathBuf};

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

fn search(dir: &Path, file_name: &str) -> Option<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::trace!(dir = %dir.display(), error = %e, "skipping unreadable directory");
            return None;
        }
    };

    for entry in entries.flatten() {
        let name = entry.file_name();
        if is_hidden(&name) {
            continue;
        }
        let path = entry.path();
        let Ok(meta) = fs::metadata(&path) else {
            continue;
        };
        if meta.is_dir() {
            if let Some(hit) = search(&path, file_name) {
                return Some(hit);
            }
        } else if name == file_name {
            return Some(path);
        }
    }
    None
}

/// Depth-first search for `file_name` below `root`, skipping dot-entries.
/// First hit wins; directory listing order decides among duplicates.
pub fn find_file(root: &Path, file_name: &str) -> Option<PathBuf> {
    search(root, file_name)
}

/// Find `file_name` under `search_root` and rename it into `dest_dir`.
pub fn locate_and_move(search_root: &Path, file_name: &str, dest_dir: &Path) -> Result<PathBuf> {
    let found = find_file(search_root, file_name).ok_or_else(|| SetupError::AssetNotFound {
        file_name: file_name.to_string(),
        root: search_root.to_path_buf(),
    })?;

    let dest = dest_dir.join(file_name);
    fs::rename(&found, &dest).map_err(|e| SetupError::io(&dest, e))?;
    tracing::debug!(from = %found.display(), to = %dest.display(), "installed");
    Ok(dest)
}

//! Advisory checksum comparison.
//! The manifest hash is reported, not enforced: a mismatch is logged and the
//! install continues.

use crate::errors::{Result, SetupError};
use crate::types::ResolvedAsset;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Read;
use std::path::Path;

/// Compare the downloaded file with the manifest hash; returns whether they
/// agree. Never fails the run.
pub fn check_download(asset: &ResolvedAsset, path: &Path) -> bool {
    let want = asset.checksum.trim().to_lowercase();
    match sha256_file(path) {
        Ok(got) if got == want => {
            tracing::debug!(file = %asset.file_name, "checksum matches manifest");
            true
        }
        Ok(got) => {
            tracing::warn!(
                file = %asset.file_name,
                got = %got,
                want = %want,
                "checksum differs from manifest"
            );
            false
        }
        Err(e) => {
            tracing::warn!(file = %asset.file_name, error = %e, "could not hash download");
            false
        }
    }
}

pub fn sha256_file(path: &Path) -> Result<String> {
    let mut f = fs::File::open(path).map_err(|e| SetupError::io(path, e))?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = f.read(&mut buf).map_err(|e| SetupError::io(path, e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

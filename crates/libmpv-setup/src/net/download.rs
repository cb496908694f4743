use crate::errors::{Result, SetupError};
use indicatif::ProgressBar;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use std::time::Duration;

/// Blocking HTTPS client with rustls. One per run.
pub fn http_client(timeout: Duration) -> Result<Client> {
    let client = Client::builder()
        .timeout(timeout)
        .user_agent(concat!("libmpv-setup/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

/// Stream `url` into `dest`, returning the number of bytes written.
/// Single attempt; the file handle is closed and the progress bar cleared on
/// every return path.
pub fn download_to_path(
    client: &Client,
    url: &str,
    dest: &Path,
    progress: &ProgressBar,
) -> Result<u64> {
    let result = stream_to_path(client, url, dest, progress);
    progress.finish_and_clear();
    let written = result.map_err(|reason| SetupError::Download {
        url: url.to_string(),
        reason,
    })?;

    tracing::debug!(url, bytes = written, dest = %dest.display(), "download complete");
    Ok(written)
}

fn stream_to_path(
    client: &Client,
    url: &str,
    dest: &Path,
    progress: &ProgressBar,
) -> std::result::Result<u64, String> {
    let write_err = |e: io::Error| format!("writing {}: {e}", dest.display());

    let mut resp = client.get(url).send().map_err(|e| e.to_string())?;
    let status = resp.status();
    if !status.is_success() {
        return Err(status.to_string());
    }
    if status == StatusCode::NO_CONTENT {
        return Err("response body is empty".into());
    }

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
    }

    if let Some(total) = resp.content_length() {
        progress.set_length(total);
    }

    let mut out = fs::File::create(dest).map_err(write_err)?;
    let mut buf = [0u8; 128 * 1024];
    let mut written = 0u64;

    loop {
        let n = resp.read(&mut buf).map_err(|e| e.to_string())?;
        if n == 0 {
            break;
        }
        out.write_all(&buf[..n]).map_err(write_err)?;
        written += n as u64;
        progress.inc(n as u64);
    }
    out.flush().map_err(write_err)?;

    if written == 0 {
        return Err("response body is empty".into());
    }
    Ok(written)
}

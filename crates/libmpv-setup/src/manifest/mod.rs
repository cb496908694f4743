mod checksum;

pub use checksum::{check_download, sha256_file};

use crate::config::join_url;
use crate::errors::{Result, SetupError};
use crate::types::{AssetDescriptor, ManifestLine, ResolvedAsset};
use reqwest::blocking::Client;

/// Fetch the manifest as plain text (blocking). Never cached.
pub fn fetch_manifest(client: &Client, url: &str) -> Result<String> {
    tracing::debug!(url, "fetching manifest");
    client
        .get(url)
        .send()
        .and_then(|resp| resp.error_for_status())
        .and_then(|resp| resp.text())
        .map_err(|source| SetupError::ManifestFetch {
            url: url.to_string(),
            source,
        })
}

/// The download lands at `<temp_dir>/<file_name>`, so the name must be one
/// plain path component.
fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', ':'])
}

/// First line, in document order, that the descriptor accepts.
/// The filename is the line's last whitespace-delimited token. A first match
/// whose filename is not a plain file name yields None.
pub fn find_asset(manifest: &str, descriptor: &AssetDescriptor) -> Option<ManifestLine> {
    manifest
        .lines()
        .map(str::trim)
        .find(|line| descriptor.matches(line))
        .and_then(|line| {
            let mut tokens = line.split_whitespace();
            let first = tokens.next()?;
            let file_name = tokens.last().unwrap_or(first);
            if !is_plain_file_name(file_name) {
                tracing::warn!(file_name, "manifest entry is not a plain file name");
                return None;
            }
            Some(ManifestLine {
                checksum: first.to_string(),
                file_name: file_name.to_string(),
            })
        })
}

/// Fetch `<base_url>/<manifest_name>` and resolve the descriptor against it.
pub fn resolve_asset(
    client: &Client,
    base_url: &str,
    manifest_name: &str,
    descriptor: &AssetDescriptor,
) -> Result<ResolvedAsset> {
    let url = join_url(base_url, manifest_name);
    let text = fetch_manifest(client, &url)?;

    let line = find_asset(&text, descriptor).ok_or_else(|| SetupError::AssetNotInManifest {
        search_key: descriptor.search_key.clone(),
        excluded: descriptor.excluded.clone(),
        url: url.clone(),
    })?;

    Ok(ResolvedAsset {
        download_url: join_url(base_url, &line.file_name),
        file_name: line.file_name,
        checksum: line.checksum,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_filename_from_hash_line() {
        let m = "abc123  libmpv-wrapper-windows-x86_64.zip\n";
        let d = AssetDescriptor::new("libmpv-wrapper-windows-x86_64");
        let hit = find_asset(m, &d).unwrap();
        assert_eq!(hit.file_name, "libmpv-wrapper-windows-x86_64.zip");
        assert_eq!(hit.checksum, "abc123");
    }

    #[test]
    fn exclusion_skips_tagged_variant() {
        let m = "aaa mpv-dev-lgpl-x86_64-v3.7z\nbbb mpv-dev-lgpl-x86_64.7z\n";
        let d = AssetDescriptor::new("mpv-dev-lgpl-x86_64").excluding("v3");
        assert_eq!(find_asset(m, &d).unwrap().file_name, "mpv-dev-lgpl-x86_64.7z");
    }

    #[test]
    fn first_matching_line_wins() {
        let d = AssetDescriptor::new("libmpv-wrapper-linux-x86_64");
        let a = "zzz other.zip\n111 libmpv-wrapper-linux-x86_64.zip\n222 libmpv-wrapper-linux-x86_64.tar.gz\n";
        let b = "111 libmpv-wrapper-linux-x86_64.zip\nyyy another.zip\n222 libmpv-wrapper-linux-x86_64.tar.gz\nzzz other.zip\n";
        assert_eq!(find_asset(a, &d), find_asset(b, &d));
        assert_eq!(find_asset(a, &d).unwrap().file_name, "libmpv-wrapper-linux-x86_64.zip");
    }

    #[test]
    fn crlf_and_padding_are_tolerated() {
        let m = "  deadbeef\t  libmpv-wrapper-macos-aarch64.zip  \r\n";
        let d = AssetDescriptor::new("libmpv-wrapper-macos-aarch64");
        assert_eq!(find_asset(m, &d).unwrap().file_name, "libmpv-wrapper-macos-aarch64.zip");
    }

    #[test]
    fn no_match_is_none() {
        let m = "aaa mpv-dev-lgpl-x86_64-v3.7z\n";
        let d = AssetDescriptor::new("mpv-dev-lgpl-x86_64").excluding("v3");
        assert!(find_asset(m, &d).is_none());
        assert!(find_asset("", &d).is_none());
    }

    #[test]
    fn path_like_filenames_are_refused() {
        let d = AssetDescriptor::new("libmpv-wrapper-linux-x86_64");
        for m in [
            "1111  libmpv-wrapper-linux-x86_64 /tmp/victim.txt\n",
            "1111  libmpv-wrapper-linux-x86_64 ../../victim.txt\n",
            "1111  ../libmpv-wrapper-linux-x86_64.zip\n",
            "1111  sub/libmpv-wrapper-linux-x86_64.zip\n",
            "1111  libmpv-wrapper-linux-x86_64 C:\\victim.txt\n",
            "1111  libmpv-wrapper-linux-x86_64 ..\n",
        ] {
            assert!(find_asset(m, &d).is_none(), "{m}");
        }
    }

    #[test]
    fn plain_file_name_rules() {
        assert!(is_plain_file_name("mpv-dev-lgpl-x86_64-20250101-git-abc.7z"));
        assert!(is_plain_file_name("libmpv-wrapper-linux-x86_64.zip"));
        assert!(!is_plain_file_name(""));
        assert!(!is_plain_file_name("."));
        assert!(!is_plain_file_name(".."));
        assert!(!is_plain_file_name("/abs.zip"));
        assert!(!is_plain_file_name("a\\b.zip"));
    }
}

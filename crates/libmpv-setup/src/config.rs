use once_cell::sync::Lazy;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Release feed of the cross-platform wrapper library.
pub static DEFAULT_WRAPPER_BASE_URL: Lazy<String> = Lazy::new(|| {
    "https://github.com/nini22P/libmpv-wrapper/releases/latest/download".to_string()
});

/// Release feed of the Windows libmpv builds.
pub static DEFAULT_MPV_BASE_URL: Lazy<String> = Lazy::new(|| {
    "https://github.com/zhongfly/mpv-winbuild/releases/latest/download".to_string()
});

pub const DEFAULT_MANIFEST_NAME: &str = "sha256.txt";
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;

pub const ENV_TARGET_DIR: &str = "LIBMPV_SETUP_TARGET_DIR";
pub const ENV_WRAPPER_BASE_URL: &str = "LIBMPV_WRAPPER_BASE_URL";
pub const ENV_MPV_BASE_URL: &str = "LIBMPV_MPV_BASE_URL";
pub const ENV_TIMEOUT_SECS: &str = "LIBMPV_SETUP_TIMEOUT_SECS";

/// Everything a setup run needs to know about where to fetch from and where to
/// install to. Built once and handed to the pipeline by reference.
#[derive(Debug, Clone)]
pub struct SetupConfig {
    /// <project>/src-tauri/lib
    pub target_dir: PathBuf,
    /// <project>/src-tauri/lib/temp
    pub temp_dir: PathBuf,
    pub wrapper_base_url: String,
    pub mpv_base_url: String,
    pub manifest_name: String,
    pub http_timeout: Duration,
}

impl SetupConfig {
    /// Defaults rooted at `project_root`.
    pub fn for_project(project_root: &Path) -> Self {
        Self::with_target_dir(project_root.join("src-tauri").join("lib"))
    }

    /// Defaults with an explicit install directory; scratch lives under it.
    pub fn with_target_dir(target_dir: impl Into<PathBuf>) -> Self {
        let target_dir = target_dir.into();
        Self {
            temp_dir: target_dir.join("temp"),
            target_dir,
            wrapper_base_url: DEFAULT_WRAPPER_BASE_URL.clone(),
            mpv_base_url: DEFAULT_MPV_BASE_URL.clone(),
            manifest_name: DEFAULT_MANIFEST_NAME.to_string(),
            http_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Defaults for the current directory, then `LIBMPV_*` overrides.
    pub fn from_env() -> std::io::Result<Self> {
        let cwd = env::current_dir()?;
        Ok(Self::from_lookup(&cwd, |key| env::var(key).ok()))
    }

    fn from_lookup(cwd: &Path, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = match lookup(ENV_TARGET_DIR).filter(|s| !s.is_empty()) {
            Some(dir) => Self::with_target_dir(cwd.join(dir)),
            None => Self::for_project(cwd),
        };
        if let Some(url) = lookup(ENV_WRAPPER_BASE_URL).filter(|s| !s.is_empty()) {
            cfg.wrapper_base_url = url;
        }
        if let Some(url) = lookup(ENV_MPV_BASE_URL).filter(|s| !s.is_empty()) {
            cfg.mpv_base_url = url;
        }
        match lookup(ENV_TIMEOUT_SECS).map(|s| s.trim().parse::<u64>()) {
            Some(Ok(secs)) if secs > 0 => cfg.http_timeout = Duration::from_secs(secs),
            Some(_) => tracing::warn!("ignoring invalid {ENV_TIMEOUT_SECS}"),
            None => {}
        }
        cfg
    }
}

/// `<base>/<name>` without doubling the slash.
pub fn join_url(base: &str, name: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), name)
}

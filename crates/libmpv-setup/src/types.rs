use std::fmt;
use std::path::PathBuf;

/// Canonical operating system names used in release asset names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsName {
    Windows,
    Macos,
    Linux,
}

impl OsName {
    pub fn as_str(self) -> &'static str {
        match self {
            OsName::Windows => "windows",
            OsName::Macos => "macos",
            OsName::Linux => "linux",
        }
    }

    /// The one wrapper library each OS ships.
    pub fn wrapper_lib_name(self) -> &'static str {
        match self {
            OsName::Windows => "libmpv-wrapper.dll",
            OsName::Macos => "libmpv-wrapper.dylib",
            OsName::Linux => "libmpv-wrapper.so",
        }
    }

    /// Only Windows gets libmpv from us; elsewhere it comes from the system
    /// package manager.
    pub fn bundles_libmpv(self) -> bool {
        matches!(self, OsName::Windows)
    }
}

impl fmt::Display for OsName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical CPU architecture names used in release asset names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchName {
    X86_64,
    Aarch64,
}

impl ArchName {
    pub fn as_str(self) -> &'static str {
        match self {
            ArchName::X86_64 => "x86_64",
            ArchName::Aarch64 => "aarch64",
        }
    }
}

impl fmt::Display for ArchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What we detected about the host, once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemProfile {
    pub platform: String, // raw host value, e.g. "windows" or "win32"
    pub os: OsName,
    pub arch: ArchName,
    pub wrapper_lib_name: &'static str,
}

/// How to pick one line out of a checksum manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetDescriptor {
    pub search_key: String,
    pub excluded: Option<String>,
}

impl AssetDescriptor {
    pub fn new(search_key: impl Into<String>) -> Self {
        Self {
            search_key: search_key.into(),
            excluded: None,
        }
    }

    pub fn excluding(mut self, tag: impl Into<String>) -> Self {
        self.excluded = Some(tag.into());
        self
    }

    pub fn matches(&self, line: &str) -> bool {
        line.contains(self.search_key.as_str())
            && self
                .excluded
                .as_deref()
                .map_or(true, |tag| !line.contains(tag))
    }
}

/// One `<hash>  <filename>` manifest line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestLine {
    pub checksum: String,
    pub file_name: String,
}

/// A manifest hit turned into something downloadable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
    pub file_name: String,
    pub checksum: String,
    pub download_url: String,
}

/// One provisioning job: resolve, download, extract, install `target_file`.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub label: String,
    pub base_url: String,
    pub descriptor: AssetDescriptor,
    pub target_file: String,
    pub extract_dir_name: &'static str,
    pub large: bool,
}

/// Summary of a successful run (for callers and tests).
#[derive(Debug, Clone)]
pub struct InstallReport {
    pub profile: SystemProfile,
    pub installed: Vec<PathBuf>,
    pub skipped: Vec<String>,
}

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("Unsupported architecture: {0}")]
    UnsupportedArchitecture(String),

    #[error("failed to fetch manifest {url}: {source}")]
    ManifestFetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Could not find '{search_key}'{} in {url}", excluded_note(.excluded))]
    AssetNotInManifest {
        search_key: String,
        excluded: Option<String>,
        url: String,
    },

    #[error("download of {url} failed: {reason}")]
    Download { url: String, reason: String },

    #[error("extraction of {} failed: {reason}", .archive.display())]
    Extraction { archive: PathBuf, reason: String },

    #[error("{file_name} not found in extracted files under {}", .root.display())]
    AssetNotFound { file_name: String, root: PathBuf },

    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to process {label}: {source}")]
    Artifact {
        label: String,
        #[source]
        source: Box<SetupError>,
    },
}

fn excluded_note(excluded: &Option<String>) -> String {
    match excluded {
        Some(tag) => format!(" (excluding '{tag}')"),
        None => String::new(),
    }
}

impl SetupError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SetupError::Io {
            path: path.into(),
            source,
        }
    }

    /// Innermost error, skipping `Artifact` stage wrappers.
    pub fn root_cause(&self) -> &SetupError {
        match self {
            SetupError::Artifact { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Failure of a best-effort cleanup step. Deliberately not convertible into
/// `SetupError`: callers log it and move on.
#[derive(Debug, Error)]
#[error("failed to remove {}: {source}", .path.display())]
pub struct CleanupError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

pub type Result<T> = std::result::Result<T, SetupError>;

//! The `setup-lib` run: detect the host, then resolve, download, extract and
//! install each artifact in turn. Strictly sequential; the first failure ends
//! the run. The scratch directory is removed afterwards either way.

use crate::config::SetupConfig;
use crate::errors::{CleanupError, Result, SetupError};
use crate::install::{extract_archive, locate_and_move};
use crate::manifest::{check_download, resolve_asset};
use crate::net::{download_to_path, http_client};
use crate::report::Reporter;
use crate::types::{Artifact, AssetDescriptor, InstallReport, SystemProfile};
use reqwest::blocking::Client;
use std::fs;
use std::path::{Path, PathBuf};

pub const WRAPPER_LABEL: &str = "libmpv-wrapper";
pub const LIBMPV_LABEL: &str = "libmpv";
pub const LIBMPV_DLL: &str = "libmpv-2.dll";

/// Build tag we never want on Windows (x86-64-v3 builds need AVX2).
const LIBMPV_EXCLUDED_TAG: &str = "v3";

/// The wrapper library for this host. Always installed.
pub fn wrapper_artifact(config: &SetupConfig, profile: &SystemProfile) -> Artifact {
    Artifact {
        label: WRAPPER_LABEL.to_string(),
        base_url: config.wrapper_base_url.clone(),
        descriptor: AssetDescriptor::new(format!(
            "libmpv-wrapper-{}-{}",
            profile.os, profile.arch
        )),
        target_file: profile.wrapper_lib_name.to_string(),
        extract_dir_name: "wrapper_extract",
        large: false,
    }
}

/// libmpv itself, only for hosts that do not get it from a package manager.
pub fn libmpv_artifact(config: &SetupConfig, profile: &SystemProfile) -> Option<Artifact> {
    if !profile.os.bundles_libmpv() {
        return None;
    }
    Some(Artifact {
        label: LIBMPV_LABEL.to_string(),
        base_url: config.mpv_base_url.clone(),
        descriptor: AssetDescriptor::new(format!("mpv-dev-lgpl-{}", profile.arch))
            .excluding(LIBMPV_EXCLUDED_TAG),
        target_file: LIBMPV_DLL.to_string(),
        extract_dir_name: "libmpv_extract",
        large: true,
    })
}

/// Remove `dir` recursively; a missing directory counts as removed.
pub fn remove_scratch(dir: &Path) -> std::result::Result<(), CleanupError> {
    match fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(CleanupError {
            path: dir.to_path_buf(),
            source,
        }),
    }
}

pub struct Pipeline<'a, R: Reporter> {
    config: &'a SetupConfig,
    reporter: R,
    client: Client,
}

impl<'a, R: Reporter> Pipeline<'a, R> {
    pub fn new(config: &'a SetupConfig, reporter: R) -> Result<Self> {
        let client = http_client(config.http_timeout)?;
        Ok(Self {
            config,
            reporter,
            client,
        })
    }

    /// Run for the machine we are on.
    pub fn run(&self) -> Result<InstallReport> {
        let profile = SystemProfile::detect()?;
        self.run_with(&profile)
    }

    /// Run as if the host reported `platform`/`arch`.
    pub fn run_for(&self, platform: &str, arch: &str) -> Result<InstallReport> {
        let profile = SystemProfile::from_host(platform, arch)?;
        self.run_with(&profile)
    }

    pub fn run_with(&self, profile: &SystemProfile) -> Result<InstallReport> {
        self.reporter.warn(&format!(
            "Detected System: {} ({})",
            profile.os, profile.arch
        ));

        let outcome = self.install_all(profile);

        self.reporter.note("\nCleaning up temporary files...");
        if let Err(e) = remove_scratch(&self.config.temp_dir) {
            tracing::warn!(error = %e, "cleanup failed");
            self.reporter.note(&format!("  could not clean up: {e}"));
        }

        let report = outcome?;
        self.reporter.success(&format!(
            "\nSUCCESS! Libraries are set up in {}",
            self.config.target_dir.display()
        ));
        Ok(report)
    }

    fn install_all(&self, profile: &SystemProfile) -> Result<InstallReport> {
        let cfg = self.config;
        for dir in [&cfg.temp_dir, &cfg.target_dir] {
            fs::create_dir_all(dir).map_err(|e| SetupError::io(dir, e))?;
        }

        let mut report = InstallReport {
            profile: profile.clone(),
            installed: Vec::new(),
            skipped: Vec::new(),
        };

        let wrapper = wrapper_artifact(cfg, profile);
        self.reporter
            .stage(&format!("\n[1/2] Processing {}...", wrapper.label));
        report.installed.push(self.install_artifact(&wrapper)?);

        match libmpv_artifact(cfg, profile) {
            Some(libmpv) => {
                self.reporter.stage(&format!(
                    "\n[2/2] Processing {} ({})...",
                    libmpv.label, profile.os
                ));
                report.installed.push(self.install_artifact(&libmpv)?);
            }
            None => {
                self.reporter.note(&format!(
                    "\n[2/2] Skipping {LIBMPV_LABEL} download (not bundled on {})",
                    profile.os
                ));
                self.reporter.warn(&format!(
                    "NOTE: On {}, ensure system libmpv is installed.",
                    profile.os
                ));
                report.skipped.push(LIBMPV_LABEL.to_string());
            }
        }

        Ok(report)
    }

    /// resolve → download → extract → locate/move, wrapped with the label so
    /// the error names the failing artifact.
    fn install_artifact(&self, artifact: &Artifact) -> Result<PathBuf> {
        self.install_artifact_inner(artifact)
            .map_err(|source| SetupError::Artifact {
                label: artifact.label.clone(),
                source: Box::new(source),
            })
    }

    fn install_artifact_inner(&self, artifact: &Artifact) -> Result<PathBuf> {
        let cfg = self.config;
        let asset = resolve_asset(
            &self.client,
            &artifact.base_url,
            &cfg.manifest_name,
            &artifact.descriptor,
        )?;
        self.reporter
            .warn(&format!("  Found file: {}", asset.file_name));

        let archive_path = cfg.temp_dir.join(&asset.file_name);
        self.reporter.info(if artifact.large {
            "  Downloading (this file is large)..."
        } else {
            "  Downloading..."
        });
        let bar = self.reporter.download_bar();
        download_to_path(&self.client, &asset.download_url, &archive_path, &bar)?;
        check_download(&asset, &archive_path);

        let extract_dir = cfg.temp_dir.join(artifact.extract_dir_name);
        self.reporter
            .stage(&format!("  Extracting {}...", asset.file_name));
        extract_archive(&archive_path, &extract_dir)?;

        let installed = locate_and_move(&extract_dir, &artifact.target_file, &cfg.target_dir)?;
        self.reporter.success(&format!(
            "  -> {} downloaded successfully.",
            artifact.target_file
        ));
        Ok(installed)
    }
}

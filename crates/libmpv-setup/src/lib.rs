//! libmpv-setup
//!
//! Blocking helpers behind `setup-lib`, which provisions the native libraries
//! the tauri libmpv plugin loads at runtime.
//! - Detects the host OS/arch.
//! - Looks up the matching asset in a release's `sha256.txt`.
//! - Downloads, extracts (zip or 7z) and moves the library into place.
//!
//! Windows additionally gets `libmpv-2.dll`; other platforms are expected to
//! have libmpv from their package manager.

pub mod config;
pub mod errors;
pub mod install;
pub mod manifest;
pub mod net;
pub mod pipeline;
pub mod platform;
pub mod report;
pub mod types;

pub use config::SetupConfig;
pub use errors::{CleanupError, SetupError};
pub use install::{extract_archive, locate_and_move};
pub use manifest::{fetch_manifest, find_asset, resolve_asset};
pub use net::download_to_path;
pub use pipeline::Pipeline;
pub use report::{ConsoleReporter, Reporter, SilentReporter};
pub use types::*;

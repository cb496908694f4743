//! Host detection: maps OS/arch identifiers to the names release assets use.

use crate::errors::{Result, SetupError};
use crate::types::{ArchName, OsName, SystemProfile};

fn os_key(platform: &str) -> Option<OsName> {
    match platform {
        "windows" | "win32" => Some(OsName::Windows),
        "macos" | "darwin" => Some(OsName::Macos),
        "linux" => Some(OsName::Linux),
        _ => None,
    }
}

fn arch_key(arch: &str) -> Option<ArchName> {
    match arch {
        "x86_64" | "x64" => Some(ArchName::X86_64),
        "aarch64" | "arm64" => Some(ArchName::Aarch64),
        _ => None,
    }
}

impl SystemProfile {
    /// Profile of the machine we are running on.
    pub fn detect() -> Result<Self> {
        Self::from_host(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Pure mapping from raw host identifiers. The OS is checked first, so a
    /// host with both an unknown OS and arch reports the OS.
    pub fn from_host(platform: &str, arch: &str) -> Result<Self> {
        let os = os_key(platform).ok_or_else(|| SetupError::UnsupportedPlatform(platform.into()))?;
        let arch = arch_key(arch).ok_or_else(|| SetupError::UnsupportedArchitecture(arch.into()))?;

        Ok(SystemProfile {
            platform: platform.to_string(),
            os,
            arch,
            wrapper_lib_name: os.wrapper_lib_name(),
        })
    }
}

//! Host platform resolution.

use serde::Serialize;

use crate::error::{InstallError, InstallResult};

/// Operating system of a release artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Os {
    Darwin,
    Linux,
    Windows,
}

impl Os {
    /// All operating systems with published artifacts.
    pub const ALL: [Os; 3] = [Os::Darwin, Os::Linux, Os::Windows];

    /// Parse a host or user-supplied OS name.
    pub fn parse(s: &str) -> InstallResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "darwin" | "macos" => Ok(Self::Darwin),
            "linux" => Ok(Self::Linux),
            "windows" => Ok(Self::Windows),
            _ => Err(InstallError::UnsupportedPlatform {
                value: s.to_string(),
            }),
        }
    }

    /// Get the name used in artifact filenames.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Darwin => "darwin",
            Self::Linux => "linux",
            Self::Windows => "windows",
        }
    }

    /// File name of the tool executable on this OS.
    pub fn executable_name(&self, tool: &str) -> String {
        match self {
            Self::Windows => format!("{tool}.exe"),
            Self::Darwin | Self::Linux => tool.to_string(),
        }
    }
}

impl std::fmt::Display for Os {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CPU architecture of a release artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    Amd64,
    Arm64,
}

impl Arch {
    /// All architectures with published artifacts.
    pub const ALL: [Arch; 2] = [Arch::Amd64, Arch::Arm64];

    /// Parse a host or user-supplied architecture name.
    pub fn parse(s: &str) -> InstallResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "x86_64" | "amd64" | "x64" => Ok(Self::Amd64),
            "aarch64" | "arm64" => Ok(Self::Arm64),
            _ => Err(InstallError::UnsupportedPlatform {
                value: s.to_string(),
            }),
        }
    }

    /// Get the name used in artifact filenames.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Amd64 => "amd64",
            Self::Arm64 => "arm64",
        }
    }
}

impl std::fmt::Display for Arch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical (os, arch) pair used to name artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Platform {
    pub os: Os,
    pub arch: Arch,
}

impl Platform {
    pub fn new(os: Os, arch: Arch) -> Self {
        Self { os, arch }
    }

    /// Resolve a platform from raw host names.
    ///
    /// The OS is checked first, so an unknown OS is reported even when the
    /// architecture is also unknown.
    pub fn from_host(os: &str, arch: &str) -> InstallResult<Self> {
        let os = Os::parse(os)?;
        let arch = Arch::parse(arch)?;
        Ok(Self { os, arch })
    }

    /// Resolve the platform this process is running on.
    pub fn current() -> InstallResult<Self> {
        Self::from_host(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Every supported platform.
    pub fn all() -> impl Iterator<Item = Platform> {
        Os::ALL
            .into_iter()
            .flat_map(|os| Arch::ALL.into_iter().map(move |arch| Platform { os, arch }))
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.os, self.arch)
    }
}

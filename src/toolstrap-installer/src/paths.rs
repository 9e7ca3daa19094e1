//! Install target path resolution.
//!
//! The installer never writes the final binary itself; the bootstrap binary's
//! self-update does. These paths are computed so the result can be reported
//! and exported to later CI steps.
//!
//! Resolution order:
//! - `TOOL_ROOT`: install root override, any OS
//! - Windows: `%LOCALAPPDATA%\tool`
//! - Linux/macOS: `$XDG_DATA_HOME/tool`, else `~/.local/share/tool`
//!
//! The binary lives in `bin/` under the install root.

use std::path::{Path, PathBuf};

use crate::TOOL_NAME;
use crate::error::{InstallError, InstallResult};
use crate::platform::Os;

/// Install root override.
pub const ROOT_ENV: &str = "TOOL_ROOT";

/// Data-home override on Unix-like systems.
pub const DATA_HOME_ENV: &str = "XDG_DATA_HOME";

/// Per-user local application data on Windows.
pub const LOCAL_APP_DATA_ENV: &str = "LOCALAPPDATA";

/// Snapshot of the environment values that decide the install path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallEnv {
    /// `TOOL_ROOT`
    pub root: Option<PathBuf>,
    /// `XDG_DATA_HOME`
    pub data_home: Option<PathBuf>,
    /// `LOCALAPPDATA`
    pub local_app_data: Option<PathBuf>,
    /// User home directory
    pub home: Option<PathBuf>,
}

impl InstallEnv {
    /// Capture the current process environment.
    ///
    /// Empty variables count as unset. A relative `TOOL_ROOT` is resolved
    /// against the current directory.
    pub fn from_process() -> Self {
        let root = env_path(ROOT_ENV).map(|root| {
            if root.is_relative() {
                match std::env::current_dir() {
                    Ok(cwd) => cwd.join(root),
                    Err(_) => root,
                }
            } else {
                root
            }
        });

        Self {
            root,
            data_home: env_path(DATA_HOME_ENV),
            local_app_data: env_path(LOCAL_APP_DATA_ENV),
            home: dirs::home_dir(),
        }
    }

    /// Directory the tool installs itself under.
    pub fn install_root(&self, os: Os, tool: &str) -> InstallResult<PathBuf> {
        if let Some(root) = &self.root {
            return Ok(root.clone());
        }

        let base = match os {
            Os::Windows => self
                .local_app_data
                .clone()
                .or_else(|| self.home.as_ref().map(|h| h.join("AppData").join("Local"))),
            Os::Darwin | Os::Linux => self
                .data_home
                .clone()
                .or_else(|| self.home.as_ref().map(|h| h.join(".local").join("share"))),
        };

        base.map(|b| b.join(tool))
            .ok_or_else(|| InstallError::InstallPathUnavailable {
                os: os.to_string(),
            })
    }

    /// Full path of the installed executable.
    pub fn install_path(&self, os: Os, tool: &str) -> InstallResult<PathBuf> {
        Ok(self
            .install_root(os, tool)?
            .join("bin")
            .join(os.executable_name(tool)))
    }
}

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var_os(name)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Where the tool will live after an install on `os`.
///
/// Reads the process environment but performs no filesystem I/O.
pub fn resolve_install_path(os: &str) -> InstallResult<PathBuf> {
    let os = Os::parse(os)?;
    InstallEnv::from_process().install_path(os, TOOL_NAME)
}

/// Directory to put on `PATH` for an installed executable.
pub fn bin_dir(install_path: &Path) -> Option<&Path> {
    install_path.parent()
}

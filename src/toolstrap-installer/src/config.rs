//! Installer configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Environment variable overriding the overall download timeout, in seconds.
pub const TIMEOUT_ENV: &str = "TOOLSTRAP_DOWNLOAD_TIMEOUT_SECS";

/// Environment variable overriding where temporary workspaces are created.
pub const TEMP_DIR_ENV: &str = "TOOLSTRAP_TEMP_DIR";

/// Tunables for an install attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallerConfig {
    /// Upper bound on the whole download, in seconds (default: 300)
    #[serde(default = "default_download_timeout")]
    pub download_timeout_secs: u64,

    /// Connect timeout, in seconds (default: 30)
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Parent directory for temporary workspaces (default: system temp dir)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp_root: Option<PathBuf>,

    /// Subcommand that makes the bootstrap binary update itself
    #[serde(default = "default_self_update_command")]
    pub self_update_command: String,

    /// Flag that makes the installed binary print its version
    #[serde(default = "default_version_flag")]
    pub version_flag: String,
}

fn default_download_timeout() -> u64 {
    300
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_self_update_command() -> String {
    "self-update".to_string()
}

fn default_version_flag() -> String {
    "--version".to_string()
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            download_timeout_secs: default_download_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            temp_root: None,
            self_update_command: default_self_update_command(),
            version_flag: default_version_flag(),
        }
    }
}

impl InstallerConfig {
    /// Build a config from defaults and `TOOLSTRAP_*` environment variables.
    ///
    /// Unparseable values are ignored with a warning.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var(TIMEOUT_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.download_timeout_secs = secs,
                _ => tracing::warn!("Ignoring invalid {}={:?}", TIMEOUT_ENV, raw),
            }
        }

        if let Some(dir) = std::env::var_os(TEMP_DIR_ENV).filter(|v| !v.is_empty()) {
            config.temp_root = Some(PathBuf::from(dir));
        }

        config
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

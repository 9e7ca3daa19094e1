//! Toolstrap Installer - verified bootstrap of a pinned tool release
//!
//! Installs the tool on a machine that has never seen it, typically a CI
//! runner:
//! - Resolves the host platform to a release artifact
//! - Downloads it and checks it against a SHA256 pinned at build time
//! - Unpacks it (tar.gz, or zip on Windows) into a private temp directory
//! - Runs the unpacked binary's `self-update` to reach the requested version
//!
//! Nothing downloaded is extracted or executed before its checksum matches.
//!
//! # Example
//!
//! ```rust,ignore
//! use toolstrap_installer::Installer;
//!
//! let outcome = Installer::new().install(Some("v3.1.0")).await?;
//! println!("{}", outcome.install_path.display());
//! ```

mod artifact;
mod config;
mod download;
mod error;
mod extract;
mod http_client;
mod install;
mod paths;
mod platform;
mod verify;
mod workspace;

pub use artifact::{Artifact, BootstrapManifest, ChecksumTable};
pub use config::{InstallerConfig, TEMP_DIR_ENV, TIMEOUT_ENV};
pub use download::{DownloadProgress, fetch};
pub use error::{ErrorKind, InstallError, InstallResult};
pub use extract::{ArchiveExtractor, ArchiveKind, extract, mark_executable};
pub use http_client::{USER_AGENT, create_download_client};
pub use install::{InstallOutcome, Installer, Stage};
pub use paths::{
    DATA_HOME_ENV, InstallEnv, LOCAL_APP_DATA_ENV, ROOT_ENV, bin_dir, resolve_install_path,
};
pub use platform::{Arch, Os, Platform};
pub use verify::{calculate_sha256, verify_sha256};
pub use workspace::TempWorkspace;

/// Name of the bootstrapped executable and its artifacts
pub const TOOL_NAME: &str = "tool";

/// Release the installer downloads before handing over to self-update
pub const PINNED_VERSION: &str = "v2.55.1";

/// Release download prefix; the tag and filename are appended
pub const RELEASE_BASE_URL: &str = "https://github.com/tool-cli/tool/releases/download";

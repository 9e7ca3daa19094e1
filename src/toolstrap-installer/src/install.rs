//! Bootstrap install driver.

use std::path::{Path, PathBuf};

use reqwest::Client;
use tokio::process::Command;

use crate::artifact::{Artifact, BootstrapManifest};
use crate::config::InstallerConfig;
use crate::download::fetch;
use crate::error::{InstallError, InstallResult};
use crate::extract::{extract, mark_executable};
use crate::http_client::create_download_client;
use crate::paths::{InstallEnv, ROOT_ENV};
use crate::platform::Platform;
use crate::verify::verify_sha256;
use crate::workspace::TempWorkspace;

/// Step of an install attempt, reported as it is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    PlatformResolved,
    ArtifactLocated,
    Downloaded,
    Verified,
    Extracted,
    PermissionSet,
    SelfUpdated,
    Reported,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PlatformResolved => "platform resolved",
            Self::ArtifactLocated => "artifact located",
            Self::Downloaded => "downloaded",
            Self::Verified => "verified",
            Self::Extracted => "extracted",
            Self::PermissionSet => "permission set",
            Self::SelfUpdated => "self-updated",
            Self::Reported => "reported",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a successful install.
#[derive(Debug, Clone)]
pub struct InstallOutcome {
    /// Platform the artifact was chosen for
    pub platform: Platform,
    /// Pinned version that was downloaded
    pub bootstrap_version: String,
    /// Version passed to self-update, if any
    pub target_version: Option<String>,
    /// Where the tool now lives
    pub install_path: PathBuf,
    /// Output of the installed binary's version flag, if it ran
    pub reported_version: Option<String>,
}

/// Downloads, verifies and unpacks the pinned bootstrap release, then lets it
/// update itself to the requested version.
pub struct Installer {
    manifest: BootstrapManifest,
    config: InstallerConfig,
    env: InstallEnv,
    host_os: String,
    host_arch: String,
}

impl Installer {
    /// Create an installer for the pinned release, configured from the environment.
    pub fn new() -> Self {
        Self::with_config(InstallerConfig::from_env())
    }

    /// Create with a specific config.
    pub fn with_config(config: InstallerConfig) -> Self {
        Self {
            manifest: BootstrapManifest::pinned(),
            config,
            env: InstallEnv::from_process(),
            host_os: std::env::consts::OS.to_string(),
            host_arch: std::env::consts::ARCH.to_string(),
        }
    }

    /// Replace the release manifest.
    pub fn with_manifest(mut self, manifest: BootstrapManifest) -> Self {
        self.manifest = manifest;
        self
    }

    /// Replace the environment snapshot used for the install path.
    pub fn with_env(mut self, env: InstallEnv) -> Self {
        self.env = env;
        self
    }

    /// Pretend to run on another host.
    pub fn with_host(mut self, os: impl Into<String>, arch: impl Into<String>) -> Self {
        self.host_os = os.into();
        self.host_arch = arch.into();
        self
    }

    pub fn config(&self) -> &InstallerConfig {
        &self.config
    }

    pub fn manifest(&self) -> &BootstrapManifest {
        &self.manifest
    }

    /// Resolve the host platform.
    pub fn platform(&self) -> InstallResult<Platform> {
        Platform::from_host(&self.host_os, &self.host_arch)
    }

    /// Where the tool ends up on this host, without installing.
    pub fn install_path(&self) -> InstallResult<PathBuf> {
        let platform = self.platform()?;
        self.env.install_path(platform.os, &self.manifest.tool)
    }

    /// Install the tool, converging it to `target_version` (or its default).
    pub async fn install(&self, target_version: Option<&str>) -> InstallResult<InstallOutcome> {
        self.install_with_progress(target_version, |_| {}).await
    }

    /// Install, calling `on_stage` as each stage is reached.
    pub async fn install_with_progress<F>(
        &self,
        target_version: Option<&str>,
        mut on_stage: F,
    ) -> InstallResult<InstallOutcome>
    where
        F: FnMut(Stage),
    {
        let target_version = target_version
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        // Everything up to here is pure: an unsupported host never touches
        // the network or the filesystem.
        let platform = self.platform()?;
        tracing::info!("Platform: {}", platform);
        on_stage(Stage::PlatformResolved);

        let artifact = self.manifest.locate(platform)?;
        tracing::info!("Bootstrap artifact: {} ({})", artifact.filename, self.manifest.version);
        on_stage(Stage::ArtifactLocated);

        let install_path = self.env.install_path(platform.os, &self.manifest.tool)?;
        let client = create_download_client(&self.config)?;

        let workspace = TempWorkspace::create(self.config.temp_root.as_deref())?;
        let result = self
            .run(
                &workspace,
                &client,
                &artifact,
                target_version.as_deref(),
                &install_path,
                &mut on_stage,
            )
            .await;

        let workspace_path = workspace.path().to_path_buf();
        if let Err(e) = workspace.close() {
            tracing::warn!("Failed to remove {}: {}", workspace_path.display(), e);
        }

        let reported_version = result?;
        tracing::info!("Installed {} at {}", self.manifest.tool, install_path.display());

        Ok(InstallOutcome {
            platform,
            bootstrap_version: self.manifest.version.clone(),
            target_version,
            install_path,
            reported_version,
        })
    }

    /// Download through version report, inside `workspace`.
    async fn run<F>(
        &self,
        workspace: &TempWorkspace,
        client: &Client,
        artifact: &Artifact,
        target_version: Option<&str>,
        install_path: &Path,
        on_stage: &mut F,
    ) -> InstallResult<Option<String>>
    where
        F: FnMut(Stage),
    {
        let archive = workspace.archive_path(&artifact.filename);
        fetch(client, &artifact.url, &archive).await?;
        on_stage(Stage::Downloaded);

        verify_sha256(&archive, &artifact.sha256).await?;
        tracing::info!("Checksum verified: {}", artifact.sha256);
        on_stage(Stage::Verified);

        let binary = extract(
            &archive,
            &workspace.extract_dir()?,
            artifact.kind,
            &artifact.binary_name,
        )?;
        on_stage(Stage::Extracted);

        mark_executable(&binary)?;
        on_stage(Stage::PermissionSet);

        self.self_update(&binary, target_version).await?;
        on_stage(Stage::SelfUpdated);

        let reported = match self.query_version(install_path).await {
            Ok(version) => {
                tracing::info!("{}", version);
                Some(version)
            }
            Err(e) => {
                tracing::warn!("{}", e);
                None
            }
        };
        on_stage(Stage::Reported);

        Ok(reported)
    }

    /// Run `<binary> self-update [<version>]`.
    async fn self_update(&self, binary: &Path, target_version: Option<&str>) -> InstallResult<()> {
        let mut args = vec![self.config.self_update_command.clone()];
        if let Some(version) = target_version {
            args.push(version.to_string());
        }
        let command = format!("{} {}", binary.display(), args.join(" "));
        tracing::info!("Running: {}", command);

        let mut cmd = Command::new(binary);
        cmd.args(&args).kill_on_drop(true);
        if let Some(root) = &self.env.root {
            cmd.env(ROOT_ENV, root);
        }

        let output = cmd.output().await.map_err(|e| InstallError::SpawnFailed {
            command: command.clone(),
            message: e.to_string(),
        })?;

        for line in String::from_utf8_lossy(&output.stdout).lines() {
            tracing::info!("{}", line);
        }

        if !output.status.success() {
            for line in String::from_utf8_lossy(&output.stderr).lines() {
                tracing::error!("{}", line);
            }
            return Err(InstallError::SelfUpdateFailed {
                command,
                code: output.status.code(),
            });
        }

        for line in String::from_utf8_lossy(&output.stderr).lines() {
            tracing::info!("{}", line);
        }

        Ok(())
    }

    /// Run `<install path> --version` and return its output.
    async fn query_version(&self, install_path: &Path) -> InstallResult<String> {
        let failed = |message: String| InstallError::VersionQueryFailed {
            path: install_path.to_path_buf(),
            message,
        };

        let output = Command::new(install_path)
            .arg(&self.config.version_flag)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| failed(e.to_string()))?;

        if !output.status.success() {
            return Err(failed(format!("exited with {}", output.status)));
        }

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if stdout.is_empty() {
            Ok(String::from_utf8_lossy(&output.stderr).trim().to_string())
        } else {
            Ok(stdout)
        }
    }
}

impl Default for Installer {
    fn default() -> Self {
        Self::new()
    }
}

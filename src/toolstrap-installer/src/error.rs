//! Error types for toolstrap-installer.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for install operations.
pub type InstallResult<T> = std::result::Result<T, InstallError>;

/// Stable classification of an [`InstallError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnsupportedPlatform,
    NoChecksum,
    DownloadFailed,
    ChecksumMismatch,
    ExtractionFailed,
    PermissionSetFailed,
    SelfUpdateFailed,
    VersionQueryFailed,
    Workspace,
}

impl ErrorKind {
    /// Short identifier used in diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnsupportedPlatform => "unsupported-platform",
            Self::NoChecksum => "no-checksum",
            Self::DownloadFailed => "download-failed",
            Self::ChecksumMismatch => "checksum-mismatch",
            Self::ExtractionFailed => "extraction-failed",
            Self::PermissionSetFailed => "permission-set-failed",
            Self::SelfUpdateFailed => "self-update-failed",
            Self::VersionQueryFailed => "version-query-failed",
            Self::Workspace => "workspace",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur while bootstrapping the tool.
#[derive(Debug, Error)]
pub enum InstallError {
    // Platform errors
    #[error("Unsupported platform: {value}")]
    UnsupportedPlatform { value: String },

    #[error("No pinned checksum for artifact {filename}")]
    NoChecksum { filename: String },

    // Download errors
    #[error("Failed to build HTTP client: {message}")]
    HttpClient { message: String },

    #[error("Download of {url} failed with HTTP {status}")]
    DownloadStatus { url: String, status: u16 },

    #[error("Download of {url} failed: {message}")]
    DownloadFailed { url: String, message: String },

    // Verification errors
    #[error("SHA256 verification failed: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    // Archive errors
    #[error("Failed to extract archive: {message}")]
    ExtractionFailed { message: String },

    #[error("Archive entry escapes the extraction directory: {entry}")]
    UnsafeArchivePath { entry: String },

    #[error("Binary {name} not found in archive")]
    BinaryNotFound { name: String },

    #[error("Failed to mark {path} executable: {source}")]
    PermissionSetFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Process errors
    #[error("Self-update failed: {command} (exit code: {code:?})")]
    SelfUpdateFailed { command: String, code: Option<i32> },

    #[error("Failed to run {command}: {message}")]
    SpawnFailed { command: String, message: String },

    #[error("Version query of {path} failed: {message}")]
    VersionQueryFailed { path: PathBuf, message: String },

    // File system errors
    #[error("Cannot determine install directory for {os}: no home directory")]
    InstallPathUnavailable { os: String },

    #[error("Failed to create temp directory: {0}")]
    TempDirFailed(#[source] std::io::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl InstallError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedPlatform { .. } => ErrorKind::UnsupportedPlatform,
            Self::NoChecksum { .. } => ErrorKind::NoChecksum,
            Self::HttpClient { .. } | Self::DownloadStatus { .. } | Self::DownloadFailed { .. } => {
                ErrorKind::DownloadFailed
            }
            Self::ChecksumMismatch { .. } => ErrorKind::ChecksumMismatch,
            Self::ExtractionFailed { .. }
            | Self::UnsafeArchivePath { .. }
            | Self::BinaryNotFound { .. } => ErrorKind::ExtractionFailed,
            Self::PermissionSetFailed { .. } => ErrorKind::PermissionSetFailed,
            Self::SelfUpdateFailed { .. } | Self::SpawnFailed { .. } => ErrorKind::SelfUpdateFailed,
            Self::VersionQueryFailed { .. } => ErrorKind::VersionQueryFailed,
            Self::InstallPathUnavailable { .. } | Self::TempDirFailed(_) | Self::Io(_) => {
                ErrorKind::Workspace
            }
        }
    }

    /// Whether the install attempt must be abandoned.
    ///
    /// Only the final version query is non-fatal.
    pub fn is_fatal(&self) -> bool {
        self.kind() != ErrorKind::VersionQueryFailed
    }

    /// Check if retrying the whole install may succeed.
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::DownloadFailed { .. } => true,
            Self::DownloadStatus { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

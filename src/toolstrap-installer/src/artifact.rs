//! Release artifact naming and pinned checksums.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::Serialize;

use crate::error::{InstallError, InstallResult};
use crate::extract::ArchiveKind;
use crate::platform::Platform;
use crate::{PINNED_VERSION, RELEASE_BASE_URL, TOOL_NAME};

/// SHA256 digests of the release archives published for [`PINNED_VERSION`].
const PINNED_CHECKSUMS: &[(&str, &str)] = &[
    (
        "tool_darwin_amd64.tar.gz",
        "f66362653e497644484f689e1b7191815df5ee0f655b7bbfd8ae67c5c402ad23",
    ),
    (
        "tool_darwin_arm64.tar.gz",
        "f02d4f2265b08689528af8f270895f422ab7b3fb060b63afb1c09718d7d3757f",
    ),
    (
        "tool_linux_amd64.tar.gz",
        "d704b4fe573d01be8c98c40def110bcedff3da1440ce136596dd71c8dd762f0d",
    ),
    (
        "tool_linux_arm64.tar.gz",
        "0748ffa7d115643a3e5b53b7eb829c6e57caf6f43245bd8520b3e5d93a671d1c",
    ),
    (
        "tool_windows_amd64.zip",
        "509aebaf1f95a8099f61824060c1dad1dc37a784850a28c15363f22944a808a1",
    ),
    (
        "tool_windows_arm64.zip",
        "6c5186f612eee885456393a5fe6abce8fda8e1dc7457a64e727b8c4ce1841e01",
    ),
];

static PINNED_TABLE: Lazy<ChecksumTable> =
    Lazy::new(|| PINNED_CHECKSUMS.iter().copied().collect());

/// Map from artifact filename to expected hex digest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChecksumTable {
    entries: HashMap<String, String>,
}

impl ChecksumTable {
    /// The table shipped with this build.
    pub fn pinned() -> &'static ChecksumTable {
        &PINNED_TABLE
    }

    /// Look up the expected digest for a filename.
    pub fn get(&self, filename: &str) -> Option<&str> {
        self.entries.get(filename).map(String::as_str)
    }

    pub fn filenames(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ChecksumTable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Everything needed to fetch one bootstrap release.
///
/// The pinned manifest is fixed at build time. Other manifests exist so tests
/// can point the installer at a local release host.
#[derive(Debug, Clone)]
pub struct BootstrapManifest {
    /// Executable and artifact name prefix
    pub tool: String,
    /// Release tag the checksums belong to
    pub version: String,
    /// URL prefix that release tags are appended to
    pub release_base: String,
    /// Expected digests keyed by artifact filename
    pub checksums: ChecksumTable,
}

impl BootstrapManifest {
    /// The manifest baked into this build.
    pub fn pinned() -> Self {
        Self {
            tool: TOOL_NAME.to_string(),
            version: PINNED_VERSION.to_string(),
            release_base: RELEASE_BASE_URL.to_string(),
            checksums: ChecksumTable::pinned().clone(),
        }
    }

    /// Archive filename for a platform.
    pub fn filename(&self, platform: Platform) -> String {
        format!(
            "{}_{}_{}.{}",
            self.tool,
            platform.os,
            platform.arch,
            ArchiveKind::for_os(platform.os).extension()
        )
    }

    /// Resolve the artifact for a platform.
    pub fn locate(&self, platform: Platform) -> InstallResult<Artifact> {
        let filename = self.filename(platform);
        let sha256 = self
            .checksums
            .get(&filename)
            .ok_or_else(|| InstallError::NoChecksum {
                filename: filename.clone(),
            })?
            .to_string();

        let url = format!(
            "{}/{}/{}",
            self.release_base.trim_end_matches('/'),
            self.version,
            filename
        );

        Ok(Artifact {
            url,
            filename,
            sha256,
            kind: ArchiveKind::for_os(platform.os),
            binary_name: platform.os.executable_name(&self.tool),
        })
    }
}

impl Default for BootstrapManifest {
    fn default() -> Self {
        Self::pinned()
    }
}

/// A located release archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    /// Download URL
    pub url: String,
    /// Archive filename
    pub filename: String,
    /// Expected SHA256 (hex)
    pub sha256: String,
    /// Archive format
    pub kind: ArchiveKind,
    /// Executable path relative to the archive root
    pub binary_name: String,
}

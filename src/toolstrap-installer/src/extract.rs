//! Archive extraction.
//!
//! Only regular files are materialized, and every entry path is checked so
//! that nothing lands outside the destination directory. This holds even
//! though archives are checksum-verified before they reach this module.

use std::fs::File;
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use serde::Serialize;
use tar::{Archive, EntryType};

use crate::error::{InstallError, InstallResult};
use crate::platform::Os;

/// Archive format of a release artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchiveKind {
    /// gzip-compressed tarball (`.tar.gz`)
    TarGz,
    /// zip archive (`.zip`)
    Zip,
}

impl ArchiveKind {
    /// Format used for artifacts built for `os`.
    pub fn for_os(os: Os) -> Self {
        match os {
            Os::Windows => Self::Zip,
            Os::Darwin | Os::Linux => Self::TarGz,
        }
    }

    /// Filename extension, without the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::TarGz => "tar.gz",
            Self::Zip => "zip",
        }
    }

    /// Extraction strategy for this format.
    pub fn extractor(&self) -> &'static dyn ArchiveExtractor {
        match self {
            Self::TarGz => &TarGzExtractor,
            Self::Zip => &ZipExtractor,
        }
    }
}

/// Unpacks one archive format into a directory.
pub trait ArchiveExtractor: Send + Sync {
    fn extract(&self, archive: &Path, dest: &Path) -> InstallResult<()>;
}

/// Extracts `.tar.gz` archives.
pub struct TarGzExtractor;

impl ArchiveExtractor for TarGzExtractor {
    fn extract(&self, archive: &Path, dest: &Path) -> InstallResult<()> {
        let file = File::open(archive).map_err(extraction_failed)?;
        let mut archive = Archive::new(GzDecoder::new(file));

        for entry in archive.entries().map_err(extraction_failed)? {
            let mut entry = entry.map_err(extraction_failed)?;
            let raw = entry.path().map_err(extraction_failed)?.into_owned();
            let entry_type = entry.header().entry_type();

            if !matches!(entry_type, EntryType::Regular | EntryType::Continuous) {
                tracing::debug!("Skipping {:?} entry {}", entry_type, raw.display());
                continue;
            }

            let target = dest.join(sanitize_entry_path(&raw)?);
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent).map_err(extraction_failed)?;
            }
            entry.unpack(&target).map_err(extraction_failed)?;
        }

        Ok(())
    }
}

/// Extracts `.zip` archives.
pub struct ZipExtractor;

impl ArchiveExtractor for ZipExtractor {
    fn extract(&self, archive: &Path, dest: &Path) -> InstallResult<()> {
        let file = File::open(archive).map_err(extraction_failed)?;
        let mut archive = zip::ZipArchive::new(file).map_err(extraction_failed)?;

        for i in 0..archive.len() {
            let mut entry = archive.by_index(i).map_err(extraction_failed)?;
            let relative = entry
                .enclosed_name()
                .ok_or_else(|| InstallError::UnsafeArchivePath {
                    entry: entry.name().to_string(),
                })?;

            if entry.is_dir() || entry.is_symlink() {
                tracing::debug!("Skipping non-file entry {}", entry.name());
                continue;
            }

            let target = dest.join(sanitize_entry_path(&relative)?);
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent).map_err(extraction_failed)?;
            }
            let mut out = File::create(&target).map_err(extraction_failed)?;
            std::io::copy(&mut entry, &mut out).map_err(extraction_failed)?;
        }

        Ok(())
    }
}

fn extraction_failed(e: impl std::fmt::Display) -> InstallError {
    InstallError::ExtractionFailed {
        message: e.to_string(),
    }
}

/// Reduce an entry path to plain relative components.
///
/// Absolute paths, drive prefixes and `..` are rejected outright rather than
/// normalized.
fn sanitize_entry_path(raw: &Path) -> InstallResult<PathBuf> {
    let mut clean = PathBuf::new();
    for component in raw.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(InstallError::UnsafeArchivePath {
                    entry: raw.display().to_string(),
                });
            }
        }
    }

    if clean.as_os_str().is_empty() {
        return Err(InstallError::UnsafeArchivePath {
            entry: raw.display().to_string(),
        });
    }

    Ok(clean)
}

/// Extract `archive` into `dest` and return the path of `binary_name`.
///
/// The binary must sit at the archive root as a regular file.
pub fn extract(
    archive: &Path,
    dest: &Path,
    kind: ArchiveKind,
    binary_name: &str,
) -> InstallResult<PathBuf> {
    kind.extractor().extract(archive, dest)?;

    let binary = dest.join(binary_name);
    match std::fs::symlink_metadata(&binary) {
        Ok(meta) if meta.is_file() => Ok(binary),
        _ => Err(InstallError::BinaryNotFound {
            name: binary_name.to_string(),
        }),
    }
}

/// Set the binary's mode to 0755.
#[cfg(unix)]
pub fn mark_executable(path: &Path) -> InstallResult<()> {
    use std::os::unix::fs::PermissionsExt;

    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).map_err(|source| {
        InstallError::PermissionSetFailed {
            path: path.to_path_buf(),
            source,
        }
    })
}

/// Windows has no execute bit; only check the file is still there.
#[cfg(not(unix))]
pub fn mark_executable(path: &Path) -> InstallResult<()> {
    std::fs::metadata(path)
        .map(|_| ())
        .map_err(|source| InstallError::PermissionSetFailed {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    /// Append a regular file whose name is written verbatim into the header.
    ///
    /// `tar::Header::set_path` refuses `..`, so hostile names go in by hand.
    fn append_raw<W: Write>(builder: &mut tar::Builder<W>, name: &str, data: &[u8]) {
        let mut header = tar::Header::new_gnu();
        let bytes = name.as_bytes();
        header.as_gnu_mut().unwrap().name[..bytes.len()].copy_from_slice(bytes);
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_entry_type(EntryType::Regular);
        header.set_cksum();
        builder.append(&header, data).unwrap();
    }

    fn write_tar_gz(path: &Path, build: impl FnOnce(&mut tar::Builder<GzEncoder<File>>)) {
        let file = File::create(path).unwrap();
        let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
        build(&mut builder);
        builder.into_inner().unwrap().finish().unwrap();
    }

    #[test]
    fn test_archive_kind_for_os() {
        assert_eq!(ArchiveKind::for_os(Os::Windows), ArchiveKind::Zip);
        assert_eq!(ArchiveKind::for_os(Os::Linux), ArchiveKind::TarGz);
        assert_eq!(ArchiveKind::for_os(Os::Darwin).extension(), "tar.gz");
    }

    #[test]
    fn test_sanitize_entry_path() {
        assert_eq!(
            sanitize_entry_path(Path::new("./bin/tool")).unwrap(),
            PathBuf::from("bin/tool")
        );
        assert!(sanitize_entry_path(Path::new("../../etc/passwd")).is_err());
        assert!(sanitize_entry_path(Path::new("bin/../../x")).is_err());
        assert!(sanitize_entry_path(Path::new("/etc/passwd")).is_err());
        assert!(sanitize_entry_path(Path::new(".")).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_extract_tar_gz_and_mark_executable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("tool_linux_amd64.tar.gz");
        write_tar_gz(&archive, |b| {
            append_raw(b, "tool", b"#!/bin/sh\necho ok\n");
            append_raw(b, "docs/README.md", b"readme");
        });

        let dest = dir.path().join("out");
        std::fs::create_dir(&dest).unwrap();
        let binary = extract(&archive, &dest, ArchiveKind::TarGz, "tool").unwrap();

        assert_eq!(binary, dest.join("tool"));
        assert_eq!(std::fs::read(dest.join("docs/README.md")).unwrap(), b"readme");

        mark_executable(&binary).unwrap();
        let mode = std::fs::metadata(&binary).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[test]
    fn test_extract_rejects_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("evil.tar.gz");
        write_tar_gz(&archive, |b| {
            append_raw(b, "tool", b"binary");
            append_raw(b, "../../etc/passwd", b"root::0:0::/:/bin/sh\n");
        });

        let dest = dir.path().join("a").join("b");
        std::fs::create_dir_all(&dest).unwrap();
        let err = extract(&archive, &dest, ArchiveKind::TarGz, "tool").unwrap_err();

        assert!(matches!(err, InstallError::UnsafeArchivePath { ref entry } if entry == "../../etc/passwd"));
        assert_eq!(err.kind(), ErrorKind::ExtractionFailed);
        // ../../ from dest is the tempdir root
        assert!(!dir.path().join("etc").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_extract_skips_symlinks() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("link.tar.gz");
        write_tar_gz(&archive, |b| {
            let mut header = tar::Header::new_gnu();
            header.set_entry_type(EntryType::Symlink);
            header.set_size(0);
            header.set_mode(0o777);
            b.append_link(&mut header, "tool", "/bin/sh").unwrap();
        });

        let dest = dir.path().join("out");
        std::fs::create_dir(&dest).unwrap();
        let err = extract(&archive, &dest, ArchiveKind::TarGz, "tool").unwrap_err();

        assert!(matches!(err, InstallError::BinaryNotFound { .. }));
        assert!(std::fs::symlink_metadata(dest.join("tool")).is_err());
    }

    #[test]
    fn test_extract_missing_binary() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("empty.tar.gz");
        write_tar_gz(&archive, |b| append_raw(b, "bin/other", b"x"));

        let dest = dir.path().join("out");
        std::fs::create_dir(&dest).unwrap();
        let err = extract(&archive, &dest, ArchiveKind::TarGz, "tool").unwrap_err();

        assert!(matches!(err, InstallError::BinaryNotFound { ref name } if name == "tool"));
    }

    #[test]
    fn test_extract_corrupt_gzip() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("corrupt.tar.gz");
        std::fs::write(&archive, b"definitely not gzip").unwrap();

        let dest = dir.path().join("out");
        std::fs::create_dir(&dest).unwrap();
        let err = extract(&archive, &dest, ArchiveKind::TarGz, "tool").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExtractionFailed);
    }

    #[test]
    fn test_extract_file_dir_clash_is_extraction_error() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("clash.tar.gz");
        write_tar_gz(&archive, |b| {
            append_raw(b, "tool", b"binary");
            append_raw(b, "tool/x", b"nested");
        });

        let dest = dir.path().join("out");
        std::fs::create_dir(&dest).unwrap();
        let err = extract(&archive, &dest, ArchiveKind::TarGz, "tool").unwrap_err();

        assert!(matches!(err, InstallError::ExtractionFailed { .. }), "{err:?}");
        assert_eq!(err.kind(), ErrorKind::ExtractionFailed);
    }

    #[test]
    fn test_extract_missing_archive_is_extraction_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = extract(
            &dir.path().join("gone.zip"),
            dir.path(),
            ArchiveKind::Zip,
            "tool.exe",
        )
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ExtractionFailed);
    }

    #[test]
    fn test_mark_executable_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("tool");

        let err = mark_executable(&missing).unwrap_err();

        assert!(matches!(err, InstallError::PermissionSetFailed { ref path, .. } if path == &missing));
        assert_eq!(err.kind(), ErrorKind::PermissionSetFailed);
        assert!(err.is_fatal());
    }

    #[test]
    fn test_extract_zip() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("tool_windows_amd64.zip");
        {
            let file = File::create(&archive).unwrap();
            let mut writer = zip::ZipWriter::new(file);
            let options = zip::write::SimpleFileOptions::default();
            writer.add_directory("licenses/", options).unwrap();
            writer.start_file("licenses/LICENSE", options).unwrap();
            writer.write_all(b"MIT").unwrap();
            writer.start_file("tool.exe", options).unwrap();
            writer.write_all(b"MZ").unwrap();
            writer.finish().unwrap();
        }

        let dest = dir.path().join("out");
        std::fs::create_dir(&dest).unwrap();
        let binary = extract(&archive, &dest, ArchiveKind::Zip, "tool.exe").unwrap();

        assert_eq!(std::fs::read(binary).unwrap(), b"MZ");
        assert_eq!(std::fs::read(dest.join("licenses/LICENSE")).unwrap(), b"MIT");
    }

    #[test]
    fn test_extract_zip_rejects_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("evil.zip");
        {
            let file = File::create(&archive).unwrap();
            let mut writer = zip::ZipWriter::new(file);
            let options = zip::write::SimpleFileOptions::default();
            writer.start_file("../evil.exe", options).unwrap();
            writer.write_all(b"MZ").unwrap();
            writer.finish().unwrap();
        }

        let dest = dir.path().join("out");
        std::fs::create_dir(&dest).unwrap();
        let err = extract(&archive, &dest, ArchiveKind::Zip, "tool.exe").unwrap_err();

        assert!(matches!(err, InstallError::UnsafeArchivePath { .. }));
        assert!(!dir.path().join("evil.exe").exists());
    }
}

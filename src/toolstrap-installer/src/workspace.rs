//! Per-attempt temporary workspace.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::{InstallError, InstallResult};

const PREFIX: &str = "toolstrap-";

/// Exclusively-owned scratch directory for one install attempt.
///
/// Holds the downloaded archive and its extracted contents. [`close`] removes
/// it and reports failures; if the guard is dropped instead (early return,
/// panic) the directory is still removed, best-effort.
///
/// [`close`]: TempWorkspace::close
#[derive(Debug)]
pub struct TempWorkspace {
    dir: TempDir,
}

impl TempWorkspace {
    /// Create a randomly-named directory under `parent` (or the system temp dir).
    ///
    /// On Unix the directory is created owner-only (0700).
    pub fn create(parent: Option<&Path>) -> InstallResult<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(PREFIX);
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            builder.permissions(std::fs::Permissions::from_mode(0o700));
        }

        let dir = match parent {
            Some(parent) => {
                std::fs::create_dir_all(parent).map_err(InstallError::TempDirFailed)?;
                builder.tempdir_in(parent)
            }
            None => builder.tempdir(),
        }
        .map_err(InstallError::TempDirFailed)?;

        tracing::debug!("Created workspace {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Where the downloaded archive is written.
    pub fn archive_path(&self, filename: &str) -> PathBuf {
        self.dir.path().join(filename)
    }

    /// Directory the archive is unpacked into, created on first call.
    pub fn extract_dir(&self) -> InstallResult<PathBuf> {
        let dir = self.dir.path().join("extract");
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Remove the workspace, reporting failure.
    pub fn close(self) -> std::io::Result<()> {
        let path = self.dir.path().to_path_buf();
        self.dir.close()?;
        if path.exists() {
            return Err(std::io::Error::other(format!(
                "{} still exists after removal",
                path.display()
            )));
        }
        tracing::debug!("Removed workspace {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_removes_contents() {
        let parent = tempfile::tempdir().unwrap();
        let workspace = TempWorkspace::create(Some(parent.path())).unwrap();
        let path = workspace.path().to_path_buf();

        std::fs::write(workspace.archive_path("a.tar.gz"), b"data").unwrap();
        let extract = workspace.extract_dir().unwrap();
        std::fs::write(extract.join("tool"), b"bin").unwrap();

        workspace.close().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_close_reports_missing_directory() {
        let parent = tempfile::tempdir().unwrap();
        let workspace = TempWorkspace::create(Some(parent.path())).unwrap();
        std::fs::remove_dir_all(workspace.path()).unwrap();

        assert!(workspace.close().is_err());
    }

    #[test]
    fn test_drop_removes_directory() {
        let parent = tempfile::tempdir().unwrap();
        let path = {
            let workspace = TempWorkspace::create(Some(parent.path())).unwrap();
            workspace.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_workspaces_are_isolated() {
        let parent = tempfile::tempdir().unwrap();
        let a = TempWorkspace::create(Some(parent.path())).unwrap();
        let b = TempWorkspace::create(Some(parent.path())).unwrap();
        assert_ne!(a.path(), b.path());
        assert!(a.path().file_name().unwrap().to_string_lossy().starts_with(PREFIX));
    }

    #[cfg(unix)]
    #[test]
    fn test_owner_only_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let parent = tempfile::tempdir().unwrap();
        let workspace = TempWorkspace::create(Some(parent.path())).unwrap();
        let mode = std::fs::metadata(workspace.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o700);
    }
}

//! SHA256 verification for downloaded files.

use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::io::AsyncReadExt;

use crate::error::{InstallError, InstallResult};

/// Verify SHA256 checksum of a file.
///
/// The comparison is case-insensitive and ignores surrounding whitespace in
/// `expected`.
pub async fn verify_sha256(path: &Path, expected: &str) -> InstallResult<()> {
    let actual = calculate_sha256(path).await?;

    // Normalize expected (remove any whitespace, lowercase)
    let expected = expected.trim().to_lowercase();

    if actual != expected {
        return Err(InstallError::ChecksumMismatch { expected, actual });
    }

    Ok(())
}

/// Calculate SHA256 hash of a file.
pub async fn calculate_sha256(path: &Path) -> InstallResult<String> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; 8192];

    loop {
        let n = file.read(&mut buffer).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    let result = hasher.finalize();
    Ok(hex::encode(result))
}

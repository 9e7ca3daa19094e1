//! Streaming artifact download.

use std::path::Path;

use futures::StreamExt;
use reqwest::Client;
use tokio::io::AsyncWriteExt;

use crate::error::{InstallError, InstallResult};

/// Progress information during download.
#[derive(Debug, Clone, Copy)]
pub struct DownloadProgress {
    /// Bytes downloaded so far
    pub downloaded: u64,
    /// Total bytes to download, if the server sent a length
    pub total: Option<u64>,
}

impl DownloadProgress {
    /// Get download progress as a percentage (0-100).
    pub fn percentage(&self) -> Option<f32> {
        match self.total {
            Some(0) | None => None,
            Some(total) => Some((self.downloaded as f32 / total as f32) * 100.0),
        }
    }

    /// Get human-readable downloaded size.
    pub fn downloaded_human(&self) -> String {
        format_bytes(self.downloaded)
    }
}

/// Format bytes as human-readable string.
pub(crate) fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Stream `url` into a new file at `dest`.
///
/// The destination must not exist; it is created exclusively so a file
/// planted in the workspace is never reused.
pub async fn fetch(client: &Client, url: &str, dest: &Path) -> InstallResult<u64> {
    tracing::debug!(%url, dest = %dest.display(), "Downloading artifact");

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| InstallError::DownloadFailed {
            url: url.to_string(),
            message: e.to_string(),
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(InstallError::DownloadStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let total = response.content_length();
    let mut progress = DownloadProgress {
        downloaded: 0,
        total,
    };
    let mut next_report = 10.0_f32;

    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(dest)
        .await?;
    let mut stream = response.bytes_stream();

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| InstallError::DownloadFailed {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        file.write_all(&chunk).await?;
        progress.downloaded += chunk.len() as u64;

        if let Some(pct) = progress.percentage()
            && pct >= next_report
        {
            tracing::debug!("Downloaded {} ({:.0}%)", progress.downloaded_human(), pct);
            next_report = (pct / 10.0).floor() * 10.0 + 10.0;
        }
    }

    file.flush().await?;
    file.sync_all().await?;

    if let Some(expected) = total
        && expected != progress.downloaded
    {
        return Err(InstallError::DownloadFailed {
            url: url.to_string(),
            message: format!(
                "truncated body: expected {} bytes, got {}",
                expected, progress.downloaded
            ),
        });
    }

    tracing::debug!("Downloaded {} from {}", progress.downloaded_human(), url);
    Ok(progress.downloaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InstallerConfig;
    use crate::error::ErrorKind;
    use crate::http_client::create_download_client;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(500), "500 B");
        assert_eq!(format_bytes(1024), "1.0 KB");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(1048576), "1.0 MB");
        assert_eq!(format_bytes(1073741824), "1.0 GB");
    }

    #[test]
    fn test_download_progress() {
        let progress = DownloadProgress {
            downloaded: 50_000_000,
            total: Some(100_000_000),
        };
        assert!((progress.percentage().unwrap() - 50.0).abs() < 0.01);
        assert_eq!(progress.downloaded_human(), "47.7 MB");

        let unknown = DownloadProgress {
            downloaded: 10,
            total: None,
        };
        assert!(unknown.percentage().is_none());
    }

    #[tokio::test]
    async fn test_fetch_writes_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/tool.tar.gz"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"archive bytes".to_vec()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("tool.tar.gz");
        let client = create_download_client(&InstallerConfig::default()).unwrap();

        let written = fetch(&client, &format!("{}/v1/tool.tar.gz", server.uri()), &dest)
            .await
            .unwrap();

        assert_eq!(written, 13);
        assert_eq!(std::fs::read(&dest).unwrap(), b"archive bytes");
    }

    #[tokio::test]
    async fn test_fetch_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("tool.tar.gz");
        let client = create_download_client(&InstallerConfig::default()).unwrap();

        let err = fetch(&client, &format!("{}/missing", server.uri()), &dest)
            .await
            .unwrap_err();

        assert!(matches!(err, InstallError::DownloadStatus { status: 404, .. }));
        assert_eq!(err.kind(), ErrorKind::DownloadFailed);
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_fetch_refuses_existing_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"new".to_vec()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("tool.tar.gz");
        std::fs::write(&dest, b"planted").unwrap();
        let client = create_download_client(&InstallerConfig::default()).unwrap();

        let err = fetch(&client, &server.uri(), &dest).await.unwrap_err();
        assert!(matches!(err, InstallError::Io(_)));
        assert_eq!(std::fs::read(&dest).unwrap(), b"planted");
    }
}

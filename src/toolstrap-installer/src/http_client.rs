//! HTTP client factory for release downloads.

use reqwest::Client;

use crate::config::InstallerConfig;
use crate::error::{InstallError, InstallResult};

/// User-Agent string for all HTTP requests
pub const USER_AGENT: &str = concat!("toolstrap/", env!("CARGO_PKG_VERSION"));

/// Creates an HTTP client for artifact downloads.
///
/// The overall timeout bounds the whole transfer, so a stalled release host
/// cannot hang a CI job indefinitely.
pub fn create_download_client(config: &InstallerConfig) -> InstallResult<Client> {
    create_client_builder(config)
        .build()
        .map_err(|e| InstallError::HttpClient {
            message: e.to_string(),
        })
}

/// Creates an HTTP client builder with the standard configuration.
pub fn create_client_builder(config: &InstallerConfig) -> reqwest::ClientBuilder {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(config.download_timeout())
        .connect_timeout(config.connect_timeout())
        .tcp_nodelay(true)
        .redirect(reqwest::redirect::Policy::limited(10))
}

//! HTTP access to the distribution server.

use anyhow::{bail, Context};
use reqwest::blocking::Client;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use std::time::Duration;

use crate::error::{ProvisionError, Result};
use crate::ui::progress::download_bar;

use super::Distribution;

/// Timeout for the reachability check.
pub const REACHABILITY_TIMEOUT: Duration = Duration::from_secs(10);

/// Fetches installer packages over HTTP/HTTPS.
pub struct HttpFetcher {
    client: Client,
    reachability_timeout: Duration,
    show_progress: bool,
}

impl HttpFetcher {
    /// Create a fetcher with the default 10-second reachability timeout.
    pub fn new() -> Result<Self> {
        Self::with_timeout(REACHABILITY_TIMEOUT)
    }

    /// Create a fetcher with a custom reachability timeout.
    ///
    /// Downloads themselves are not time-limited.
    pub fn with_timeout(reachability_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("kindling/", env!("CARGO_PKG_VERSION")))
            .timeout(None::<Duration>)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            reachability_timeout,
            show_progress: false,
        })
    }

    /// Draw a progress bar while downloading.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Get the configured reachability timeout.
    pub fn timeout(&self) -> Duration {
        self.reachability_timeout
    }

    fn head(&self, url: &str) -> anyhow::Result<()> {
        let response = self
            .client
            .head(url)
            .timeout(self.reachability_timeout)
            .send()?;
        if !response.status().is_success() {
            bail!("HTTP {}", response.status());
        }
        Ok(())
    }

    fn get_to_file(&self, url: &str, dest: &Path) -> anyhow::Result<u64> {
        let mut response = self.client.get(url).send()?;
        if !response.status().is_success() {
            bail!("HTTP {}", response.status());
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let file =
            File::create(dest).with_context(|| format!("Failed to create {}", dest.display()))?;

        let bar = download_bar(response.content_length(), self.show_progress);
        let mut writer = bar.wrap_write(BufWriter::new(file));
        let written = response.copy_to(&mut writer)?;
        writer.flush()?;
        bar.finish_and_clear();

        Ok(written)
    }
}

impl Distribution for HttpFetcher {
    fn check_reachable(&self, url: &str) -> Result<()> {
        self.head(url).map_err(|e| ProvisionError::Connectivity {
            url: url.to_string(),
            message: format!("{:#}", e),
        })
    }

    fn download(&self, url: &str, dest: &Path) -> Result<u64> {
        self.get_to_file(url, dest).map_err(|e| {
            let _ = fs::remove_file(dest);
            ProvisionError::Download {
                url: url.to_string(),
                message: format!("{:#}", e),
            }
        })
    }
}

/// Hex-encoded SHA-256 of a file's contents.
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use tempfile::TempDir;

    #[test]
    fn default_timeout_is_10_seconds() {
        let fetcher = HttpFetcher::new().unwrap();
        assert_eq!(fetcher.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn reachable_when_head_succeeds() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(httpmock::Method::HEAD).path("/3.11.9/python-3.11.9-amd64.exe");
            then.status(200);
        });

        let fetcher = HttpFetcher::new().unwrap();
        fetcher
            .check_reachable(&server.url("/3.11.9/python-3.11.9-amd64.exe"))
            .unwrap();
        mock.assert();
    }

    #[test]
    fn unreachable_on_error_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(httpmock::Method::HEAD).path("/missing.exe");
            then.status(404);
        });

        let fetcher = HttpFetcher::new().unwrap();
        let err = fetcher
            .check_reachable(&server.url("/missing.exe"))
            .unwrap_err();
        assert!(matches!(err, ProvisionError::Connectivity { .. }));
        assert!(err.to_string().contains("404"));
    }

    #[test]
    fn unreachable_when_nothing_listens() {
        let fetcher = HttpFetcher::with_timeout(Duration::from_secs(2)).unwrap();
        let err = fetcher
            .check_reachable("http://127.0.0.1:1/python.exe")
            .unwrap_err();
        assert_eq!(err.kind(), "ConnectivityError");
    }

    #[test]
    fn download_writes_body_to_file() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/pkg/python.pkg");
            then.status(200).body("installer-bytes");
        });

        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("scratch").join("python.pkg");
        let fetcher = HttpFetcher::new().unwrap();
        let written = fetcher
            .download(&server.url("/pkg/python.pkg"), &dest)
            .unwrap();

        assert_eq!(written, 15);
        assert_eq!(fs::read_to_string(&dest).unwrap(), "installer-bytes");
    }

    #[test]
    fn download_failure_leaves_no_file() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/pkg/python.pkg");
            then.status(500);
        });

        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("python.pkg");
        let fetcher = HttpFetcher::new().unwrap();
        let err = fetcher
            .download(&server.url("/pkg/python.pkg"), &dest)
            .unwrap_err();

        assert!(matches!(err, ProvisionError::Download { .. }));
        assert!(!dest.exists());
    }

    #[test]
    fn sha256_of_known_content() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("data");
        fs::write(&path, "abc").unwrap();
        assert_eq!(
            sha256_file(&path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
